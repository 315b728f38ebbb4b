use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::ArchiveError;

#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CompressionLevel {
    #[default]
    Optimal,
    Fastest,
    NoCompression,
}

impl fmt::Display for CompressionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompressionLevel::Optimal => write!(f, "optimal"),
            CompressionLevel::Fastest => write!(f, "fastest"),
            CompressionLevel::NoCompression => write!(f, "none"),
        }
    }
}

impl FromStr for CompressionLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "optimal" => Ok(CompressionLevel::Optimal),
            "fastest" => Ok(CompressionLevel::Fastest),
            "none" | "nocompression" => Ok(CompressionLevel::NoCompression),
            _ => Err(format!(
                "unknown compression level {:?}, expected optimal, fastest or none",
                s
            )),
        }
    }
}

// Passed through untouched to the compressor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CreateOptions {
    pub level: CompressionLevel,
    pub include_base_dir: bool,
}

/// Builds and unpacks the archive container.
///
/// The checksum layer never looks inside the container, it only needs
/// "write an archive of this directory to this path" and the reverse.
pub trait Compressor {
    fn create(
        &self,
        source_dir: &Path,
        dest: &Path,
        options: &CreateOptions,
    ) -> Result<(), ArchiveError>;

    fn extract(&self, archive: &Path, dest_dir: &Path) -> Result<(), ArchiveError>;
}
