use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde::Deserialize;
use thiserror::Error;

use ckarc::CompressionLevel;
use ckcore::buf::{BufferPolicy, BUFFER_RATIO, DEFAULT_BUFFER_SIZE, MAX_BUFFER_SIZE};

#[derive(Parser)]
#[command(name = "ckzip")]
#[command(about = "Zip archives carrying their own checksum")]
#[command(author, version, long_about = None)]
pub struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Hash with a fixed read buffer instead of one scaled to the archive
    #[arg(short, long, value_name = "BYTES")]
    pub buffer_size: Option<usize>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Archives a directory and stores the archive's checksum in it
    Create {
        source: PathBuf,
        dest: PathBuf,

        /// Don't append a checksum
        #[arg(long)]
        no_checksum: bool,

        /// Fail if the destination already exists
        #[arg(long)]
        no_overwrite: bool,

        /// optimal, fastest or none
        #[arg(short, long)]
        level: Option<CompressionLevel>,

        /// Put the source directory itself at the root of the archive
        #[arg(long)]
        include_base_dir: bool,
    },

    /// Verifies the stored checksum then extracts
    Extract {
        archive: PathBuf,
        dest: PathBuf,

        /// Extract without checking the stored checksum
        #[arg(long)]
        no_check: bool,
    },

    /// Computes and stores the checksum, replacing any stored one
    Append { archive: PathBuf },

    /// Removes the stored checksum
    Remove { archive: PathBuf },

    /// Prints the stored checksum
    Show { archive: PathBuf },

    /// Prints the checksum of the archive, ignoring any stored one
    Hash { archive: PathBuf },

    /// Compares the stored checksum against the archive
    Verify { archive: PathBuf },

    /// Prints the read buffer size that would be used for a file
    Suggest {
        file: PathBuf,

        #[arg(long)]
        min: Option<usize>,

        #[arg(long)]
        max: Option<usize>,

        #[arg(long)]
        ratio: Option<f32>,
    },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    IO(#[from] std::io::Error),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

// Configuration, every key is optional in a user config file
pub const DEFAULT_CONFIG: &str = r#"
    [checksum]
    # buffer_size = 65536, fixed instead of scaled by ratio within min/max
    min_buffer = 4096
    max_buffer = 10485760
    ratio = 0.0005

    [archive]
    store_checksum = true
    overwrite = true
    check = true
    level = "Optimal"
    include_base_dir = false
"#;

#[derive(Deserialize, Debug, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub checksum: ChecksumConfig,
    pub archive: ArchiveConfig,
}

#[derive(Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct ChecksumConfig {
    pub buffer_size: Option<usize>,
    pub min_buffer: usize,
    pub max_buffer: usize,
    pub ratio: f32,
}

impl Default for ChecksumConfig {
    fn default() -> Self {
        ChecksumConfig {
            buffer_size: None,
            min_buffer: DEFAULT_BUFFER_SIZE,
            max_buffer: MAX_BUFFER_SIZE,
            ratio: BUFFER_RATIO,
        }
    }
}

impl ChecksumConfig {
    pub fn policy(&self) -> BufferPolicy {
        match self.buffer_size {
            Some(size) => BufferPolicy::Fixed(size),
            None => BufferPolicy::Suggested {
                min: self.min_buffer,
                max: self.max_buffer,
                ratio: self.ratio,
            },
        }
    }
}

#[derive(Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct ArchiveConfig {
    pub store_checksum: bool,
    pub overwrite: bool,
    pub check: bool,
    pub level: CompressionLevel,
    pub include_base_dir: bool,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        ArchiveConfig {
            store_checksum: true,
            overwrite: true,
            check: true,
            level: CompressionLevel::Optimal,
            include_base_dir: false,
        }
    }
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
        match path {
            None => Ok(toml::from_str(DEFAULT_CONFIG)?),
            Some(path) => Ok(toml::from_str(&fs::read_to_string(path)?)?),
        }
    }
}
