pub mod archive;
pub mod compress;
pub mod error;
pub mod zipfile;

pub use archive::Archiver;
pub use compress::{CompressionLevel, Compressor, CreateOptions};
pub use error::ArchiveError;
pub use zipfile::ZipCompressor;
