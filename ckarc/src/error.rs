use std::path::PathBuf;

use thiserror::Error;

use ckcore::ChecksumError;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error(transparent)]
    IO(#[from] std::io::Error),
    #[error(transparent)]
    Checksum(#[from] ChecksumError),
    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
    #[error(transparent)]
    Walk(#[from] ignore::Error),
    #[error("{} was not found", .0.display())]
    FileNotFound(PathBuf),
    #[error("{} directory could not be found", .0.display())]
    DirectoryNotFound(PathBuf),
    #[error("{} already exists", .0.display())]
    FileAlreadyExists(PathBuf),
    #[error(
        "calculated checksum {} for {} does not match the stored {}",
        .computed,
        .path.display(),
        .stored
    )]
    FailedChecksum {
        path: PathBuf,
        stored: String,
        computed: String,
    },
}
