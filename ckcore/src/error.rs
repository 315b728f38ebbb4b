use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChecksumError {
    #[error(transparent)]
    IO(#[from] std::io::Error),
    #[error("{} was not found", .0.display())]
    NotFound(PathBuf),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("{} doesn't have a stored checksum value", .0.display())]
    NoChecksumStored(PathBuf),
    #[error("{} has a trailer with a non-ascii checksum", .0.display())]
    MalformedTrailer(PathBuf),
}

// Everything that touches a path checks for it first, before any open/seek
pub(crate) fn require_file(path: &std::path::Path) -> Result<(), ChecksumError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(ChecksumError::NotFound(path.to_path_buf()))
    }
}

#[cfg(test)]
mod test_error {
    use super::*;

    #[test]
    fn not_found_names_path() {
        let err = ChecksumError::NotFound(PathBuf::from("/tmp/missing.zip"));
        assert_eq!(err.to_string(), "/tmp/missing.zip was not found");
    }

    #[test]
    fn require_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope");

        assert!(matches!(
            require_file(&path),
            Err(ChecksumError::NotFound(p)) if p == path
        ));
    }

    #[test]
    fn require_directory_is_not_a_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            require_file(dir.path()),
            Err(ChecksumError::NotFound(_))
        ));
    }
}
