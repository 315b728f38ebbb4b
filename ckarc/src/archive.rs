use std::fs;
use std::path::Path;

use log::{info, warn};

use ckcore::buf::BufferPolicy;
use ckcore::hash::StreamingHasher;
use ckcore::trailer;
use ckcore::ChecksumError;

use crate::compress::{Compressor, CreateOptions};
use crate::error::ArchiveError;

// Nothing here locks, callers must not run two operations on one path at once
pub struct Archiver<C: Compressor> {
    compressor: C,
    buffer: BufferPolicy,
}

fn require_archive(archive: &Path) -> Result<(), ArchiveError> {
    if archive.is_file() {
        Ok(())
    } else {
        Err(ArchiveError::FileNotFound(archive.to_path_buf()))
    }
}

fn require_dir(dir: &Path) -> Result<(), ArchiveError> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(ArchiveError::DirectoryNotFound(dir.to_path_buf()))
    }
}

impl<C: Compressor> Archiver<C> {
    pub fn new(compressor: C, buffer: BufferPolicy) -> Self {
        Archiver { compressor, buffer }
    }

    fn hasher(&self, archive: &Path) -> Result<StreamingHasher, ChecksumError> {
        StreamingHasher::new(self.buffer.resolve(archive)?)
    }

    pub fn create_with_checksum(
        &self,
        source_dir: &Path,
        dest: &Path,
        store_checksum: bool,
        overwrite: bool,
        options: &CreateOptions,
    ) -> Result<(), ArchiveError> {
        require_dir(source_dir)?;

        if dest.exists() {
            if !overwrite {
                return Err(ArchiveError::FileAlreadyExists(dest.to_path_buf()));
            }
            warn!("overwriting {}", dest.display());
            fs::remove_file(dest)?;
        }

        self.compressor.create(source_dir, dest, options)?;

        if store_checksum {
            let hash = self.append_checksum(dest)?;
            info!("{}: checksum {}", dest.display(), hash);
        }
        Ok(())
    }

    /// Checks the stored checksum (if `check`) before anything is extracted.
    pub fn verify_and_extract(
        &self,
        archive: &Path,
        dest_dir: &Path,
        check: bool,
    ) -> Result<(), ArchiveError> {
        require_archive(archive)?;
        require_dir(dest_dir)?;

        if check {
            self.verify(archive)?;
        }
        self.compressor.extract(archive, dest_dir)
    }

    /// Hash the archive and store it as the trailer, replacing any old one.
    pub fn append_checksum(&self, archive: &Path) -> Result<String, ArchiveError> {
        require_archive(archive)?;
        Ok(self.hasher(archive)?.digest_and_store(archive)?)
    }

    pub fn remove_checksum(&self, archive: &Path) -> Result<Option<String>, ArchiveError> {
        require_archive(archive)?;
        Ok(trailer::remove_trailer(archive)?)
    }

    pub fn has_checksum(&self, archive: &Path) -> Result<bool, ArchiveError> {
        require_archive(archive)?;
        Ok(trailer::has_trailer(archive)?)
    }

    pub fn stored_checksum(&self, archive: &Path) -> Result<String, ArchiveError> {
        require_archive(archive)?;
        Ok(trailer::read_stored_hash(archive)?)
    }

    // Read only, a stale trailer is left as it is
    pub fn calculate_checksum(&self, archive: &Path) -> Result<String, ArchiveError> {
        require_archive(archive)?;
        Ok(self.hasher(archive)?.digest(archive)?)
    }

    pub fn has_matching_checksum(&self, archive: &Path) -> Result<bool, ArchiveError> {
        Ok(self.stored_checksum(archive)? == self.calculate_checksum(archive)?)
    }

    pub fn verify(&self, archive: &Path) -> Result<(), ArchiveError> {
        let stored = self.stored_checksum(archive)?;
        let computed = self.calculate_checksum(archive)?;

        if stored == computed {
            info!("{}: checksum ok {}", archive.display(), computed);
            Ok(())
        } else {
            Err(ArchiveError::FailedChecksum {
                path: archive.to_path_buf(),
                stored,
                computed,
            })
        }
    }
}
