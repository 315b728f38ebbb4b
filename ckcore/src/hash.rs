use std::fs::{File, OpenOptions};
use std::io::{copy, BufReader, Read};
use std::path::Path;

use log::debug;
use md5::{Digest, Md5};

use crate::buf::Body;
use crate::error::{require_file, ChecksumError};
use crate::trailer::{trailer_offset, write_trailer};

// To encapsulate the hash engine used
pub fn digest_bytes(data: &[u8]) -> String {
    hex::encode(Md5::digest(data))
}

fn digest_reader<R: Read>(reader: &mut R) -> std::io::Result<String> {
    let mut hash = Md5::new();
    copy(reader, &mut hash)?;
    Ok(hex::encode(hash.finalize()))
}

/// Hashes the logical body of a file, the bytes in front of any trailer.
///
/// Reads go through a buffer of `buffer_size` bytes so memory stays bounded
/// regardless of the archive size.
#[derive(Debug, Clone, Copy)]
pub struct StreamingHasher {
    buffer_size: usize,
}

impl StreamingHasher {
    pub fn new(buffer_size: usize) -> Result<StreamingHasher, ChecksumError> {
        if buffer_size < 1 {
            return Err(ChecksumError::InvalidArgument(
                "buffer size cannot be less than 1 byte".to_string(),
            ));
        }
        Ok(StreamingHasher { buffer_size })
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    // Returns the hash, the trailer offset if one was found, and the handle back
    fn scan(&self, mut file: File) -> std::io::Result<(String, Option<u64>, File)> {
        let total = file.metadata()?.len();
        let offset = trailer_offset(&mut file, total)?;

        let body = Body::new(file, offset.unwrap_or(total))?;
        let mut reader = BufReader::with_capacity(self.buffer_size, body);
        let hash = digest_reader(&mut reader)?;

        Ok((hash, offset, reader.into_inner().into_inner()))
    }

    /// Hash without touching the file.
    pub fn digest(&self, path: &Path) -> Result<String, ChecksumError> {
        require_file(path)?;

        let (hash, offset, _) = self.scan(File::open(path)?)?;
        debug!(
            "{}: {} (trailer: {})",
            path.display(),
            hash,
            offset.is_some()
        );
        Ok(hash)
    }

    /// Hash then write the result as the file's trailer.
    ///
    /// An old trailer is excluded from the hash and replaced, so calling this
    /// again on the same body leaves the file byte for byte the same.
    pub fn digest_and_store(&self, path: &Path) -> Result<String, ChecksumError> {
        require_file(path)?;

        let file = OpenOptions::new().read(true).write(true).open(path)?;
        let (hash, offset, mut file) = self.scan(file)?;

        if let Some(offset) = offset {
            debug!("{}: refreshing trailer at {}", path.display(), offset);
            file.set_len(offset)?;
        }
        write_trailer(&mut file, &hash)?;

        debug!("{}: stored {}", path.display(), hash);
        Ok(hash)
    }
}

#[cfg(test)]
mod test_digest {
    use super::*;
    use crate::trailer::{
        append_trailer, encode_trailer, has_trailer, read_stored_hash, remove_trailer, MAGIC,
        TRAILER_LEN,
    };
    use std::fs;

    const FOX: &[u8] = b"The quick brown fox jumps over the lazy dog";
    const FOX_MD5: &str = "9e107d9d372bb6826bd81d3542a419d6";

    fn write_file(dir: &tempfile::TempDir, data: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join("archive.zip");
        fs::write(&path, data).unwrap();
        path
    }

    #[test]
    fn known_bytes() {
        assert_eq!(digest_bytes(b""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(digest_bytes(b"abc"), "900150983cd24fb0d6963f7d28e17f72");
        assert_eq!(digest_bytes(FOX), FOX_MD5);
    }

    #[test]
    fn zero_buffer_rejected() {
        assert!(matches!(
            StreamingHasher::new(0),
            Err(ChecksumError::InvalidArgument(_))
        ));
        assert_eq!(StreamingHasher::new(1).unwrap().buffer_size(), 1);
    }

    #[test]
    fn missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let hasher = StreamingHasher::new(4096).unwrap();

        assert!(matches!(
            hasher.digest(&dir.path().join("missing")),
            Err(ChecksumError::NotFound(_))
        ));
        assert!(matches!(
            hasher.digest_and_store(&dir.path().join("missing")),
            Err(ChecksumError::NotFound(_))
        ));
    }

    #[test]
    fn file_matches_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, FOX);

        for size in [1, 3, 7, 4096] {
            let hasher = StreamingHasher::new(size).unwrap();
            assert_eq!(hasher.digest(&path).unwrap(), FOX_MD5, "buffer {}", size);
        }
    }

    #[test]
    fn empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, b"");

        let hasher = StreamingHasher::new(4096).unwrap();
        assert_eq!(
            hasher.digest(&path).unwrap(),
            "d41d8cd98f00b204e9800998ecf8427e"
        );
    }

    #[test]
    fn trailer_excluded() {
        let dir = tempfile::tempdir().unwrap();
        let mut data = FOX.to_vec();
        data.extend_from_slice(&encode_trailer("00000000000000000000000000000000"));
        let path = write_file(&dir, &data);

        let hasher = StreamingHasher::new(16).unwrap();
        assert_eq!(hasher.digest(&path).unwrap(), FOX_MD5);

        // Read only
        assert_eq!(fs::read(&path).unwrap(), data);
    }

    #[test]
    fn short_file_ending_in_magic_is_all_body() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, MAGIC);

        let hasher = StreamingHasher::new(4096).unwrap();
        assert_eq!(hasher.digest(&path).unwrap(), digest_bytes(MAGIC));
    }

    #[test]
    fn store_appends_first_trailer() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, FOX);

        let hasher = StreamingHasher::new(4096).unwrap();
        assert_eq!(hasher.digest_and_store(&path).unwrap(), FOX_MD5);

        assert!(has_trailer(&path).unwrap());
        assert_eq!(read_stored_hash(&path).unwrap(), FOX_MD5);
        assert_eq!(
            fs::metadata(&path).unwrap().len(),
            (FOX.len() + TRAILER_LEN) as u64
        );
    }

    #[test]
    fn store_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, FOX);
        let hasher = StreamingHasher::new(5).unwrap();

        hasher.digest_and_store(&path).unwrap();
        let first = fs::read(&path).unwrap();

        for _ in 0..3 {
            assert_eq!(hasher.digest_and_store(&path).unwrap(), FOX_MD5);
            assert_eq!(fs::read(&path).unwrap(), first);
        }
        assert_eq!(hasher.digest(&path).unwrap(), FOX_MD5);
    }

    #[test]
    fn empty_body_does_not_stack() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, b"");
        let empty_md5 = "d41d8cd98f00b204e9800998ecf8427e";
        let hasher = StreamingHasher::new(4096).unwrap();

        for _ in 0..2 {
            assert_eq!(hasher.digest_and_store(&path).unwrap(), empty_md5);
            assert_eq!(fs::metadata(&path).unwrap().len(), TRAILER_LEN as u64);
        }

        for _ in 0..2 {
            append_trailer(&path, empty_md5).unwrap();
            assert_eq!(fs::metadata(&path).unwrap().len(), TRAILER_LEN as u64);
        }
        assert!(has_trailer(&path).unwrap());
        assert_eq!(hasher.digest(&path).unwrap(), empty_md5);

        assert_eq!(remove_trailer(&path).unwrap().as_deref(), Some(empty_md5));
        assert_eq!(fs::metadata(&path).unwrap().len(), 0);
    }

    #[test]
    fn store_replaces_stale_trailer() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, FOX);
        append_trailer(&path, "ffffffffffffffffffffffffffffffff").unwrap();

        let hasher = StreamingHasher::new(4096).unwrap();
        assert_eq!(hasher.digest_and_store(&path).unwrap(), FOX_MD5);
        assert_eq!(read_stored_hash(&path).unwrap(), FOX_MD5);
        assert_eq!(
            fs::metadata(&path).unwrap().len(),
            (FOX.len() + TRAILER_LEN) as u64
        );
    }

    #[test]
    fn hash_of_appended_equals_hash_of_body() {
        let dir = tempfile::tempdir().unwrap();
        let hasher = StreamingHasher::new(64).unwrap();

        for len in [0usize, 1, 42, 43, 44, 1000] {
            let body: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
            let path = write_file(&dir, &body);

            let body_hash = digest_bytes(&body);
            append_trailer(&path, &body_hash).unwrap();
            assert_eq!(hasher.digest(&path).unwrap(), body_hash, "len {}", len);
        }
    }
}
