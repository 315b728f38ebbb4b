use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use log::debug;

use crate::buf::Body;
use crate::error::{require_file, ChecksumError};

// On disk layout, appended after the zip body:
//  <32 lowercase hex chars of md5><ChecksumZIP>
// No length prefix or version, the magic suffix is the only marker.
pub const MAGIC: &[u8; 11] = b"ChecksumZIP";
pub const MAGIC_LEN: usize = MAGIC.len();
pub const HASH_TEXT_LEN: usize = 32;
pub const TRAILER_LEN: usize = HASH_TEXT_LEN + MAGIC_LEN;

/// Body length of an open stream if it ends in a trailer.
///
/// A trailer is only recognised when all of it fits, anything shorter than
/// `TRAILER_LEN` bytes is all body. An empty body in front of it is fine.
pub(crate) fn trailer_offset<F: Read + Seek>(
    file: &mut F,
    total: u64,
) -> std::io::Result<Option<u64>> {
    if total < TRAILER_LEN as u64 {
        return Ok(None);
    }

    file.seek(SeekFrom::Start(total - MAGIC_LEN as u64))?;
    let mut tail = [0u8; MAGIC_LEN];
    file.read_exact(&mut tail)?;

    if &tail == MAGIC {
        Ok(Some(total - TRAILER_LEN as u64))
    } else {
        Ok(None)
    }
}

pub fn encode_trailer(hash_text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(TRAILER_LEN);
    out.extend_from_slice(hash_text.as_bytes());
    out.extend_from_slice(MAGIC);
    out
}

// Caller has already cut the file down to its body
pub(crate) fn write_trailer(file: &mut File, hash_text: &str) -> std::io::Result<()> {
    file.seek(SeekFrom::End(0))?;
    file.write_all(&encode_trailer(hash_text))?;
    file.sync_data()
}

fn read_hash_text<F: Read + Seek>(
    file: &mut F,
    offset: u64,
    path: &Path,
) -> Result<String, ChecksumError> {
    file.seek(SeekFrom::Start(offset))?;
    let mut raw = [0u8; TRAILER_LEN];
    file.read_exact(&mut raw)?;

    match std::str::from_utf8(&raw[..HASH_TEXT_LEN]) {
        Ok(hash) if hash.is_ascii() => Ok(hash.to_string()),
        _ => Err(ChecksumError::MalformedTrailer(path.to_path_buf())),
    }
}

fn is_hash_text(hash_text: &str) -> bool {
    hash_text.len() == HASH_TEXT_LEN
        && hash_text
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

pub fn has_trailer(path: &Path) -> Result<bool, ChecksumError> {
    require_file(path)?;

    let mut file = File::open(path)?;
    let total = file.metadata()?.len();
    Ok(trailer_offset(&mut file, total)?.is_some())
}

pub fn read_stored_hash(path: &Path) -> Result<String, ChecksumError> {
    require_file(path)?;

    let mut file = File::open(path)?;
    let total = file.metadata()?.len();
    match trailer_offset(&mut file, total)? {
        Some(offset) => read_hash_text(&mut file, offset, path),
        None => Err(ChecksumError::NoChecksumStored(path.to_path_buf())),
    }
}

/// Strip the trailer and hand back the hash it carried, `None` if there was none.
pub fn remove_trailer(path: &Path) -> Result<Option<String>, ChecksumError> {
    require_file(path)?;

    // Read then truncate on the same handle
    let mut file = OpenOptions::new().read(true).write(true).open(path)?;
    let total = file.metadata()?.len();
    let offset = match trailer_offset(&mut file, total)? {
        Some(offset) => offset,
        None => return Ok(None),
    };

    let hash = read_hash_text(&mut file, offset, path)?;
    file.set_len(offset)?;
    file.sync_data()?;

    debug!("removed trailer {} from {}", hash, path.display());
    Ok(Some(hash))
}

/// Append `hash_text` + magic, replacing a trailer that is already there.
pub fn append_trailer(path: &Path, hash_text: &str) -> Result<(), ChecksumError> {
    require_file(path)?;

    if !is_hash_text(hash_text) {
        return Err(ChecksumError::InvalidArgument(format!(
            "checksum must be {} lowercase hex characters, got {:?}",
            HASH_TEXT_LEN, hash_text
        )));
    }

    let mut file = OpenOptions::new().read(true).write(true).open(path)?;
    let total = file.metadata()?.len();
    if let Some(offset) = trailer_offset(&mut file, total)? {
        debug!("replacing existing trailer on {}", path.display());
        file.set_len(offset)?;
    }

    write_trailer(&mut file, hash_text)?;
    Ok(())
}

/// Open the archive for reading with any trailer hidden behind a `Body`.
pub fn open_body(path: &Path) -> Result<Body<File>, ChecksumError> {
    require_file(path)?;

    let mut file = File::open(path)?;
    let total = file.metadata()?.len();
    let len = trailer_offset(&mut file, total)?.unwrap_or(total);
    Ok(Body::new(file, len)?)
}
