use std::cmp;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::{require_file, ChecksumError};

pub const DEFAULT_BUFFER_SIZE: usize = 4 * 1024;
pub const MAX_BUFFER_SIZE: usize = 10 * 1024 * 1024;

// A 10GiB file gets the 10MiB max buffer
pub const BUFFER_RATIO: f32 = 0.0005;

/// Scale the read buffer to the file, `floor(len * ratio)` clamped to `[min, max]`.
pub fn suggest_buffer_size(
    path: &Path,
    min: usize,
    max: usize,
    ratio: f32,
) -> Result<usize, ChecksumError> {
    require_file(path)?;

    if min < 1 {
        return Err(ChecksumError::InvalidArgument(
            "minimum buffer size cannot be less than 1 byte".to_string(),
        ));
    }
    if max < 1 {
        return Err(ChecksumError::InvalidArgument(
            "maximum buffer size cannot be less than 1 byte".to_string(),
        ));
    }
    if min > max {
        return Err(ChecksumError::InvalidArgument(format!(
            "minimum buffer size {} is larger than the maximum {}",
            min, max
        )));
    }

    let len = path.metadata()?.len();

    // Float to int casts saturate, so a negative or NaN ratio lands on min
    let size = (len as f64 * f64::from(ratio)) as usize;
    Ok(size.clamp(min, max))
}

/// How big of a read buffer to hash a given file with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BufferPolicy {
    Fixed(usize),
    Suggested { min: usize, max: usize, ratio: f32 },
}

impl Default for BufferPolicy {
    fn default() -> Self {
        BufferPolicy::Fixed(DEFAULT_BUFFER_SIZE)
    }
}

impl BufferPolicy {
    pub fn resolve(&self, path: &Path) -> Result<usize, ChecksumError> {
        match *self {
            BufferPolicy::Fixed(size) => Ok(size),
            BufferPolicy::Suggested { min, max, ratio } => {
                suggest_buffer_size(path, min, max, ratio)
            }
        }
    }
}

/// Read + Seek view over the first `len` bytes of a stream.
///
/// Used to hide an appended trailer from anything reading the archive body,
/// seeking from the end is relative to `len` and not the underlying stream.
pub struct Body<R> {
    inner: R,
    len: u64,
    pos: u64,
}

impl<R: Seek> Body<R> {
    pub fn new(mut inner: R, len: u64) -> io::Result<Self> {
        inner.seek(SeekFrom::Start(0))?;
        Ok(Body { inner, len, pos: 0 })
    }
}

impl<R> Body<R> {
    pub fn body_len(&self) -> u64 {
        self.len
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for Body<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = self.len.saturating_sub(self.pos);
        let max = cmp::min(buf.len() as u64, remaining) as usize;
        if max == 0 {
            return Ok(0);
        }

        let read = self.inner.read(&mut buf[..max])?;
        self.pos += read as u64;
        Ok(read)
    }
}

impl<R: Seek> Seek for Body<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(n) => Some(n),
            SeekFrom::End(n) => self.len.checked_add_signed(n),
            SeekFrom::Current(n) => self.pos.checked_add_signed(n),
        }
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                "invalid seek to a negative or overflowing position",
            )
        })?;

        self.pos = self.inner.seek(SeekFrom::Start(target))?;
        Ok(self.pos)
    }
}
