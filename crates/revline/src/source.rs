//! Byte source abstractions for backwards reading.
//!
//! A [`ByteSource`] knows its total length and can fill a buffer from any
//! offset. The reader never asks for bytes past the length it was given.
//!
//! - [`SeekSource`] wraps any `Read + Seek` (files, cursors)
//! - [`MemorySource`] serves an in-memory buffer without copying it first

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use tracing::debug;

/// Random-access byte source of known length.
pub trait ByteSource {
    /// Total length in bytes.
    fn len(&self) -> u64;

    /// Check whether the source holds no bytes.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fill `buf` with the bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Fails if the range cannot be read in full.
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<()>;
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn len(&self) -> u64 {
        (**self).len()
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        (**self).read_at(offset, buf)
    }
}

/// Byte source backed by a seekable reader.
///
/// The length is measured once at construction by seeking to the end.
#[derive(Debug)]
pub struct SeekSource<R: Read + Seek> {
    reader: R,
    len: u64,
}

impl<R: Read + Seek> SeekSource<R> {
    /// Wrap a seekable reader.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader cannot seek to its end.
    pub fn new(mut reader: R) -> io::Result<Self> {
        let len = reader.seek(SeekFrom::End(0))?;
        Ok(Self { reader, len })
    }

    /// Unwrap the underlying reader.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl SeekSource<File> {
    /// Open a file for backwards reading.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or measured.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let source = Self::new(File::open(path)?)?;
        debug!("Opened {} ({} bytes)", path.display(), source.len);
        Ok(source)
    }
}

impl<R: Read + Seek> ByteSource for SeekSource<R> {
    fn len(&self) -> u64 {
        self.len
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        self.reader.seek(SeekFrom::Start(offset))?;
        self.reader.read_exact(buf)
    }
}

/// Byte source over an in-memory buffer.
#[derive(Debug, Clone)]
pub struct MemorySource<T: AsRef<[u8]>> {
    data: T,
}

impl<T: AsRef<[u8]>> MemorySource<T> {
    /// Wrap an in-memory buffer.
    pub const fn new(data: T) -> Self {
        Self { data }
    }
}

impl<T: AsRef<[u8]>> ByteSource for MemorySource<T> {
    fn len(&self) -> u64 {
        self.data.as_ref().len() as u64
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        let data = self.data.as_ref();
        let range = usize::try_from(offset)
            .ok()
            .and_then(|start| Some(start..start.checked_add(buf.len())?))
            .filter(|range| range.end <= data.len())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!(
                        "range {offset}+{} is outside a {}-byte buffer",
                        buf.len(),
                        data.len()
                    ),
                )
            })?;
        buf.copy_from_slice(&data[range]);
        Ok(())
    }
}
