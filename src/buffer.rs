//! Memory-mapped tzdata file access with a big-endian cursor

use crate::error::{Result, TzDataError};
use byteorder::{BigEndian, ReadBytesExt};
use memmap2::{Mmap, MmapOptions};
use std::fs::File;
use std::io::{Cursor, Seek, SeekFrom};
use std::path::Path;
use tracing::debug;

/// Read-only memory map over a single tzdata file.
///
/// The map is released exactly once, when this value is dropped. All access
/// goes through bounds-checked slices or a [`TzCursor`]; the underlying file
/// is never written.
#[derive(Debug)]
pub struct MappedTzFile {
    mmap: Mmap,
}

impl MappedTzFile {
    /// Memory-map the file at `path` read-only.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let size = file.metadata()?.len();

        debug!("mapping tzdata file {:?} ({} bytes)", path, size);

        let mmap = unsafe { MmapOptions::new().map(&file)? };
        Ok(Self { mmap })
    }

    /// Total size of the mapped file in bytes.
    pub fn len(&self) -> u64 {
        self.mmap.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }

    /// Borrow `length` bytes starting at `offset` without copying.
    pub fn slice(&self, offset: u64, length: usize, section: &'static str) -> Result<&[u8]> {
        let end = offset + length as u64;
        if end > self.len() {
            return Err(TzDataError::SectionOutOfBounds {
                section,
                start: offset,
                end,
                file_size: self.len(),
            });
        }
        Ok(&self.mmap[offset as usize..end as usize])
    }

    /// Big-endian cursor positioned at the start of the file.
    pub fn cursor(&self) -> TzCursor<'_> {
        TzCursor::new(&self.mmap)
    }
}

/// Big-endian byte cursor over a mapped buffer.
///
/// Mirrors the seek/skip/read-primitive surface the index parser needs.
pub struct TzCursor<'a> {
    inner: Cursor<&'a [u8]>,
}

impl<'a> TzCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            inner: Cursor::new(data),
        }
    }

    /// Move to an absolute offset.
    pub fn seek(&mut self, offset: u64) -> Result<()> {
        self.inner.seek(SeekFrom::Start(offset))?;
        Ok(())
    }

    /// Advance past `count` bytes.
    pub fn skip(&mut self, count: i64) -> Result<()> {
        self.inner.seek(SeekFrom::Current(count))?;
        Ok(())
    }

    /// Read a big-endian `u32`.
    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(self.inner.read_u32::<BigEndian>()?)
    }

    /// Fill `buf` completely from the current position.
    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        std::io::Read::read_exact(&mut self.inner, buf)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_mapped_file_slice_and_cursor() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[0xDE, 0xAD, 0xBE, 0xEF, 0x01, 0x02])
            .unwrap();
        file.flush().unwrap();

        let mapped = MappedTzFile::open(file.path()).unwrap();
        assert_eq!(mapped.len(), 6);

        let slice = mapped.slice(4, 2, "data").unwrap();
        assert_eq!(slice, &[0x01, 0x02]);

        let mut cursor = mapped.cursor();
        assert_eq!(cursor.read_u32().unwrap(), 0xDEADBEEF);
        cursor.seek(0).unwrap();
        cursor.skip(4).unwrap();
        let mut rest = [0u8; 2];
        cursor.read_exact(&mut rest).unwrap();
        assert_eq!(rest, [0x01, 0x02]);
    }

    #[test]
    fn test_slice_out_of_bounds() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[0u8; 8]).unwrap();
        file.flush().unwrap();

        let mapped = MappedTzFile::open(file.path()).unwrap();
        let err = mapped.slice(4, 8, "index").unwrap_err();
        assert!(matches!(err, TzDataError::SectionOutOfBounds { .. }));
    }

    #[test]
    fn test_open_missing_file() {
        let err = MappedTzFile::open(Path::new("/nonexistent/tzdata")).unwrap_err();
        assert!(matches!(err, TzDataError::Io(_)));
    }
}
