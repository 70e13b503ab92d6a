//! Block devices
//!
//! The minimal surface the store needs from a flash partition or image file.

use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};

/// A seekable, readable, writable byte store
///
/// `read_some`/`write_some` may transfer fewer bytes than asked; callers
/// loop until the full length is moved.
pub trait BlockDevice {
    /// Move to an absolute byte offset, returning the new position
    fn seek_to(&mut self, offset: u64) -> io::Result<u64>;

    /// Read up to `buf.len()` bytes; `Ok(0)` means end of device
    fn read_some(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Write up to `buf.len()` bytes
    fn write_some(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Make completed writes durable
    fn sync(&mut self) -> io::Result<()>;
}

impl BlockDevice for File {
    fn seek_to(&mut self, offset: u64) -> io::Result<u64> {
        Seek::seek(self, SeekFrom::Start(offset))
    }

    fn read_some(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Read::read(self, buf)
    }

    fn write_some(&mut self, buf: &[u8]) -> io::Result<usize> {
        Write::write(self, buf)
    }

    fn sync(&mut self) -> io::Result<()> {
        Write::flush(self)?;
        self.sync_all()
    }
}

/// In-memory image, mostly for tests and offline editing
impl BlockDevice for Cursor<Vec<u8>> {
    fn seek_to(&mut self, offset: u64) -> io::Result<u64> {
        Seek::seek(self, SeekFrom::Start(offset))
    }

    fn read_some(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Read::read(self, buf)
    }

    fn write_some(&mut self, buf: &[u8]) -> io::Result<usize> {
        Write::write(self, buf)
    }

    fn sync(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<D: BlockDevice + ?Sized> BlockDevice for &mut D {
    fn seek_to(&mut self, offset: u64) -> io::Result<u64> {
        (**self).seek_to(offset)
    }

    fn read_some(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read_some(buf)
    }

    fn write_some(&mut self, buf: &[u8]) -> io::Result<usize> {
        (**self).write_some(buf)
    }

    fn sync(&mut self) -> io::Result<()> {
        (**self).sync()
    }
}
