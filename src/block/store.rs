//! Block Store
//!
//! Owns the block-sized buffer and moves whole blocks to and from a device.

use std::io;

use tracing::{debug, trace};

use crate::error::{EnvError, Result};

use super::{BlockDevice, BlockHeader, FLAG_OBSOLETE, FLAG_OFFSET, HEADER_SIZE};

/// Fixed-size buffer holding one block
///
/// The size is set at construction and never changes.
#[derive(Debug, Clone)]
pub struct BlockStore {
    buffer: Vec<u8>,
}

impl BlockStore {
    /// Create a store for blocks of `size` bytes
    pub fn new(size: usize) -> Self {
        Self {
            buffer: vec![0u8; size],
        }
    }

    pub fn size(&self) -> usize {
        self.buffer.len()
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut [u8] {
        &mut self.buffer
    }

    /// Read the header of the block at `offset`
    pub fn read_header<D: BlockDevice + ?Sized>(device: &mut D, offset: u64) -> Result<BlockHeader> {
        let mut raw = [0u8; HEADER_SIZE];
        read_fully(device, offset, &mut raw)?;
        trace!(offset, header = ?raw, "read block header");
        Ok(BlockHeader::from_bytes(raw))
    }

    /// Fill the buffer with the block at `offset`
    pub fn read_full_block<D: BlockDevice + ?Sized>(&mut self, device: &mut D, offset: u64) -> Result<()> {
        read_fully(device, offset, &mut self.buffer)?;
        debug!(offset, size = self.buffer.len(), "read block");
        Ok(())
    }

    /// Write the whole buffer to the block at `offset`
    pub fn write_full_block<D: BlockDevice + ?Sized>(&self, device: &mut D, offset: u64) -> Result<()> {
        write_fully(device, offset, &self.buffer)?;
        debug!(offset, size = self.buffer.len(), "wrote block");
        Ok(())
    }

    /// Mark the block at `offset` obsolete
    ///
    /// Only the flag byte is written; the rest of the block is untouched.
    pub fn invalidate<D: BlockDevice + ?Sized>(device: &mut D, offset: u64) -> Result<()> {
        write_fully(device, offset + FLAG_OFFSET as u64, &[FLAG_OBSOLETE])?;
        debug!(offset, "invalidated block");
        Ok(())
    }
}

// =============================================================================
// Transfer Helpers
// =============================================================================

fn seek_exact<D: BlockDevice + ?Sized>(device: &mut D, offset: u64) -> Result<()> {
    let position = device.seek_to(offset)?;
    if position != offset {
        return Err(EnvError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("unable to reach position {:#x}, got {:#x}", offset, position),
        )));
    }
    Ok(())
}

/// Read exactly `buf.len()` bytes from `offset`, retrying partial reads
fn read_fully<D: BlockDevice + ?Sized>(device: &mut D, offset: u64, buf: &mut [u8]) -> Result<()> {
    seek_exact(device, offset)?;

    let mut have = 0;
    while have < buf.len() {
        match device.read_some(&mut buf[have..]) {
            Ok(0) => {
                return Err(EnvError::ShortRead {
                    offset,
                    expected: buf.len(),
                    actual: have,
                })
            }
            Ok(n) => have += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}

/// Write all of `buf` at `offset`, retrying partial writes
fn write_fully<D: BlockDevice + ?Sized>(device: &mut D, offset: u64, buf: &[u8]) -> Result<()> {
    seek_exact(device, offset)?;

    let mut done = 0;
    while done < buf.len() {
        match device.write_some(&buf[done..]) {
            Ok(0) => {
                return Err(EnvError::ShortWrite {
                    offset,
                    expected: buf.len(),
                    actual: done,
                })
            }
            Ok(n) => done += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}
