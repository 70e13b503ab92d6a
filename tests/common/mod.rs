//! Shared helpers for bootenv integration tests
//!
//! - Block and image builders with valid checksums
//! - `FaultyDevice`: in-memory device with injectable write failures
//! - `TrickleDevice`: transfers a few bytes per call and gets interrupted

#![allow(dead_code)]

use std::io::{self, Cursor};

use bootenv::block::BlockDevice;
use bootenv::checksum;
use bootenv::Config;

// =============================================================================
// Layout
// =============================================================================

pub const SIZE: usize = 8 * 1024;
pub const PRIMARY: u64 = 0;
pub const ALTERNATE: u64 = 128 * 1024;
pub const IMAGE_LEN: usize = ALTERNATE as usize + SIZE;

pub const ACTIVE: u8 = 0x01;
pub const OBSOLETE: u8 = 0x00;

pub fn config() -> Config {
    Config::builder().device("test-image").build()
}

// =============================================================================
// Builders
// =============================================================================

/// Build a block with a valid checksum
///
/// `flag: None` builds the legacy layout (payload at byte 4).
pub fn block(flag: Option<u8>, payload: &[u8]) -> Vec<u8> {
    let mut block = vec![0u8; SIZE];
    let data_offset = match flag {
        Some(flag) => {
            block[4] = flag;
            5
        }
        None => 4,
    };
    block[data_offset..data_offset + payload.len()].copy_from_slice(payload);
    checksum::stamp(&mut block, data_offset);
    block
}

/// Erased device with the given blocks written in place
pub fn image(primary: Option<&[u8]>, alternate: Option<&[u8]>) -> Vec<u8> {
    let mut image = vec![0xFFu8; IMAGE_LEN];
    if let Some(block) = primary {
        image[PRIMARY as usize..PRIMARY as usize + block.len()].copy_from_slice(block);
    }
    if let Some(block) = alternate {
        image[ALTERNATE as usize..ALTERNATE as usize + block.len()].copy_from_slice(block);
    }
    image
}

pub fn device(image: Vec<u8>) -> Cursor<Vec<u8>> {
    Cursor::new(image)
}

/// Slice out the block stored at `offset`
pub fn block_at(image: &[u8], offset: u64) -> &[u8] {
    &image[offset as usize..offset as usize + SIZE]
}

/// Collect a table into owned pairs for comparisons
pub fn pairs(table: &bootenv::EntryTable) -> Vec<(String, String)> {
    table
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

pub fn owned(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

// =============================================================================
// Fault Injection
// =============================================================================

/// How a FaultyDevice misbehaves on writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteFault {
    /// All writes succeed
    None,
    /// Accept this many bytes in total, then fail with an I/O error
    ErrorAfter(usize),
    /// Accept this many bytes in total, then report zero bytes written
    ZeroAfter(usize),
    /// Fail any write that starts at this offset
    ErrorAt(u64),
}

/// In-memory device simulating power loss and broken flash
#[derive(Debug)]
pub struct FaultyDevice {
    pub data: Vec<u8>,
    position: u64,
    fault: WriteFault,
    written: usize,
    pub syncs: usize,
}

impl FaultyDevice {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            position: 0,
            fault: WriteFault::None,
            written: 0,
            syncs: 0,
        }
    }

    pub fn with_fault(mut self, fault: WriteFault) -> Self {
        self.fault = fault;
        self
    }

    /// Stop injecting faults ("power is back")
    pub fn heal(&mut self) {
        self.fault = WriteFault::None;
    }

    fn injected() -> io::Error {
        io::Error::new(io::ErrorKind::Other, "injected write failure")
    }
}

impl BlockDevice for FaultyDevice {
    fn seek_to(&mut self, offset: u64) -> io::Result<u64> {
        self.position = offset;
        Ok(offset)
    }

    fn read_some(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let start = self.position as usize;
        if start >= self.data.len() {
            return Ok(0);
        }
        let n = buf.len().min(self.data.len() - start);
        buf[..n].copy_from_slice(&self.data[start..start + n]);
        self.position += n as u64;
        Ok(n)
    }

    fn write_some(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = match self.fault {
            WriteFault::None => buf.len(),
            WriteFault::ErrorAt(offset) if offset == self.position => {
                return Err(Self::injected())
            }
            WriteFault::ErrorAt(_) => buf.len(),
            WriteFault::ErrorAfter(limit) | WriteFault::ZeroAfter(limit) => {
                let left = limit.saturating_sub(self.written);
                if left == 0 {
                    return match self.fault {
                        WriteFault::ZeroAfter(_) => Ok(0),
                        _ => Err(Self::injected()),
                    };
                }
                buf.len().min(left)
            }
        };

        let start = self.position as usize;
        if start + n > self.data.len() {
            self.data.resize(start + n, 0xFF);
        }
        self.data[start..start + n].copy_from_slice(&buf[..n]);
        self.position += n as u64;
        self.written += n;
        Ok(n)
    }

    fn sync(&mut self) -> io::Result<()> {
        self.syncs += 1;
        Ok(())
    }
}

/// Device that moves at most `chunk` bytes per call and reports an
/// interruption before every transfer
#[derive(Debug)]
pub struct TrickleDevice {
    inner: Cursor<Vec<u8>>,
    chunk: usize,
    interrupt_next: bool,
    pub calls: usize,
}

impl TrickleDevice {
    pub fn new(data: Vec<u8>, chunk: usize) -> Self {
        Self {
            inner: Cursor::new(data),
            chunk,
            interrupt_next: true,
            calls: 0,
        }
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.inner.into_inner()
    }

    fn interrupted(&mut self) -> bool {
        self.calls += 1;
        self.interrupt_next = !self.interrupt_next;
        !self.interrupt_next
    }
}

impl BlockDevice for TrickleDevice {
    fn seek_to(&mut self, offset: u64) -> io::Result<u64> {
        self.inner.seek_to(offset)
    }

    fn read_some(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.interrupted() {
            return Err(io::Error::new(io::ErrorKind::Interrupted, "signal"));
        }
        let n = buf.len().min(self.chunk);
        self.inner.read_some(&mut buf[..n])
    }

    fn write_some(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.interrupted() {
            return Err(io::Error::new(io::ErrorKind::Interrupted, "signal"));
        }
        let n = buf.len().min(self.chunk);
        self.inner.write_some(&buf[..n])
    }

    fn sync(&mut self) -> io::Result<()> {
        Ok(())
    }
}
