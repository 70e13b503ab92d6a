//! Checksum Engine
//!
//! CRC-32 (reflected, polynomial 0xEDB88320, seed and final XOR 0xFFFFFFFF)
//! over the payload of a block. The word is stored big-endian in bytes 0..4
//! of the block header and compared byte-for-byte on load.

use crate::error::{EnvError, Result};

/// Size of the checksum word at the start of every block
pub const CHECKSUM_SIZE: usize = 4;

/// Compute the CRC-32 of a byte range
pub fn crc(bytes: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(bytes);
    hasher.finalize()
}

/// Serialize a checksum word as stored on the device
pub fn to_bytes(word: u32) -> [u8; CHECKSUM_SIZE] {
    word.to_be_bytes()
}

/// True if `payload` hashes to the stored header word
pub fn verify(payload: &[u8], stored: &[u8; CHECKSUM_SIZE]) -> bool {
    to_bytes(crc(payload)) == *stored
}

/// Recompute the payload checksum of `block` and write it into its header
///
/// Returns the stamped word.
///
/// # Panics
///
/// If `block` is shorter than the checksum word or than `data_offset`.
/// Blocks sized by a validated `Config` always satisfy both.
pub fn stamp(block: &mut [u8], data_offset: usize) -> u32 {
    let word = crc(&block[data_offset..]);
    block[..CHECKSUM_SIZE].copy_from_slice(&to_bytes(word));
    word
}

/// Check the payload of `block` against its header word
///
/// `offset` is where the block lives on the device and only feeds the error.
///
/// # Panics
///
/// Same conditions as [`stamp`].
pub fn verify_block(block: &[u8], data_offset: usize, offset: u64) -> Result<()> {
    let mut stored = [0u8; CHECKSUM_SIZE];
    stored.copy_from_slice(&block[..CHECKSUM_SIZE]);

    let computed = crc(&block[data_offset..]);
    if to_bytes(computed) != stored {
        return Err(EnvError::ChecksumMismatch {
            offset,
            computed,
            stored: u32::from_be_bytes(stored),
        });
    }

    Ok(())
}
