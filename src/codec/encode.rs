//! Payload encoder
//!
//! Writes `key=value\0` pairs followed by the closing `\0`.

use bytes::BufMut;

use crate::error::{EnvError, Result};
use crate::table::EntryTable;

/// Number of payload bytes `table` encodes to, terminator included
pub fn encoded_len(table: &EntryTable) -> usize {
    table
        .iter()
        .map(|(key, value)| key.len() + 1 + value.len() + 1)
        .sum::<usize>()
        + 1
}

/// Encode `table` into `block` starting at `data_offset`
///
/// Returns the offset just past the terminator. On error `block` is left
/// untouched; bytes after the terminator are never cleared.
pub fn encode(table: &EntryTable, block: &mut [u8], data_offset: usize) -> Result<usize> {
    for entry in table.entries() {
        entry.validate()?;
    }

    let needed = data_offset + encoded_len(table);
    if needed > block.len() {
        return Err(EnvError::Overflow {
            needed,
            capacity: block.len(),
        });
    }

    let mut out = &mut block[data_offset..];
    for (key, value) in table {
        out.put_slice(key.as_bytes());
        out.put_u8(b'=');
        out.put_slice(value.as_bytes());
        out.put_u8(0);
    }
    out.put_u8(0);

    Ok(needed)
}
