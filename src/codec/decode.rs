//! Payload decoder
//!
//! Three-state scanner over `block[data_offset..]`.

use std::ops::Range;

use crate::error::DecodeError;
use crate::table::EntryTable;

/// Byte ranges of one entry inside a block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrySpan {
    /// Key bytes, without the `=`
    pub key: Range<usize>,
    /// Value bytes, without the terminating NUL
    pub value: Range<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    InKey,
    InValue,
    AfterEntry,
}

/// Locate every entry in the payload
///
/// Stops at the double NUL terminator. An entry may not start with `=`,
/// the first one included, since an empty key cannot be encoded again. Spans are absolute offsets into
/// `block`.
pub fn scan(block: &[u8], data_offset: usize) -> Result<Vec<EntrySpan>, DecodeError> {
    if block.get(data_offset) == Some(&0) {
        return Ok(Vec::new());
    }

    let mut spans = Vec::new();
    let mut state = State::InKey;
    let mut key_start = data_offset;
    let mut value_start = data_offset;

    for (pos, &byte) in block.iter().enumerate().skip(data_offset) {
        match (state, byte) {
            (State::InKey, b'=') if pos == key_start => {
                return Err(DecodeError::UnexpectedSeparator { offset: pos });
            }
            (State::InKey, b'=') => {
                value_start = pos + 1;
                state = State::InValue;
            }
            (State::InKey, 0) => {
                return Err(DecodeError::BareKey { offset: key_start });
            }
            (State::InValue, 0) => {
                spans.push(EntrySpan {
                    key: key_start..value_start - 1,
                    value: value_start..pos,
                });
                state = State::AfterEntry;
            }
            (State::AfterEntry, 0) => return Ok(spans),
            (State::AfterEntry, b'=') => {
                return Err(DecodeError::UnexpectedSeparator { offset: pos });
            }
            (State::AfterEntry, _) => {
                key_start = pos;
                state = State::InKey;
            }
            (State::InKey, _) | (State::InValue, _) => {}
        }
    }

    Err(DecodeError::Truncated)
}

/// Decode the payload of `block` into an owned table
///
/// A key that appears twice keeps its first position and its last value.
pub fn decode(block: &[u8], data_offset: usize) -> Result<EntryTable, DecodeError> {
    let spans = scan(block, data_offset)?;

    let mut table = EntryTable::new();
    for span in spans {
        let key = text(block, span.key)?;
        let value = text(block, span.value)?;
        table.upsert(key, value);
    }

    Ok(table)
}

fn text(block: &[u8], span: Range<usize>) -> Result<&str, DecodeError> {
    let offset = span.start;
    std::str::from_utf8(&block[span]).map_err(|_| DecodeError::InvalidText { offset })
}
