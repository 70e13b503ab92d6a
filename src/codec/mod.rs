//! Payload Codec Module
//!
//! Converts between the payload region of a block and an [`EntryTable`].
//!
//! ## Payload Format
//! ```text
//! data_offset                                              size
//! ┌──────────────────┬──────────────────┬────┬──────────────┐
//! │ key=value \0     │ key=value \0     │ \0 │ (stale bytes)│
//! └──────────────────┴──────────────────┴────┴──────────────┘
//! ```
//!
//! - Only the first `=` of an entry separates key from value
//! - An empty string (second consecutive `\0`) ends the list
//! - Bytes after the terminator are ignored but still covered by the checksum
//! - A payload whose first byte is `\0` is an empty environment
//!
//! [`EntryTable`]: crate::table::EntryTable

mod decode;
mod encode;

pub use decode::{decode, scan, EntrySpan};
pub use encode::{encode, encoded_len};
