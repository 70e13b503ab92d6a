//! Error types for bootenv
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using EnvError
pub type Result<T> = std::result::Result<T, EnvError>;

/// Unified error type for bootenv operations
#[derive(Debug, Error)]
pub enum EnvError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("short read at {offset:#x}: expected {expected} bytes, got {actual}")]
    ShortRead {
        offset: u64,
        expected: usize,
        actual: usize,
    },

    #[error("short write at {offset:#x}: expected {expected} bytes, wrote {actual}")]
    ShortWrite {
        offset: u64,
        expected: usize,
        actual: usize,
    },

    // -------------------------------------------------------------------------
    // Block Errors
    // -------------------------------------------------------------------------
    #[error("no environment found")]
    NoEnvironmentFound,

    #[error("invalid checksum in block at {offset:#x}: computed {computed:#010x}, stored {stored:#010x}")]
    ChecksumMismatch { offset: u64, computed: u32, stored: u32 },

    // -------------------------------------------------------------------------
    // Payload Errors
    // -------------------------------------------------------------------------
    #[error("unable to parse environment: {0}")]
    Decode(#[from] DecodeError),

    #[error("environment too large: needs {needed} bytes, block holds {capacity}")]
    Overflow { needed: usize, capacity: usize },

    #[error("invalid entry {key:?}: {reason}")]
    InvalidEntry { key: String, reason: &'static str },

    // -------------------------------------------------------------------------
    // Table Errors
    // -------------------------------------------------------------------------
    #[error("key not found: {0}")]
    KeyNotFound(String),

    #[error("environment not loaded")]
    NotLoaded,

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Ways a payload can fail to decode
///
/// Offsets are absolute positions within the block.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// A key reached its terminator before any `=`
    #[error("key without value at offset {offset}")]
    BareKey { offset: usize },

    /// An entry started with `=`
    #[error("unexpected '=' at offset {offset}")]
    UnexpectedSeparator { offset: usize },

    /// The block ended before the double NUL terminator
    #[error("missing terminator")]
    Truncated,

    /// A key or value is not valid UTF-8
    #[error("invalid text at offset {offset}")]
    InvalidText { offset: usize },
}
