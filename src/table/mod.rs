//! Entry Table Module
//!
//! In-memory view of a decoded environment.
//!
//! ## Responsibilities
//! - Keep entries in the order they were decoded or added
//! - Keep keys unique (upsert replaces values in place)
//! - Linear lookup; environments hold tens of entries, not thousands
//!
//! ## Data Structure Choice
//! A plain `Vec<Entry>`:
//! - Order matters (it is the on-device order after a save)
//! - Removal shifts later entries down, preserving order
//! - Owned strings, so the table outlives the block buffer it came from

mod entry_table;

pub use entry_table::{EntryTable, Iter};

use crate::error::{EnvError, Result};

/// A single `key=value` pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    key: String,
    value: String,
}

impl Entry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Replace the value, returning the old one
    pub(crate) fn replace_value(&mut self, value: String) -> String {
        std::mem::replace(&mut self.value, value)
    }

    /// Check that the pair can be represented in a block payload
    ///
    /// Keys must be non-empty and free of `=` and NUL; values must be free
    /// of NUL.
    pub fn validate(&self) -> Result<()> {
        check_pair(&self.key, &self.value)
    }
}

pub(crate) fn check_pair(key: &str, value: &str) -> Result<()> {
    let reason = if key.is_empty() {
        "empty key"
    } else if key.contains('=') {
        "key contains '='"
    } else if key.contains('\0') {
        "key contains NUL"
    } else if value.contains('\0') {
        "value contains NUL"
    } else {
        return Ok(());
    };

    Err(EnvError::InvalidEntry {
        key: key.to_string(),
        reason,
    })
}
