//! EntryTable implementation
//!
//! Ordered, key-unique list of entries with linear lookup.

use std::io::Write;

use crate::error::{EnvError, Result};

use super::Entry;

/// Ordered key-unique collection of environment entries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryTable {
    entries: Vec<Entry>,
}

impl EntryTable {
    /// Create a new empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new entry or update the value of an existing one
    ///
    /// Updates keep the entry's position; new keys are appended.
    pub fn upsert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();

        match self.position(&key) {
            Some(i) => {
                self.entries[i].replace_value(value);
            }
            None => self.entries.push(Entry::new(key, value)),
        }
    }

    /// Remove an entry, shifting later entries down by one
    pub fn remove(&mut self, key: &str) -> Result<Entry> {
        match self.position(key) {
            Some(i) => Ok(self.entries.remove(i)),
            None => Err(EnvError::KeyNotFound(key.to_string())),
        }
    }

    /// Get the value stored under `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.position(key).map(|i| self.entries[i].value())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(key, value)` pairs in table order
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            inner: self.entries.iter(),
        }
    }

    /// Borrow the entries in table order
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Print the table as `key=value` lines
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        for (key, value) in self.iter() {
            writeln!(writer, "{}={}", key, value)?;
        }
        Ok(())
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.key() == key)
    }
}

impl<K, V> FromIterator<(K, V)> for EntryTable
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut table = EntryTable::new();
        for (key, value) in iter {
            table.upsert(key, value);
        }
        table
    }
}

impl<'a> IntoIterator for &'a EntryTable {
    type Item = (&'a str, &'a str);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over EntryTable pairs
pub struct Iter<'a> {
    inner: std::slice::Iter<'a, Entry>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a str, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|e| (e.key(), e.value()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Iter<'_> {}
