//! Configuration for bootenv
//!
//! Centralized configuration with defaults matching the classic
//! redundant boot environment layout.

use std::path::PathBuf;

use crate::block::HEADER_SIZE;
use crate::error::{EnvError, Result};

/// Default size of one environment block (8 KiB)
pub const DEFAULT_BLOCK_SIZE: usize = 8 * 1024;

/// Default offset of the primary block
pub const DEFAULT_PRIMARY_OFFSET: u64 = 0;

/// Default offset of the alternate (redundant) block (128 KiB)
pub const DEFAULT_ALTERNATE_OFFSET: u64 = 128 * 1024;

/// Default device or image holding the environment
#[cfg(any(target_arch = "powerpc", target_arch = "powerpc64"))]
pub const DEFAULT_DEVICE: &str = "/dev/mtdblock4";

/// Default device or image holding the environment
#[cfg(not(any(target_arch = "powerpc", target_arch = "powerpc64")))]
pub const DEFAULT_DEVICE: &str = "uboot-config";

/// Main configuration for an environment store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Device Configuration
    // -------------------------------------------------------------------------
    /// Device or image file holding both blocks
    pub device: PathBuf,

    // -------------------------------------------------------------------------
    // Layout Configuration
    // -------------------------------------------------------------------------
    /// Size of each block in bytes, header included
    pub block_size: usize,

    /// Byte offset of the primary block
    pub primary_offset: u64,

    /// Byte offset of the alternate block
    pub alternate_offset: u64,

    // -------------------------------------------------------------------------
    // Durability Configuration
    // -------------------------------------------------------------------------
    /// Sync the device after a save (write + invalidate)
    pub sync_on_save: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device: PathBuf::from(DEFAULT_DEVICE),
            block_size: DEFAULT_BLOCK_SIZE,
            primary_offset: DEFAULT_PRIMARY_OFFSET,
            alternate_offset: DEFAULT_ALTERNATE_OFFSET,
            sync_on_save: true,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check that the layout can hold an environment
    ///
    /// A block must fit the flagged header plus the terminator, and the two
    /// blocks must not overlap.
    pub fn validate(&self) -> Result<()> {
        if self.block_size <= HEADER_SIZE {
            return Err(EnvError::Config(format!(
                "block size {} too small, need more than {} bytes",
                self.block_size, HEADER_SIZE
            )));
        }

        let size = self.block_size as u64;
        let (low, high) = if self.primary_offset <= self.alternate_offset {
            (self.primary_offset, self.alternate_offset)
        } else {
            (self.alternate_offset, self.primary_offset)
        };

        if high - low < size {
            return Err(EnvError::Config(format!(
                "blocks at {:#x} and {:#x} overlap (block size {:#x})",
                self.primary_offset, self.alternate_offset, size
            )));
        }

        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the device or image path
    pub fn device(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.device = path.into();
        self
    }

    /// Set the block size (in bytes)
    pub fn block_size(mut self, size: usize) -> Self {
        self.config.block_size = size;
        self
    }

    /// Set the primary block offset
    pub fn primary_offset(mut self, offset: u64) -> Self {
        self.config.primary_offset = offset;
        self
    }

    /// Set the alternate block offset
    pub fn alternate_offset(mut self, offset: u64) -> Self {
        self.config.alternate_offset = offset;
        self
    }

    /// Sync the device after each save
    pub fn sync_on_save(mut self, sync: bool) -> Self {
        self.config.sync_on_save = sync;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
