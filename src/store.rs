//! Store Module
//!
//! The controller that ties blocks, checksum and codec together.
//!
//! ## Responsibilities
//! - Load: select block → read → verify checksum → decode
//! - Hold the table while it is edited (no device I/O)
//! - Save: encode → stamp flag and checksum → write target → invalidate source
//!
//! ## Crash Safety
//! The source block is never written before the target block is complete.
//! A crash during the target write leaves the source intact; a crash between
//! the target write and the invalidation leaves two active blocks, which
//! selection resolves in favour of the primary.

use std::io::Write;

use tracing::{debug, error, info, warn};

use crate::block::{
    select_source_and_target, BlockDevice, BlockHeader, BlockStore, Flag, Layout, Placement,
    FLAG_ACTIVE, FLAG_OFFSET,
};
use crate::checksum;
use crate::codec;
use crate::config::Config;
use crate::error::{EnvError, Result};
use crate::table::{self, EntryTable};

/// Lifecycle of one load/edit/save cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
    /// Nothing loaded yet
    Empty,
    /// Table decoded from a verified block
    Loaded,
    /// Table edited since the last load or save
    Mutated,
    /// Table written to the device
    Saved,
}

/// A redundant environment store
///
/// ## Ownership
/// One store owns its block buffer and table exclusively. Devices are
/// borrowed per call so the caller decides how they are opened.
pub struct EnvStore {
    /// Store configuration
    config: Config,

    /// Block-sized scratch buffer
    blocks: BlockStore,

    /// Source/target blocks, known once loaded
    placement: Option<Placement>,

    /// Decoded environment, absent until a load succeeds
    table: Option<EntryTable>,

    state: StoreState,
}

impl EnvStore {
    /// Create an empty store for the configured layout
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            blocks: BlockStore::new(config.block_size),
            config,
            placement: None,
            table: None,
            state: StoreState::Empty,
        })
    }

    /// Load the environment from `device`
    ///
    /// On failure the store keeps whatever it held before.
    pub fn load<D: BlockDevice + ?Sized>(&mut self, device: &mut D) -> Result<()> {
        let primary_offset = self.config.primary_offset;
        let alternate_offset = self.config.alternate_offset;

        // Step 1: Read both candidate headers
        let primary = BlockStore::read_header(device, primary_offset)?;
        let alternate = BlockStore::read_header(device, alternate_offset)?;

        // Step 2: Pick the source block
        let placement =
            select_source_and_target(&primary, &alternate, primary_offset, alternate_offset)
                .map_err(|e| {
                    error!("no environment found, giving up");
                    e
                })?;

        match placement.layout {
            Layout::Redundant if placement.source == primary_offset => {
                info!(offset = placement.source, flag = ?placement.flag, "loading first config block")
            }
            Layout::Redundant => {
                info!(offset = placement.source, "loading second config block")
            }
            Layout::Single => info!("no redundant config found, using only one"),
        }

        // Step 3: Read and verify. A damaged block only gives way to the other
        // one if that one is flagged active too, as after a torn write
        let placement = match self.read_verified(device, placement.source, placement.data_offset()) {
            Ok(()) => placement,
            Err(err @ EnvError::ChecksumMismatch { .. }) if placement.is_redundant() => {
                let other = if placement.target == primary_offset {
                    primary
                } else {
                    alternate
                };
                self.fall_back(device, &placement, &other, err)?
            }
            Err(err) => {
                error!(offset = placement.source, error = %err, "unable to load config block");
                return Err(err);
            }
        };

        // Step 4: Decode into a fresh table
        let table = codec::decode(self.blocks.buffer(), placement.data_offset())
            .map_err(|e| {
                error!(error = %e, "unable to parse config block");
                e
            })?;

        info!(
            offset = placement.source,
            entries = table.len(),
            "loaded configuration variables"
        );

        self.placement = Some(placement);
        self.table = Some(table);
        self.state = StoreState::Loaded;

        Ok(())
    }

    /// Insert or update a variable
    pub fn upsert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let table = self.table.as_mut().ok_or(EnvError::NotLoaded)?;

        let key = key.into();
        let value = value.into();
        table::check_pair(&key, &value)?;

        debug!(key = %key, "updating");
        table.upsert(key, value);
        self.state = StoreState::Mutated;

        Ok(())
    }

    /// Remove a variable
    pub fn remove(&mut self, key: &str) -> Result<()> {
        let table = self.table.as_mut().ok_or(EnvError::NotLoaded)?;

        table.remove(key)?;
        debug!(key, "removing");
        self.state = StoreState::Mutated;

        Ok(())
    }

    /// Write the table back to `device`
    ///
    /// Steps:
    /// 1. Encode into the buffer (device untouched on failure)
    /// 2. Stamp the active flag and the checksum
    /// 3. Write the whole block to the target
    /// 4. Mark the source obsolete if it is a different block
    pub fn save<D: BlockDevice + ?Sized>(&mut self, device: &mut D) -> Result<()> {
        let (placement, table) = match (self.placement, self.table.as_ref()) {
            (Some(placement), Some(table)) => (placement, table),
            _ => return Err(EnvError::NotLoaded),
        };
        let data_offset = placement.data_offset();

        // Step 1: Encode
        let end = codec::encode(table, self.blocks.buffer_mut(), data_offset)
            .map_err(|e| {
                error!(error = %e, "unable to serialise configuration variables");
                e
            })?;

        // Step 2: Flag and checksum
        let buffer = self.blocks.buffer_mut();
        if placement.is_redundant() {
            buffer[FLAG_OFFSET] = FLAG_ACTIVE;
        }
        let word = checksum::stamp(buffer, data_offset);
        debug!(
            checksum = format_args!("{:#010x}", word),
            payload = end - data_offset,
            "serialised configuration variables"
        );

        // Step 3: New block first
        self.blocks
            .write_full_block(device, placement.target)
            .map_err(|e| {
                error!(offset = placement.target, error = %e, "unable to write config block");
                e
            })?;
        if self.config.sync_on_save {
            device.sync()?;
        }
        info!(offset = placement.target, "wrote config block");

        // Step 4: Then retire the old one
        if placement.target != placement.source {
            BlockStore::invalidate(device, placement.source).map_err(|e| {
                error!(offset = placement.source, error = %e, "unable to invalidate previous config block");
                e
            })?;
            info!(offset = placement.source, "invalidated previous config block");
        }

        if self.config.sync_on_save {
            device.sync()?;
        }

        self.placement = Some(placement.after_save());
        self.state = StoreState::Saved;

        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn state(&self) -> StoreState {
        self.state
    }

    /// The loaded table, if any
    pub fn table(&self) -> Option<&EntryTable> {
        self.table.as_ref()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.table.as_ref()?.get(key)
    }

    /// Source and target blocks of the loaded environment
    pub fn placement(&self) -> Option<&Placement> {
        self.placement.as_ref()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Print the table as `key=value` lines
    pub fn write_entries<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.table
            .as_ref()
            .ok_or(EnvError::NotLoaded)?
            .write_to(writer)
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn read_verified<D: BlockDevice + ?Sized>(
        &mut self,
        device: &mut D,
        offset: u64,
        data_offset: usize,
    ) -> Result<()> {
        self.blocks.read_full_block(device, offset)?;
        checksum::verify_block(self.blocks.buffer(), data_offset, offset)
    }

    /// Try the other redundant block after `err` rejected the selected one
    ///
    /// Only an active other block is eligible. An obsolete one holds data a
    /// completed save has superseded, so `err` is returned instead.
    fn fall_back<D: BlockDevice + ?Sized>(
        &mut self,
        device: &mut D,
        selected: &Placement,
        other: &BlockHeader,
        err: EnvError,
    ) -> Result<Placement> {
        if other.flag() != Flag::Active {
            error!(offset = selected.source, error = %err, "invalid checksum");
            return Err(err);
        }

        warn!(
            offset = selected.source,
            other = selected.target,
            error = %err,
            "invalid checksum, trying the other config block"
        );

        let fallback = Placement {
            source: selected.target,
            target: selected.source,
            layout: selected.layout,
            flag: other.flag(),
        };

        match self.read_verified(device, fallback.source, fallback.data_offset()) {
            Ok(()) => Ok(fallback),
            Err(other_err) => {
                error!(offset = fallback.source, error = %other_err, "other config block unusable too");
                Err(err)
            }
        }
    }
}
