//! # bootenv
//!
//! A redundant, checksum-protected `key=value` store for boot environments:
//! - Two fixed-offset blocks on a flash partition or image file
//! - CRC-32 over each block's payload, stored big-endian in its header
//! - A flag byte marking the active block
//! - Crash-safe updates: write the other block, then retire the old one
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        EnvStore                             │
//! │            load → upsert/remove → save                      │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┼─────────────────┐
//!          │            │                 │
//!          ▼            ▼                 ▼
//!   ┌─────────────┐ ┌─────────────┐ ┌─────────────┐
//!   │ BlockStore  │ │  Checksum   │ │    Codec    │
//!   │ (select/IO) │ │  (CRC-32)   │ │ (key=val\0) │
//!   └──────┬──────┘ └─────────────┘ └──────┬──────┘
//!          │                               │
//!          ▼                               ▼
//!   ┌─────────────┐                 ┌─────────────┐
//!   │ BlockDevice │                 │ EntryTable  │
//!   │ (file/mem)  │                 │  (ordered)  │
//!   └─────────────┘                 └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use std::fs::OpenOptions;
//! use bootenv::{Config, EnvStore};
//!
//! # fn main() -> bootenv::Result<()> {
//! let config = Config::builder().device("uboot-config").build();
//! let mut device = OpenOptions::new().read(true).write(true).open(&config.device)?;
//!
//! let mut store = EnvStore::new(config)?;
//! store.load(&mut device)?;
//! store.upsert("bootdelay", "3")?;
//! store.save(&mut device)?;
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod checksum;
pub mod codec;
pub mod table;
pub mod block;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use block::{BlockDevice, Placement};
pub use config::Config;
pub use error::{DecodeError, EnvError, Result};
pub use store::{EnvStore, StoreState};
pub use table::{Entry, EntryTable};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of bootenv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
