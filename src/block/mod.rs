//! Block Module
//!
//! Fixed-size environment blocks on a seekable device.
//!
//! ## Responsibilities
//! - Parse the 5-byte block header into a closed [`Flag`] enum
//! - Decide which of the two redundant blocks is the source
//! - Read and write whole blocks, retrying partial transfers
//! - Mark a stale block obsolete by clearing its flag byte
//!
//! ## Block Format
//! ```text
//! ┌──────────────┬──────────┬──────────────────────────────────┐
//! │ CRC32 BE (4) │ Flag (1) │ Payload ...                      │
//! └──────────────┴──────────┴──────────────────────────────────┘
//!   redundant layout: data_offset = 5, flag 0x01 active / 0x00 obsolete
//!
//! ┌──────────────┬─────────────────────────────────────────────┐
//! │ CRC32 BE (4) │ Payload ...                                 │
//! └──────────────┴─────────────────────────────────────────────┘
//!   single (legacy) layout: data_offset = 4, no flag byte
//! ```

mod device;
mod store;

pub use device::BlockDevice;
pub use store::BlockStore;

use crate::checksum::CHECKSUM_SIZE;
use crate::error::{EnvError, Result};

// =============================================================================
// Header Constants
// =============================================================================

/// Bytes read from each candidate block to select the source
pub const HEADER_SIZE: usize = CHECKSUM_SIZE + 1;

/// Position of the flag byte within a block
pub const FLAG_OFFSET: usize = CHECKSUM_SIZE;

/// Flag byte of a block that has been superseded
pub const FLAG_OBSOLETE: u8 = 0x00;

/// Flag byte of the current block
pub const FLAG_ACTIVE: u8 = 0x01;

/// Value of erased flash
const ERASED: u8 = 0xFF;

// =============================================================================
// Header Types
// =============================================================================

/// Meaning of a block's flag byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    /// Block uses the single layout and has no flag byte
    NoFlag,
    /// Block has been superseded by the other one
    Obsolete,
    /// Block is the current one
    Active,
    /// Byte 4 is neither active nor obsolete (payload or erased flash)
    Unrecognized(u8),
}

impl Flag {
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            FLAG_OBSOLETE => Flag::Obsolete,
            FLAG_ACTIVE => Flag::Active,
            other => Flag::Unrecognized(other),
        }
    }

    /// True for flag bytes written by the redundant layout
    pub fn is_recognized(self) -> bool {
        matches!(self, Flag::Obsolete | Flag::Active)
    }
}

/// Header of one candidate block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    raw: [u8; HEADER_SIZE],
}

impl BlockHeader {
    pub fn from_bytes(raw: [u8; HEADER_SIZE]) -> Self {
        Self { raw }
    }

    /// Stored checksum word, as on the device
    pub fn checksum(&self) -> [u8; CHECKSUM_SIZE] {
        let mut word = [0u8; CHECKSUM_SIZE];
        word.copy_from_slice(&self.raw[..CHECKSUM_SIZE]);
        word
    }

    pub fn flag(&self) -> Flag {
        Flag::from_byte(self.raw[FLAG_OFFSET])
    }

    /// True if the header looks like erased flash
    pub fn is_blank(&self) -> bool {
        self.raw.iter().all(|&b| b == ERASED)
    }

    pub fn as_bytes(&self) -> &[u8; HEADER_SIZE] {
        &self.raw
    }
}

// =============================================================================
// Placement
// =============================================================================

/// How the blocks on a device are organised
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Two blocks with flag bytes; saves alternate between them
    Redundant,
    /// One legacy block without a flag byte; saves overwrite it
    Single,
}

impl Layout {
    /// First payload byte within a block
    pub fn data_offset(self) -> usize {
        match self {
            Layout::Redundant => HEADER_SIZE,
            Layout::Single => CHECKSUM_SIZE,
        }
    }
}

/// Where the environment was found and where the next save goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Offset of the block holding the current environment
    pub source: u64,
    /// Offset the next save writes to
    pub target: u64,
    pub layout: Layout,
    /// Flag of the source block as found
    pub flag: Flag,
}

impl Placement {
    pub fn data_offset(&self) -> usize {
        self.layout.data_offset()
    }

    pub fn is_redundant(&self) -> bool {
        self.layout == Layout::Redundant
    }

    /// Placement after a successful save: the written target becomes the
    /// active source
    pub fn after_save(&self) -> Self {
        let flag = match self.layout {
            Layout::Redundant => Flag::Active,
            Layout::Single => Flag::NoFlag,
        };
        Self {
            source: self.target,
            target: self.source,
            layout: self.layout,
            flag,
        }
    }
}

/// Pick the source and target blocks from the two candidate headers
///
/// - obsolete primary + active alternate: load the alternate, write the primary
/// - active primary, or obsolete primary without an active alternate: load the
///   primary, write the alternate
/// - anything else: a non-blank primary is a legacy single block, a blank one
///   means there is no environment at all
pub fn select_source_and_target(
    primary: &BlockHeader,
    alternate: &BlockHeader,
    primary_offset: u64,
    alternate_offset: u64,
) -> Result<Placement> {
    match (primary.flag(), alternate.flag()) {
        (Flag::Obsolete, Flag::Active) => Ok(Placement {
            source: alternate_offset,
            target: primary_offset,
            layout: Layout::Redundant,
            flag: Flag::Active,
        }),
        (flag @ (Flag::Obsolete | Flag::Active), _) => Ok(Placement {
            source: primary_offset,
            target: alternate_offset,
            layout: Layout::Redundant,
            flag,
        }),
        _ if !primary.is_blank() => Ok(Placement {
            source: primary_offset,
            target: primary_offset,
            layout: Layout::Single,
            flag: Flag::NoFlag,
        }),
        _ => Err(EnvError::NoEnvironmentFound),
    }
}
