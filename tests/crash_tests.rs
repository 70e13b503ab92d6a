//! Crash Tests
//!
//! Interrupt a save at each step and check that the next load still finds
//! a complete environment.
//!
//! Tests verify:
//! - Failed target write leaves the previous environment loadable
//! - Torn target write is rejected by the checksum or the flag rules
//! - Failed invalidation leaves two active blocks, resolved to the primary
//! - Sync ordering around the two writes

mod common;

use bootenv::block::Flag;
use bootenv::{EnvError, EnvStore, StoreState};
use common::*;

// =============================================================================
// Helper Functions
// =============================================================================

/// Primary active, alternate obsolete: saves target the alternate
fn primary_source_image() -> Vec<u8> {
    image(
        Some(&block(Some(ACTIVE), b"a=1\0b=2\0\0")),
        Some(&block(Some(OBSOLETE), b"a=0\0\0")),
    )
}

/// Primary obsolete, alternate active: saves target the primary
fn alternate_source_image() -> Vec<u8> {
    image(
        Some(&block(Some(OBSOLETE), b"a=0\0\0")),
        Some(&block(Some(ACTIVE), b"a=1\0b=2\0\0")),
    )
}

fn load(dev: &mut FaultyDevice) -> EnvStore {
    let mut store = EnvStore::new(config()).unwrap();
    store.load(dev).unwrap();
    store
}

/// Load, make an edit large enough to span past the first 100 bytes, then
/// attempt a save
fn edit_and_save(dev: &mut FaultyDevice) -> bootenv::Result<()> {
    let mut store = load(dev);
    store.upsert("bootargs", "x".repeat(300))?;
    store.save(dev)
}

// =============================================================================
// Target Write Failures
// =============================================================================

#[test]
fn test_target_write_refused() {
    let before = primary_source_image();
    let mut dev = FaultyDevice::new(before.clone()).with_fault(WriteFault::ErrorAt(ALTERNATE));

    assert!(matches!(edit_and_save(&mut dev), Err(EnvError::Io(_))));
    assert_eq!(dev.data, before);
    assert_eq!(dev.syncs, 0);

    dev.heal();
    let store = load(&mut dev);
    assert_eq!(pairs(store.table().unwrap()), owned(&[("a", "1"), ("b", "2")]));
    assert_eq!(store.placement().unwrap().source, PRIMARY);
}

#[test]
fn test_torn_write_to_alternate() {
    let mut dev = FaultyDevice::new(primary_source_image()).with_fault(WriteFault::ErrorAfter(100));

    assert!(edit_and_save(&mut dev).is_err());

    // The torn alternate carries the new header but the primary is still active
    assert_eq!(block_at(&dev.data, ALTERNATE)[4], ACTIVE);
    assert_eq!(block_at(&dev.data, PRIMARY)[4], ACTIVE);

    dev.heal();
    let store = load(&mut dev);
    assert_eq!(store.placement().unwrap().source, PRIMARY);
    assert_eq!(pairs(store.table().unwrap()), owned(&[("a", "1"), ("b", "2")]));
}

#[test]
fn test_torn_write_to_primary_falls_back() {
    let mut dev =
        FaultyDevice::new(alternate_source_image()).with_fault(WriteFault::ErrorAfter(100));

    assert!(edit_and_save(&mut dev).is_err());

    // Torn primary claims to be active but fails its checksum
    assert_eq!(block_at(&dev.data, PRIMARY)[4], ACTIVE);

    dev.heal();
    let store = load(&mut dev);
    let placement = store.placement().unwrap();
    assert_eq!(placement.source, ALTERNATE);
    assert_eq!(placement.target, PRIMARY);
    assert_eq!(placement.flag, Flag::Active);
    assert_eq!(pairs(store.table().unwrap()), owned(&[("a", "1"), ("b", "2")]));
}

#[test]
fn test_save_after_fallback_repairs_primary() {
    let mut dev =
        FaultyDevice::new(alternate_source_image()).with_fault(WriteFault::ErrorAfter(100));
    assert!(edit_and_save(&mut dev).is_err());
    dev.heal();

    let mut store = load(&mut dev);
    store.upsert("c", "3").unwrap();
    store.save(&mut dev).unwrap();
    assert_eq!(store.state(), StoreState::Saved);

    assert_eq!(block_at(&dev.data, PRIMARY)[4], ACTIVE);
    assert_eq!(block_at(&dev.data, ALTERNATE)[4], OBSOLETE);

    let store = load(&mut dev);
    assert_eq!(store.placement().unwrap().source, PRIMARY);
    assert_eq!(store.get("c"), Some("3"));
    assert_eq!(store.get("bootargs"), None);
}

#[test]
fn test_short_write_reported() {
    let mut dev = FaultyDevice::new(primary_source_image()).with_fault(WriteFault::ZeroAfter(512));

    assert!(matches!(
        edit_and_save(&mut dev),
        Err(EnvError::ShortWrite { offset: ALTERNATE, actual: 512, .. })
    ));

    dev.heal();
    let store = load(&mut dev);
    assert_eq!(store.get("bootargs"), None);
}

// =============================================================================
// Invalidation Failures
// =============================================================================

#[test]
fn test_skipped_invalidation_of_primary() {
    let mut dev = FaultyDevice::new(primary_source_image())
        .with_fault(WriteFault::ErrorAt(PRIMARY + 4));

    assert!(matches!(edit_and_save(&mut dev), Err(EnvError::Io(_))));
    assert_eq!(dev.syncs, 1);

    // Both blocks are complete and active; the primary (old data) wins
    dev.heal();
    assert_eq!(block_at(&dev.data, ALTERNATE)[4], ACTIVE);
    let store = load(&mut dev);
    assert_eq!(store.placement().unwrap().source, PRIMARY);
    assert_eq!(store.get("bootargs"), None);
    assert_eq!(store.get("a"), Some("1"));
}

#[test]
fn test_skipped_invalidation_of_alternate() {
    let mut dev = FaultyDevice::new(alternate_source_image())
        .with_fault(WriteFault::ErrorAt(ALTERNATE + 4));

    assert!(edit_and_save(&mut dev).is_err());

    // The new primary is complete and wins over the still-active alternate
    dev.heal();
    assert_eq!(block_at(&dev.data, ALTERNATE)[4], ACTIVE);
    let store = load(&mut dev);
    assert_eq!(store.placement().unwrap().source, PRIMARY);
    assert_eq!(store.get("bootargs").map(str::len), Some(300));
}

// =============================================================================
// Sync Ordering
// =============================================================================

#[test]
fn test_successful_save_syncs_twice() {
    let mut dev = FaultyDevice::new(primary_source_image());

    edit_and_save(&mut dev).unwrap();

    assert_eq!(dev.syncs, 2);
}

#[test]
fn test_sync_can_be_disabled() {
    let mut dev = FaultyDevice::new(primary_source_image());
    let config = bootenv::Config::builder()
        .device("test-image")
        .sync_on_save(false)
        .build();

    let mut store = EnvStore::new(config).unwrap();
    store.load(&mut dev).unwrap();
    store.save(&mut dev).unwrap();

    assert_eq!(dev.syncs, 0);
}

#[test]
fn test_legacy_save_syncs_once_per_step() {
    let mut dev = FaultyDevice::new(image(Some(&block(None, b"a=1\0\0")), None));

    edit_and_save(&mut dev).unwrap();

    // No invalidation write, but both sync points still run
    assert_eq!(dev.syncs, 2);
    assert!(block_at(&dev.data, ALTERNATE).iter().all(|&b| b == 0xFF));
}
