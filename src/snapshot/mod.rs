//! Durable snapshots of the entry store.
//!
//! - [`format`]: the versioned on-disk format and its trailing sentinel.
//! - [`durability`]: [`DurabilityManager`], load with invalidation at
//!   construction, atomic write-verify-rename at flush.
//!
//! Snapshot paths are `<dir>/<stem>.mocache`, where the stem is a digest of
//! `(installation, domain, catalog path)` so distinct domains and catalogs
//! never share a file.

pub mod durability;
pub mod format;

pub use durability::{DurabilityManager, LoadOutcome, PersistOutcome, SNAPSHOT_EXTENSION};
pub use format::{SENTINEL, SNAPSHOT_VERSION, Snapshot, read_snapshot};
