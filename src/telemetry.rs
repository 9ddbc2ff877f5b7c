//! Telemetry metric name constants.
//!
//! Consumers install their own `metrics` recorder; without one, every
//! metric call is a no-op.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `mocache_`. Counters end in `_total`.

/// Lookups served, by where the answer came from.
///
/// Labels: `outcome` ("hit" | "override" | "catalog" | "unavailable").
pub const LOOKUPS_TOTAL: &str = "mocache_lookups_total";

/// Catalog import attempts (at most one per cache instance).
///
/// Labels: `status` ("ok" | "error").
pub const CATALOG_IMPORTS_TOTAL: &str = "mocache_catalog_imports_total";

/// Snapshot loads at cache construction.
///
/// Labels: `outcome` ("loaded" | "missing" | "stale" | "corrupt").
pub const SNAPSHOT_LOADS_TOTAL: &str = "mocache_snapshot_loads_total";

/// Snapshot write attempts at flush.
///
/// Labels: `status` ("ok" | "error" | "skipped").
pub const SNAPSHOT_WRITES_TOTAL: &str = "mocache_snapshot_writes_total";
