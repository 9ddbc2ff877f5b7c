//! Mocache error types

use std::path::PathBuf;

/// Mocache error types
#[derive(Debug, thiserror::Error)]
pub enum MocacheError {
    // Catalog errors
    /// The catalog file could not be imported. Lookups degrade to the
    /// identity fallback while this holds.
    #[error("catalog unavailable at {}: {reason}", path.display())]
    CatalogUnavailable { path: PathBuf, reason: String },

    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),

    // Snapshot errors (handled locally, never surfaced by lookups)
    #[error("corrupt snapshot: {0}")]
    SnapshotCorrupt(String),

    #[error("stale snapshot (recorded mtime {recorded}, catalog mtime {current})")]
    SnapshotStale { recorded: u64, current: u64 },

    #[error("persistence failed: {0}")]
    Persistence(String),

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),

    // Wrapped errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for Mocache operations
pub type Result<T> = std::result::Result<T, MocacheError>;
