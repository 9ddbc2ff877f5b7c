//! Catalog file location and modification time.

use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

/// Resolved path of a compiled catalog plus its modification time as
/// observed when the cache was constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogLocation {
    path: PathBuf,
    mtime_ns: Option<u64>,
}

impl CatalogLocation {
    /// Resolve a catalog path, reading its modification time once.
    ///
    /// A missing or unreadable file yields `mtime_ns() == None`; the cache
    /// still works in that case but never trusts a snapshot.
    pub fn resolve(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mtime_ns = modified_ns(&path);
        Self { path, mtime_ns }
    }

    /// Catalog file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Modification time in nanoseconds since the Unix epoch.
    pub fn mtime_ns(&self) -> Option<u64> {
        self.mtime_ns
    }
}

/// Modification time of `path` in nanoseconds since the Unix epoch.
pub(crate) fn modified_ns(path: &Path) -> Option<u64> {
    let modified = std::fs::metadata(path).ok()?.modified().ok()?;
    let since_epoch = modified.duration_since(UNIX_EPOCH).ok()?;
    u64::try_from(since_epoch.as_nanos()).ok()
}
