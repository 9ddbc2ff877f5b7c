//! Snapshot loading, invalidation and crash-safe persistence.
//!
//! # Write protocol
//!
//! 1. Serialize the store and the catalog mtime to a staging file next to
//!    the snapshot (`<stem>.mocache.<pid>.<seq>.tmp`) under an exclusive
//!    file lock.
//! 2. The sentinel is the last thing written.
//! 3. Re-open the staging file and check the sentinel sits at the expected
//!    offset and that the file ends there.
//! 4. Rename the staging file over the snapshot.
//! 5. On any failure, delete the staging file and report it. The in-memory
//!    cache is unaffected.
//!
//! # Invalidation
//!
//! A snapshot is trusted only if it names the same domain and its recorded
//! catalog mtime equals the one observed at construction. Any other state
//! (missing mtime, mismatch, unreadable file) starts the cache empty.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use tracing::{debug, info, warn};

use super::format::{self, SENTINEL, Snapshot};
use crate::cache::EntryStore;
use crate::telemetry;
use crate::types::{CatalogLocation, Domain};
use crate::{MocacheError, Result};

/// Snapshot file extension.
pub const SNAPSHOT_EXTENSION: &str = "mocache";

/// Distinguishes staging files of concurrent writers within one process.
static STAGING_SEQ: AtomicU64 = AtomicU64::new(0);

/// What construction found on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Snapshot trusted; this many entries were loaded.
    Loaded(usize),
    /// No snapshot file.
    Missing,
    /// Snapshot belongs to a different catalog mtime; discarded.
    Stale,
    /// Snapshot unreadable, truncated or otherwise invalid; discarded.
    Corrupt,
}

impl LoadOutcome {
    fn label(self) -> &'static str {
        match self {
            Self::Loaded(_) => "loaded",
            Self::Missing => "missing",
            Self::Stale => "stale",
            Self::Corrupt => "corrupt",
        }
    }
}

/// What a flush did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistOutcome {
    /// A verified snapshot with this many entries replaced the old one.
    Written { entries: usize },
    /// Nothing to do: the store is clean and a snapshot exists, or the
    /// catalog mtime is unknown.
    Skipped,
    /// The write failed; the staging file was removed.
    Failed { reason: String },
}

/// Loads and persists the snapshot of one `(domain, catalog)` pair.
#[derive(Debug)]
pub struct DurabilityManager {
    path: PathBuf,
    domain: Domain,
    catalog_mtime_ns: Option<u64>,
    write_empty_snapshot: bool,
    write_lock: Mutex<()>,
}

impl DurabilityManager {
    /// Create a manager for the snapshot at `path`.
    pub fn new(
        path: impl Into<PathBuf>,
        domain: Domain,
        catalog: &CatalogLocation,
        write_empty_snapshot: bool,
    ) -> Self {
        Self {
            path: path.into(),
            domain,
            catalog_mtime_ns: catalog.mtime_ns(),
            write_empty_snapshot,
            write_lock: Mutex::new(()),
        }
    }

    /// Snapshot file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Build the initial store from the snapshot, if it can be trusted.
    ///
    /// Never fails: every problem downgrades to an empty store.
    pub fn load(&self) -> (EntryStore, LoadOutcome) {
        let (store, outcome) = match self.read_trusted() {
            Ok(Some(snapshot)) => {
                let count = snapshot.entries.len();
                debug!(path = %self.path.display(), entries = count, "loaded snapshot");
                (EntryStore::from_entries(snapshot.entries), LoadOutcome::Loaded(count))
            }
            Ok(None) => (EntryStore::new(), LoadOutcome::Missing),
            Err(e @ MocacheError::SnapshotStale { .. }) => {
                info!(path = %self.path.display(), reason = %e, "discarding stale snapshot");
                (EntryStore::new(), LoadOutcome::Stale)
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "discarding unreadable snapshot");
                (EntryStore::new(), LoadOutcome::Corrupt)
            }
        };
        metrics::counter!(telemetry::SNAPSHOT_LOADS_TOTAL, "outcome" => outcome.label())
            .increment(1);
        (store, outcome)
    }

    /// Persist `store` if it changed (or if no snapshot exists yet).
    ///
    /// Only one thread runs the write sequence at a time; a second concurrent
    /// flush observes the cleared dirty flag and skips.
    pub fn persist(&self, store: &EntryStore) -> PersistOutcome {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let Some(mtime) = self.catalog_mtime_ns else {
            debug!(path = %self.path.display(), "catalog mtime unknown, not persisting");
            return self.skipped();
        };

        let dirty = store.take_dirty();
        if !dirty && (!self.write_empty_snapshot || self.path.exists()) {
            return self.skipped();
        }

        let snapshot = Snapshot::new(self.domain.clone(), Some(mtime), store.entries());
        let entries = snapshot.entries.len();
        match self.write_atomic(&snapshot) {
            Ok(()) => {
                metrics::counter!(telemetry::SNAPSHOT_WRITES_TOTAL, "status" => "ok").increment(1);
                info!(path = %self.path.display(), entries, "persisted snapshot");
                PersistOutcome::Written { entries }
            }
            Err(e) => {
                if dirty {
                    store.mark_dirty();
                }
                metrics::counter!(telemetry::SNAPSHOT_WRITES_TOTAL, "status" => "error")
                    .increment(1);
                warn!(path = %self.path.display(), error = %e, "failed to persist snapshot");
                PersistOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Delete the snapshot file. A missing file is not an error.
    pub fn remove(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn skipped(&self) -> PersistOutcome {
        metrics::counter!(telemetry::SNAPSHOT_WRITES_TOTAL, "status" => "skipped").increment(1);
        PersistOutcome::Skipped
    }

    /// Read the snapshot and apply the trust checks. `Ok(None)` means no file.
    fn read_trusted(&self) -> Result<Option<Snapshot>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let snapshot = format::decode(&bytes)?;
        if snapshot.domain != self.domain {
            return Err(MocacheError::SnapshotCorrupt(format!(
                "snapshot is for domain '{}', expected '{}'",
                snapshot.domain, self.domain
            )));
        }
        let recorded = snapshot.catalog_mtime_ns.ok_or_else(|| {
            MocacheError::SnapshotCorrupt("snapshot has no catalog mtime".to_string())
        })?;
        match self.catalog_mtime_ns {
            Some(current) if current == recorded => Ok(Some(snapshot)),
            current => Err(MocacheError::SnapshotStale {
                recorded,
                current: current.unwrap_or(0),
            }),
        }
    }

    fn write_atomic(&self, snapshot: &Snapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                MocacheError::Persistence(format!(
                    "failed to create snapshot dir {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let staging = self.staging_path();
        let bytes = format::encode(snapshot)?;
        let body_len = (bytes.len() - SENTINEL.len()) as u64;

        let result = write_locked(&staging, &bytes, SENTINEL.len())
            .and_then(|()| verify_sentinel(&staging, body_len))
            .and_then(|()| {
                fs::rename(&staging, &self.path).map_err(|e| {
                    MocacheError::Persistence(format!(
                        "failed to rename {} → {}: {e}",
                        staging.display(),
                        self.path.display()
                    ))
                })
            });
        if result.is_err() {
            discard_staging(&staging);
        }
        result
    }

    fn staging_path(&self) -> PathBuf {
        let seq = STAGING_SEQ.fetch_add(1, Ordering::Relaxed);
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(format!(".{}.{seq}.tmp", std::process::id()));
        self.path.with_file_name(name)
    }
}

/// Remove a staging file left by a failed write. Returns whether a file was
/// removed; a staging file that was never created is not an error.
fn discard_staging(path: &Path) -> bool {
    match fs::remove_file(path) {
        Ok(()) => true,
        Err(e) if e.kind() == ErrorKind::NotFound => false,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "failed to remove staging file");
            false
        }
    }
}

/// Write `bytes` to `path` under an exclusive lock; the trailing
/// `sentinel_len` bytes are written last.
fn write_locked(path: &Path, bytes: &[u8], sentinel_len: usize) -> Result<()> {
    let io_err = |e: std::io::Error| {
        MocacheError::Persistence(format!("failed to write {}: {e}", path.display()))
    };
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .map_err(io_err)?;
    file.lock().map_err(io_err)?;
    file.set_len(0).map_err(io_err)?;
    let (body, sentinel) = bytes.split_at(bytes.len() - sentinel_len);
    file.write_all(body).map_err(io_err)?;
    file.write_all(sentinel).map_err(io_err)?;
    file.sync_all().map_err(io_err)?;
    Ok(())
}

/// Check that `path` is exactly `body_len` bytes followed by the sentinel.
pub(crate) fn verify_sentinel(path: &Path, body_len: u64) -> Result<()> {
    let mismatch = |detail: String| {
        MocacheError::Persistence(format!(
            "sentinel verification failed for {}: {detail}",
            path.display()
        ))
    };
    let mut file = fs::File::open(path).map_err(|e| mismatch(e.to_string()))?;
    let len = file.metadata().map_err(|e| mismatch(e.to_string()))?.len();
    let expected = body_len + SENTINEL.len() as u64;
    if len != expected {
        return Err(mismatch(format!("file is {len} bytes, expected {expected}")));
    }
    file.seek(SeekFrom::Start(body_len))
        .map_err(|e| mismatch(e.to_string()))?;
    let mut trailer = vec![0u8; SENTINEL.len()];
    file.read_exact(&mut trailer)
        .map_err(|e| mismatch(e.to_string()))?;
    if trailer != SENTINEL {
        return Err(mismatch("trailing bytes are not the sentinel".to_string()));
    }
    Ok(())
}
