//! Versioned snapshot file format.
//!
//! ```text
//! {"version":1,"domain":"blog","catalog_mtime_ns":...,"entries":{"<hex key>":"..."}}
//! \n#mocache:end:v1\n
//! ```
//!
//! The JSON body is followed by a fixed sentinel, which must be the last
//! bytes of the file. A file cut short anywhere (crash mid-write, disk full)
//! lacks the sentinel at that position and is rejected as a whole.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::types::{CacheKey, Domain};
use crate::{MocacheError, Result};

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Maximum supported snapshot format version.
const MAX_SUPPORTED_VERSION: u32 = 1;

/// Trailing marker of every complete snapshot file.
pub const SENTINEL: &[u8] = b"\n#mocache:end:v1\n";

/// Durable copy of an entry store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Format version.
    pub version: u32,
    /// Domain the entries belong to.
    pub domain: Domain,
    /// Catalog modification time (ns since the Unix epoch) the entries were
    /// resolved against. A snapshot without one is never trusted.
    #[serde(default)]
    pub catalog_mtime_ns: Option<u64>,
    /// Resolved entries.
    pub entries: BTreeMap<CacheKey, String>,
}

impl Snapshot {
    /// Create a current-version snapshot.
    pub fn new(
        domain: Domain,
        catalog_mtime_ns: Option<u64>,
        entries: BTreeMap<CacheKey, String>,
    ) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            domain,
            catalog_mtime_ns,
            entries,
        }
    }
}

/// Serialize a snapshot, sentinel included.
pub fn encode(snapshot: &Snapshot) -> Result<Vec<u8>> {
    let mut bytes = serde_json::to_vec(snapshot)?;
    bytes.extend_from_slice(SENTINEL);
    Ok(bytes)
}

/// Validate the sentinel and decode a snapshot.
pub fn decode(bytes: &[u8]) -> Result<Snapshot> {
    let body = bytes
        .strip_suffix(SENTINEL)
        .ok_or_else(|| MocacheError::SnapshotCorrupt("missing trailing sentinel".to_string()))?;
    let snapshot: Snapshot = serde_json::from_slice(body)
        .map_err(|e| MocacheError::SnapshotCorrupt(format!("invalid body: {e}")))?;
    if snapshot.version > MAX_SUPPORTED_VERSION {
        return Err(MocacheError::SnapshotCorrupt(format!(
            "unsupported snapshot version {} (max supported: {MAX_SUPPORTED_VERSION})",
            snapshot.version
        )));
    }
    Ok(snapshot)
}

/// Read and validate a snapshot file.
///
/// For tooling: any reader must go through this (or [`decode`]) rather than
/// parsing the JSON body directly.
pub fn read_snapshot(path: &Path) -> Result<Snapshot> {
    let bytes = std::fs::read(path)?;
    decode(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::KEY_LEN;

    fn sample() -> Snapshot {
        let mut entries = BTreeMap::new();
        entries.insert(CacheKey::from_bytes([7; KEY_LEN]), "Annuler".to_string());
        Snapshot::new(Domain::new("blog"), Some(1_700_000_000_000_000_000), entries)
    }

    #[test]
    fn encoded_snapshot_ends_with_sentinel() {
        let bytes = encode(&sample()).unwrap();
        assert!(bytes.ends_with(SENTINEL));
        assert_eq!(decode(&bytes).unwrap(), sample());
    }

    #[test]
    fn truncation_anywhere_is_rejected() {
        let bytes = encode(&sample()).unwrap();
        for cut in [0, 1, bytes.len() / 2, bytes.len() - SENTINEL.len(), bytes.len() - 1] {
            let err = decode(&bytes[..cut]).unwrap_err();
            assert!(matches!(err, MocacheError::SnapshotCorrupt(_)), "cut at {cut}");
        }
    }

    #[test]
    fn trailing_garbage_is_rejected() {
        let mut bytes = encode(&sample()).unwrap();
        bytes.extend_from_slice(b"junk");
        assert!(decode(&bytes).is_err());
    }

    #[test]
    fn sentinel_with_invalid_body_is_rejected() {
        let mut bytes = b"{\"version\":1,".to_vec();
        bytes.extend_from_slice(SENTINEL);
        let err = decode(&bytes).unwrap_err();
        assert!(err.to_string().contains("invalid body"));
    }

    #[test]
    fn future_version_is_rejected() {
        let mut snapshot = sample();
        snapshot.version = 999;
        let bytes = encode(&snapshot).unwrap();
        let err = decode(&bytes).unwrap_err();
        assert!(err.to_string().contains("unsupported snapshot version"));
    }

    #[test]
    fn missing_mtime_decodes_as_none() {
        let mut bytes = br#"{"version":1,"domain":"blog","entries":{}}"#.to_vec();
        bytes.extend_from_slice(SENTINEL);
        assert_eq!(decode(&bytes).unwrap().catalog_mtime_ns, None);
    }
}
