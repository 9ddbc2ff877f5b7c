//! Deterministic fingerprints for lookups and snapshot files.
//!
//! Keys are the SHA-256 of the JSON serialization of `(args, domain)`. The
//! serialization covers every [`LookupArgs`] field, so two lookups that differ
//! in text, plural, count or context never share a key. Digests are stable
//! across processes and platforms.

use std::path::Path;

use sha2::{Digest, Sha256};

use crate::types::{CacheKey, Domain, KEY_LEN, LookupArgs};

/// Compute the cache key for a lookup in `domain`.
///
/// # Panics
///
/// Panics if the arguments cannot be serialized. `LookupArgs` contains only
/// strings and integers, so this indicates a broken caller contract rather
/// than an environmental failure.
pub fn fingerprint(args: &LookupArgs<'_>, domain: &Domain) -> CacheKey {
    let payload =
        serde_json::to_vec(&(args, domain)).expect("lookup arguments are always serializable");
    CacheKey::from_bytes(digest(&payload))
}

/// Compute the hex file stem identifying the snapshot of one
/// `(installation, domain, catalog path)` triple.
pub fn snapshot_stem(installation: &str, domain: &Domain, catalog: &Path) -> String {
    let catalog = catalog.to_string_lossy();
    let payload = serde_json::to_vec(&(installation, domain, catalog.as_ref()))
        .expect("snapshot identity is always serializable");
    hex::encode(digest(&payload))
}

fn digest(payload: &[u8]) -> [u8; KEY_LEN] {
    let mut out = [0u8; KEY_LEN];
    out.copy_from_slice(&Sha256::digest(payload));
    out
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn blog() -> Domain {
        Domain::new("blog")
    }

    #[test]
    fn deterministic() {
        let args = LookupArgs::singular("Cancel");
        assert_eq!(fingerprint(&args, &blog()), fingerprint(&args, &blog()));
    }

    #[test]
    fn stable_across_processes() {
        // Pinned digest: changing the serialization invalidates every
        // snapshot on disk.
        let key = fingerprint(&LookupArgs::singular("Cancel"), &blog());
        assert_eq!(
            key.to_hex(),
            "2023fe3e96cb7ed37d6840f9fa5ac549534353869202f087f958e7e87fc54d83"
        );
    }

    #[test]
    fn differs_on_domain() {
        let args = LookupArgs::singular("Cancel");
        assert_ne!(
            fingerprint(&args, &blog()),
            fingerprint(&args, &Domain::new("admin"))
        );
    }

    #[test]
    fn differs_on_context() {
        let plain = LookupArgs::singular("May");
        let month = plain.with_context(Some("month"));
        let verb = plain.with_context(Some("verb"));
        let keys: HashSet<_> = [plain, month, verb]
            .iter()
            .map(|a| fingerprint(a, &blog()))
            .collect();
        assert_eq!(keys.len(), 3);
    }

    #[test]
    fn differs_on_plural_and_count() {
        let one = LookupArgs::plural("file", "files", 1);
        let two = LookupArgs::plural("file", "files", 2);
        let other_plural = LookupArgs::plural("file", "documents", 1);
        let singular = LookupArgs::singular("file");
        let keys: HashSet<_> = [one, two, other_plural, singular]
            .iter()
            .map(|a| fingerprint(a, &blog()))
            .collect();
        assert_eq!(keys.len(), 4);
    }

    #[test]
    fn no_collisions_across_large_sample() {
        let texts: Vec<String> = (0..2_000).map(|i| format!("text-{i}")).collect();
        let mut keys = HashSet::new();
        for text in &texts {
            keys.insert(fingerprint(&LookupArgs::singular(text), &blog()));
            for count in 0..4 {
                keys.insert(fingerprint(&LookupArgs::plural(text, "many", count), &blog()));
            }
        }
        assert_eq!(keys.len(), texts.len() * 5);
    }

    #[test]
    fn field_boundaries_do_not_alias() {
        // "ab" + "c" must not collide with "a" + "bc".
        let a = LookupArgs::plural("ab", "c", 1);
        let b = LookupArgs::plural("a", "bc", 1);
        assert_ne!(fingerprint(&a, &blog()), fingerprint(&b, &blog()));
    }

    #[test]
    fn snapshot_stem_distinguishes_inputs() {
        let path = Path::new("/srv/lang/blog-fr_FR.mo");
        let base = snapshot_stem("default", &blog(), path);
        assert_eq!(base, snapshot_stem("default", &blog(), path));
        assert_ne!(base, snapshot_stem("staging", &blog(), path));
        assert_ne!(base, snapshot_stem("default", &Domain::new("admin"), path));
        assert_ne!(
            base,
            snapshot_stem("default", &blog(), Path::new("/srv/lang/blog-de_DE.mo"))
        );
        assert_eq!(base.len(), KEY_LEN * 2);
    }
}
