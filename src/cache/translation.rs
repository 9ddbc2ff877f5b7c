//! The translation cache façade.

use std::path::Path;

use tracing::debug;

use super::EntryStore;
use crate::catalog::CatalogProvider;
use crate::fingerprint::fingerprint;
use crate::providers::{LookupProvider, OverrideChain};
use crate::snapshot::{DurabilityManager, LoadOutcome, PersistOutcome};
use crate::telemetry;
use crate::types::{CatalogLocation, Domain, LookupArgs};
use crate::Result;

use super::TranslationCacheBuilder;

/// Persistent lookup cache for one domain's catalog.
///
/// Lookups never fail: when nothing can translate a text (catalog
/// unreadable, text absent) the source text comes back unchanged.
///
/// # Lifecycle
///
/// New entries live in memory until [`flush()`](Self::flush) or
/// [`close()`](Self::close) writes a snapshot. Dropping the cache flushes
/// too, so the durable write happens on every exit path of the owning scope.
pub struct TranslationCache {
    domain: Domain,
    catalog: CatalogLocation,
    store: EntryStore,
    overrides: OverrideChain,
    provider: CatalogProvider,
    durability: DurabilityManager,
    load_outcome: LoadOutcome,
}

impl TranslationCache {
    /// Create a builder for `domain` backed by the catalog at `catalog_path`.
    pub fn builder(
        domain: impl Into<Domain>,
        catalog_path: impl Into<std::path::PathBuf>,
    ) -> TranslationCacheBuilder {
        TranslationCacheBuilder::new(domain, catalog_path)
    }

    pub(crate) fn from_parts(
        domain: Domain,
        catalog: CatalogLocation,
        store: EntryStore,
        overrides: OverrideChain,
        provider: CatalogProvider,
        durability: DurabilityManager,
        load_outcome: LoadOutcome,
    ) -> Self {
        Self {
            domain,
            catalog,
            store,
            overrides,
            provider,
            durability,
            load_outcome,
        }
    }

    /// Translate `text`, disambiguated by `context`.
    pub fn translate(&self, text: &str, context: Option<&str>) -> String {
        self.lookup(&LookupArgs::singular(text).with_context(context))
    }

    /// Translate a plural pair for `count`.
    pub fn translate_plural(
        &self,
        singular: &str,
        plural: &str,
        count: u64,
        context: Option<&str>,
    ) -> String {
        self.lookup(&LookupArgs::plural(singular, plural, count).with_context(context))
    }

    /// Resolve `args`: store, then override chain, then catalog.
    pub fn lookup(&self, args: &LookupArgs<'_>) -> String {
        let key = fingerprint(args, &self.domain);
        if let Some(hit) = self.store.get(&key) {
            metrics::counter!(telemetry::LOOKUPS_TOTAL, "outcome" => "hit").increment(1);
            return hit.to_string();
        }

        if let Some(answer) = self.overrides.try_resolve(args) {
            metrics::counter!(telemetry::LOOKUPS_TOTAL, "outcome" => "override").increment(1);
            return self.store.put(key, answer).to_string();
        }

        match self.provider.resolve_args(args) {
            Ok(answer) => {
                metrics::counter!(telemetry::LOOKUPS_TOTAL, "outcome" => "catalog").increment(1);
                self.store.put(key, answer).to_string()
            }
            Err(e) => {
                // Not cached: a later instance may find a readable catalog.
                metrics::counter!(telemetry::LOOKUPS_TOTAL, "outcome" => "unavailable")
                    .increment(1);
                debug!(domain = %self.domain, error = %e, "resolver unavailable, returning source text");
                args.identity().to_owned()
            }
        }
    }

    /// Persist new entries now. Idempotent: a second call with nothing new
    /// is skipped.
    pub fn flush(&self) -> PersistOutcome {
        self.durability.persist(&self.store)
    }

    /// Flush and release the cache.
    pub fn close(self) -> PersistOutcome {
        self.flush()
    }

    /// Delete this cache's snapshot file. In-memory entries are kept.
    pub fn clear_snapshot(&self) -> Result<()> {
        self.durability.remove()
    }

    /// Domain served by this cache.
    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    /// Catalog location as observed at construction.
    pub fn catalog(&self) -> &CatalogLocation {
        &self.catalog
    }

    /// Providers consulted before the catalog.
    pub fn overrides(&self) -> &OverrideChain {
        &self.overrides
    }

    /// Snapshot file path.
    pub fn snapshot_path(&self) -> &Path {
        self.durability.path()
    }

    /// What construction found on disk.
    pub fn load_outcome(&self) -> LoadOutcome {
        self.load_outcome
    }

    /// Whether the catalog import has been attempted.
    pub fn catalog_loaded(&self) -> bool {
        self.provider.is_loaded()
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Whether entries were added since the last snapshot.
    pub fn is_dirty(&self) -> bool {
        self.store.is_dirty()
    }
}

impl LookupProvider for TranslationCache {
    fn name(&self) -> &str {
        "mocache"
    }

    fn translate(&self, text: &str, context: Option<&str>) -> String {
        TranslationCache::translate(self, text, context)
    }

    fn translate_plural(
        &self,
        singular: &str,
        plural: &str,
        count: u64,
        context: Option<&str>,
    ) -> String {
        TranslationCache::translate_plural(self, singular, plural, count, context)
    }

    fn lookup(&self, args: &LookupArgs<'_>) -> String {
        TranslationCache::lookup(self, args)
    }
}

impl Drop for TranslationCache {
    fn drop(&mut self) {
        self.durability.persist(&self.store);
    }
}

impl std::fmt::Debug for TranslationCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslationCache")
            .field("domain", &self.domain)
            .field("catalog", &self.catalog)
            .field("store", &self.store)
            .field("overrides", &self.overrides)
            .field("load_outcome", &self.load_outcome)
            .finish()
    }
}
