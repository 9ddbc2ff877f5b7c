//! Builder for configuring translation cache instances

use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use super::TranslationCache;
use crate::catalog::{CatalogImporter, CatalogProvider, MoImporter};
use crate::config::CacheConfig;
use crate::fingerprint;
use crate::providers::{LookupProvider, OverrideChain, OverridePolicy};
use crate::snapshot::{DurabilityManager, SNAPSHOT_EXTENSION};
use crate::types::{CatalogLocation, Domain};
use crate::Result;

/// Builder for [`TranslationCache`].
pub struct TranslationCacheBuilder {
    domain: Domain,
    catalog_path: PathBuf,
    config: CacheConfig,
    importer: Arc<dyn CatalogImporter>,
    overrides: Vec<Arc<dyn LookupProvider>>,
}

impl TranslationCacheBuilder {
    pub fn new(domain: impl Into<Domain>, catalog_path: impl Into<PathBuf>) -> Self {
        Self {
            domain: domain.into(),
            catalog_path: catalog_path.into(),
            config: CacheConfig::default(),
            importer: Arc::new(MoImporter),
            overrides: Vec::new(),
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: CacheConfig) -> Self {
        self.config = config;
        self
    }

    /// Store snapshots in `dir` instead of the default location.
    pub fn snapshot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.snapshot_dir = Some(dir.into());
        self
    }

    /// Set the installation identity used in snapshot file names.
    pub fn installation(mut self, installation: impl Into<String>) -> Self {
        self.config.installation = installation.into();
        self
    }

    /// Set how identity answers from the override chain are treated.
    pub fn override_policy(mut self, policy: OverridePolicy) -> Self {
        self.config.override_policy = policy;
        self
    }

    /// Use a custom catalog importer (default: [`MoImporter`]).
    pub fn importer(mut self, importer: Arc<dyn CatalogImporter>) -> Self {
        self.importer = importer;
        self
    }

    /// Chain a previously registered provider for this domain.
    ///
    /// Providers are consulted in the order they were added, all before the
    /// catalog. The cache only keeps a shared reference.
    pub fn previous(mut self, provider: Arc<dyn LookupProvider>) -> Self {
        self.overrides.push(provider);
        self
    }

    /// Snapshot file the built cache will use. Creates the snapshot
    /// directory if absent.
    pub fn snapshot_path(&self) -> Result<PathBuf> {
        let dir = self.config.resolve_snapshot_dir()?;
        let stem = fingerprint::snapshot_stem(
            &self.config.installation,
            &self.domain,
            &self.catalog_path,
        );
        Ok(dir.join(format!("{stem}.{SNAPSHOT_EXTENSION}")))
    }

    /// Build the cache, loading the snapshot if it is still valid.
    ///
    /// Fails only when the snapshot directory cannot be created. An
    /// unreadable catalog or snapshot is not an error here.
    pub fn build(self) -> Result<TranslationCache> {
        let snapshot_path = self.snapshot_path()?;
        let catalog = CatalogLocation::resolve(self.catalog_path);

        let durability = DurabilityManager::new(
            snapshot_path,
            self.domain.clone(),
            &catalog,
            self.config.write_empty_snapshot,
        );
        let (store, load_outcome) = durability.load();

        let mut overrides = OverrideChain::new(self.config.override_policy);
        for provider in self.overrides {
            overrides.push(provider);
        }
        let provider = CatalogProvider::new(catalog.path(), self.importer);

        debug!(
            domain = %self.domain,
            catalog = %catalog.path().display(),
            snapshot = %durability.path().display(),
            ?load_outcome,
            overrides = overrides.len(),
            "translation cache ready"
        );

        Ok(TranslationCache::from_parts(
            self.domain,
            catalog,
            store,
            overrides,
            provider,
            durability,
            load_outcome,
        ))
    }
}
