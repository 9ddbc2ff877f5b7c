//! Installing a cache in front of a domain's lookups.
//!
//! The host application owns the mapping from domain to active lookup
//! provider. When a catalog is loaded for a domain it offers the hook a
//! chance to supply a provider, passing whatever was active before.
//! [`install_cache`] answers that offer; [`DomainRegistry`] is a minimal
//! host-side mapping for applications without one of their own.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cache::TranslationCache;
use crate::config::CacheConfig;
use crate::providers::LookupProvider;
use crate::types::{CatalogLocation, Domain};

/// Build a cache for `domain` that chains `previous`.
///
/// Returns `None` when the catalog cannot be opened or the cache cannot be
/// built; the caller keeps its previous provider active in that case.
///
/// `previous` must not be a cache for the same installation, domain and
/// catalog: both would own the same snapshot file and the last one dropped
/// overwrites the other's. [`DomainRegistry::install`] handles that case.
pub fn install_cache(
    domain: impl Into<Domain>,
    catalog_path: &Path,
    previous: Option<Arc<dyn LookupProvider>>,
    config: &CacheConfig,
) -> Option<Arc<TranslationCache>> {
    build_cache(domain.into(), catalog_path, previous.into_iter().collect(), config)
}

fn build_cache(
    domain: Domain,
    catalog_path: &Path,
    previous: Vec<Arc<dyn LookupProvider>>,
    config: &CacheConfig,
) -> Option<Arc<TranslationCache>> {
    if let Err(e) = File::open(catalog_path) {
        warn!(
            %domain,
            catalog = %catalog_path.display(),
            error = %e,
            "catalog not readable, cache not installed"
        );
        return None;
    }

    let mut builder =
        TranslationCache::builder(domain.clone(), catalog_path).config(config.clone());
    for provider in previous {
        builder = builder.previous(provider);
    }

    match builder.build() {
        Ok(cache) => {
            info!(
                %domain,
                snapshot = %cache.snapshot_path().display(),
                "installed translation cache"
            );
            Some(Arc::new(cache))
        }
        Err(e) => {
            warn!(%domain, error = %e, "failed to build translation cache");
            None
        }
    }
}

/// Active lookup provider per domain.
///
/// Installing a cache for a domain whose active cache (installed through
/// this registry) uses the same snapshot file never chains the two:
/// - catalog unchanged: the active cache stays;
/// - catalog modified: the active cache is flushed and replaced by a new
///   one chaining the same earlier providers.
///
/// ```rust,no_run
/// use std::path::Path;
/// use mocache::CacheConfig;
/// use mocache::install::DomainRegistry;
///
/// let mut registry = DomainRegistry::new();
/// let config = CacheConfig::new();
/// registry.install("blog", Path::new("/srv/lang/blog-fr_FR.mo"), &config);
///
/// if let Some(provider) = registry.get(&"blog".into()) {
///     println!("{}", provider.translate("Cancel", None));
/// }
/// ```
#[derive(Default)]
pub struct DomainRegistry {
    providers: HashMap<Domain, Arc<dyn LookupProvider>>,
    caches: HashMap<Domain, Arc<TranslationCache>>,
}

impl DomainRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `provider` active for `domain`, returning the one it replaces.
    pub fn register(
        &mut self,
        domain: impl Into<Domain>,
        provider: Arc<dyn LookupProvider>,
    ) -> Option<Arc<dyn LookupProvider>> {
        let domain = domain.into();
        self.caches.remove(&domain);
        self.providers.insert(domain, provider)
    }

    /// Install a translation cache for `domain`, chaining the currently
    /// active provider. Returns `false` (registry unchanged) if no cache
    /// could be built.
    pub fn install(
        &mut self,
        domain: impl Into<Domain>,
        catalog_path: &Path,
        config: &CacheConfig,
    ) -> bool {
        let domain = domain.into();
        let mut previous: Vec<_> = self.providers.get(&domain).cloned().into_iter().collect();

        if let Some(active) = self.caches.get(&domain) {
            let snapshot = TranslationCache::builder(domain.clone(), catalog_path)
                .config(config.clone())
                .snapshot_path();
            if snapshot.is_ok_and(|path| path == active.snapshot_path()) {
                let mtime = CatalogLocation::resolve(catalog_path).mtime_ns();
                if mtime.is_some() && mtime == active.catalog().mtime_ns() {
                    debug!(%domain, "catalog unchanged, keeping installed cache");
                    return true;
                }
                active.flush();
                previous = active.overrides().providers().to_vec();
            }
        }

        match build_cache(domain.clone(), catalog_path, previous, config) {
            Some(cache) => {
                self.providers.insert(domain.clone(), Arc::clone(&cache) as _);
                self.caches.insert(domain, cache);
                true
            }
            None => false,
        }
    }

    /// Active provider for `domain`.
    pub fn get(&self, domain: &Domain) -> Option<Arc<dyn LookupProvider>> {
        self.providers.get(domain).cloned()
    }

    /// Number of domains with an active provider.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl std::fmt::Debug for DomainRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<(&str, &str)> = self
            .providers
            .iter()
            .map(|(domain, provider)| (domain.as_str(), provider.name()))
            .collect();
        names.sort_unstable();
        f.debug_struct("DomainRegistry")
            .field("providers", &names)
            .finish()
    }
}
