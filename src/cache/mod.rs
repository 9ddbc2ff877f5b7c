//! Translation cache.
//!
//! - [`TranslationCache`]: the façade, fingerprint → [`EntryStore`] →
//!   [`OverrideChain`](crate::OverrideChain) → [`CatalogProvider`](crate::catalog::CatalogProvider),
//!   with the result written back into the store.
//! - [`EntryStore`]: append-only, concurrently readable map of resolved
//!   strings; the dirty flag decides whether a flush writes a snapshot.
//!
//! Build a cache with [`TranslationCache::builder()`]:
//!
//! ```rust,no_run
//! use mocache::{CacheConfig, TranslationCache};
//!
//! # fn main() -> mocache::Result<()> {
//! let cache = TranslationCache::builder("blog", "/srv/lang/blog-fr_FR.mo")
//!     .config(CacheConfig::new().snapshot_dir("/var/cache/mocache"))
//!     .build()?;
//!
//! assert_eq!(cache.translate("Cancel", None), "Annuler");
//! cache.close();
//! # Ok(())
//! # }
//! ```

mod builder;
pub mod store;
mod translation;

pub use builder::TranslationCacheBuilder;
pub use store::EntryStore;
pub use translation::TranslationCache;
