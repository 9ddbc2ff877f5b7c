//! mocache - persistent lookup cache for compiled translation catalogs
//!
//! Loading a `.mo` catalog on every request is expensive, and a typical page
//! only needs a few dozen of its strings. This crate keeps the strings a
//! process actually looked up, keyed by a fingerprint of the lookup
//! arguments, and persists them as a snapshot that the next process loads
//! instead of the catalog. The catalog is only imported on a miss, and a
//! snapshot is discarded as soon as the catalog's modification time changes.
//!
//! # Example
//!
//! ```rust,no_run
//! use mocache::TranslationCache;
//!
//! fn main() -> mocache::Result<()> {
//!     let cache = TranslationCache::builder("blog", "/srv/lang/blog-fr_FR.mo")
//!         .snapshot_dir("/var/cache/mocache")
//!         .build()?;
//!
//!     println!("{}", cache.translate("Cancel", None));
//!     println!("{}", cache.translate_plural("%d comment", "%d comments", 3, None));
//!
//!     // Also runs on drop.
//!     cache.close();
//!     Ok(())
//! }
//! ```
//!
//! # Chaining
//!
//! Providers registered for a domain before the cache (an older cache, a
//! hand-written override) are consulted first; see
//! [`OverrideChain`] and [`install_cache`].

pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod install;
pub mod providers;
pub mod snapshot;
pub mod telemetry;
pub mod types;

pub use cache::{EntryStore, TranslationCache, TranslationCacheBuilder};
pub use catalog::{CatalogImporter, EntryTable, MoCatalog, MoImporter};
pub use config::CacheConfig;
pub use error::{MocacheError, Result};
pub use install::install_cache;
pub use providers::{LookupProvider, OverrideChain, OverridePolicy};
pub use snapshot::{LoadOutcome, PersistOutcome};
pub use types::{CacheKey, CatalogLocation, Domain, LookupArgs};

/// Package version from Cargo.toml.
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");
