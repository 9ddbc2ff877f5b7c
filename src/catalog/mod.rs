//! Catalog collaborators and the lazy catalog provider.
//!
//! Importing a catalog is the expensive step the cache exists to avoid. The
//! [`CatalogImporter`] trait is the seam for it: given a file path it returns
//! an [`EntryTable`] or fails. [`MoImporter`] reads compiled gettext files;
//! hosts with another catalog format supply their own importer through
//! [`TranslationCacheBuilder::importer()`](crate::TranslationCacheBuilder::importer).
//!
//! [`CatalogProvider`] wraps an importer and runs it at most once per cache
//! instance, on the first miss that reaches it.

pub mod mo;
pub mod plural;
mod provider;

use std::path::Path;
use std::sync::Arc;

use crate::Result;

pub use mo::{MoCatalog, MoImporter};
pub use plural::{PluralExpr, PluralForms};
pub use provider::CatalogProvider;

/// In-memory table of singular and plural entries for one catalog.
///
/// Both methods return `None` when the text is not translated; the
/// [`CatalogProvider`] turns that into the identity fallback.
pub trait EntryTable: Send + Sync {
    /// Translation of `text`, disambiguated by `context`.
    fn resolve(&self, text: &str, context: Option<&str>) -> Option<String>;

    /// Plural form of `singular`/`plural` selected for `count` by the
    /// catalog's own plural rule.
    fn resolve_plural(
        &self,
        singular: &str,
        plural: &str,
        count: u64,
        context: Option<&str>,
    ) -> Option<String>;
}

/// Stateless import routine turning a catalog file into an [`EntryTable`].
pub trait CatalogImporter: Send + Sync {
    /// Importer name for logging/debugging.
    fn name(&self) -> &str;

    /// Import the catalog at `path`. Unreadable or malformed files are errors.
    fn import(&self, path: &Path) -> Result<Arc<dyn EntryTable>>;
}
