//! Lazy, import-once catalog provider.

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::Instant;

use tracing::{debug, warn};

use super::{CatalogImporter, EntryTable};
use crate::telemetry;
use crate::types::LookupArgs;
use crate::{MocacheError, Result};

/// Resolves lookups against a catalog that is imported on first use.
///
/// The import runs at most once, even when several threads miss at the same
/// time: the first caller imports while the others block on the same
/// [`OnceLock`]. A failed import is remembered, so every later lookup reports
/// [`MocacheError::CatalogUnavailable`] without touching the file again.
pub struct CatalogProvider {
    path: PathBuf,
    importer: Arc<dyn CatalogImporter>,
    table: OnceLock<std::result::Result<Arc<dyn EntryTable>, String>>,
}

impl CatalogProvider {
    /// Create a provider for the catalog at `path`. Nothing is read yet.
    pub fn new(path: impl Into<PathBuf>, importer: Arc<dyn CatalogImporter>) -> Self {
        Self {
            path: path.into(),
            importer,
            table: OnceLock::new(),
        }
    }

    /// Catalog file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the import has been attempted.
    pub fn is_loaded(&self) -> bool {
        self.table.get().is_some()
    }

    /// Translate `text`, returning it unchanged when the catalog lacks it.
    pub fn resolve(&self, text: &str, context: Option<&str>) -> Result<String> {
        let table = self.table()?;
        Ok(table
            .resolve(text, context)
            .unwrap_or_else(|| text.to_owned()))
    }

    /// Plural translation; falls back to `singular` when `count == 1`, else
    /// `plural`, when the catalog lacks the entry.
    pub fn resolve_plural(
        &self,
        singular: &str,
        plural: &str,
        count: u64,
        context: Option<&str>,
    ) -> Result<String> {
        let table = self.table()?;
        Ok(table
            .resolve_plural(singular, plural, count, context)
            .unwrap_or_else(|| {
                LookupArgs::plural(singular, plural, count)
                    .identity()
                    .to_owned()
            }))
    }

    /// Dispatch on the shape of `args`.
    pub fn resolve_args(&self, args: &LookupArgs<'_>) -> Result<String> {
        match (args.plural, args.count) {
            (Some(plural), Some(count)) => {
                self.resolve_plural(args.text, plural, count, args.context)
            }
            _ => self.resolve(args.text, args.context),
        }
    }

    fn table(&self) -> Result<&Arc<dyn EntryTable>> {
        self.table
            .get_or_init(|| self.import())
            .as_ref()
            .map_err(|reason| MocacheError::CatalogUnavailable {
                path: self.path.clone(),
                reason: reason.clone(),
            })
    }

    fn import(&self) -> std::result::Result<Arc<dyn EntryTable>, String> {
        let start = Instant::now();
        match self.importer.import(&self.path) {
            Ok(table) => {
                metrics::counter!(telemetry::CATALOG_IMPORTS_TOTAL, "status" => "ok").increment(1);
                debug!(
                    path = %self.path.display(),
                    importer = self.importer.name(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "imported catalog"
                );
                Ok(table)
            }
            Err(e) => {
                metrics::counter!(telemetry::CATALOG_IMPORTS_TOTAL, "status" => "error")
                    .increment(1);
                warn!(
                    path = %self.path.display(),
                    importer = self.importer.name(),
                    error = %e,
                    "catalog import failed, lookups fall back to source text"
                );
                Err(e.to_string())
            }
        }
    }
}

impl std::fmt::Debug for CatalogProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogProvider")
            .field("path", &self.path)
            .field("importer", &self.importer.name())
            .field("loaded", &self.is_loaded())
            .finish()
    }
}
