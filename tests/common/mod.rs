//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, SystemTime};

use mocache::catalog::mo;
use mocache::{CatalogImporter, EntryTable, LookupProvider, MoImporter, Result};

pub const FRENCH_HEADER: &str =
    "Content-Type: text/plain; charset=UTF-8\nPlural-Forms: nplurals=2; plural=(n > 1);\n";

/// Write a `.mo` catalog compiled from `(original, translation)` pairs.
pub fn write_mo(path: &Path, entries: &[(&str, &str)]) {
    std::fs::write(path, mo::encode(entries)).unwrap();
}

/// Catalog `blog-fr_FR.mo` in `dir` with a French plural header.
pub fn blog_catalog(dir: &Path) -> PathBuf {
    let path = dir.join("blog-fr_FR.mo");
    write_mo(
        &path,
        &[
            ("", FRENCH_HEADER),
            ("Cancel", "Annuler"),
            ("Save", "Enregistrer"),
            ("menu\x04Open", "Ouvrir"),
            ("%d comment\0%d comments", "%d commentaire\0%d commentaires"),
        ],
    );
    path
}

/// Move a file's modification time `secs` seconds into the future.
pub fn bump_mtime(path: &Path, secs: u64) {
    let file = File::options().write(true).open(path).unwrap();
    let current = file.metadata().unwrap().modified().unwrap();
    file.set_modified(current.max(SystemTime::now()) + Duration::from_secs(secs))
        .unwrap();
}

/// `.mo` importer that counts how often it runs.
#[derive(Default)]
pub struct CountingImporter {
    imports: AtomicUsize,
}

impl CountingImporter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn imports(&self) -> usize {
        self.imports.load(Ordering::SeqCst)
    }
}

impl CatalogImporter for CountingImporter {
    fn name(&self) -> &str {
        "counting"
    }

    fn import(&self, path: &Path) -> Result<Arc<dyn EntryTable>> {
        self.imports.fetch_add(1, Ordering::SeqCst);
        MoImporter.import(path)
    }
}

/// Provider answering from a fixed map; returns the source text otherwise.
pub struct MapProvider {
    name: &'static str,
    entries: HashMap<&'static str, &'static str>,
    calls: AtomicUsize,
}

impl MapProvider {
    pub fn new(name: &'static str, entries: &[(&'static str, &'static str)]) -> Arc<Self> {
        Arc::new(Self {
            name,
            entries: entries.iter().copied().collect(),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl LookupProvider for MapProvider {
    fn name(&self) -> &str {
        self.name
    }

    fn translate(&self, text: &str, _context: Option<&str>) -> String {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.entries.get(text).unwrap_or(&text).to_string()
    }

    fn translate_plural(
        &self,
        singular: &str,
        plural: &str,
        count: u64,
        _context: Option<&str>,
    ) -> String {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let text = if count == 1 { singular } else { plural };
        self.entries.get(text).unwrap_or(&text).to_string()
    }
}
