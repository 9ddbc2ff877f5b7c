//! Concurrent lookups against one cache instance.

mod common;

use std::sync::{Arc, Barrier};
use std::thread;

use common::{CountingImporter, blog_catalog};
use mocache::{LoadOutcome, PersistOutcome, TranslationCache};

#[test]
fn concurrent_misses_import_once() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = blog_catalog(dir.path());
    let importer = CountingImporter::new();
    let cache = Arc::new(
        TranslationCache::builder("blog", &catalog)
            .snapshot_dir(dir.path())
            .importer(Arc::clone(&importer) as _)
            .build()
            .unwrap(),
    );

    let barrier = Arc::new(Barrier::new(8));
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let cache = Arc::clone(&cache);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let text = if i % 2 == 0 { "Cancel" } else { "Save" };
                cache.translate(text, None)
            })
        })
        .collect();

    for (i, h) in handles.into_iter().enumerate() {
        let expected = if i % 2 == 0 { "Annuler" } else { "Enregistrer" };
        assert_eq!(h.join().expect("thread panicked"), expected);
    }
    assert_eq!(importer.imports(), 1);
    assert_eq!(cache.len(), 2);
}

#[test]
fn concurrent_flushes_write_once() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = blog_catalog(dir.path());
    let cache = Arc::new(
        TranslationCache::builder("blog", &catalog)
            .snapshot_dir(dir.path())
            .build()
            .unwrap(),
    );
    cache.translate("Cancel", None);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || cache.flush())
        })
        .collect();
    let written = handles
        .into_iter()
        .map(|h| h.join().expect("thread panicked"))
        .filter(|outcome| matches!(outcome, PersistOutcome::Written { .. }))
        .count();
    assert_eq!(written, 1);

    drop(cache);
    let reopened = TranslationCache::builder("blog", &catalog)
        .snapshot_dir(dir.path())
        .build()
        .unwrap();
    assert_eq!(reopened.load_outcome(), LoadOutcome::Loaded(1));
}

#[test]
fn lookups_during_flush_are_persisted_later() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = blog_catalog(dir.path());
    let cache = Arc::new(
        TranslationCache::builder("blog", &catalog)
            .snapshot_dir(dir.path())
            .build()
            .unwrap(),
    );

    let writer = {
        let cache = Arc::clone(&cache);
        thread::spawn(move || {
            for text in ["Cancel", "Save", "Publish", "Delete"] {
                cache.translate(text, None);
            }
        })
    };
    cache.flush();
    writer.join().expect("thread panicked");
    cache.flush();
    drop(cache);

    let reopened = TranslationCache::builder("blog", &catalog)
        .snapshot_dir(dir.path())
        .build()
        .unwrap();
    assert_eq!(reopened.load_outcome(), LoadOutcome::Loaded(4));
}
