// Integration tests for the local object cache

mod common;

use anyhow::Result;
use object_storage_dataset::cache::cache_key;
use object_storage_dataset::io::storage::{Location, ObjectIO};
use object_storage_dataset::testing::{TempCacheDir, memory_registry, numbered_csv, seeded_storage};
use object_storage_dataset::{CacheStats, CachingFetcher, DatasetConfig, ObjectStorageDataset};
use std::io::Read;
use std::sync::Arc;

// ============================================================================
// Cache Hits
// ============================================================================

#[test]
fn test_second_construction_is_served_from_the_cache() -> Result<()> {
    common::init_tracing();
    let storage = seeded_storage(
        "bucket",
        &[("a.csv", numbered_csv(0, 3, 2)), ("b.csv", numbered_csv(3, 3, 2))],
    )?;
    let registry = memory_registry(&storage);
    let cache = TempCacheDir::new()?;
    let config = DatasetConfig::new("memory://bucket/*.csv").cache_dir(cache.path());

    let first = ObjectStorageDataset::with_registry(config.clone(), &registry)?;
    assert_eq!(first.cache_stats(), CacheStats { hits: 0, misses: 2 });
    assert_eq!(storage.get_count(), 2);
    assert_eq!(cache.entry_count()?, 2);

    let second = ObjectStorageDataset::with_registry(config, &registry)?;
    assert_eq!(second.cache_stats(), CacheStats { hits: 2, misses: 0 });
    assert_eq!(storage.get_count(), 2, "no new downloads");
    assert_eq!(second.table(), first.table());
    Ok(())
}

#[test]
fn test_cached_entries_are_never_refreshed() -> Result<()> {
    let storage = seeded_storage("bucket", &[("a.csv", numbered_csv(0, 2, 1))])?;
    let registry = memory_registry(&storage);
    let cache = TempCacheDir::new()?;
    let config = DatasetConfig::new("memory://bucket/*.csv").cache_dir(cache.path());

    let before = ObjectStorageDataset::with_registry(config.clone(), &registry)?;
    storage.put_object("bucket", "a.csv", numbered_csv(5, 4, 1).as_bytes())?;
    let after = ObjectStorageDataset::with_registry(config, &registry)?;

    assert_eq!(before.len(), 2);
    assert_eq!(after.len(), 2);
    Ok(())
}

// ============================================================================
// Cache Layout
// ============================================================================

#[test]
fn test_entries_are_named_by_url_digest() -> Result<()> {
    let storage = seeded_storage("bucket", &[("dir/a.csv", "x\n1\n")])?;
    let cache = TempCacheDir::new()?;
    let mut fetcher = CachingFetcher::new(Arc::new(storage), cache.path());

    let object = Location::parse("s3://bucket/dir/*.csv")?.object("dir/a.csv");
    let key = cache_key(&object);
    assert_eq!(key.len(), 64);
    assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(fetcher.cached_path(&object), cache.path().join(&key));

    let mut body = String::new();
    fetcher.open(&object)?.read_to_string(&mut body)?;
    assert_eq!(body, "x\n1\n");
    assert!(cache.path().join(&key).is_file());

    // Same key under another protocol is a different entry.
    let other = Location::parse("gs://bucket/dir/*.csv")?.object("dir/a.csv");
    assert_ne!(cache_key(&other), key);
    Ok(())
}

#[test]
fn test_missing_cache_dir_is_created() -> Result<()> {
    let storage = seeded_storage("bucket", &[("a.csv", "x\n1\n")])?;
    let root = TempCacheDir::new()?;
    let nested = root.path().join("deep").join("cache");
    let mut fetcher = CachingFetcher::new(Arc::new(storage), &nested);

    let object = Location::parse("memory://bucket/a.csv")?.object("a.csv");
    fetcher.open(&object)?;
    assert!(fetcher.cached_path(&object).is_file());
    assert_eq!(fetcher.stats(), CacheStats { hits: 0, misses: 1 });
    Ok(())
}

#[test]
fn test_failed_download_leaves_no_entry() -> Result<()> {
    let storage = seeded_storage("bucket", &[("a.csv", "x\n1\n")])?;
    let cache = TempCacheDir::new()?;
    let mut fetcher = CachingFetcher::new(Arc::new(storage), cache.path());

    let object = Location::parse("memory://bucket/a.csv")?.object("missing.csv");
    assert!(fetcher.open(&object).is_err());
    assert_eq!(cache.entry_count()?, 0);
    Ok(())
}
