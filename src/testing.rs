//! Fixtures for exercising datasets without real cloud storage.
//!
//! # Quick Start
//!
//! ```
//! use object_storage_dataset::testing::*;
//! use object_storage_dataset::{DatasetConfig, ObjectStorageDataset};
//!
//! # fn main() -> anyhow::Result<()> {
//! let storage = seeded_storage("bucket", &[
//!     ("a.csv", numbered_csv(0, 3, 2)),
//!     ("b.csv", numbered_csv(3, 3, 2)),
//! ])?;
//! let cache = TempCacheDir::new()?;
//!
//! let config = DatasetConfig::new("memory://bucket/*.csv").cache_dir(cache.path());
//! let dataset = ObjectStorageDataset::with_registry(config, &memory_registry(&storage))?;
//! assert_eq!(dataset.len(), 6);
//! # Ok(())
//! # }
//! ```

use crate::io::storage::fake::FakeObjectIO;
use crate::io::storage::registry::StorageRegistry;
use crate::io::storage::traits::{CloudResult, ObjectIO};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Protocols [`memory_registry`] routes to the fake backend.
pub const FAKE_PROTOCOLS: &[&str] = &["memory", "s3", "gs", "az"];

/// A temporary cache directory that is deleted when dropped.
pub struct TempCacheDir {
    #[allow(dead_code)]
    temp_dir: TempDir,
    path: PathBuf,
}

impl TempCacheDir {
    /// # Errors
    ///
    /// Returns an error if the temporary directory cannot be created.
    pub fn new() -> std::io::Result<Self> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().to_path_buf();
        Ok(Self { temp_dir, path })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of entries currently cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read.
    pub fn entry_count(&self) -> std::io::Result<usize> {
        let mut count = 0;
        for entry in std::fs::read_dir(&self.path)? {
            if entry?.file_type()?.is_file() {
                count += 1;
            }
        }
        Ok(count)
    }
}

/// A CSV with header `c0,c1,...` and `rows` rows where cell `(r, c)` is
/// `(first_row + r) * 10 + c`, so every row identifies itself.
#[must_use]
pub fn numbered_csv(first_row: usize, rows: usize, columns: usize) -> String {
    let mut out = (0..columns)
        .map(|c| format!("c{c}"))
        .collect::<Vec<_>>()
        .join(",");
    out.push('\n');
    for r in first_row..first_row + rows {
        let line = (0..columns)
            .map(|c| (r * 10 + c).to_string())
            .collect::<Vec<_>>()
            .join(",");
        let _ = writeln!(out, "{line}");
    }
    out
}

/// The first cell of a row produced by [`numbered_csv`], as a row number.
#[must_use]
pub fn row_id(row: &[f64]) -> usize {
    row.first().map_or(usize::MAX, |v| (*v as usize) / 10)
}

/// A fake store with `bucket` created and `objects` uploaded.
///
/// # Errors
///
/// Returns an error if an upload fails.
pub fn seeded_storage<S: AsRef<[u8]>>(
    bucket: &str,
    objects: &[(&str, S)],
) -> CloudResult<FakeObjectIO> {
    let storage = FakeObjectIO::new();
    storage.create_bucket(bucket)?;
    for (key, body) in objects {
        storage.put_object(bucket, key, body.as_ref())?;
    }
    Ok(storage)
}

/// The default registry plus [`FAKE_PROTOCOLS`] routed to `storage`.
#[must_use]
pub fn memory_registry(storage: &FakeObjectIO) -> StorageRegistry {
    let mut registry = StorageRegistry::default();
    for protocol in FAKE_PROTOCOLS {
        registry.register_backend(*protocol, Arc::new(storage.clone()));
    }
    registry
}
