//! Local read-through cache for fetched objects.
//!
//! Every object is stored under the cache directory as a file named by the
//! hex SHA-256 of its URL. A cached file is never refreshed: invalidation and
//! eviction are left to whoever owns the directory.

use crate::error::DatasetError;
use crate::io::storage::glob::ObjectRef;
use crate::io::storage::traits::ObjectIO;
use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Hit/miss counters for one [`CachingFetcher`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
}

/// Cache file name for an object: hex SHA-256 of its URL.
#[must_use]
pub fn cache_key(object: &ObjectRef) -> String {
    Sha256::digest(object.to_string().as_bytes())
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

pub struct CachingFetcher {
    backend: Arc<dyn ObjectIO>,
    cache_dir: PathBuf,
    stats: CacheStats,
}

impl CachingFetcher {
    pub fn new(backend: Arc<dyn ObjectIO>, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            cache_dir: cache_dir.into(),
            stats: CacheStats::default(),
        }
    }

    #[must_use]
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Where `object` is (or would be) cached.
    #[must_use]
    pub fn cached_path(&self, object: &ObjectRef) -> PathBuf {
        self.cache_dir.join(cache_key(object))
    }

    /// Open `object` for reading, downloading it into the cache first if needed.
    ///
    /// # Errors
    /// Returns [`DatasetError::Storage`] if the download fails, or an I/O error
    /// if the cache directory cannot be written or read.
    pub fn open(&mut self, object: &ObjectRef) -> Result<File> {
        let path = self.cached_path(object);

        if path.is_file() {
            self.stats.hits += 1;
            debug!(%object, path = %path.display(), "cache hit");
        } else {
            self.stats.misses += 1;
            debug!(%object, path = %path.display(), "cache miss, fetching");
            let bytes = self
                .backend
                .get_object(&object.bucket, &object.key)
                .map_err(|e| DatasetError::storage(Some(object.to_string()), e))?;
            self.store(&path, &bytes)
                .with_context(|| format!("cache {object} at {}", path.display()))?;
        }

        File::open(&path).with_context(|| format!("open {}", path.display()))
    }

    /// Write `bytes` to `path` via a temp file in the same directory, so a
    /// failed download never leaves a truncated entry behind.
    fn store(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        fs::create_dir_all(&self.cache_dir)
            .with_context(|| format!("mkdir -p {}", self.cache_dir.display()))?;
        let mut tmp = tempfile::NamedTempFile::new_in(&self.cache_dir)
            .with_context(|| format!("create temp file in {}", self.cache_dir.display()))?;
        tmp.write_all(bytes)?;
        tmp.flush()?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }
}
