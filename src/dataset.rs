//! [`ObjectStorageDataset`]: list, shard, cache, load, then batch.

use crate::batcher::{CyclicBatches, Remaining};
use crate::cache::{CacheStats, CachingFetcher};
use crate::config::{DatasetConfig, IterationBudget, LoadPolicy};
use crate::error::DatasetError;
use crate::io::storage::glob::{Location, ObjectRef, list_matching};
use crate::io::storage::registry::StorageRegistry;
use crate::loader::{delimiter_byte, load_table};
use crate::shard::ShardAssignment;
use crate::table::Table;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

/// A table of rows loaded from object storage, served as cyclic batches.
///
/// Construction does all the I/O (listing, downloading into the cache,
/// parsing); iteration only slices the in-memory table.
///
/// ```no_run
/// use object_storage_dataset::{DatasetConfig, ObjectStorageDataset};
///
/// let config = DatasetConfig::new("/data/train/*.csv").batch_size(64).iterations(100);
/// let mut dataset = ObjectStorageDataset::new(config)?;
/// for batch in dataset.batches()? {
///     assert_eq!(batch.num_rows(), 64);
/// }
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Debug)]
pub struct ObjectStorageDataset {
    location: Location,
    objects: Vec<ObjectRef>,
    shard: ShardAssignment,
    load_policy: LoadPolicy,
    table: Table,
    batch_size: usize,
    iterations: Option<usize>,
    budget: IterationBudget,
    remaining: usize,
    cache_dir: PathBuf,
    cache_stats: CacheStats,
}

impl ObjectStorageDataset {
    /// Build a dataset using the default registry (`file` protocol only).
    ///
    /// # Errors
    /// See [`ObjectStorageDataset::with_registry`].
    pub fn new(config: DatasetConfig) -> Result<Self> {
        Self::with_registry(config, &StorageRegistry::default())
    }

    /// Build a dataset, resolving the glob's protocol through `registry`.
    ///
    /// # Errors
    ///
    /// Returns an error wrapping a [`DatasetError`]:
    /// - `Config` for invalid parameters or an unregistered protocol
    /// - `Storage` if listing or any download fails
    /// - `Parse` / `SchemaMismatch` if any object is not a compatible numeric CSV
    pub fn with_registry(config: DatasetConfig, registry: &StorageRegistry) -> Result<Self> {
        config.validate()?;
        let shard = ShardAssignment::new(config.worker, config.replicas)?;
        let delimiter = delimiter_byte(config.delimiter)?;

        let location = Location::parse(&config.glob)
            .map_err(|e| DatasetError::config(format!("invalid glob {}: {e}", config.glob)))?;
        let options = config.resolved_storage_options();
        let backend = registry
            .resolve(&location.protocol, &options)
            .map_err(|e| DatasetError::config(e.message))?;

        let objects = list_matching(backend.as_ref(), &location)
            .map_err(|e| DatasetError::storage(None, e))
            .with_context(|| format!("list {}", config.glob))?;
        info!(
            glob = %config.glob,
            protocol = %location.protocol,
            anonymous = options.is_anonymous(),
            matched = objects.len(),
            "listed objects"
        );

        let cache_dir = config.resolved_cache_dir();
        let mut fetcher = CachingFetcher::new(backend, cache_dir.clone());
        let table = load_table(&mut fetcher, &objects, config.load_policy, shard, delimiter)
            .with_context(|| format!("load dataset {}", config.glob))?;

        let batch_size = config.batch_size.unwrap_or(table.len());
        Ok(Self {
            location,
            objects,
            shard,
            load_policy: config.load_policy,
            table,
            batch_size,
            iterations: config.iterations,
            budget: config.iteration_budget,
            remaining: config.iterations.unwrap_or(0),
            cache_dir,
            cache_stats: fetcher.stats(),
        })
    }

    /// Start a pass of cyclic batches with the cursor at row 0.
    ///
    /// With [`IterationBudget::Shared`] a bounded pass draws from the dataset's
    /// counter, so restarting continues the original budget rather than
    /// renewing it; call [`ObjectStorageDataset::reset_iterations`] to renew.
    ///
    /// # Errors
    /// Returns [`DatasetError::EmptyDataset`] if no rows were loaded.
    pub fn batches(&mut self) -> Result<CyclicBatches<'_>, DatasetError> {
        let remaining = match (self.iterations, self.budget) {
            (None, _) => Remaining::Unbounded,
            (Some(n), IterationBudget::PerPass) => Remaining::Owned(n),
            (Some(_), IterationBudget::Shared) => Remaining::Shared(&mut self.remaining),
        };
        CyclicBatches::new(&self.table, self.batch_size, remaining)
    }

    /// Restore a shared iteration budget to the configured count.
    pub fn reset_iterations(&mut self) {
        self.remaining = self.iterations.unwrap_or(0);
    }

    /// Batches left in the shared budget; `None` when unbounded or per-pass.
    #[must_use]
    pub fn remaining_iterations(&self) -> Option<usize> {
        match (self.iterations, self.budget) {
            (Some(_), IterationBudget::Shared) => Some(self.remaining),
            _ => None,
        }
    }

    /// Every object the glob matched, in listing order.
    #[must_use]
    pub fn objects(&self) -> &[ObjectRef] {
        &self.objects
    }

    /// The objects this worker actually loaded.
    #[must_use]
    pub fn loaded_objects(&self) -> &[ObjectRef] {
        match self.load_policy {
            LoadPolicy::NodeMemory => &self.objects,
            LoadPolicy::ClusterMemory => self.shard.select(&self.objects),
            LoadPolicy::Skip => &[],
        }
    }

    #[must_use]
    pub fn location(&self) -> &Location {
        &self.location
    }

    #[must_use]
    pub fn shard(&self) -> ShardAssignment {
        self.shard
    }

    #[must_use]
    pub fn load_policy(&self) -> LoadPolicy {
        self.load_policy
    }

    #[must_use]
    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Rows loaded (the dataset size).
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    #[must_use]
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Cache hits and misses recorded while loading.
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache_stats
    }
}
