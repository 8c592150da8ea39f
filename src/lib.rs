//! # object-storage-dataset
//!
//! An iterable source of training batches backed by CSV objects in object
//! storage (S3, GCS, Azure Blob, or a local directory).
//!
//! Building an [`ObjectStorageDataset`] does all of the I/O up front:
//!
//! 1. **List** the objects matching a protocol-qualified glob
//!    (`s3://bucket/train/*.csv.gz`), in sorted order
//! 2. **Shard** the listing, when each worker should load only its own slice
//! 3. **Fetch** each object through a local cache directory
//! 4. **Parse** every object as a headed numeric CSV and concatenate the rows
//!
//! Iterating then cuts fixed-size [`Batch`]es out of the in-memory [`Table`],
//! wrapping around its end, for a fixed number of iterations or forever.
//!
//! ## Quick Start
//!
//! ```no_run
//! use object_storage_dataset::*;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = DatasetConfig::new("file:///data/train/*.csv")
//!     .batch_size(128)
//!     .iterations(10_000);
//!
//! let mut dataset = ObjectStorageDataset::new(config)?;
//! for batch in dataset.batches()? {
//!     let (rows, columns) = batch.shape();
//!     // feed `batch.values()` to the model
//! #   let _ = (rows, columns);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Cloud Backends
//!
//! Only the `file` protocol is built in. Other protocols are provided by
//! registering an [`ObjectIO`](io::storage::ObjectIO) implementation in a
//! [`StorageRegistry`]; its factory receives the configured
//! [`StorageOptions`] (anonymous access by default):
//!
//! ```ignore
//! let mut registry = StorageRegistry::default();
//! registry.register("s3", |options| Ok(Arc::new(MyS3::connect(options)?) as Arc<dyn ObjectIO>));
//! let dataset = ObjectStorageDataset::with_registry(config, &registry)?;
//! ```
//!
//! ## Sharding
//!
//! [`LoadPolicy`] selects what each worker loads:
//! - [`LoadPolicy::NodeMemory`] - every worker loads everything (default)
//! - [`LoadPolicy::ClusterMemory`] - worker `w` of `r` loads the `w`-th of `r`
//!   contiguous chunks of the listing
//! - [`LoadPolicy::Skip`] - nothing is loaded
//!
//! ## Module Overview
//!
//! - [`config`] - [`DatasetConfig`], [`LoadPolicy`], [`IterationBudget`], [`StorageOptions`]
//! - [`dataset`] - [`ObjectStorageDataset`]
//! - [`batcher`] - [`CyclicBatches`], the batch iterator
//! - [`shard`] - [`ShardAssignment`]
//! - [`loader`] - fetch + decompress + parse + concatenate
//! - [`cache`] - [`CachingFetcher`]
//! - [`table`] - [`Table`] and [`Batch`]
//! - [`io`] - storage backends, globbing, compression
//! - [`testing`] - fixtures for tests

pub mod batcher;
pub mod cache;
pub mod config;
pub mod dataset;
pub mod error;
pub mod io;
pub mod loader;
pub mod shard;
pub mod table;
pub mod testing;

pub use batcher::CyclicBatches;
pub use cache::{CacheStats, CachingFetcher};
pub use config::{DatasetConfig, IterationBudget, LoadPolicy, StorageOptions};
pub use dataset::ObjectStorageDataset;
pub use error::DatasetError;
pub use io::storage::{ObjectRef, StorageRegistry};
pub use shard::ShardAssignment;
pub use table::{Batch, Table};
