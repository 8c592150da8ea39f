//! Dataset construction parameters.
//!
//! [`DatasetConfig`] can be built fluently:
//!
//! ```
//! use object_storage_dataset::{DatasetConfig, LoadPolicy};
//!
//! let config = DatasetConfig::new("s3://training/2024/*.csv")
//!     .batch_size(256)
//!     .iterations(1_000)
//!     .load_policy(LoadPolicy::ClusterMemory)
//!     .shard(3, 8);
//! assert!(config.validate().is_ok());
//! ```
//!
//! or read from TOML with [`DatasetConfig::from_toml_str`]. Defaults that depend
//! on the environment (cache directory, storage options) are resolved per call
//! by [`DatasetConfig::resolved_cache_dir`] and
//! [`DatasetConfig::resolved_storage_options`]; nothing is shared between
//! constructions.

use crate::error::DatasetError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Which objects a worker loads into memory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadPolicy {
    /// Every worker loads every listed object; sharding is ignored.
    #[default]
    NodeMemory,
    /// Each worker loads only its contiguous shard of the listing.
    ClusterMemory,
    /// Nothing is loaded; the table is empty.
    Skip,
}

impl LoadPolicy {
    /// Map the `fits_in_node_memory` / `fits_in_cluster_memory` flag pair.
    ///
    /// Node memory wins over cluster memory; neither flag yields [`LoadPolicy::Skip`].
    #[must_use]
    pub fn from_flags(fits_in_node_memory: bool, fits_in_cluster_memory: bool) -> Self {
        match (fits_in_node_memory, fits_in_cluster_memory) {
            (true, _) => Self::NodeMemory,
            (false, true) => Self::ClusterMemory,
            (false, false) => Self::Skip,
        }
    }
}

/// What happens to a bounded iteration count when iteration is restarted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IterationBudget {
    /// One counter per dataset, consumed across restarts until
    /// `reset_iterations` is called.
    #[default]
    Shared,
    /// Every call to `batches` starts from the configured count.
    PerPass,
}

/// Credentials and backend settings handed to the storage factory.
///
/// Defaults to anonymous access (`anon = "true"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageOptions(BTreeMap<String, String>);

impl StorageOptions {
    /// Anonymous access, the value used when no options are given.
    #[must_use]
    pub fn anonymous() -> Self {
        Self(BTreeMap::from([("anon".to_string(), "true".to_string())]))
    }

    /// No options at all (not even `anon`).
    #[must_use]
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.get("anon")
            .is_some_and(|v| v.eq_ignore_ascii_case("true") || v == "1")
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl Default for StorageOptions {
    fn default() -> Self {
        Self::anonymous()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for StorageOptions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

fn default_replicas() -> usize {
    1
}

fn default_delimiter() -> char {
    ','
}

/// Construction parameters for [`crate::ObjectStorageDataset`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDatasetConfig")]
pub struct DatasetConfig {
    /// Protocol-qualified pattern, e.g. `gs://bucket/prefix/*.csv`.
    pub glob: String,
    /// Rows per batch; the whole table when unset.
    pub batch_size: Option<usize>,
    /// Number of batches to produce; unbounded when unset.
    pub iterations: Option<usize>,
    /// Where fetched objects are cached; the system temp dir when unset.
    pub cache_dir: Option<PathBuf>,
    /// Backend options; anonymous access when unset or empty.
    pub storage_options: Option<StorageOptions>,
    pub load_policy: LoadPolicy,
    pub iteration_budget: IterationBudget,
    pub worker: usize,
    pub replicas: usize,
    /// CSV field delimiter (ASCII).
    pub delimiter: char,
}

impl DatasetConfig {
    pub fn new(glob: impl Into<String>) -> Self {
        Self {
            glob: glob.into(),
            batch_size: None,
            iterations: None,
            cache_dir: None,
            storage_options: None,
            load_policy: LoadPolicy::default(),
            iteration_budget: IterationBudget::default(),
            worker: 0,
            replicas: default_replicas(),
            delimiter: default_delimiter(),
        }
    }

    #[must_use]
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    #[must_use]
    pub fn iterations(mut self, iterations: usize) -> Self {
        self.iterations = Some(iterations);
        self
    }

    #[must_use]
    pub fn cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(cache_dir.into());
        self
    }

    #[must_use]
    pub fn storage_options(mut self, options: StorageOptions) -> Self {
        self.storage_options = Some(options);
        self
    }

    #[must_use]
    pub fn load_policy(mut self, policy: LoadPolicy) -> Self {
        self.load_policy = policy;
        self
    }

    #[must_use]
    pub fn iteration_budget(mut self, budget: IterationBudget) -> Self {
        self.iteration_budget = budget;
        self
    }

    #[must_use]
    pub fn shard(mut self, worker: usize, replicas: usize) -> Self {
        self.worker = worker;
        self.replicas = replicas;
        self
    }

    #[must_use]
    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Check every parameter that can be checked without touching storage.
    ///
    /// # Errors
    /// Returns [`DatasetError::Config`] describing the first invalid parameter.
    pub fn validate(&self) -> Result<(), DatasetError> {
        if self.glob.trim().is_empty() {
            return Err(DatasetError::config("glob must not be empty"));
        }
        if self.replicas == 0 {
            return Err(DatasetError::config(
                "the number of replicas must be a positive integer",
            ));
        }
        if self.worker >= self.replicas {
            return Err(DatasetError::config(format!(
                "worker {} must be in the range [0, {})",
                self.worker, self.replicas
            )));
        }
        if self.batch_size == Some(0) {
            return Err(DatasetError::config("batch_size must be positive"));
        }
        if self.iterations == Some(0) {
            return Err(DatasetError::config("iterations must be positive"));
        }
        if !self.delimiter.is_ascii() {
            return Err(DatasetError::config(format!(
                "delimiter {:?} is not an ASCII character",
                self.delimiter
            )));
        }
        Ok(())
    }

    /// The configured cache directory, or the platform temp dir.
    #[must_use]
    pub fn resolved_cache_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// The configured storage options, or anonymous access when unset or empty.
    #[must_use]
    pub fn resolved_storage_options(&self) -> StorageOptions {
        match &self.storage_options {
            Some(options) if !options.is_empty() => options.clone(),
            _ => StorageOptions::anonymous(),
        }
    }

    /// Parse a config from TOML.
    ///
    /// ```
    /// use object_storage_dataset::{DatasetConfig, LoadPolicy};
    ///
    /// let config = DatasetConfig::from_toml_str(r#"
    ///     glob = "s3://bucket/*.csv"
    ///     batch_size = 32
    ///     fits_in_node_memory = false
    ///     worker = 1
    ///     replicas = 4
    ///
    ///     [storage_options]
    ///     region = "eu-west-1"
    /// "#)?;
    /// assert_eq!(config.load_policy, LoadPolicy::ClusterMemory);
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    ///
    /// # Errors
    /// Returns [`DatasetError::Config`] for malformed TOML or conflicting fields.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str::<Self>(source)
            .map_err(|e| DatasetError::config(format!("parse dataset config: {e}")).into())
    }

    /// Read and parse a TOML config file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or does not parse.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("read dataset config {}", path.display()))?;
        Self::from_toml_str(&source).with_context(|| format!("load {}", path.display()))
    }
}

/// Wire form accepting the legacy flag pair alongside `load_policy`.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDatasetConfig {
    glob: String,
    #[serde(default)]
    batch_size: Option<usize>,
    #[serde(default)]
    iterations: Option<usize>,
    #[serde(default)]
    cache_dir: Option<PathBuf>,
    #[serde(default)]
    storage_options: Option<StorageOptions>,
    #[serde(default)]
    load_policy: Option<LoadPolicy>,
    #[serde(default)]
    fits_in_node_memory: Option<bool>,
    #[serde(default)]
    fits_in_cluster_memory: Option<bool>,
    #[serde(default)]
    iteration_budget: IterationBudget,
    #[serde(default)]
    worker: usize,
    #[serde(default = "default_replicas")]
    replicas: usize,
    #[serde(default = "default_delimiter")]
    delimiter: char,
}

impl TryFrom<RawDatasetConfig> for DatasetConfig {
    type Error = DatasetError;

    fn try_from(raw: RawDatasetConfig) -> Result<Self, Self::Error> {
        let flags_given = raw.fits_in_node_memory.is_some() || raw.fits_in_cluster_memory.is_some();
        let load_policy = match (raw.load_policy, flags_given) {
            (Some(_), true) => {
                return Err(DatasetError::config(
                    "load_policy cannot be combined with fits_in_node_memory/fits_in_cluster_memory",
                ));
            }
            (Some(policy), false) => policy,
            (None, _) => LoadPolicy::from_flags(
                raw.fits_in_node_memory.unwrap_or(true),
                raw.fits_in_cluster_memory.unwrap_or(true),
            ),
        };

        Ok(Self {
            glob: raw.glob,
            batch_size: raw.batch_size,
            iterations: raw.iterations,
            cache_dir: raw.cache_dir,
            storage_options: raw.storage_options,
            load_policy,
            iteration_budget: raw.iteration_budget,
            worker: raw.worker,
            replicas: raw.replicas,
            delimiter: raw.delimiter,
        })
    }
}
