//! Protocol scheme → storage backend.
//!
//! A [`StorageRegistry`] holds one factory per protocol. Factories receive the
//! construction's [`StorageOptions`] so a real backend can pick up credentials,
//! region, endpoint and so on. The default registry knows only `file`; cloud
//! backends are registered by the application:
//!
//! ```
//! use object_storage_dataset::io::storage::{FakeObjectIO, StorageRegistry};
//! use std::sync::Arc;
//!
//! let mut registry = StorageRegistry::default();
//! registry.register_backend("s3", Arc::new(FakeObjectIO::new()));
//! assert!(registry.supports("s3"));
//! assert!(registry.supports("file"));
//! ```

use crate::config::StorageOptions;
use crate::io::storage::local::LocalObjectIO;
use crate::io::storage::traits::{CloudIOError, CloudResult, ErrorKind, ObjectIO};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Builds a backend for one dataset construction.
pub type BackendFactory =
    Arc<dyn Fn(&StorageOptions) -> CloudResult<Arc<dyn ObjectIO>> + Send + Sync>;

#[derive(Clone)]
pub struct StorageRegistry {
    factories: HashMap<String, BackendFactory>,
}

impl StorageRegistry {
    /// A registry with no protocols at all.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register `factory` for `protocol`, replacing any previous one.
    pub fn register<F>(&mut self, protocol: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&StorageOptions) -> CloudResult<Arc<dyn ObjectIO>> + Send + Sync + 'static,
    {
        self.factories.insert(protocol.into(), Arc::new(factory));
        self
    }

    /// Register an existing backend instance; every resolution shares it.
    pub fn register_backend(
        &mut self,
        protocol: impl Into<String>,
        backend: Arc<dyn ObjectIO>,
    ) -> &mut Self {
        self.register(protocol, move |_options: &StorageOptions| Ok(Arc::clone(&backend)))
    }

    #[must_use]
    pub fn supports(&self, protocol: &str) -> bool {
        self.factories.contains_key(protocol)
    }

    /// Registered protocols, sorted.
    #[must_use]
    pub fn protocols(&self) -> Vec<&str> {
        let mut protocols: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        protocols.sort_unstable();
        protocols
    }

    /// Build the backend for `protocol`.
    ///
    /// # Errors
    /// Returns [`ErrorKind::InvalidInput`] for an unregistered protocol, or the
    /// factory's own error.
    pub fn resolve(
        &self,
        protocol: &str,
        options: &StorageOptions,
    ) -> CloudResult<Arc<dyn ObjectIO>> {
        let factory = self.factories.get(protocol).ok_or_else(|| {
            CloudIOError::new(
                ErrorKind::InvalidInput,
                format!(
                    "no storage backend registered for protocol '{protocol}' (known: {})",
                    self.protocols().join(", ")
                ),
            )
        })?;
        factory(options)
    }
}

impl Default for StorageRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register("file", |_options: &StorageOptions| {
            Ok(Arc::new(LocalObjectIO::new()) as Arc<dyn ObjectIO>)
        });
        registry
    }
}

impl fmt::Debug for StorageRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageRegistry")
            .field("protocols", &self.protocols())
            .finish()
    }
}
