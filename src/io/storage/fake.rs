//! In-memory object storage for tests and demos.
//!
//! [`FakeObjectIO`] keeps buckets in a shared map, counts the downloads it
//! serves (so cache behaviour is observable), and can be told to fail specific
//! keys to exercise error propagation.

use crate::io::storage::traits::{CloudIOError, CloudResult, ErrorKind, ObjectIO, ObjectMetadata};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

type BucketStorage = Arc<Mutex<HashMap<String, HashMap<String, Vec<u8>>>>>;
type FailureMap = Arc<Mutex<HashMap<(String, String), ErrorKind>>>;

#[derive(Clone, Default)]
pub struct FakeObjectIO {
    storage: BucketStorage,
    failures: FailureMap,
    gets: Arc<AtomicUsize>,
    lists: Arc<AtomicUsize>,
}

fn poisoned(what: &str) -> CloudIOError {
    CloudIOError::new(ErrorKind::InternalError, format!("{what} mutex poisoned"))
}

impl FakeObjectIO {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty bucket so that listing it succeeds with no results.
    ///
    /// # Errors
    /// Returns an error if the internal lock is poisoned.
    pub fn create_bucket(&self, bucket: &str) -> CloudResult<()> {
        self.buckets()?.entry(bucket.to_string()).or_default();
        Ok(())
    }

    /// Make every subsequent `get_object` of `bucket/key` fail with `kind`.
    ///
    /// # Errors
    /// Returns an error if the internal lock is poisoned.
    pub fn fail_get(&self, bucket: &str, key: &str, kind: ErrorKind) -> CloudResult<()> {
        self.failures
            .lock()
            .map_err(|_| poisoned("failure map"))?
            .insert((bucket.to_string(), key.to_string()), kind);
        Ok(())
    }

    /// Number of `get_object` calls served (successful or not).
    #[must_use]
    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    /// Number of `list_objects` calls served.
    #[must_use]
    pub fn list_count(&self) -> usize {
        self.lists.load(Ordering::SeqCst)
    }

    fn buckets(&self) -> CloudResult<MutexGuard<'_, HashMap<String, HashMap<String, Vec<u8>>>>> {
        self.storage.lock().map_err(|_| poisoned("storage"))
    }

    fn metadata(key: &str, data: &[u8]) -> ObjectMetadata {
        ObjectMetadata {
            key: key.to_string(),
            size: data.len() as u64,
            last_modified: Some(0),
            etag: Some(format!("etag-{key}")),
            custom_metadata: HashMap::new(),
        }
    }
}

impl ObjectIO for FakeObjectIO {
    fn put_object(&self, bucket: &str, key: &str, data: &[u8]) -> CloudResult<()> {
        self.buckets()?
            .entry(bucket.to_string())
            .or_default()
            .insert(key.to_string(), data.to_vec());
        Ok(())
    }

    fn get_object(&self, bucket: &str, key: &str) -> CloudResult<Vec<u8>> {
        self.gets.fetch_add(1, Ordering::SeqCst);

        let failure = self
            .failures
            .lock()
            .map_err(|_| poisoned("failure map"))?
            .get(&(bucket.to_string(), key.to_string()))
            .cloned();
        if let Some(kind) = failure {
            return Err(CloudIOError::new(
                kind,
                format!("injected failure for {bucket}/{key}"),
            ));
        }

        self.buckets()?
            .get(bucket)
            .and_then(|b| b.get(key))
            .cloned()
            .ok_or_else(|| {
                CloudIOError::new(
                    ErrorKind::NotFound,
                    format!("Object {bucket}/{key} not found"),
                )
            })
    }

    fn list_objects(&self, bucket: &str, prefix: Option<&str>) -> CloudResult<Vec<ObjectMetadata>> {
        self.lists.fetch_add(1, Ordering::SeqCst);

        let storage = self.buckets()?;
        let bucket_map = storage.get(bucket).ok_or_else(|| {
            CloudIOError::new(ErrorKind::NotFound, format!("Bucket {bucket} not found"))
        })?;

        let mut objects: Vec<ObjectMetadata> = bucket_map
            .iter()
            .filter(|(key, _)| prefix.is_none_or(|p| key.starts_with(p)))
            .map(|(key, data)| Self::metadata(key, data))
            .collect();

        drop(storage);
        objects.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(objects)
    }

    fn object_exists(&self, bucket: &str, key: &str) -> CloudResult<bool> {
        Ok(self
            .buckets()?
            .get(bucket)
            .is_some_and(|b| b.contains_key(key)))
    }

    fn get_metadata(&self, bucket: &str, key: &str) -> CloudResult<ObjectMetadata> {
        self.buckets()?
            .get(bucket)
            .and_then(|b| b.get(key))
            .map(|data| Self::metadata(key, data))
            .ok_or_else(|| {
                CloudIOError::new(
                    ErrorKind::NotFound,
                    format!("Object {bucket}/{key} not found"),
                )
            })
    }
}
