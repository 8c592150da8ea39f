//! The `file` protocol: objects are regular files on the local filesystem.
//!
//! With an empty bucket the key is the full path (`file:///data/train/*.csv`).
//! A non-empty bucket is treated as a root directory the key is relative to.
//! Globbing uses the `glob` crate directly and keeps regular files only.
//!
//! Filesystem patterns follow the `glob` crate's rules rather than the key
//! syntax of object stores: `**` must be a whole path component
//! (`/data/**/*.csv`). A pattern like `/data/**.csv` is rejected with
//! [`ErrorKind::InvalidInput`].

use crate::io::storage::traits::{CloudIOError, CloudResult, ErrorKind, ObjectIO, ObjectMetadata};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

#[derive(Debug, Clone, Default)]
pub struct LocalObjectIO;

impl LocalObjectIO {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn resolve(bucket: &str, key: &str) -> PathBuf {
        if bucket.is_empty() {
            PathBuf::from(key)
        } else {
            Path::new(bucket).join(key)
        }
    }

    fn key_of(bucket: &str, path: &Path) -> String {
        if bucket.is_empty() {
            return path.to_string_lossy().into_owned();
        }
        path.strip_prefix(bucket)
            .unwrap_or(path)
            .to_string_lossy()
            .into_owned()
    }
}

impl ObjectIO for LocalObjectIO {
    fn put_object(&self, bucket: &str, key: &str, data: &[u8]) -> CloudResult<()> {
        let path = Self::resolve(bucket, key);
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .map_err(|e| CloudIOError::from(e).with_source(parent.display().to_string()))?;
        }
        fs::write(&path, data)
            .map_err(|e| CloudIOError::from(e).with_source(path.display().to_string()))
    }

    fn get_object(&self, bucket: &str, key: &str) -> CloudResult<Vec<u8>> {
        let path = Self::resolve(bucket, key);
        fs::read(&path).map_err(|e| CloudIOError::from(e).with_source(path.display().to_string()))
    }

    fn list_objects(&self, bucket: &str, prefix: Option<&str>) -> CloudResult<Vec<ObjectMetadata>> {
        // `**` must be a whole path component for the glob crate.
        let pattern = match prefix {
            None | Some("") => "**/*".to_string(),
            Some(p) if p.ends_with('/') => format!("{p}**/*"),
            Some(p) => format!("{p}*"),
        };
        let keys = self.glob(bucket, &pattern)?;
        keys.iter().map(|key| self.get_metadata(bucket, key)).collect()
    }

    fn object_exists(&self, bucket: &str, key: &str) -> CloudResult<bool> {
        Ok(Self::resolve(bucket, key).is_file())
    }

    fn get_metadata(&self, bucket: &str, key: &str) -> CloudResult<ObjectMetadata> {
        let path = Self::resolve(bucket, key);
        let meta = fs::metadata(&path)
            .map_err(|e| CloudIOError::from(e).with_source(path.display().to_string()))?;
        let last_modified = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .and_then(|d| i64::try_from(d.as_secs()).ok());
        Ok(ObjectMetadata {
            key: key.to_string(),
            size: meta.len(),
            last_modified,
            etag: None,
            custom_metadata: HashMap::new(),
        })
    }

    fn glob(&self, bucket: &str, pattern: &str) -> CloudResult<Vec<String>> {
        let full = Self::resolve(bucket, pattern);
        let full = full.to_string_lossy();
        let paths = glob::glob(&full).map_err(|e| {
            CloudIOError::new(
                ErrorKind::InvalidInput,
                format!("invalid glob pattern {full}: {e}"),
            )
        })?;

        let mut keys = Vec::new();
        for entry in paths {
            let path = entry.map_err(|e| {
                CloudIOError::new(
                    ErrorKind::Other,
                    format!("error reading glob entry for pattern {full}"),
                )
                .with_source(e.to_string())
            })?;
            if path.is_file() {
                keys.push(Self::key_of(bucket, &path));
            }
        }
        keys.sort();
        Ok(keys)
    }
}
