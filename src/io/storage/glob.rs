//! Protocol-qualified object URLs and glob expansion over object keys.
//!
//! A dataset is described by a single pattern such as
//! `s3://training-data/2024/*/part-*.csv.gz`. This module splits that pattern
//! into protocol, bucket and key pattern ([`Location`]), expands the key pattern
//! against an [`ObjectIO`] backend, and names each match with an [`ObjectRef`].
//!
//! # Pattern Syntax
//!
//! - `*` matches any sequence of characters within one path component
//! - `**` matches across path components
//! - `?` matches any single character
//!
//! Everything else is literal. Results are always sorted, so every worker that
//! lists the same pattern sees the same order.

use crate::io::storage::traits::{CloudIOError, CloudResult, ErrorKind, ObjectIO};
use regex::Regex;
use std::fmt;

/// Protocol used when a pattern carries no `scheme://` prefix.
pub const DEFAULT_PROTOCOL: &str = "file";

/// Split `url` into `(protocol, path)`.
///
/// ```
/// use object_storage_dataset::io::storage::glob::split_protocol;
///
/// assert_eq!(split_protocol("s3://bucket/a/*.csv"), ("s3", "bucket/a/*.csv"));
/// assert_eq!(split_protocol("/tmp/data/*.csv"), ("file", "/tmp/data/*.csv"));
/// ```
#[must_use]
pub fn split_protocol(url: &str) -> (&str, &str) {
    match url.split_once("://") {
        Some((protocol, path)) if !protocol.is_empty() => (protocol, path),
        _ => (DEFAULT_PROTOCOL, url),
    }
}

/// A parsed, protocol-qualified pattern (or path).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub protocol: String,
    /// Empty for the `file` protocol, where `key` is the full path.
    pub bucket: String,
    pub key: String,
}

impl Location {
    /// Parse a protocol-qualified pattern.
    ///
    /// For object-store protocols the first path component names the bucket.
    ///
    /// # Errors
    /// Returns [`ErrorKind::InvalidInput`] when an object-store URL has no bucket
    /// or no key component.
    pub fn parse(url: &str) -> CloudResult<Self> {
        let (protocol, path) = split_protocol(url);
        if protocol == DEFAULT_PROTOCOL {
            return Ok(Self {
                protocol: protocol.to_string(),
                bucket: String::new(),
                key: path.to_string(),
            });
        }

        match path.split_once('/') {
            Some((bucket, key)) if !bucket.is_empty() && !key.is_empty() => Ok(Self {
                protocol: protocol.to_string(),
                bucket: bucket.to_string(),
                key: key.to_string(),
            }),
            _ => Err(CloudIOError::new(
                ErrorKind::InvalidInput,
                format!("expected {protocol}://<bucket>/<key pattern>, got {url}"),
            )),
        }
    }

    /// The reference for a concrete key within this location's bucket.
    #[must_use]
    pub fn object(&self, key: impl Into<String>) -> ObjectRef {
        ObjectRef {
            protocol: self.protocol.clone(),
            bucket: self.bucket.clone(),
            key: key.into(),
        }
    }
}

/// Identifier of one listed object. Immutable once listed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectRef {
    pub protocol: String,
    pub bucket: String,
    pub key: String,
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.bucket.is_empty() {
            write!(f, "{}://{}", self.protocol, self.key)
        } else {
            write!(f, "{}://{}/{}", self.protocol, self.bucket, self.key)
        }
    }
}

/// A compiled glob over object keys.
#[derive(Debug, Clone)]
pub struct KeyPattern {
    pattern: String,
    regex: Regex,
}

impl KeyPattern {
    /// Compile a glob pattern.
    ///
    /// # Errors
    /// Returns [`ErrorKind::InvalidInput`] if the translated expression fails to compile.
    pub fn new(pattern: &str) -> CloudResult<Self> {
        let regex = Regex::new(&glob_to_regex(pattern)).map_err(|e| {
            CloudIOError::new(
                ErrorKind::InvalidInput,
                format!("Invalid glob pattern '{pattern}': {e}"),
            )
        })?;
        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    #[must_use]
    pub fn matches(&self, key: &str) -> bool {
        self.regex.is_match(key)
    }

    /// The static prefix before the first wildcard, usable as a listing prefix.
    #[must_use]
    pub fn literal_prefix(&self) -> Option<&str> {
        match self.pattern.find(['*', '?']) {
            Some(0) => None,
            Some(pos) => Some(&self.pattern[..pos]),
            None => Some(&self.pattern),
        }
    }
}

/// Convert a glob pattern to an anchored regex.
fn glob_to_regex(pattern: &str) -> String {
    let mut regex = String::from("^");
    let mut chars = pattern.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '*' => {
                if chars.peek() == Some(&'*') {
                    chars.next();
                    regex.push_str(".*");
                } else {
                    regex.push_str("[^/]*");
                }
            }
            '?' => regex.push_str("[^/]"),
            '.' | '+' | '(' | ')' | '|' | '[' | ']' | '{' | '}' | '^' | '$' | '\\' => {
                regex.push('\\');
                regex.push(ch);
            }
            _ => regex.push(ch),
        }
    }

    regex.push('$');
    regex
}

/// Expand a key glob against `storage`, returning matching keys in sorted order.
///
/// # Errors
///
/// Returns an error if:
/// - The glob pattern is invalid
/// - The bucket doesn't exist or cannot be listed
pub fn expand_key_glob<S>(storage: &S, bucket: &str, pattern: &str) -> CloudResult<Vec<String>>
where
    S: ObjectIO + ?Sized,
{
    let pattern = KeyPattern::new(pattern)?;
    let mut keys: Vec<String> = storage
        .list_objects(bucket, pattern.literal_prefix())?
        .into_iter()
        .map(|meta| meta.key)
        .filter(|key| pattern.matches(key))
        .collect();
    keys.sort();
    Ok(keys)
}

/// Resolve a protocol-qualified pattern to the sorted list of matching objects.
///
/// The backend must already be the one registered for `location.protocol`.
/// An empty result is not an error.
///
/// # Errors
/// Returns the backend's error when listing fails.
pub fn list_matching<S>(storage: &S, location: &Location) -> CloudResult<Vec<ObjectRef>>
where
    S: ObjectIO + ?Sized,
{
    let keys = storage.glob(&location.bucket, &location.key)?;
    Ok(keys.into_iter().map(|key| location.object(key)).collect())
}
