//! Error taxonomy for building and iterating a dataset.
//!
//! Public entry points return `anyhow::Result` so that I/O context accumulates
//! naturally; the underlying cause is always a [`DatasetError`], which callers
//! can recover with `err.downcast_ref::<DatasetError>()`.

use crate::io::storage::traits::CloudIOError;
use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum DatasetError {
    /// Invalid construction parameters (shard indices, zero sizes, unknown protocol, bad TOML).
    Config { message: String },
    /// Listing or fetching failed in the storage backend.
    Storage {
        object: Option<String>,
        source: CloudIOError,
    },
    /// An object's content is not a numeric CSV table.
    Parse { object: String, message: String },
    /// An object's header disagrees with the first loaded object.
    SchemaMismatch {
        object: String,
        expected: Vec<String>,
        found: Vec<String>,
    },
    /// Iteration was started over a table with no rows.
    EmptyDataset,
}

impl DatasetError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn storage(object: Option<String>, source: CloudIOError) -> Self {
        Self::Storage { object, source }
    }

    pub fn parse(object: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            object: object.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. })
    }
}

impl fmt::Display for DatasetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { message } => write!(f, "configuration error: {message}"),
            Self::Storage {
                object: Some(object),
                source,
            } => write!(f, "storage error for {object}: {source}"),
            Self::Storage {
                object: None,
                source,
            } => write!(f, "storage error: {source}"),
            Self::Parse { object, message } => write!(f, "parse error in {object}: {message}"),
            Self::SchemaMismatch {
                object,
                expected,
                found,
            } => write!(
                f,
                "schema mismatch in {object}: expected columns {expected:?}, found {found:?}"
            ),
            Self::EmptyDataset => write!(f, "cannot iterate over an empty dataset"),
        }
    }
}

impl Error for DatasetError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage { source, .. } => Some(source),
            _ => None,
        }
    }
}
