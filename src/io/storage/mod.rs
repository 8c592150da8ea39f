//! Object storage abstractions.
//!
//! - [`traits`] - [`ObjectIO`], the provider-agnostic backend trait, and its error type
//! - [`glob`] - protocol-qualified URLs, [`ObjectRef`], and key globbing
//! - [`registry`] - [`StorageRegistry`], mapping protocol schemes to backends
//! - [`local`] - the `file` protocol
//! - [`fake`] - an in-memory backend for tests
//!
//! ## Error Handling
//!
//! All operations return [`CloudResult<T>`] where the error is [`CloudIOError`],
//! categorized by [`ErrorKind`]. Nothing in this crate retries: a listing or
//! download failure aborts dataset construction.

pub mod fake;
pub mod glob;
pub mod local;
pub mod registry;
pub mod traits;

pub use fake::FakeObjectIO;
pub use glob::{Location, ObjectRef, list_matching, split_protocol};
pub use local::LocalObjectIO;
pub use registry::{BackendFactory, StorageRegistry};
pub use traits::*;
