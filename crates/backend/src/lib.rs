//! Backend resolution for the Tessera storage client.
//!
//! Two interchangeable backend implementations sit behind the
//! [`StorageBackend`](tessera_api::StorageBackend) seam:
//!
//! - [`RealBackend`] - HTTP adapter against the storage network's operator
//!   API
//! - [`SubstituteBackend`] - in-process backend for development and testing
//!
//! [`BackendHandle`] owns the selection: it resolves once per handle
//! (single-flight), caches the result, and never falls back silently in
//! production.

#![warn(missing_docs)]

mod real;
mod resolver;
mod substitute;

pub use real::RealBackend;
pub use resolver::BackendHandle;
pub use substitute::SubstituteBackend;
