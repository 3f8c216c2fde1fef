//! Tessera API - core abstractions for the proof-backed storage client.
//!
//! This crate defines the seams between the storage client and its backends.
//! Implementations live elsewhere: the real HTTP adapter and the in-process
//! substitute in `tessera-backend`, the payment preflight in
//! `tessera-payment`, and the client itself in `tessera-client`.
//!
//! # Core Concepts
//!
//! - [`StorageBackend`] - connects sessions against one of two
//!   interchangeable deployments (real network or substitute)
//! - [`StorageSession`] - payment escrow and storage-service construction
//! - [`StorageService`] - upload/download/verify bound to one provider and
//!   proof set
//! - [`SessionEvent`] - typed progress events during service construction
//! - [`ClientError`] - the error taxonomy shared across the stack
//!
//! # Design Principles
//!
//! - Traits define *what*, implementations define *how*
//! - Backend selection never leaks to callers beyond [`StorageBackend::is_substitute`]
//! - Errors are wrapped with operation context at component boundaries,
//!   never swallowed (stats paths degrade instead, see `tessera-client`)

#![warn(missing_docs)]

mod config;
mod error;
mod event;
mod traits;

pub use config::{BackendMode, ClientConfig, TOKEN};
pub use error::{ClientError, ClientResult};
pub use event::{EventSender, SessionEvent};
pub use traits::{StorageBackend, StorageService, StorageSession};

// Re-export primitives for convenience
pub use tessera_primitives::{
    AllowanceCheck, ContentId, Payload, ProofSetInfo, ProviderInfo, RetrievalResult, StorageResult,
    StorageStats,
};
