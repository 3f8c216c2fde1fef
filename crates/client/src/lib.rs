//! Storage client for the Tessera proof-backed storage network.
//!
//! [`StorageClient`] wraps one storage-service handle bound to a selected
//! provider and proof set. Callers construct it from a
//! [`ClientConfig`](tessera_api::ClientConfig), call [`StorageClient::initialize`]
//! once (idempotent, and implied by the first operation if skipped), then
//! store, retrieve, verify, resolve CDN URLs, and snapshot stats.
//!
//! # Components
//!
//! - [`StorageClient`] - upload/download with payment preflight per call
//! - [`resolve_url`] - pure CDN/gateway URL selection
//!
//! Every upload runs the payment preflight again: allowance is shared
//! mutable state and a sibling upload may have depleted it since the last
//! check. No retries are performed anywhere in this crate; errors propagate
//! wrapped and callers decide whether to retry.

#![warn(missing_docs)]

mod cdn;
mod client;

pub use cdn::{resolve_url, FILCDN_GATEWAY, IPFS_GATEWAY};
pub use client::StorageClient;
