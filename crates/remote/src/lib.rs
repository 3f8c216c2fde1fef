//! Server-mediated storage adapter.
//!
//! Structurally the same surface as
//! [`StorageClient`](tessera_client::StorageClient), but every method is an
//! HTTP call to a trusted intermediary process. This adapter exists so that
//! code running in an untrusted context never holds signing credentials:
//! all deposits, approvals and uploads are signed only inside the process
//! that runs the real storage client behind these endpoints.
//!
//! The CDN URL is the one operation computed locally - it needs no secret
//! material - using the same selection rule as the direct client.

#![warn(missing_docs)]

mod client;
mod wire;

pub use client::RemoteClient;
pub use wire::PayloadFormat;
