//! Core primitive types for the Tessera storage client.
//!
//! This crate provides the fundamental value types used across the Tessera
//! stack, kept separate to avoid circular dependencies:
//!
//! - [`ContentId`] - self-verifying content identifier
//! - [`Payload`] - upload/download payload normalization
//! - [`StorageResult`] / [`RetrievalResult`] - operation records
//! - [`ProviderInfo`] / [`ProofSetInfo`] - session metadata
//! - [`AllowanceCheck`] - payment preflight computation result
//! - [`StorageStats`] - point-in-time observability snapshot

#![warn(missing_docs)]

mod cid;
mod payload;
mod types;

pub use cid::{ContentId, InvalidContentId};
pub use payload::{Payload, MIME_JSON, MIME_OCTET_STREAM, MIME_TEXT};
pub use types::{
    AllowanceCheck, ProofSetInfo, ProviderInfo, RetrievalResult, StorageResult, StorageStats,
};

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn timestamp_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
