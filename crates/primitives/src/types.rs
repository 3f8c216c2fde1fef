//! Session metadata and operation records.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::{ContentId, Payload};

/// Immutable record of a completed upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageResult {
    /// Content identifier the data was stored under.
    pub cid: ContentId,
    /// Size of the stored bytes.
    pub size: u64,
    /// Fetchable URL for the identifier (CDN or gateway).
    pub url: String,
    /// Wall-clock completion time, milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
}

/// Result of a download, with the inferred MIME type.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalResult {
    /// The downloaded payload (parsed JSON where the bytes allow it).
    pub payload: Payload,
    /// Inferred MIME type, never supplied by the caller.
    pub mime_type: String,
}

/// Identity and reachability of the storage provider bound to a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderInfo {
    /// On-chain owner address of the provider.
    pub owner: Address,
    /// Provider's proof-data-possession service endpoint.
    pub pdp_url: String,
    /// Empirical download speed, updated after each retrieval.
    pub speed_bytes_per_sec: u64,
}

/// The billing/verification group uploads are attached to.
///
/// A session resolves to exactly one active proof set: reusing an existing
/// one is free, creating one incurs a one-time fee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofSetInfo {
    /// Identifier of the proof set.
    pub proof_set_id: u64,
    /// Whether an existing proof set was reused rather than created.
    pub is_existing: bool,
}

/// Result of an allowance sufficiency check.
///
/// Computed by the backend, consumed immediately by the payment preflight;
/// never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllowanceCheck {
    /// Whether the currently approved allowance covers the operation.
    pub sufficient: bool,
    /// Total lockup allowance the operation requires.
    pub lockup_allowance_needed: U256,
    /// Per-period rate allowance the operation requires.
    pub rate_allowance_needed: U256,
}

/// Point-in-time operational snapshot.
///
/// Constructed fresh on every call; a failed balance query lands in
/// [`error`](Self::error) instead of failing the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageStats {
    /// Network identifier the client is connected to.
    pub network: String,
    /// Provider selected for the current session, if initialized.
    pub provider: Option<ProviderInfo>,
    /// Proof set the session resolved to, if initialized.
    pub proof_set_id: Option<u64>,
    /// Whether CDN delivery mode is enabled.
    pub cdn_enabled: bool,
    /// Escrow account balance, if the query succeeded.
    pub balance: Option<U256>,
    /// Error from the best-effort balance query, if it failed.
    pub error: Option<String>,
    /// Snapshot time, milliseconds since the Unix epoch.
    pub last_updated_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_result_wire_names() {
        let result = StorageResult {
            cid: ContentId::derive(b"x"),
            size: 1,
            url: "https://ipfs.io/ipfs/x".into(),
            timestamp_ms: 123,
        };
        let json = serde_json::to_string(&result).expect("serializes");
        assert!(json.contains("timestampMs"));
        let back: StorageResult = serde_json::from_str(&json).expect("round trips");
        assert_eq!(back, result);
    }

    #[test]
    fn test_stats_serializes_with_optional_fields_absent() {
        let stats = StorageStats {
            network: "calibration".into(),
            provider: None,
            proof_set_id: None,
            cdn_enabled: false,
            balance: None,
            error: Some("balance query failed".into()),
            last_updated_ms: 1,
        };
        let json = serde_json::to_string(&stats).expect("serializes");
        assert!(json.contains("cdnEnabled"));
    }
}
