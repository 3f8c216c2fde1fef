//! Remote client implementation.

use parking_lot::RwLock;
use tracing::{debug, warn};

use tessera_api::{
    ClientError, ClientResult, ContentId, Payload, RetrievalResult, StorageResult, StorageStats,
};
use tessera_client::resolve_url;
use tessera_primitives::timestamp_ms;

use crate::wire::{AuthResponse, RetrieveResponse, StoreRequest};

/// Storage client whose every operation is proxied through a trusted
/// intermediary.
///
/// Holds no signing material. Stats are cached so that `get_stats` can
/// degrade to a stale snapshot when the intermediary is unreachable.
pub struct RemoteClient {
    base_url: String,
    http: reqwest::Client,
    cdn_enabled: bool,
    network: String,
    cached_stats: RwLock<Option<StorageStats>>,
}

impl RemoteClient {
    /// Create a client against the intermediary's base URL.
    pub fn new(base_url: impl Into<String>, network: impl Into<String>, cdn_enabled: bool) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            http: reqwest::Client::new(),
            cdn_enabled,
            network: network.into(),
            cached_stats: RwLock::new(None),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Confirm the intermediary is authenticated and initialized.
    ///
    /// The remote side owns the actual initialization; this only checks its
    /// status and fails if the trusted process is not ready.
    pub async fn initialize(&self) -> ClientResult<()> {
        let response = self
            .http
            .get(self.url("/auth"))
            .send()
            .await
            .map_err(|e| ClientError::initialization(format!("auth request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Remote {
                status: status.as_u16(),
                message: "auth endpoint rejected the request".into(),
            });
        }

        let auth: AuthResponse = response
            .json()
            .await
            .map_err(|e| ClientError::initialization(format!("auth response decode failed: {e}")))?;

        if auth.status != "authenticated" {
            return Err(ClientError::initialization(format!(
                "remote reports status {:?}",
                auth.status
            )));
        }
        if !auth.initialized {
            return Err(ClientError::initialization(
                "remote storage client is not initialized",
            ));
        }

        if let Some(stats) = auth.stats {
            *self.cached_stats.write() = Some(stats);
        }
        debug!(base_url = %self.base_url, "remote storage client ready");
        Ok(())
    }

    /// Store a payload through the intermediary.
    pub async fn store_data(&self, payload: impl Into<Payload>) -> ClientResult<StorageResult> {
        let request = StoreRequest::encode(payload.into());
        let response = self
            .http
            .post(self.url("/store"))
            .json(&request)
            .send()
            .await
            .map_err(|e| ClientError::storage(format!("store request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Remote {
                status: status.as_u16(),
                message: "store endpoint rejected the upload".into(),
            });
        }
        response
            .json()
            .await
            .map_err(|e| ClientError::storage(format!("store response decode failed: {e}")))
    }

    /// Retrieve a payload through the intermediary.
    pub async fn retrieve_data(&self, cid: &str) -> ClientResult<RetrievalResult> {
        let cid = ContentId::new(cid)?;
        let response = self
            .http
            .get(self.url("/retrieve"))
            .query(&[("cid", cid.as_str())])
            .send()
            .await
            .map_err(|e| ClientError::storage(format!("retrieve request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Remote {
                status: status.as_u16(),
                message: format!("retrieve endpoint rejected the request for {cid}"),
            });
        }

        let body: RetrieveResponse = response
            .json()
            .await
            .map_err(|e| ClientError::storage(format!("retrieve response decode failed: {e}")))?;
        let mime_type = body.mime_type.clone();
        Ok(RetrievalResult {
            payload: body.decode()?,
            mime_type,
        })
    }

    /// Derive a fetchable URL for an identifier.
    ///
    /// Computed locally - no secret material is involved - with the same
    /// rule as the direct client, using the provider endpoint from the last
    /// cached stats snapshot when one is known.
    pub fn get_cdn_url(&self, cid: &str) -> ClientResult<String> {
        let cached = self.cached_stats.read();
        let endpoint = cached
            .as_ref()
            .and_then(|s| s.provider.as_ref())
            .map(|p| p.pdp_url.as_str());
        resolve_url(self.cdn_enabled, endpoint, cid)
    }

    /// Fetch the intermediary's stats, merging into the local cache.
    ///
    /// Never fails: when the intermediary is unreachable the last cached
    /// snapshot is returned with an `error` marker (or a minimal snapshot if
    /// nothing was ever cached).
    pub async fn get_stats(&self) -> StorageStats {
        match self.fetch_stats().await {
            Ok(stats) => {
                *self.cached_stats.write() = Some(stats.clone());
                stats
            }
            Err(e) => {
                warn!(%e, "stats fetch failed, serving stale snapshot");
                let cached = self.cached_stats.read().clone();
                match cached {
                    Some(mut stats) => {
                        stats.error = Some(e.to_string());
                        stats
                    }
                    None => StorageStats {
                        network: self.network.clone(),
                        provider: None,
                        proof_set_id: None,
                        cdn_enabled: self.cdn_enabled,
                        balance: None,
                        error: Some(e.to_string()),
                        last_updated_ms: timestamp_ms(),
                    },
                }
            }
        }
    }

    async fn fetch_stats(&self) -> ClientResult<StorageStats> {
        let response = self
            .http
            .get(self.url("/stats"))
            .send()
            .await
            .map_err(|e| ClientError::storage(format!("stats request failed: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Remote {
                status: status.as_u16(),
                message: "stats endpoint rejected the request".into(),
            });
        }
        response
            .json()
            .await
            .map_err(|e| ClientError::storage(format!("stats response decode failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_client(cdn: bool) -> RemoteClient {
        // Port 1 refuses connections immediately.
        RemoteClient::new("http://127.0.0.1:1/api/storage", "calibration", cdn)
    }

    #[tokio::test]
    async fn test_empty_cid_rejected_locally() {
        let client = unreachable_client(false);
        let err = client.retrieve_data("").await.expect_err("empty cid");
        assert!(matches!(err, ClientError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_cdn_url_without_cached_provider() {
        let client = unreachable_client(false);
        assert_eq!(
            client.get_cdn_url("Qm123").expect("resolves"),
            "https://ipfs.io/ipfs/Qm123"
        );

        let cdn_client = unreachable_client(true);
        assert_eq!(
            cdn_client.get_cdn_url("Qm123").expect("resolves"),
            "https://gateway.filcdn.io/ipfs/Qm123"
        );
    }

    #[tokio::test]
    async fn test_stats_degrade_without_cache() {
        let client = unreachable_client(false);
        let stats = client.get_stats().await;
        assert_eq!(stats.network, "calibration");
        assert!(stats.error.is_some());
        assert!(stats.balance.is_none());
    }

    #[tokio::test]
    async fn test_stats_degrade_to_stale_cache() {
        let client = unreachable_client(false);
        let cached = StorageStats {
            network: "calibration".into(),
            provider: None,
            proof_set_id: Some(42),
            cdn_enabled: false,
            balance: None,
            error: None,
            last_updated_ms: 7,
        };
        *client.cached_stats.write() = Some(cached);

        let stats = client.get_stats().await;
        assert_eq!(stats.proof_set_id, Some(42));
        assert!(stats.error.is_some(), "stale snapshot carries the error marker");
    }

    #[tokio::test]
    async fn test_initialize_fails_when_unreachable() {
        let client = unreachable_client(false);
        let err = client.initialize().await.expect_err("unreachable");
        assert!(matches!(err, ClientError::Initialization { .. }));
    }
}
