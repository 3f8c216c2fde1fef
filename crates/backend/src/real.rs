//! Real network backend.
//!
//! HTTP adapter over the storage network's operator API. Payment operations
//! (allowance check, deposit, approval, balance) go to the payments surface
//! under the configured RPC endpoint; uploads go straight to the selected
//! provider's proof-data-possession endpoint. The operator is the trusted
//! process holding the wallet, so every call here carries credentials and
//! this backend must never be constructed in an untrusted context (that is
//! what `tessera-remote` is for).

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::debug;

use tessera_api::{
    AllowanceCheck, ClientConfig, ClientError, ClientResult, ContentId, EventSender, ProofSetInfo,
    ProviderInfo, SessionEvent, StorageBackend, StorageService, StorageSession,
};

/// Timeout for the initial reachability probe.
const LOAD_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Backend adapter for the real storage network.
pub struct RealBackend {
    http: reqwest::Client,
    base_url: String,
}

impl RealBackend {
    /// Load the real backend, probing the RPC endpoint for reachability.
    ///
    /// A failure here is what the resolver treats as fatal in production.
    pub async fn load(config: &ClientConfig) -> ClientResult<Self> {
        if config.wallet_key.is_none() {
            return Err(ClientError::initialization(
                "real backend requires a wallet key",
            ));
        }

        let http = reqwest::Client::builder()
            .timeout(LOAD_PROBE_TIMEOUT)
            .build()
            .map_err(|e| ClientError::initialization(format!("http client build failed: {e}")))?;

        let base_url = config.rpc_url.trim_end_matches('/').to_owned();
        http.get(format!("{base_url}/health"))
            .send()
            .await
            .map_err(|e| {
                ClientError::initialization(format!("rpc endpoint unreachable ({base_url}): {e}"))
            })?;

        Ok(Self { http, base_url })
    }
}

#[async_trait]
impl StorageBackend for RealBackend {
    async fn connect(&self, config: &ClientConfig) -> ClientResult<Arc<dyn StorageSession>> {
        // Sessions get their own client without the short probe timeout.
        let http = reqwest::Client::new();
        debug!(network = %config.network, "connecting real network session");
        Ok(Arc::new(RealSession {
            http,
            base_url: self.base_url.clone(),
            cdn_enabled: config.cdn_enabled,
        }))
    }

    fn is_substitute(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "real"
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AllowanceRequest {
    size: u64,
    cdn_enabled: bool,
}

#[derive(Serialize)]
struct DepositRequest {
    amount: U256,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ApproveRequest {
    service: Address,
    rate_allowance: U256,
    total_allowance: U256,
}

#[derive(Deserialize)]
struct BalanceResponse {
    balance: U256,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionResponse {
    provider: ProviderInfo,
    proof_set: ProofSetInfo,
    creation_tx: Option<String>,
}

#[derive(Deserialize)]
struct UploadResponse {
    cid: String,
}

/// A connected session against the real network.
struct RealSession {
    http: reqwest::Client,
    base_url: String,
    cdn_enabled: bool,
}

impl RealSession {
    async fn post_json<B: Serialize>(
        &self,
        path: &str,
        body: &B,
        op: &str,
    ) -> ClientResult<reqwest::Response> {
        let response = self
            .http
            .post(format!("{}{path}", self.base_url))
            .json(body)
            .send()
            .await
            .map_err(|e| ClientError::allowance(format!("{op} request failed: {e}")))?;
        if !response.status().is_success() {
            return Err(ClientError::allowance(format!(
                "{op} rejected with status {}",
                response.status()
            )));
        }
        Ok(response)
    }
}

#[async_trait]
impl StorageSession for RealSession {
    async fn check_allowance(&self, size: u64, cdn_enabled: bool) -> ClientResult<AllowanceCheck> {
        let response = self
            .post_json(
                "/payments/allowance",
                &AllowanceRequest { size, cdn_enabled },
                "allowance check",
            )
            .await?;
        response
            .json()
            .await
            .map_err(|e| ClientError::allowance(format!("allowance check decode failed: {e}")))
    }

    async fn deposit(&self, amount: U256) -> ClientResult<()> {
        self.post_json("/payments/deposit", &DepositRequest { amount }, "deposit")
            .await?;
        Ok(())
    }

    async fn approve_service(
        &self,
        service: Address,
        rate_allowance: U256,
        total_allowance: U256,
    ) -> ClientResult<()> {
        self.post_json(
            "/payments/approve",
            &ApproveRequest {
                service,
                rate_allowance,
                total_allowance,
            },
            "service approval",
        )
        .await?;
        Ok(())
    }

    async fn balance(&self) -> ClientResult<U256> {
        let response = self
            .http
            .get(format!("{}/payments/balance", self.base_url))
            .send()
            .await
            .map_err(|e| ClientError::storage(format!("balance query failed: {e}")))?;
        let body: BalanceResponse = response
            .json()
            .await
            .map_err(|e| ClientError::storage(format!("balance decode failed: {e}")))?;
        Ok(body.balance)
    }

    async fn create_storage_service(
        &self,
        events: EventSender,
    ) -> ClientResult<Arc<dyn StorageService>> {
        let response = self
            .http
            .post(format!("{}/storage/session", self.base_url))
            .json(&serde_json::json!({ "cdnEnabled": self.cdn_enabled }))
            .send()
            .await
            .map_err(|e| {
                ClientError::initialization(format!("storage session request failed: {e}"))
            })?;
        if !response.status().is_success() {
            return Err(ClientError::initialization(format!(
                "storage session rejected with status {}",
                response.status()
            )));
        }
        let body: SessionResponse = response
            .json()
            .await
            .map_err(|e| ClientError::initialization(format!("session decode failed: {e}")))?;

        let _ = events.send(SessionEvent::ProviderSelected(body.provider.clone()));
        if !body.proof_set.is_existing {
            let _ = events.send(SessionEvent::ProofSetCreationStarted);
            if let Some(tx) = body.creation_tx {
                let _ = events.send(SessionEvent::ProofSetTransactionMined { tx });
            }
            let _ = events.send(SessionEvent::ProofSetLive {
                proof_set_id: body.proof_set.proof_set_id,
            });
        }
        let _ = events.send(SessionEvent::ProofSetResolved(body.proof_set));

        Ok(Arc::new(RealService {
            http: self.http.clone(),
            pdp_url: body.provider.pdp_url,
        }))
    }
}

/// A storage service bound to one provider on the real network.
struct RealService {
    http: reqwest::Client,
    pdp_url: String,
}

impl RealService {
    fn piece_url(&self, cid: &ContentId) -> String {
        format!("{}/piece/{cid}", self.pdp_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl StorageService for RealService {
    async fn upload(&self, data: Bytes) -> ClientResult<ContentId> {
        let url = format!("{}/piece", self.pdp_url.trim_end_matches('/'));
        let response = self
            .http
            .post(url)
            .body(data)
            .send()
            .await
            .map_err(|e| ClientError::storage(format!("upload failed: {e}")))?;
        if !response.status().is_success() {
            return Err(ClientError::storage(format!(
                "upload rejected with status {}",
                response.status()
            )));
        }
        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| ClientError::storage(format!("upload response decode failed: {e}")))?;
        Ok(ContentId::new(body.cid)?)
    }

    async fn download(&self, cid: &ContentId) -> ClientResult<Bytes> {
        let response = self
            .http
            .get(self.piece_url(cid))
            .send()
            .await
            .map_err(|e| ClientError::storage(format!("download failed for {cid}: {e}")))?;
        if !response.status().is_success() {
            return Err(ClientError::storage(format!(
                "download for {cid} rejected with status {}",
                response.status()
            )));
        }
        response
            .bytes()
            .await
            .map_err(|e| ClientError::storage(format!("download body read failed: {e}")))
    }

    async fn verify(&self, cid: &ContentId) -> ClientResult<bool> {
        // HEAD confirms existence without transferring the payload.
        let response = self
            .http
            .head(self.piece_url(cid))
            .send()
            .await
            .map_err(|e| ClientError::storage(format!("verification failed for {cid}: {e}")))?;
        Ok(response.status().is_success())
    }
}
