//! In-process substitute backend.
//!
//! Used in development and testing so the full client stack - preflight,
//! event stream, upload/download - runs without a network or a funded
//! wallet. Escrow and allowance bookkeeping are simulated faithfully enough
//! that the payment paths execute exactly as they do against the real
//! network: an insufficient allowance stays insufficient until a deposit and
//! approval land, and uploads draw the lockup down again.

use std::collections::HashMap;
use std::sync::Arc;

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use tracing::debug;

use tessera_api::{
    AllowanceCheck, ClientConfig, ClientError, ClientResult, ContentId, EventSender, ProofSetInfo,
    ProviderInfo, SessionEvent, StorageBackend, StorageService, StorageSession,
};

/// Simulated lockup cost per stored byte.
const LOCKUP_PRICE_PER_BYTE: u64 = 1_000;

/// Simulated rate cost per stored byte.
const RATE_PRICE_PER_BYTE: u64 = 10;

/// CDN-mode lockup multiplier (delivery capacity is reserved up front).
const CDN_LOCKUP_MULTIPLIER: u64 = 2;

/// Owner address advertised by the fake provider.
const PROVIDER_OWNER: Address = Address::repeat_byte(0xA5);

/// Delivery endpoint advertised by the fake provider.
const PROVIDER_PDP_URL: &str = "https://provider.substitute.invalid/pdp";

#[derive(Default)]
struct EscrowState {
    balance: U256,
    rate_allowance: U256,
    lockup_allowance: U256,
    lockup_used: U256,
}

#[derive(Default)]
struct SubstituteState {
    escrow: EscrowState,
    store: HashMap<ContentId, Bytes>,
    proof_set_id: Option<u64>,
}

/// The in-process substitute backend.
///
/// All sessions connected through one backend instance share escrow state
/// and the content store, so a proof set created by the first session is
/// reused by later ones.
#[derive(Default)]
pub struct SubstituteBackend {
    state: Arc<RwLock<SubstituteState>>,
}

impl SubstituteBackend {
    /// Create an empty substitute backend.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageBackend for SubstituteBackend {
    async fn connect(&self, config: &ClientConfig) -> ClientResult<Arc<dyn StorageSession>> {
        debug!(network = %config.network, "connecting substitute session");
        Ok(Arc::new(SubstituteSession {
            state: Arc::clone(&self.state),
            cdn_enabled: config.cdn_enabled,
        }))
    }

    fn is_substitute(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "substitute"
    }
}

/// A session against the substitute backend.
struct SubstituteSession {
    state: Arc<RwLock<SubstituteState>>,
    cdn_enabled: bool,
}

impl SubstituteSession {
    fn lockup_needed(&self, size: u64, cdn_enabled: bool) -> U256 {
        let multiplier = if cdn_enabled { CDN_LOCKUP_MULTIPLIER } else { 1 };
        U256::from(size.max(1))
            .saturating_mul(U256::from(LOCKUP_PRICE_PER_BYTE))
            .saturating_mul(U256::from(multiplier))
    }
}

#[async_trait]
impl StorageSession for SubstituteSession {
    async fn check_allowance(&self, size: u64, cdn_enabled: bool) -> ClientResult<AllowanceCheck> {
        let lockup_needed = self.lockup_needed(size, cdn_enabled);
        let rate_needed = U256::from(size.max(1)).saturating_mul(U256::from(RATE_PRICE_PER_BYTE));

        let state = self.state.read();
        let escrow = &state.escrow;
        let lockup_available = escrow.lockup_allowance.saturating_sub(escrow.lockup_used);
        let sufficient = lockup_available >= lockup_needed
            && escrow.rate_allowance >= rate_needed
            && escrow.balance >= lockup_needed;

        Ok(AllowanceCheck {
            sufficient,
            lockup_allowance_needed: lockup_needed,
            rate_allowance_needed: rate_needed,
        })
    }

    async fn deposit(&self, amount: U256) -> ClientResult<()> {
        let mut state = self.state.write();
        state.escrow.balance = state.escrow.balance.saturating_add(amount);
        debug!(%amount, balance = %state.escrow.balance, "substitute deposit");
        Ok(())
    }

    async fn approve_service(
        &self,
        service: Address,
        rate_allowance: U256,
        total_allowance: U256,
    ) -> ClientResult<()> {
        let mut state = self.state.write();
        state.escrow.rate_allowance = rate_allowance;
        state.escrow.lockup_allowance = total_allowance;
        state.escrow.lockup_used = U256::ZERO;
        debug!(%service, %rate_allowance, %total_allowance, "substitute service approval");
        Ok(())
    }

    async fn balance(&self) -> ClientResult<U256> {
        Ok(self.state.read().escrow.balance)
    }

    async fn create_storage_service(
        &self,
        events: EventSender,
    ) -> ClientResult<Arc<dyn StorageService>> {
        let provider = ProviderInfo {
            owner: PROVIDER_OWNER,
            pdp_url: PROVIDER_PDP_URL.into(),
            speed_bytes_per_sec: 0,
        };
        let _ = events.send(SessionEvent::ProviderSelected(provider));

        let existing = self.state.read().proof_set_id;
        let info = match existing {
            Some(proof_set_id) => ProofSetInfo {
                proof_set_id,
                is_existing: true,
            },
            None => {
                // Two-phase creation: mined first, live afterwards.
                let proof_set_id = rand::random::<u32>() as u64;
                let _ = events.send(SessionEvent::ProofSetCreationStarted);
                let _ = events.send(SessionEvent::ProofSetTransactionMined {
                    tx: format!("0x{:064x}", rand::random::<u64>()),
                });
                let _ = events.send(SessionEvent::ProofSetLive { proof_set_id });
                self.state.write().proof_set_id = Some(proof_set_id);
                ProofSetInfo {
                    proof_set_id,
                    is_existing: false,
                }
            }
        };
        let _ = events.send(SessionEvent::ProofSetResolved(info));

        Ok(Arc::new(SubstituteService {
            state: Arc::clone(&self.state),
            cdn_enabled: self.cdn_enabled,
        }))
    }
}

/// A storage service against the substitute backend.
struct SubstituteService {
    state: Arc<RwLock<SubstituteState>>,
    cdn_enabled: bool,
}

#[async_trait]
impl StorageService for SubstituteService {
    async fn upload(&self, data: Bytes) -> ClientResult<ContentId> {
        let size = data.len() as u64;
        let multiplier = if self.cdn_enabled { CDN_LOCKUP_MULTIPLIER } else { 1 };
        let cost = U256::from(size.max(1))
            .saturating_mul(U256::from(LOCKUP_PRICE_PER_BYTE))
            .saturating_mul(U256::from(multiplier));

        let mut state = self.state.write();
        let available = state
            .escrow
            .lockup_allowance
            .saturating_sub(state.escrow.lockup_used);
        if available < cost || state.escrow.balance < cost {
            return Err(ClientError::storage(format!(
                "upload rejected: allowance exhausted (needed {cost}, available {available})"
            )));
        }
        state.escrow.lockup_used = state.escrow.lockup_used.saturating_add(cost);
        state.escrow.balance = state.escrow.balance.saturating_sub(cost);

        let cid = ContentId::derive(&data);
        state.store.insert(cid.clone(), data);
        debug!(%cid, size, "substitute upload stored");
        Ok(cid)
    }

    async fn download(&self, cid: &ContentId) -> ClientResult<Bytes> {
        self.state
            .read()
            .store
            .get(cid)
            .cloned()
            .ok_or_else(|| ClientError::storage(format!("content not found: {cid}")))
    }

    async fn verify(&self, cid: &ContentId) -> ClientResult<bool> {
        Ok(self.state.read().store.contains_key(cid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    async fn session(cdn: bool) -> (Arc<dyn StorageSession>, SubstituteBackend) {
        let backend = SubstituteBackend::new();
        let config = ClientConfig {
            cdn_enabled: cdn,
            ..ClientConfig::substitute()
        };
        let session = backend.connect(&config).await.expect("connects");
        (session, backend)
    }

    async fn fund(session: &Arc<dyn StorageSession>, size: u64) {
        let check = session.check_allowance(size, false).await.expect("checks");
        session
            .deposit(check.lockup_allowance_needed * U256::from(4u64))
            .await
            .expect("deposits");
        session
            .approve_service(
                Address::ZERO,
                check.rate_allowance_needed,
                check.lockup_allowance_needed * U256::from(4u64),
            )
            .await
            .expect("approves");
    }

    #[tokio::test]
    async fn test_deposit_and_approve_make_allowance_sufficient() {
        let (session, _backend) = session(false).await;

        let before = session.check_allowance(100, false).await.expect("checks");
        assert!(!before.sufficient);

        fund(&session, 100).await;

        let after = session.check_allowance(100, false).await.expect("checks");
        assert!(after.sufficient);
    }

    #[tokio::test]
    async fn test_uploads_deplete_allowance() {
        let (session, _backend) = session(false).await;
        fund(&session, 100).await;

        let (tx, _rx) = mpsc::unbounded_channel();
        let service = session.create_storage_service(tx).await.expect("creates");

        // Funded for 4x a 100-byte upload; the fifth must fail.
        for _ in 0..4 {
            let data = Bytes::from(vec![7u8; 100]);
            service.upload(data).await.expect("upload within allowance");
        }
        let err = service
            .upload(Bytes::from(vec![7u8; 100]))
            .await
            .expect_err("allowance exhausted");
        assert!(matches!(err, ClientError::Storage { .. }));
    }

    #[tokio::test]
    async fn test_event_sequence_on_creation_then_reuse() {
        let (session, backend) = session(false).await;

        let (tx, mut rx) = mpsc::unbounded_channel();
        session.create_storage_service(tx).await.expect("creates");

        assert!(matches!(rx.recv().await, Some(SessionEvent::ProviderSelected(_))));
        assert!(matches!(rx.recv().await, Some(SessionEvent::ProofSetCreationStarted)));
        assert!(matches!(
            rx.recv().await,
            Some(SessionEvent::ProofSetTransactionMined { .. })
        ));
        let live_id = match rx.recv().await {
            Some(SessionEvent::ProofSetLive { proof_set_id }) => proof_set_id,
            other => panic!("expected ProofSetLive, got {other:?}"),
        };
        match rx.recv().await {
            Some(SessionEvent::ProofSetResolved(info)) => {
                assert_eq!(info.proof_set_id, live_id);
                assert!(!info.is_existing);
            }
            other => panic!("expected ProofSetResolved, got {other:?}"),
        }

        // A second session against the same backend reuses the proof set.
        let session2 = backend
            .connect(&ClientConfig::substitute())
            .await
            .expect("connects");
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        session2.create_storage_service(tx2).await.expect("creates");

        assert!(matches!(rx2.recv().await, Some(SessionEvent::ProviderSelected(_))));
        match rx2.recv().await {
            Some(SessionEvent::ProofSetResolved(info)) => {
                assert_eq!(info.proof_set_id, live_id);
                assert!(info.is_existing);
            }
            other => panic!("expected ProofSetResolved, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_round_trip_and_verify() {
        let (session, _backend) = session(false).await;
        fund(&session, 1024).await;

        let (tx, _rx) = mpsc::unbounded_channel();
        let service = session.create_storage_service(tx).await.expect("creates");

        let data = Bytes::from_static(b"proof-backed bytes");
        let cid = service.upload(data.clone()).await.expect("uploads");
        assert_eq!(cid, ContentId::derive(&data));

        let downloaded = service.download(&cid).await.expect("downloads");
        assert_eq!(downloaded, data);

        assert!(service.verify(&cid).await.expect("verifies"));
        let missing = ContentId::derive(b"never stored");
        assert!(!service.verify(&missing).await.expect("verifies"));
    }
}
