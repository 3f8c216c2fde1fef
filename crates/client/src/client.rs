//! Storage client implementation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use tessera_api::{
    ClientConfig, ClientError, ClientResult, ContentId, Payload, ProofSetInfo, ProviderInfo,
    RetrievalResult, SessionEvent, StorageBackend, StorageResult, StorageService, StorageSession,
    StorageStats,
};
use tessera_backend::BackendHandle;
use tessera_payment::Preflight;

/// Payload size the first-time preflight is sized for.
///
/// Initialization covers the common first-use case of needing a brand new
/// proof set, so the check runs with `requires_new_proof_set = true` before
/// any real payload size is known.
const INITIAL_PREFLIGHT_SIZE: u64 = 1024;

#[derive(Default)]
struct SessionState {
    session: Option<Arc<dyn StorageSession>>,
    service: Option<Arc<dyn StorageService>>,
    preflight: Option<Arc<Preflight>>,
    provider: Option<ProviderInfo>,
    proof_set: Option<ProofSetInfo>,
}

struct Inner {
    initializing: AtomicBool,
    initialized: AtomicBool,
    // Error of the last failed initialization, surfaced to waiters so
    // concurrent callers fail with the same message as the initializer.
    failure: RwLock<Option<String>>,
    state: RwLock<SessionState>,
}

/// Client for the proof-backed storage network.
///
/// One client instance binds to one backend, one session, and one proof set
/// for its whole lifetime; the proof set never silently changes mid-session.
/// `initialize()` is idempotent and single-flighted: concurrent first-time
/// callers poll the in-flight initialization rather than racing a second
/// one. Operations self-initialize lazily when the explicit call is skipped.
///
/// Concurrent uploads are intentionally not serialized against each other.
/// Each upload re-runs the payment preflight, but two uploads may both pass
/// it optimistically and one may then fail at the backend if the combined
/// allowance was insufficient. A stricter client could hold a mutex across
/// preflight + upload at the cost of upload parallelism.
pub struct StorageClient {
    config: ClientConfig,
    backend: BackendHandle,
    inner: Inner,
}

impl StorageClient {
    /// Create a client; no network activity until first use.
    pub fn new(config: ClientConfig) -> Self {
        let backend = BackendHandle::new(config.clone());
        Self::with_backend_handle(config, backend)
    }

    /// Create a client against an already-resolved backend.
    pub fn with_backend(config: ClientConfig, backend: Arc<dyn StorageBackend>) -> Self {
        let handle = BackendHandle::preresolved(config.clone(), backend);
        Self::with_backend_handle(config, handle)
    }

    fn with_backend_handle(config: ClientConfig, backend: BackendHandle) -> Self {
        Self {
            config,
            backend,
            inner: Inner {
                initializing: AtomicBool::new(false),
                initialized: AtomicBool::new(false),
                failure: RwLock::new(None),
                state: RwLock::new(SessionState::default()),
            },
        }
    }

    /// Whether initialization has completed.
    pub fn is_initialized(&self) -> bool {
        self.inner.initialized.load(Ordering::Acquire)
    }

    /// Initialize the client: resolve the backend, connect a session, run
    /// the first-use payment preflight, and bind a storage service.
    ///
    /// Safe to call repeatedly; later calls return immediately. Concurrent
    /// calls during the first initialization poll until it completes or the
    /// configured bound is exceeded.
    pub async fn initialize(&self) -> ClientResult<()> {
        if self.inner.initialized.load(Ordering::Acquire) {
            return Ok(());
        }
        if self.inner.initializing.swap(true, Ordering::AcqRel) {
            return self.wait_for_initializer().await;
        }

        // An in-flight initializer may have finished between the load above
        // and winning the swap; without this recheck the session would be
        // constructed (and paid for) a second time.
        if self.inner.initialized.load(Ordering::Acquire) {
            self.inner.initializing.store(false, Ordering::Release);
            return Ok(());
        }

        *self.inner.failure.write() = None;
        let result = self.run_initialization().await;
        match &result {
            Ok(()) => self.inner.initialized.store(true, Ordering::Release),
            Err(e) => {
                // Stash the message so waiters reconstruct the same error.
                let message = match e {
                    ClientError::Initialization { message } => message.clone(),
                    other => other.to_string(),
                };
                *self.inner.failure.write() = Some(message);
            }
        }
        self.inner.initializing.store(false, Ordering::Release);
        result
    }

    /// Bounded poll while another caller holds the initialization.
    async fn wait_for_initializer(&self) -> ClientResult<()> {
        let started = Instant::now();
        loop {
            if self.inner.initialized.load(Ordering::Acquire) {
                return Ok(());
            }
            if !self.inner.initializing.load(Ordering::Acquire) {
                // The initializer sets `initialized` before clearing
                // `initializing`; recheck to distinguish success from failure.
                if self.inner.initialized.load(Ordering::Acquire) {
                    return Ok(());
                }
                let message = self
                    .inner
                    .failure
                    .read()
                    .clone()
                    .unwrap_or_else(|| "concurrent initialization failed".into());
                return Err(ClientError::initialization(message));
            }
            if started.elapsed() >= self.config.init_poll_timeout {
                return Err(ClientError::InitializationTimeout {
                    waited_ms: self.config.init_poll_timeout.as_millis() as u64,
                });
            }
            tokio::time::sleep(self.config.init_poll_interval).await;
        }
    }

    async fn run_initialization(&self) -> ClientResult<()> {
        let backend = self.backend.resolve().await?;
        info!(backend = backend.name(), network = %self.config.network, "initializing storage client");

        let session = backend.connect(&self.config).await.map_err(|e| {
            ClientError::initialization(format!("session connect failed: {e}"))
        })?;

        let preflight = Arc::new(Preflight::new(
            Arc::clone(&session),
            self.config.service_address,
            self.config.proof_set_creation_fee,
            self.config.safety_buffer,
            self.config.cdn_enabled,
        ));
        preflight
            .ensure_allowance(INITIAL_PREFLIGHT_SIZE, true)
            .await?;

        let (events_tx, mut events_rx) = mpsc::unbounded_channel();
        let service = session
            .create_storage_service(events_tx)
            .await
            .map_err(|e| {
                ClientError::initialization(format!("storage service creation failed: {e}"))
            })?;

        // The sender is dropped once service creation returns, so this loop
        // drains the complete event sequence and terminates.
        while let Some(event) = events_rx.recv().await {
            self.record_event(event);
        }

        let mut state = self.inner.state.write();
        state.session = Some(session);
        state.service = Some(service);
        state.preflight = Some(preflight);
        Ok(())
    }

    fn record_event(&self, event: SessionEvent) {
        match event {
            SessionEvent::ProviderSelected(provider) => {
                info!(owner = %provider.owner, pdp_url = %provider.pdp_url, "storage provider selected");
                self.inner.state.write().provider = Some(provider);
            }
            SessionEvent::ProofSetCreationStarted => {
                info!("no reusable proof set found, creating a new one");
            }
            SessionEvent::ProofSetTransactionMined { tx } => {
                // Mined is not live; uploads must wait for the live event.
                info!(%tx, "proof set creation transaction mined, waiting for the set to go live");
            }
            SessionEvent::ProofSetLive { proof_set_id } => {
                info!(proof_set_id, "proof set is live");
            }
            SessionEvent::ProofSetResolved(info) => {
                if info.is_existing {
                    info!(proof_set_id = info.proof_set_id, "reusing existing proof set");
                } else {
                    info!(proof_set_id = info.proof_set_id, "using newly created proof set");
                }
                self.inner.state.write().proof_set = Some(info);
            }
        }
    }

    async fn ensure_initialized(&self) -> ClientResult<()> {
        if self.is_initialized() {
            return Ok(());
        }
        debug!("operation called before initialize(), self-initializing");
        self.initialize().await
    }

    fn service_handles(&self) -> ClientResult<(Arc<Preflight>, Arc<dyn StorageService>)> {
        let state = self.inner.state.read();
        match (&state.preflight, &state.service) {
            (Some(preflight), Some(service)) => {
                Ok((Arc::clone(preflight), Arc::clone(service)))
            }
            _ => Err(ClientError::initialization(
                "storage service not available after initialization",
            )),
        }
    }

    /// Store a payload, returning the record of the completed upload.
    ///
    /// The payment preflight runs on every call; allowance may have been
    /// depleted since the last upload.
    pub async fn store_data(&self, payload: impl Into<Payload>) -> ClientResult<StorageResult> {
        self.ensure_initialized().await?;
        let (preflight, service) = self.service_handles()?;

        let data: Bytes = payload.into().into_bytes();
        let size = data.len() as u64;

        preflight.ensure_allowance(size, false).await?;

        let cid = service.upload(data).await?;
        let url = self.get_cdn_url(cid.as_str())?;
        debug!(%cid, size, %url, "upload complete");

        Ok(StorageResult {
            cid,
            size,
            url,
            timestamp_ms: tessera_primitives::timestamp_ms(),
        })
    }

    /// Retrieve the payload stored under an identifier.
    ///
    /// The MIME type is inferred from the bytes: content that parses as
    /// UTF-8 JSON comes back as a JSON payload, anything else as raw bytes.
    pub async fn retrieve_data(&self, cid: &str) -> ClientResult<RetrievalResult> {
        let cid = ContentId::new(cid)?;
        self.ensure_initialized().await?;
        let (_, service) = self.service_handles()?;

        let started = Instant::now();
        let data = service.download(&cid).await?;
        self.record_download_speed(data.len() as u64, started);

        let (payload, mime_type) = Payload::infer(data);
        Ok(RetrievalResult {
            payload,
            mime_type: mime_type.to_owned(),
        })
    }

    /// Confirm an identifier is still retrievable without downloading it.
    pub async fn verify(&self, cid: &str) -> ClientResult<bool> {
        let cid = ContentId::new(cid)?;
        self.ensure_initialized().await?;
        let (_, service) = self.service_handles()?;
        service.verify(&cid).await
    }

    /// Update the provider's empirical download speed.
    ///
    /// Measured at nanosecond resolution so that fast local retrievals
    /// still produce a non-zero figure.
    fn record_download_speed(&self, bytes: u64, started: Instant) {
        let elapsed_ns = started.elapsed().as_nanos() as u64;
        if elapsed_ns == 0 {
            return;
        }
        let speed = bytes.saturating_mul(1_000_000_000) / elapsed_ns;
        if let Some(provider) = self.inner.state.write().provider.as_mut() {
            provider.speed_bytes_per_sec = speed;
            debug!(speed_bytes_per_sec = speed, "provider download speed updated");
        }
    }

    /// Derive a fetchable URL for an identifier from current state.
    ///
    /// Pure function; makes no network call and does not initialize.
    pub fn get_cdn_url(&self, cid: &str) -> ClientResult<String> {
        let state = self.inner.state.read();
        let endpoint = state.provider.as_ref().map(|p| p.pdp_url.as_str());
        crate::resolve_url(self.config.cdn_enabled, endpoint, cid)
    }

    /// Point-in-time operational snapshot.
    ///
    /// Never fails: the escrow balance query is best-effort and a failure
    /// lands in the snapshot's `error` field instead of propagating.
    pub async fn stats(&self) -> StorageStats {
        let (provider, proof_set_id, session) = {
            let state = self.inner.state.read();
            (
                state.provider.clone(),
                state.proof_set.map(|p| p.proof_set_id),
                state.session.clone(),
            )
        };

        let (balance, error) = match session {
            Some(session) => match session.balance().await {
                Ok(balance) => (Some(balance), None),
                Err(e) => {
                    warn!(%e, "balance query failed, degrading stats snapshot");
                    (None, Some(e.to_string()))
                }
            },
            None => (None, None),
        };

        StorageStats {
            network: self.config.network.clone(),
            provider,
            proof_set_id,
            cdn_enabled: self.config.cdn_enabled,
            balance,
            error,
            last_updated_ms: tessera_primitives::timestamp_ms(),
        }
    }
}
