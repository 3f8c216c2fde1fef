//! Backend trait seams.
//!
//! These traits are object-safe so that the resolver can hand out one of two
//! structurally identical implementations behind `Arc<dyn _>` without the
//! choice leaking into caller signatures.

use std::sync::Arc;

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use bytes::Bytes;
use tessera_primitives::{AllowanceCheck, ContentId};

use crate::{ClientResult, EventSender};

/// A deployment backend: either the real storage network or the in-process
/// substitute.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Connect a payment/storage session using the given configuration.
    async fn connect(&self, config: &crate::ClientConfig) -> ClientResult<Arc<dyn StorageSession>>;

    /// Whether this is the substitute backend.
    ///
    /// Exposed so other components can log and guard without re-deriving the
    /// selection logic.
    fn is_substitute(&self) -> bool;

    /// Short backend name for logging.
    fn name(&self) -> &'static str;
}

/// A connected session: payment escrow plus storage-service construction.
#[async_trait]
pub trait StorageSession: Send + Sync {
    /// Check whether the approved allowance covers an operation of the given
    /// size under the given CDN mode.
    async fn check_allowance(&self, size: u64, cdn_enabled: bool) -> ClientResult<AllowanceCheck>;

    /// Deposit funds into the payment escrow.
    async fn deposit(&self, amount: U256) -> ClientResult<()>;

    /// Approve the storage service to spend at `rate_allowance` per period,
    /// up to `total_allowance` in total.
    async fn approve_service(
        &self,
        service: Address,
        rate_allowance: U256,
        total_allowance: U256,
    ) -> ClientResult<()>;

    /// Current escrow account balance.
    async fn balance(&self) -> ClientResult<U256>;

    /// Construct a storage service bound to one provider and proof set.
    ///
    /// Progress is reported on `events`; see
    /// [`SessionEvent`](crate::SessionEvent) for ordering guarantees.
    async fn create_storage_service(
        &self,
        events: EventSender,
    ) -> ClientResult<Arc<dyn StorageService>>;
}

/// A storage service bound to one selected provider and proof set.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Upload bytes, returning the content identifier they were stored under.
    async fn upload(&self, data: Bytes) -> ClientResult<ContentId>;

    /// Download the bytes stored under an identifier.
    async fn download(&self, cid: &ContentId) -> ClientResult<Bytes>;

    /// Confirm an identifier is still retrievable without transferring the
    /// payload, where the backend supports it.
    async fn verify(&self, cid: &ContentId) -> ClientResult<bool>;
}
