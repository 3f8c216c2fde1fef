//! Session progress events.
//!
//! Storage-service construction is a multi-step process on the network side:
//! a provider is selected, then a proof set is either reused or created.
//! Creation is itself two-phase - the creation transaction is mined first,
//! and the proof set separately becomes live afterwards. Consumers must not
//! treat [`ProofSetTransactionMined`](SessionEvent::ProofSetTransactionMined)
//! as ready; only [`ProofSetLive`](SessionEvent::ProofSetLive) (followed by
//! [`ProofSetResolved`](SessionEvent::ProofSetResolved)) means the set is
//! usable.

use tessera_primitives::{ProofSetInfo, ProviderInfo};
use tokio::sync::mpsc;

/// Progress events emitted while a storage service is being constructed.
///
/// Events arrive in order on the channel handed to
/// [`StorageSession::create_storage_service`](crate::StorageSession::create_storage_service):
/// `ProviderSelected` always precedes `ProofSetResolved`; the creation
/// events only appear when no existing proof set could be reused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A storage provider was selected for this session.
    ProviderSelected(ProviderInfo),

    /// No reusable proof set was found; creation has started.
    ProofSetCreationStarted,

    /// The proof-set creation transaction was mined. The set is not yet
    /// usable at this point.
    ProofSetTransactionMined {
        /// Hash of the mined creation transaction.
        tx: String,
    },

    /// The proof set became live and can accept uploads.
    ProofSetLive {
        /// Identifier of the now-live proof set.
        proof_set_id: u64,
    },

    /// The session resolved to its final proof set (reused or created).
    ProofSetResolved(ProofSetInfo),
}

/// Sender half for session progress events.
pub type EventSender = mpsc::UnboundedSender<SessionEvent>;
