//! Allowance preflight.

use std::sync::Arc;

use alloy_primitives::{Address, U256};
use tracing::debug;

use tessera_api::{ClientError, ClientResult, StorageSession};

/// Allowance checker bound to one payment session.
///
/// The check runs before **every** upload, not only on first use: allowance
/// is shared mutable state and can be depleted by sibling uploads between
/// calls, so sufficiency is re-evaluated per call and never cached.
pub struct Preflight {
    session: Arc<dyn StorageSession>,
    service_address: Address,
    proof_set_creation_fee: U256,
    safety_buffer: U256,
    cdn_enabled: bool,
}

impl Preflight {
    /// Create a preflight bound to the given session.
    pub fn new(
        session: Arc<dyn StorageSession>,
        service_address: Address,
        proof_set_creation_fee: U256,
        safety_buffer: U256,
        cdn_enabled: bool,
    ) -> Self {
        Self {
            session,
            service_address,
            proof_set_creation_fee,
            safety_buffer,
            cdn_enabled,
        }
    }

    /// Ensure sufficient allowance is present for an operation of
    /// `data_size` bytes, topping up the escrow if needed.
    ///
    /// Returns only once sufficient allowance is confirmed. When the current
    /// allowance already covers the operation no transaction is issued;
    /// otherwise one deposit and one approval are performed, sized to cover
    /// the lockup allowance, the proof-set creation fee (when a new set is
    /// required), and the safety buffer.
    pub async fn ensure_allowance(
        &self,
        data_size: u64,
        requires_new_proof_set: bool,
    ) -> ClientResult<()> {
        let check = self
            .session
            .check_allowance(data_size, self.cdn_enabled)
            .await
            .map_err(|e| ClientError::allowance(format!("allowance check failed: {e}")))?;

        if check.sufficient {
            debug!(data_size, "allowance sufficient, no top-up needed");
            return Ok(());
        }

        let creation_fee = if requires_new_proof_set {
            self.proof_set_creation_fee
        } else {
            U256::ZERO
        };
        let total_needed = check
            .lockup_allowance_needed
            .saturating_add(creation_fee)
            .saturating_add(self.safety_buffer);

        debug!(
            data_size,
            requires_new_proof_set,
            %total_needed,
            rate = %check.rate_allowance_needed,
            "allowance insufficient, depositing and approving"
        );

        self.session
            .deposit(total_needed)
            .await
            .map_err(|e| ClientError::allowance(format!("deposit failed: {e}")))?;

        self.session
            .approve_service(
                self.service_address,
                check.rate_allowance_needed,
                total_needed,
            )
            .await
            .map_err(|e| ClientError::allowance(format!("service approval failed: {e}")))?;

        Ok(())
    }
}
