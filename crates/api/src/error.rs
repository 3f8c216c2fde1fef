//! Error types for storage client operations.
//!
//! Each error variant carries the contextual message produced at the
//! component boundary where the underlying failure was caught. Errors are
//! wrapped and re-thrown, never swallowed; the stats aggregator is the one
//! documented exception and degrades to a partial snapshot instead.

use tessera_primitives::InvalidContentId;

/// Error type for storage client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Backend unreachable, credentials rejected, or session setup failed.
    #[error("initialization error: {message}")]
    Initialization {
        /// Description of the initialization failure.
        message: String,
    },

    /// A concurrent initializer did not finish within the poll bound.
    #[error("initialization timed out after {waited_ms}ms")]
    InitializationTimeout {
        /// How long the caller polled before giving up.
        waited_ms: u64,
    },

    /// Deposit or service-approval transaction failed.
    #[error("allowance error: {message}")]
    Allowance {
        /// Description of the failed deposit/approval round trip.
        message: String,
    },

    /// Upload or download failed at the backend layer.
    #[error("storage error: {message}")]
    Storage {
        /// Description of the storage failure.
        message: String,
    },

    /// Empty/malformed identifier or unsupported payload.
    #[error("validation error: {message}")]
    Validation {
        /// Description of what failed validation.
        message: String,
    },

    /// A server-mediated endpoint reported a failure.
    #[error("remote error (status {status}): {message}")]
    Remote {
        /// HTTP status code reported by the trusted intermediary.
        status: u16,
        /// Description of the remote failure.
        message: String,
    },
}

impl ClientError {
    /// Initialization failure with operation context.
    pub fn initialization(message: impl Into<String>) -> Self {
        Self::Initialization {
            message: message.into(),
        }
    }

    /// Allowance failure with operation context.
    pub fn allowance(message: impl Into<String>) -> Self {
        Self::Allowance {
            message: message.into(),
        }
    }

    /// Storage failure with operation context.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Validation failure.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

impl From<InvalidContentId> for ClientError {
    fn from(err: InvalidContentId) -> Self {
        Self::Validation {
            message: err.to_string(),
        }
    }
}

/// Result type for storage client operations.
pub type ClientResult<T> = core::result::Result<T, ClientError>;
