//! Client configuration.
//!
//! Backend selection is an explicit configuration value, not an ambient
//! process flag: callers pass a [`BackendMode`] and the resolver evaluates
//! it exactly once per client instance.
//!
//! # Defaults
//!
//! - Proof-set creation fee: 5 tokens
//! - Allowance safety buffer: 5 tokens
//! - Initialization poll: 250ms interval, 15s bound

use core::time::Duration;

use alloy_primitives::{Address, U256};

/// One whole unit of the payment token (18 decimals).
pub const TOKEN: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

/// Which backend implementation a client should run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum BackendMode {
    /// Resolve once at construction: substitute outside production, real in
    /// production.
    #[default]
    Auto,
    /// Always use the real network backend.
    Real,
    /// Always use the in-process substitute backend.
    Substitute,
}

/// Configuration for a storage client instance.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend selection mode.
    pub mode: BackendMode,
    /// Whether this deployment is production. A real-backend load failure is
    /// fatal in production and falls back to the substitute elsewhere.
    pub production: bool,
    /// RPC endpoint of the storage network.
    pub rpc_url: String,
    /// Wallet private key, hex-encoded. Only the trusted process holds one;
    /// the server-mediated adapter runs without it.
    pub wallet_key: Option<String>,
    /// Address of the storage service approved to draw on the escrow.
    pub service_address: Address,
    /// Whether CDN delivery mode is enabled.
    pub cdn_enabled: bool,
    /// Network identifier, for logging and stats.
    pub network: String,
    /// One-time fee charged when a new proof set must be created.
    pub proof_set_creation_fee: U256,
    /// Safety buffer added on top of every computed allowance top-up.
    pub safety_buffer: U256,
    /// Minimum provider reputation. Consumed by callers during provider
    /// selection; not enforced by this client.
    pub min_provider_reputation: u32,
    /// Interval between polls while waiting on a concurrent initializer.
    pub init_poll_interval: Duration,
    /// Total time to wait on a concurrent initializer before timing out.
    pub init_poll_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            mode: BackendMode::Auto,
            production: false,
            rpc_url: "https://api.calibration.node.glif.io/rpc/v1".into(),
            wallet_key: None,
            service_address: Address::ZERO,
            cdn_enabled: false,
            network: "calibration".into(),
            proof_set_creation_fee: TOKEN.saturating_mul(U256::from(5u64)),
            safety_buffer: TOKEN.saturating_mul(U256::from(5u64)),
            min_provider_reputation: 0,
            init_poll_interval: Duration::from_millis(250),
            init_poll_timeout: Duration::from_secs(15),
        }
    }
}

impl ClientConfig {
    /// Configuration for an explicitly substitute-backed client.
    pub fn substitute() -> Self {
        Self {
            mode: BackendMode::Substitute,
            ..Self::default()
        }
    }
}
