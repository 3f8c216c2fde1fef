//! Backend selection.
//!
//! A [`BackendHandle`] is an explicitly-owned, lazily-initialized handle:
//! the first `resolve()` call pays the selection cost and every later call
//! receives the cached backend. There is no module-level singleton - tests
//! construct independent handles without cross-test leakage.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{info, warn};

use tessera_api::{BackendMode, ClientConfig, ClientError, ClientResult, StorageBackend};

use crate::{RealBackend, SubstituteBackend};

/// Lazily-resolved backend selection for one client instance.
///
/// Selection rule, evaluated once:
/// - `Substitute` mode, or `Auto` outside production, picks the substitute.
/// - `Real` mode, or `Auto` in production, connects the real backend. A
///   connect failure is fatal in production (a production system must never
///   silently run against a substitute) and falls back to the substitute
///   with a loud warning elsewhere.
pub struct BackendHandle {
    config: ClientConfig,
    resolved: OnceCell<Arc<dyn StorageBackend>>,
}

impl BackendHandle {
    /// Create an unresolved handle for the given configuration.
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            resolved: OnceCell::new(),
        }
    }

    /// Create a handle already resolved to the given backend.
    ///
    /// Bypasses selection entirely; tests use this to inject instrumented
    /// backends.
    pub fn preresolved(config: ClientConfig, backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            config,
            resolved: OnceCell::new_with(Some(backend)),
        }
    }

    /// Resolve the backend, selecting on first call and caching the result.
    ///
    /// Concurrent first-time callers are single-flighted; exactly one
    /// selection runs.
    pub async fn resolve(&self) -> ClientResult<&Arc<dyn StorageBackend>> {
        self.resolved
            .get_or_try_init(|| async { self.select().await })
            .await
    }

    /// Whether the resolved backend is the substitute.
    ///
    /// Resolves first if no earlier call has.
    pub async fn is_substitute(&self) -> ClientResult<bool> {
        Ok(self.resolve().await?.is_substitute())
    }

    async fn select(&self) -> ClientResult<Arc<dyn StorageBackend>> {
        let use_substitute = match self.config.mode {
            BackendMode::Substitute => true,
            BackendMode::Real => false,
            BackendMode::Auto => !self.config.production,
        };

        if use_substitute {
            info!(mode = %self.config.mode, "using substitute storage backend");
            return Ok(Arc::new(SubstituteBackend::new()));
        }

        match RealBackend::load(&self.config).await {
            Ok(backend) => {
                info!(rpc_url = %self.config.rpc_url, "loaded real storage backend");
                Ok(Arc::new(backend))
            }
            Err(err) if self.config.production => {
                // Never run production against a substitute.
                Err(ClientError::initialization(format!(
                    "failed to load real backend in production: {err}"
                )))
            }
            Err(err) => {
                warn!(%err, "real backend failed to load, falling back to substitute");
                Ok(Arc::new(SubstituteBackend::new()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(mode: BackendMode, production: bool) -> ClientConfig {
        ClientConfig {
            mode,
            production,
            // Unroutable endpoint: real backend loads always fail in tests.
            rpc_url: "http://127.0.0.1:1/rpc".into(),
            ..ClientConfig::default()
        }
    }

    #[tokio::test]
    async fn test_substitute_mode_selects_substitute() {
        let handle = BackendHandle::new(config(BackendMode::Substitute, false));
        assert!(handle.is_substitute().await.expect("resolves"));
    }

    #[tokio::test]
    async fn test_auto_outside_production_selects_substitute() {
        let handle = BackendHandle::new(config(BackendMode::Auto, false));
        assert!(handle.is_substitute().await.expect("resolves"));
    }

    #[tokio::test]
    async fn test_real_failure_in_production_is_fatal() {
        let handle = BackendHandle::new(config(BackendMode::Real, true));
        let err = handle.resolve().await.err().expect("must not fall back");
        assert!(matches!(err, ClientError::Initialization { .. }));
    }

    #[tokio::test]
    async fn test_real_failure_outside_production_falls_back() {
        let handle = BackendHandle::new(config(BackendMode::Real, false));
        assert!(handle.is_substitute().await.expect("falls back"));
    }

    #[tokio::test]
    async fn test_resolution_is_cached() {
        let handle = BackendHandle::new(config(BackendMode::Substitute, false));
        let first = Arc::as_ptr(handle.resolve().await.expect("resolves"));
        let second = Arc::as_ptr(handle.resolve().await.expect("resolves"));
        assert_eq!(first, second);
    }
}
