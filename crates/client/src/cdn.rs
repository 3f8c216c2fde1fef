//! CDN URL resolution.
//!
//! Pure function of current state; no network call is made. The provider's
//! delivery endpoint is preferred when CDN mode is enabled, with generic
//! content-addressed gateways as fallbacks.

use tessera_api::{ClientError, ClientResult};

/// Generic CDN gateway used when CDN mode is on but no provider endpoint is
/// known yet.
pub const FILCDN_GATEWAY: &str = "https://gateway.filcdn.io";

/// Generic content-addressed gateway used when CDN mode is off.
pub const IPFS_GATEWAY: &str = "https://ipfs.io";

/// Derive a fetchable URL for a content identifier.
///
/// - CDN mode on, provider endpoint known: `{endpoint}/ipfs/{cid}`
/// - CDN mode on, provider unknown: FilCDN gateway
/// - CDN mode off: generic IPFS gateway
///
/// Fails with a validation error on an empty identifier, before anything
/// else.
pub fn resolve_url(
    cdn_enabled: bool,
    provider_endpoint: Option<&str>,
    cid: &str,
) -> ClientResult<String> {
    if cid.trim().is_empty() {
        return Err(ClientError::validation(
            "cannot resolve URL for an empty content identifier",
        ));
    }

    let base = match (cdn_enabled, provider_endpoint) {
        (true, Some(endpoint)) => endpoint.trim_end_matches('/'),
        (true, None) => FILCDN_GATEWAY,
        (false, _) => IPFS_GATEWAY,
    };
    Ok(format!("{base}/ipfs/{cid}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cdn_disabled_uses_generic_gateway() {
        let url = resolve_url(false, Some("https://p.example/pdp"), "Qm123").expect("resolves");
        assert_eq!(url, "https://ipfs.io/ipfs/Qm123");
    }

    #[test]
    fn test_cdn_enabled_prefers_provider_endpoint() {
        let url = resolve_url(true, Some("https://p.example/pdp"), "Qm123").expect("resolves");
        assert_eq!(url, "https://p.example/pdp/ipfs/Qm123");
    }

    #[test]
    fn test_cdn_enabled_without_provider_falls_back_to_filcdn() {
        let url = resolve_url(true, None, "Qm123").expect("resolves");
        assert_eq!(url, "https://gateway.filcdn.io/ipfs/Qm123");
    }

    #[test]
    fn test_empty_identifier_rejected() {
        let err = resolve_url(false, None, "").expect_err("empty cid");
        assert!(matches!(err, ClientError::Validation { .. }));
    }

    #[test]
    fn test_trailing_slash_on_endpoint_is_normalized() {
        let url = resolve_url(true, Some("https://p.example/pdp/"), "Qm123").expect("resolves");
        assert_eq!(url, "https://p.example/pdp/ipfs/Qm123");
    }
}
