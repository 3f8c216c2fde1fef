//! Content identifiers.
//!
//! A [`ContentId`] is a self-verifying identifier derived from the stored
//! bytes. The network issues identifiers for uploaded content; the substitute
//! backend derives them locally via [`ContentId::derive`] so that round-trips
//! behave identically in both deployments.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Prefix for locally derived identifiers (CIDv1-style raw sha2-256).
const DERIVED_PREFIX: &str = "bafk";

/// Error for malformed content identifiers.
#[derive(Debug, thiserror::Error)]
#[error("invalid content identifier: {reason}")]
pub struct InvalidContentId {
    /// Description of why the identifier is invalid.
    pub reason: String,
}

/// A content-derived identifier used as the lookup key for retrieval.
///
/// Identifiers are opaque strings from the client's point of view; the only
/// local validation is non-emptiness. Re-deriving an identifier from the
/// stored bytes must match the identifier it was stored under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(String);

impl ContentId {
    /// Create an identifier from a string, rejecting empty input.
    pub fn new(s: impl Into<String>) -> Result<Self, InvalidContentId> {
        let s = s.into();
        if s.trim().is_empty() {
            return Err(InvalidContentId {
                reason: "identifier is empty".into(),
            });
        }
        Ok(Self(s))
    }

    /// Derive an identifier from content bytes (sha2-256).
    pub fn derive(data: &[u8]) -> Self {
        let digest = Sha256::digest(data);
        Self(format!("{DERIVED_PREFIX}{}", hex::encode(digest)))
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this identifier was locally derived (substitute backend).
    pub fn is_derived(&self) -> bool {
        self.0.starts_with(DERIVED_PREFIX)
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ContentId {
    type Err = InvalidContentId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for ContentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_rejected() {
        assert!(ContentId::new("").is_err());
        assert!(ContentId::new("   ").is_err());
        assert!("".parse::<ContentId>().is_err());
    }

    #[test]
    fn test_derive_deterministic() {
        let a = ContentId::derive(b"hello");
        let b = ContentId::derive(b"hello");
        assert_eq!(a, b);
        assert!(a.is_derived());
    }

    #[test]
    fn test_derive_distinguishes_content() {
        assert_ne!(ContentId::derive(b"a"), ContentId::derive(b"b"));
    }

    #[test]
    fn test_network_issued_passthrough() {
        let cid = ContentId::new("QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG")
            .expect("valid identifier");
        assert!(!cid.is_derived());
        assert_eq!(cid.to_string(), cid.as_str());
    }
}
