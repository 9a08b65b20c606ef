//! Endpoint Type and Normalization
//!
//! Canonical representation of a SOCKS5 forward-proxy endpoint and the
//! normalization rules applied to raw tokens from source and ban files.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// A canonical proxy endpoint of the form `socks5://host:port` or
/// `socks5h://host:port`.
///
/// Instances only come out of [`Endpoint::normalize`], so an `Endpoint` is
/// never empty, never carries an http/https scheme, and is never
/// double-prefixed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Endpoint(String);

impl Endpoint {
    /// Normalize a raw token into a canonical endpoint.
    ///
    /// Returns `None` for tokens that are empty after trimming, http/https
    /// proxies, double-prefixed URIs like `socks5://http://ip:port`, and
    /// tokens without a `host:port` shape. Rejected tokens are logged and
    /// skipped; callers must handle the `None` case explicitly.
    pub fn normalize(raw: &str) -> Option<Endpoint> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        // Not a SOCKS5 proxy
        if raw.starts_with("http://") || raw.starts_with("https://") {
            warn!("Skipping non-SOCKS5 proxy: {}", raw);
            return None;
        }
        // Malformed-source artifact: socks5://http://ip:port
        if raw.starts_with("socks5://http://") || raw.starts_with("socks5://https://") {
            warn!("Skipping malformed proxy URI: {}", raw);
            return None;
        }
        if raw.starts_with("socks5://") || raw.starts_with("socks5h://") {
            return Some(Endpoint(raw.to_string()));
        }
        // Bare host:port gets the default scheme
        if raw.contains(':') {
            return Some(Endpoint(format!("socks5://{}", raw)));
        }
        warn!("Skipping invalid proxy token: {}", raw);
        None
    }

    /// The canonical URI string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Endpoint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_host_port_gets_prefixed() {
        let endpoint = Endpoint::normalize("10.0.0.1:1080").unwrap();
        assert_eq!(endpoint.as_str(), "socks5://10.0.0.1:1080");
    }

    #[test]
    fn test_existing_scheme_is_kept() {
        let endpoint = Endpoint::normalize("socks5://10.0.0.1:1080").unwrap();
        assert_eq!(endpoint.as_str(), "socks5://10.0.0.1:1080");

        let endpoint = Endpoint::normalize("socks5h://proxy.example.com:9050").unwrap();
        assert_eq!(endpoint.as_str(), "socks5h://proxy.example.com:9050");
    }

    #[test]
    fn test_normalization_is_idempotent() {
        for raw in ["10.0.0.1:1080", "socks5://10.0.0.1:1080", "socks5h://host:1"] {
            let once = Endpoint::normalize(raw).unwrap();
            let twice = Endpoint::normalize(once.as_str()).unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_http_proxies_are_rejected() {
        assert!(Endpoint::normalize("http://10.0.0.1:8080").is_none());
        assert!(Endpoint::normalize("https://10.0.0.1:8080").is_none());
    }

    #[test]
    fn test_double_prefixed_uris_are_rejected() {
        assert!(Endpoint::normalize("socks5://http://10.0.0.1:8080").is_none());
        assert!(Endpoint::normalize("socks5://https://10.0.0.1:8080").is_none());
    }

    #[test]
    fn test_empty_and_ambiguous_tokens_are_rejected() {
        assert!(Endpoint::normalize("").is_none());
        assert!(Endpoint::normalize("   ").is_none());
        assert!(Endpoint::normalize("justahostname").is_none());
    }

    #[test]
    fn test_surrounding_whitespace_is_trimmed() {
        let endpoint = Endpoint::normalize("  10.0.0.1:1080  ").unwrap();
        assert_eq!(endpoint.as_str(), "socks5://10.0.0.1:1080");
    }
}
