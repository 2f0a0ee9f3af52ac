//! Facilitator registry and federation.
//!
//! Facilitators are third-party services that already index x402 resources
//! and expose them over a common discovery API. Syncing against them is the
//! cheapest discovery channel; the registry below is the hardcoded set of
//! operators we federate with.

pub mod client;
pub mod sync;

use serde::{Deserialize, Serialize};

pub use client::{FacilitatorClient, FacilitatorError, ListResourcesRequest, ListResourcesResponse};
pub use sync::{FacilitatorSyncResult, SyncReport, sync_all};

/// Identity of a facilitator: display name plus discovery API base URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilitatorInfo {
    pub name: String,
    pub url: String,
}

impl FacilitatorInfo {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Facilitators synced on the periodic schedule.
pub fn known_facilitators() -> Vec<FacilitatorInfo> {
    vec![
        FacilitatorInfo::new("x402.org", "https://x402.org/facilitator"),
        FacilitatorInfo::new(
            "Coinbase CDP",
            "https://api.cdp.coinbase.com/platform/v2/x402",
        ),
        FacilitatorInfo::new("Mogami", "https://facilitator.mogami.tech"),
        FacilitatorInfo::new("x402.rs", "https://facilitator.x402.rs"),
        FacilitatorInfo::new("PayAI", "https://facilitator.payai.network"),
        FacilitatorInfo::new("Corbits", "https://facilitator.corbits.dev"),
    ]
}

/// Resolve a facilitator URL back to its identity.
///
/// Matching is progressively looser: exact normalized URL, then substring
/// containment either way, then a hostname-derived name so unknown
/// operators still get a readable label.
pub fn info_for_url(url: &str) -> FacilitatorInfo {
    let normalized = url.trim_end_matches('/');

    for info in known_facilitators() {
        if info.url.trim_end_matches('/') == normalized {
            return info;
        }
    }

    for info in known_facilitators() {
        let known = info.url.trim_end_matches('/');
        if normalized.contains(known) || known.contains(normalized) {
            return FacilitatorInfo::new(info.name, url);
        }
    }

    let name = url::Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(String::from))
        .unwrap_or_else(|| "Unknown".to_string());
    FacilitatorInfo::new(name, url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_facilitators_count() {
        assert_eq!(known_facilitators().len(), 6);
    }

    #[test]
    fn test_info_for_url_exact_match() {
        let info = info_for_url("https://facilitator.payai.network");
        assert_eq!(info.name, "PayAI");
    }

    #[test]
    fn test_info_for_url_ignores_trailing_slash() {
        let info = info_for_url("https://x402.org/facilitator/");
        assert_eq!(info.name, "x402.org");
    }

    #[test]
    fn test_info_for_url_substring_match() {
        let info = info_for_url("https://facilitator.x402.rs/discovery");
        assert_eq!(info.name, "x402.rs");
        assert_eq!(info.url, "https://facilitator.x402.rs/discovery");
    }

    #[test]
    fn test_info_for_url_hostname_fallback() {
        let info = info_for_url("https://pay.somewhere.example/v1");
        assert_eq!(info.name, "pay.somewhere.example");
    }

    #[test]
    fn test_info_for_url_unparseable_fallback() {
        let info = info_for_url("not a url");
        assert_eq!(info.name, "Unknown");
    }
}
