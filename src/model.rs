//! Core domain types for discovered x402 resources.
//!
//! Wire shapes keep the camelCase JSON used by facilitators and 402 response
//! bodies, so the same structs serve both deserialization of upstream
//! payloads and persistence in the local store.
//!
//! # Key Concepts
//!
//! - **Endpoint**: a URL believed to implement the pay-per-request protocol.
//! - **Resource**: a validated endpoint plus its declared payment
//!   requirements and metadata, keyed by its URL.
//! - **Facilitator**: a third-party registry that lists known resources.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One accepted payment method advertised by a resource.
///
/// Mirrors the `accepts` entries of a 402 response body. Order within
/// [`DiscoveredResource::accepts`] is significant: index 0 is the default
/// requirement shown to clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequirement {
    pub scheme: String,
    pub network: String,
    #[serde(default)]
    pub max_amount_required: String,
    #[serde(default)]
    pub resource: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub pay_to: String,
    #[serde(default = "default_timeout_seconds")]
    pub max_timeout_seconds: u64,
    #[serde(default)]
    pub asset: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,
}

fn default_timeout_seconds() -> u64 {
    60
}

/// A resource as reported by a probe or a facilitator listing.
///
/// The `resource` URL is the natural key. Invariant: it must parse as an
/// absolute http/https URL before the resource is admitted to the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveredResource {
    pub resource: String,
    #[serde(default = "default_resource_type", rename = "type")]
    pub resource_type: String,
    #[serde(default = "default_x402_version")]
    pub x402_version: u32,
    #[serde(default)]
    pub accepts: Vec<PaymentRequirement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Map<String, Value>>,
    #[serde(default = "Utc::now")]
    pub last_updated: DateTime<Utc>,
}

fn default_resource_type() -> String {
    "http".to_string()
}

fn default_x402_version() -> u32 {
    1
}

impl DiscoveredResource {
    /// Whether the resource URL is a syntactically valid absolute http(s) URL.
    pub fn has_valid_url(&self) -> bool {
        match url::Url::parse(&self.resource) {
            Ok(parsed) => matches!(parsed.scheme(), "http" | "https"),
            Err(_) => false,
        }
    }
}

/// Where a stored resource came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceSource {
    Crawler,
    Facilitator,
    DirectDiscovery,
}

impl ResourceSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceSource::Crawler => "crawler",
            ResourceSource::Facilitator => "facilitator",
            ResourceSource::DirectDiscovery => "direct-discovery",
        }
    }
}

impl std::str::FromStr for ResourceSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "crawler" => Ok(ResourceSource::Crawler),
            "facilitator" => Ok(ResourceSource::Facilitator),
            "direct-discovery" => Ok(ResourceSource::DirectDiscovery),
            other => Err(format!("unknown resource source: {other}")),
        }
    }
}

/// A discovered resource plus provenance, as persisted in the store.
///
/// `created_at` is set once on first admission and survives every upsert;
/// `updated_at` is refreshed on each one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredResource {
    pub resource: String,
    pub source: ResourceSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facilitator_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facilitator_url: Option<String>,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub x402_version: u32,
    pub accepts: Vec<PaymentRequirement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Map<String, Value>>,
    pub last_updated: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredResource {
    /// Lowercased text blob used by keyword search: the URL, the joined
    /// accepts descriptions, and the stringified metadata.
    pub fn searchable_text(&self) -> String {
        let descriptions = self
            .accepts
            .iter()
            .map(|accept| accept.description.to_lowercase())
            .collect::<Vec<_>>()
            .join(" ");
        let metadata = self
            .metadata
            .as_ref()
            .and_then(|m| serde_json::to_string(m).ok())
            .unwrap_or_default()
            .to_lowercase();

        format!("{} {} {}", self.resource.to_lowercase(), descriptions, metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn requirement() -> PaymentRequirement {
        PaymentRequirement {
            scheme: "exact".to_string(),
            network: "base".to_string(),
            max_amount_required: "1000".to_string(),
            resource: "https://api.example.com/v1/data".to_string(),
            description: "Weather data lookup".to_string(),
            mime_type: "application/json".to_string(),
            pay_to: "0xabc".to_string(),
            max_timeout_seconds: 60,
            asset: "usdc".to_string(),
            output_schema: None,
            extra: None,
        }
    }

    #[test]
    fn test_payment_requirement_camel_case() {
        let json = serde_json::to_value(requirement()).unwrap();
        assert!(json.get("maxAmountRequired").is_some());
        assert!(json.get("payTo").is_some());
        assert!(json.get("maxTimeoutSeconds").is_some());
    }

    #[test]
    fn test_resource_source_tags() {
        assert_eq!(
            serde_json::to_string(&ResourceSource::DirectDiscovery).unwrap(),
            "\"direct-discovery\""
        );
        assert_eq!(
            "facilitator".parse::<ResourceSource>().unwrap(),
            ResourceSource::Facilitator
        );
    }

    #[test]
    fn test_discovered_resource_defaults() {
        let json = r#"{"resource": "https://api.example.com/v1"}"#;
        let resource: DiscoveredResource = serde_json::from_str(json).unwrap();
        assert_eq!(resource.resource_type, "http");
        assert_eq!(resource.x402_version, 1);
        assert!(resource.accepts.is_empty());
        assert!(resource.has_valid_url());
    }

    #[test]
    fn test_invalid_resource_url() {
        let json = r#"{"resource": "not a url"}"#;
        let resource: DiscoveredResource = serde_json::from_str(json).unwrap();
        assert!(!resource.has_valid_url());

        let json = r#"{"resource": "ftp://example.com/file"}"#;
        let resource: DiscoveredResource = serde_json::from_str(json).unwrap();
        assert!(!resource.has_valid_url());
    }

    #[test]
    fn test_searchable_text() {
        let stored = StoredResource {
            resource: "https://api.example.com/Weather".to_string(),
            source: ResourceSource::Crawler,
            facilitator_name: None,
            facilitator_url: None,
            resource_type: "http".to_string(),
            x402_version: 1,
            accepts: vec![requirement()],
            metadata: None,
            last_updated: Utc::now(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let text = stored.searchable_text();
        assert!(text.contains("https://api.example.com/weather"));
        assert!(text.contains("weather data lookup"));
    }
}
