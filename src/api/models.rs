//! API models for the discovery and resource endpoints.
//!
//! Responses keep the camelCase shapes of the facilitator discovery API so
//! downstream x402 clients can consume this service and a facilitator
//! interchangeably.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::model::{DiscoveredResource, StoredResource};
use crate::observability::MetricsSnapshot;
use crate::store::{EndpointStats, ResourceStats};

/// Query parameters for `GET /resources`.
#[derive(Debug, Default, Deserialize)]
pub struct ResourceQueryParams {
    /// Free-text search query.
    pub q: Option<String>,
    #[serde(rename = "type")]
    pub resource_type: Option<String>,
    /// Provenance filter: crawler, facilitator, or direct-discovery.
    pub source: Option<String>,
    pub facilitator: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourcesResponse {
    pub resources: Vec<StoredResource>,
    pub total: usize,
}

/// Query parameters for `GET /discovery/resources`.
#[derive(Debug, Default, Deserialize)]
pub struct DiscoveryQueryParams {
    #[serde(rename = "type")]
    pub resource_type: Option<String>,
    pub limit: Option<usize>,
    #[serde(default)]
    pub force_refresh: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryResponse {
    pub x402_version: u32,
    pub items: Vec<DiscoveredResource>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub resources: ResourceStats,
    pub endpoints: EndpointStats,
    pub metrics: MetricsSnapshot,
    pub crawler_running: bool,
}

#[derive(Debug, Serialize)]
pub struct CrawlTriggeredResponse {
    pub status: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct AddEndpointRequest {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct AddEndpointResponse {
    pub url: String,
    pub added: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub components: HashMap<String, String>,
    pub version: String,
}
