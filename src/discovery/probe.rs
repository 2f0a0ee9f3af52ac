//! Direct probing of known endpoints.
//!
//! The crawl validator only asks "does this look like x402"; the probe asks
//! for the full payment manifest. A probe hit requires an actual 402 with a
//! JSON body carrying `x402Version` and an `accepts` array, and is stored
//! with direct-discovery provenance.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::refresher::EndpointRefresher;
use crate::model::{DiscoveredResource, PaymentRequirement, ResourceSource};
use crate::observability::Metrics;
use crate::store::ResourceStore;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
const PROBE_USER_AGENT: &str = "x402-discovery-bot/1.0";
const PROBE_BATCH_SIZE: usize = 10;
const DEFAULT_DISCOVERY_LIMIT: usize = 1000;

/// Options for [`DirectProber::discover_resources_from_endpoints`].
#[derive(Debug, Clone, Default)]
pub struct DiscoveryOptions {
    /// Only return resources of this type ("http", ...).
    pub resource_type: Option<String>,
    /// Cap on returned resources; defaults to 1000.
    pub limit: Option<usize>,
    /// Force an endpoint list refresh before probing.
    pub force_refresh: bool,
}

pub struct DirectProber {
    client: reqwest::Client,
    refresher: Arc<EndpointRefresher>,
    resources: ResourceStore,
    metrics: Arc<Metrics>,
}

impl DirectProber {
    pub fn new(
        refresher: Arc<EndpointRefresher>,
        resources: ResourceStore,
        metrics: Arc<Metrics>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(PROBE_TIMEOUT)
            .user_agent(PROBE_USER_AGENT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            refresher,
            resources,
            metrics,
        }
    }

    /// Probe every known endpoint and return the resources that answered
    /// with a payment manifest, newest first.
    ///
    /// The endpoint list is fetched in background mode, so a stale list is
    /// served immediately while it refreshes behind this call.
    pub async fn discover_resources_from_endpoints(
        &self,
        options: &DiscoveryOptions,
    ) -> Vec<DiscoveredResource> {
        let endpoints = match self
            .refresher
            .discover_and_update(options.force_refresh, true)
            .await
        {
            Ok(endpoints) => endpoints,
            Err(error) => {
                warn!(error, "Endpoint refresh failed, probing nothing");
                return Vec::new();
            }
        };

        if endpoints.is_empty() {
            return Vec::new();
        }
        info!(endpoints = endpoints.len(), "Probing endpoints for resources");

        let mut discovered: Vec<DiscoveredResource> = Vec::new();
        let mut seen = std::collections::HashSet::new();
        for batch in endpoints.chunks(PROBE_BATCH_SIZE) {
            let probes = batch.iter().map(|url| self.probe_endpoint(url));
            for resource in join_all(probes).await.into_iter().flatten() {
                if seen.insert(resource.resource.clone()) {
                    self.metrics.probe_hit();
                    discovered.push(resource);
                }
            }
        }

        match self
            .resources
            .upsert_batch(&discovered, ResourceSource::DirectDiscovery, None)
        {
            Ok(written) => self.metrics.resources_upserted(written as u64),
            Err(err) => warn!(error = %err, "Failed to store probed resources"),
        }

        if let Some(resource_type) = &options.resource_type {
            discovered.retain(|r| &r.resource_type == resource_type);
        }
        discovered.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));
        discovered.truncate(options.limit.unwrap_or(DEFAULT_DISCOVERY_LIMIT));
        discovered
    }

    /// Probe one endpoint for its payment manifest.
    pub async fn probe_endpoint(&self, url: &str) -> Option<DiscoveredResource> {
        let response = match self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                debug!(url, error = %err, "Probe request failed");
                return None;
            }
        };

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(String::from);
        let body = response.bytes().await.ok()?;

        parse_probe_response(url, status, content_type.as_deref(), &body)
    }
}

/// Decide whether a probe response is a payment manifest.
///
/// Strict by design: only a 402 with a JSON content type whose body carries
/// `x402Version` and an `accepts` array counts. Anything looser would fill
/// the store with resources nobody can actually pay for.
pub(crate) fn parse_probe_response(
    url: &str,
    status: u16,
    content_type: Option<&str>,
    body: &[u8],
) -> Option<DiscoveredResource> {
    if status != 402 {
        return None;
    }
    let json_like = content_type
        .map(|value| {
            value
                .parse::<mime::Mime>()
                .map(|m| {
                    m.subtype() == mime::JSON || m.suffix() == Some(mime::JSON)
                })
                .unwrap_or(false)
        })
        .unwrap_or(false);
    if !json_like {
        return None;
    }

    let value: Value = serde_json::from_slice(body).ok()?;
    let version = value.get("x402Version")?.as_u64()? as u32;
    let accepts_raw = value.get("accepts")?.as_array()?;

    let accepts: Vec<PaymentRequirement> = accepts_raw
        .iter()
        .filter_map(|entry| serde_json::from_value::<PaymentRequirement>(entry.clone()).ok())
        .map(|mut requirement| {
            if requirement.resource.is_empty() {
                requirement.resource = url.to_string();
            }
            requirement
        })
        .collect();

    let mut metadata = serde_json::Map::new();
    metadata.insert("discoveredBy".to_string(), Value::from(PROBE_USER_AGENT));
    metadata.insert(
        "discoveredAt".to_string(),
        Value::from(Utc::now().to_rfc3339()),
    );

    Some(DiscoveredResource {
        resource: url.to_string(),
        resource_type: "http".to_string(),
        x402_version: version,
        accepts,
        metadata: Some(metadata),
        last_updated: Utc::now(),
    })
}
