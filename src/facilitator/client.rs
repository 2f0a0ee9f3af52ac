//! HTTP client for the facilitator discovery API.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::model::DiscoveredResource;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const DEFAULT_LIST_LIMIT: usize = 1000;

#[derive(Debug, Error)]
pub enum FacilitatorError {
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Facilitator returned status {0}")]
    Status(reqwest::StatusCode),
}

pub type Result<T> = std::result::Result<T, FacilitatorError>;

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResourcesRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResourcesResponse {
    #[serde(default)]
    pub items: Vec<DiscoveredResource>,
    #[serde(default)]
    pub x402_version: Option<u32>,
}

#[derive(Clone)]
pub struct FacilitatorClient {
    client: reqwest::Client,
    base_url: String,
}

impl FacilitatorClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent("x402-scout/1.0")
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// List the resources a facilitator has indexed.
    pub async fn list_resources(&self, request: &ListResourcesRequest) -> Result<ListResourcesResponse> {
        let url = format!("{}/discovery/resources", self.base_url);
        let limit = request.limit.unwrap_or(DEFAULT_LIST_LIMIT);

        let mut req = self.client.get(&url).query(&[("limit", limit)]);
        if let Some(offset) = request.offset {
            req = req.query(&[("offset", offset)]);
        }

        let response = req.send().await?;
        if !response.status().is_success() {
            return Err(FacilitatorError::Status(response.status()));
        }

        let body: ListResourcesResponse = response.json().await?;
        debug!(
            base_url = %self.base_url,
            items = body.items.len(),
            "Listed facilitator resources"
        );
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_list_resources_parses_items() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/discovery/resources"))
            .and(query_param("limit", "1000"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "x402Version": 1,
                "items": [
                    {"resource": "https://api.example.com/v1/data", "accepts": []}
                ]
            })))
            .mount(&server)
            .await;

        let client = FacilitatorClient::new(server.uri());
        let response = client
            .list_resources(&ListResourcesRequest::default())
            .await
            .unwrap();

        assert_eq!(response.items.len(), 1);
        assert_eq!(response.items[0].resource, "https://api.example.com/v1/data");
        assert_eq!(response.x402_version, Some(1));
    }

    #[tokio::test]
    async fn test_list_resources_surfaces_http_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/discovery/resources"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = FacilitatorClient::new(server.uri());
        let err = client
            .list_resources(&ListResourcesRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, FacilitatorError::Status(status) if status.as_u16() == 500));
    }

    #[tokio::test]
    async fn test_trailing_slash_normalized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/discovery/resources"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"items": []})))
            .mount(&server)
            .await;

        let client = FacilitatorClient::new(format!("{}/", server.uri()));
        let response = client
            .list_resources(&ListResourcesRequest::default())
            .await
            .unwrap();
        assert!(response.items.is_empty());
    }
}
