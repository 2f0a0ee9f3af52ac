//! Ecosystem partner website crawler.
//!
//! Partners are registered locally as directories containing a
//! `metadata.json` with a display name and website URL. Each declared
//! website is fetched once per crawl and scanned for candidate URLs. A
//! partner with no website, unreadable metadata, or a failed fetch is
//! skipped.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::{EndpointSource, Result};
use crate::crawler::extract::extract_urls_from_text;

const MAX_PARTNERS: usize = 50;
const FETCH_TIMEOUT: Duration = Duration::from_secs(5);
pub const CRAWLER_USER_AGENT: &str = "x402-crawler/1.0";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartnerMetadata {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    website_url: Option<String>,
}

pub struct EcosystemSource {
    partners_dir: PathBuf,
    client: reqwest::Client,
}

impl EcosystemSource {
    pub fn new(partners_dir: PathBuf) -> Self {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(CRAWLER_USER_AGENT)
            .build()
            .unwrap_or_default();
        Self { partners_dir, client }
    }

    fn load_partner(&self, folder: &std::path::Path) -> Option<PartnerMetadata> {
        let metadata_path = folder.join("metadata.json");
        let content = std::fs::read_to_string(&metadata_path).ok()?;
        match serde_json::from_str(&content) {
            Ok(metadata) => Some(metadata),
            Err(error) => {
                debug!(path = %metadata_path.display(), error = %error, "Bad partner metadata");
                None
            }
        }
    }

    async fn crawl_website(&self, partner: &str, website: &str) -> Vec<String> {
        let response = match self.client.get(website).send().await {
            Ok(response) => response,
            Err(error) => {
                debug!(partner, website, error = %error, "Partner website fetch failed");
                return Vec::new();
            }
        };

        if !response.status().is_success() {
            debug!(partner, website, status = %response.status(), "Partner website fetch rejected");
            return Vec::new();
        }

        let html = match response.text().await {
            Ok(html) => html,
            Err(error) => {
                debug!(partner, website, error = %error, "Failed to read partner website body");
                return Vec::new();
            }
        };

        let urls = extract_urls_from_text(&html);
        debug!(partner, count = urls.len(), "Extracted URLs from partner website");
        urls
    }
}

#[async_trait]
impl EndpointSource for EcosystemSource {
    fn name(&self) -> &'static str {
        "Ecosystem"
    }

    async fn crawl(&self) -> Result<Vec<String>> {
        let mut folders: Vec<PathBuf> = std::fs::read_dir(&self.partners_dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect();
        folders.sort();

        let total = folders.len().min(MAX_PARTNERS);
        info!(
            found = folders.len(),
            processing = total,
            dir = %self.partners_dir.display(),
            "Starting ecosystem crawl"
        );

        let mut urls = Vec::new();
        let mut seen = HashSet::new();

        for folder in folders.into_iter().take(MAX_PARTNERS) {
            let Some(metadata) = self.load_partner(&folder) else {
                continue;
            };
            let partner = metadata
                .name
                .unwrap_or_else(|| folder.file_name().unwrap_or_default().to_string_lossy().into_owned());

            let Some(website) = metadata.website_url.filter(|w| !w.is_empty()) else {
                debug!(partner = %partner, "Partner has no website URL");
                continue;
            };

            for url in self.crawl_website(&partner, &website).await {
                if seen.insert(url.clone()) {
                    urls.push(url);
                }
            }
        }

        if urls.is_empty() {
            warn!("Ecosystem crawl extracted no URLs");
        }
        info!(urls = urls.len(), "Ecosystem crawl completed");
        Ok(urls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn write_partner(dir: &std::path::Path, folder: &str, metadata: serde_json::Value) {
        let partner_dir = dir.join(folder);
        std::fs::create_dir_all(&partner_dir).unwrap();
        std::fs::write(
            partner_dir.join("metadata.json"),
            serde_json::to_string(&metadata).unwrap(),
        )
        .unwrap();
    }

    #[tokio::test]
    async fn test_crawls_partner_websites() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .and(header("user-agent", CRAWLER_USER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "docs at https://api.partner.test/v1/quote",
            ))
            .mount(&server)
            .await;

        let temp = TempDir::new().unwrap();
        write_partner(
            temp.path(),
            "partner-a",
            serde_json::json!({"name": "Partner A", "websiteUrl": server.uri()}),
        );

        let source = EcosystemSource::new(temp.path().to_path_buf());
        let urls = source.crawl().await.unwrap();
        assert_eq!(urls, vec!["https://api.partner.test/v1/quote"]);
    }

    #[tokio::test]
    async fn test_skips_partners_without_website_or_metadata() {
        let temp = TempDir::new().unwrap();
        write_partner(temp.path(), "no-site", serde_json::json!({"name": "No Site"}));
        let broken = temp.path().join("broken");
        std::fs::create_dir_all(&broken).unwrap();
        std::fs::write(broken.join("metadata.json"), "{not json").unwrap();

        let source = EcosystemSource::new(temp.path().to_path_buf());
        let urls = source.crawl().await.unwrap();
        assert!(urls.is_empty());
    }

    #[tokio::test]
    async fn test_failed_fetch_is_not_fatal() {
        let temp = TempDir::new().unwrap();
        write_partner(
            temp.path(),
            "dead",
            serde_json::json!({"name": "Dead", "websiteUrl": "http://127.0.0.1:1/"}),
        );

        let source = EcosystemSource::new(temp.path().to_path_buf());
        assert!(source.crawl().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_directory_is_an_error() {
        let source = EcosystemSource::new(PathBuf::from("/nonexistent/partners"));
        assert!(source.crawl().await.is_err());
    }
}
