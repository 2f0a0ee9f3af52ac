//! Candidate URL sources feeding the crawl aggregator.
//!
//! Each source is fault-isolated: the aggregator logs a failed source and
//! moves on, so one provider outage never aborts a crawl cycle.

pub mod ecosystem;
pub mod github;

use async_trait::async_trait;
use thiserror::Error;

pub use ecosystem::EcosystemSource;
pub use github::GithubSource;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed upstream data: {0}")]
    Malformed(String),
}

pub type Result<T> = std::result::Result<T, SourceError>;

/// A crawl source producing candidate endpoint URLs.
#[async_trait]
pub trait EndpointSource: Send + Sync {
    /// Human-readable source label, used in progress reporting and logs.
    fn name(&self) -> &'static str;

    /// Produce a deduplicated set of candidate URLs. Ordering across
    /// sources is not significant; failures of individual fetches within
    /// the source are skipped, not surfaced.
    async fn crawl(&self) -> Result<Vec<String>>;
}
