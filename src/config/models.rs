use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub retention: RetentionConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    #[serde(default = "default_data_path")]
    pub data_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            data_path: default_data_path(),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    "0.0.0.0:8080".parse().unwrap()
}

fn default_data_path() -> PathBuf {
    PathBuf::from("data/scout")
}

/// Crawler configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CrawlerConfig {
    /// GitHub API token (loaded from environment, not from config file)
    #[serde(skip)]
    pub github_token: Option<String>,
    /// Directory of ecosystem partner entries, one subdirectory each.
    #[serde(default = "default_partners_dir")]
    pub partners_dir: PathBuf,
    /// Age at which the cached endpoint list counts as stale.
    #[serde(default = "default_refresh_ttl_hours")]
    pub refresh_ttl_hours: u32,
    /// Candidate URLs validated concurrently per batch.
    #[serde(default = "default_validation_batch_size")]
    pub validation_batch_size: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            github_token: None,
            partners_dir: default_partners_dir(),
            refresh_ttl_hours: default_refresh_ttl_hours(),
            validation_batch_size: default_validation_batch_size(),
        }
    }
}

fn default_partners_dir() -> PathBuf {
    PathBuf::from("data/partners")
}

fn default_refresh_ttl_hours() -> u32 {
    24
}

fn default_validation_batch_size() -> usize {
    10
}

/// Background scheduling intervals
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_initial_delay_secs")]
    pub initial_delay_secs: u64,
    #[serde(default = "default_crawl_interval_secs")]
    pub crawl_interval_secs: u64,
    #[serde(default = "default_facilitator_sync_interval_secs")]
    pub facilitator_sync_interval_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            initial_delay_secs: default_initial_delay_secs(),
            crawl_interval_secs: default_crawl_interval_secs(),
            facilitator_sync_interval_secs: default_facilitator_sync_interval_secs(),
        }
    }
}

fn default_initial_delay_secs() -> u64 {
    30
}

fn default_crawl_interval_secs() -> u64 {
    30 * 60
}

fn default_facilitator_sync_interval_secs() -> u64 {
    6 * 60 * 60
}

/// Retention configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetentionConfig {
    /// Resources untouched for this many days are pruned.
    #[serde(default = "default_resource_ttl_days")]
    pub resource_ttl_days: u32,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            resource_ttl_days: default_resource_ttl_days(),
        }
    }
}

fn default_resource_ttl_days() -> u32 {
    90
}
