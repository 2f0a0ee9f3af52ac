//! Configuration management.
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use x402_scout::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Server listening on: {}", config.server.bind_addr);
//! ```
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `SCOUT__<section>__<key>`
//!
//! Examples:
//! - `SCOUT__SERVER__BIND_ADDR=0.0.0.0:9000`
//! - `SCOUT__CRAWLER__REFRESH_TTL_HOURS=12`
//! - `SCOUT__SCHEDULE__CRAWL_INTERVAL_SECS=600`
//!
//! The GitHub token is a secret and only ever read from the `GITHUB_TOKEN`
//! environment variable, never from the TOML file.
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/scout.toml`.
//! This can be overridden using the `SCOUT_CONFIG` environment variable.

mod models;
mod sources;

// Re-export public types
pub use models::{Config, CrawlerConfig, RetentionConfig, ScheduleConfig, ServerConfig};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables (`SCOUT__*`)
    /// 2. TOML file (default: `config/scout.toml`)
    /// 3. Default values
    pub fn load() -> Result<Self, ConfigError> {
        Ok(sources::load()?)
    }

    /// Load configuration from a specific path
    ///
    /// Useful for testing with custom configuration files.
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        Ok(sources::load_from_sources(path)?)
    }
}
