//! Fjall-based persistence for the discovery pipeline.
//!
//! One keyspace holds everything:
//!
//! - Stored resources (one record per URL) in the `resources` partition
//! - The endpoint list and crawler progress as whole documents in `meta`
//!
//! Fjall gives atomic per-key writes, which replaces the load-modify-save
//! JSON files a naive port would use; concurrent writers cannot tear a
//! document.

pub mod endpoints;
pub mod error;
pub mod partitions;
pub mod resources;

use std::path::Path;

use fjall::{Config, Keyspace};
use tracing::info;

pub use endpoints::{EndpointList, EndpointListStore, EndpointStats};
pub use error::{Result, StoreError};
pub use resources::{QueryResult, ResourceQuery, ResourceStats, ResourceStore};

/// Open (or create) the keyspace backing all stores.
pub fn open_keyspace<P: AsRef<Path>>(path: P) -> Result<Keyspace> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    info!(path = %path.display(), "Opening store keyspace");
    Ok(Config::new(path).open()?)
}
