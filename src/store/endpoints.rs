//! Persisted endpoint working set.
//!
//! The whole list is one document under a fixed key in the `meta`
//! partition, loaded and saved atomically. Membership means the URL passed
//! validation at some point or was manually admitted; it is the input to
//! future direct probing, not a guarantee of current validity.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::error::{Result, StoreError};
use super::partitions::ENDPOINT_LIST_KEY;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointStats {
    pub total_discovered: usize,
    pub total_validated: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_crawl_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointList {
    /// Ordered, unique endpoint URLs.
    pub endpoints: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
    /// Per-source discovery counters ("crawl", "manual", ...).
    #[serde(default)]
    pub sources: BTreeMap<String, usize>,
    #[serde(default)]
    pub stats: EndpointStats,
}

impl EndpointList {
    /// Whether the last crawl is older than the given TTL (or never ran).
    pub fn is_stale(&self, ttl: chrono::Duration) -> bool {
        match self.stats.last_crawl_time {
            Some(last) => Utc::now() - last > ttl,
            None => true,
        }
    }
}

#[derive(Clone)]
pub struct EndpointListStore {
    keyspace: Keyspace,
    meta: PartitionHandle,
}

impl EndpointListStore {
    pub fn new(keyspace: &Keyspace) -> Result<Self> {
        let meta = keyspace.open_partition("meta", PartitionCreateOptions::default())?;
        Ok(Self {
            keyspace: keyspace.clone(),
            meta,
        })
    }

    /// Load the endpoint list. Read failures fall back to an empty default
    /// with a warning; an empty list triggers a crawl rather than an error.
    pub fn load(&self) -> EndpointList {
        match self.meta.get(ENDPOINT_LIST_KEY) {
            Ok(Some(value)) => serde_json::from_slice(&value).unwrap_or_else(|err| {
                warn!(error = %err, "Corrupt endpoint list, starting empty");
                EndpointList::default()
            }),
            Ok(None) => EndpointList::default(),
            Err(err) => {
                warn!(error = %err, "Failed to load endpoint list, starting empty");
                EndpointList::default()
            }
        }
    }

    /// Persist the endpoint list. Write failures propagate to the caller.
    pub fn save(&self, list: &EndpointList) -> Result<()> {
        self.meta.insert(ENDPOINT_LIST_KEY, serde_json::to_vec(list)?)?;
        self.keyspace.persist(fjall::PersistMode::Buffer)?;
        debug!(endpoints = list.endpoints.len(), "Saved endpoint list");
        Ok(())
    }

    /// Manual admission, bypassing the crawl. Idempotent append-if-absent.
    ///
    /// Returns true when the endpoint was actually added.
    pub fn add_endpoint(&self, url: &str) -> Result<bool> {
        let parsed = url::Url::parse(url).map_err(|_| StoreError::InvalidUrl(url.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(StoreError::InvalidUrl(url.to_string()));
        }

        let mut list = self.load();
        if list.endpoints.iter().any(|existing| existing == url) {
            return Ok(false);
        }

        list.endpoints.push(url.to_string());
        list.last_updated = Some(Utc::now());
        *list.sources.entry("manual".to_string()).or_default() += 1;
        self.save(&list)?;
        Ok(true)
    }

    pub fn stats(&self) -> EndpointStats {
        self.load().stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_store() -> (EndpointListStore, TempDir) {
        let temp = TempDir::new().unwrap();
        let keyspace = crate::store::open_keyspace(temp.path().join("store")).unwrap();
        (EndpointListStore::new(&keyspace).unwrap(), temp)
    }

    #[test]
    fn test_load_defaults_to_empty() {
        let (store, _temp) = open_store();
        let list = store.load();
        assert!(list.endpoints.is_empty());
        assert!(list.is_stale(chrono::Duration::hours(24)));
    }

    #[test]
    fn test_add_endpoint_is_idempotent() {
        let (store, _temp) = open_store();
        let url = "https://api.example.com/v1/pay";

        assert!(store.add_endpoint(url).unwrap());
        assert!(!store.add_endpoint(url).unwrap());

        let list = store.load();
        assert_eq!(list.endpoints, vec![url]);
        assert_eq!(list.sources.get("manual"), Some(&1));
    }

    #[test]
    fn test_add_endpoint_rejects_invalid_urls() {
        let (store, _temp) = open_store();
        assert!(matches!(
            store.add_endpoint("not-a-url"),
            Err(StoreError::InvalidUrl(_))
        ));
        assert!(matches!(
            store.add_endpoint("ftp://example.com/x"),
            Err(StoreError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_save_load_round_trip() {
        let (store, _temp) = open_store();
        let mut list = EndpointList::default();
        list.endpoints = vec!["https://a.test/x".to_string(), "https://b.test/y".to_string()];
        list.stats.total_discovered = 10;
        list.stats.total_validated = 2;
        list.stats.last_crawl_time = Some(Utc::now());
        store.save(&list).unwrap();

        let loaded = store.load();
        assert_eq!(loaded.endpoints, list.endpoints);
        assert_eq!(loaded.stats.total_validated, 2);
        assert!(!loaded.is_stale(chrono::Duration::hours(24)));
    }

    #[test]
    fn test_staleness_boundary() {
        let mut list = EndpointList::default();
        list.stats.last_crawl_time = Some(Utc::now() - chrono::Duration::hours(25));
        assert!(list.is_stale(chrono::Duration::hours(24)));

        list.stats.last_crawl_time = Some(Utc::now() - chrono::Duration::hours(1));
        assert!(!list.is_stale(chrono::Duration::hours(24)));
    }
}
