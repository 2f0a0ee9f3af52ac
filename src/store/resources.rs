//! Fjall-backed store for discovered resources.
//!
//! Resources are keyed by their URL. Upserts replace all payload fields but
//! preserve the original `created_at`; reads are best-effort and never
//! surface storage errors to callers (queries degrade to empty results),
//! while writes propagate failures.

use std::collections::BTreeMap;

use chrono::Utc;
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle};
use tracing::{debug, error, warn};

use super::error::{Result, StoreError};
use super::partitions::encode_resource_key;
use crate::facilitator::FacilitatorInfo;
use crate::model::{DiscoveredResource, ResourceSource, StoredResource};
use crate::search::{calculate_relevance_score, extract_search_keywords, matches_search_keywords};

/// Query options for [`ResourceStore::query`].
#[derive(Debug, Default, Clone)]
pub struct ResourceQuery {
    /// Free-text query run through keyword extraction and relevance ranking.
    pub query: Option<String>,
    pub resource_type: Option<String>,
    pub source: Option<ResourceSource>,
    pub facilitator_name: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct QueryResult {
    pub resources: Vec<StoredResource>,
    pub total: usize,
}

#[derive(Debug, Clone, Default, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceStats {
    pub total: usize,
    pub by_source: BTreeMap<String, usize>,
    pub by_type: BTreeMap<String, usize>,
    pub by_facilitator: BTreeMap<String, usize>,
}

const DEFAULT_QUERY_LIMIT: usize = 100;

#[derive(Clone)]
pub struct ResourceStore {
    keyspace: Keyspace,
    resources: PartitionHandle,
}

impl ResourceStore {
    pub fn new(keyspace: &Keyspace) -> Result<Self> {
        let resources =
            keyspace.open_partition("resources", PartitionCreateOptions::default())?;
        Ok(Self {
            keyspace: keyspace.clone(),
            resources,
        })
    }

    /// Insert or update a resource. The URL is the merge key: payload fields
    /// are replaced wholesale, `created_at` survives from the first insert.
    pub fn upsert(
        &self,
        resource: &DiscoveredResource,
        source: ResourceSource,
        facilitator: Option<&FacilitatorInfo>,
    ) -> Result<()> {
        if !resource.has_valid_url() {
            return Err(StoreError::InvalidUrl(resource.resource.clone()));
        }

        let key = encode_resource_key(&resource.resource);
        let now = Utc::now();
        let created_at = match self.resources.get(&key)? {
            Some(existing) => serde_json::from_slice::<StoredResource>(&existing)
                .map(|stored| stored.created_at)
                .unwrap_or(now),
            None => now,
        };

        let stored = StoredResource {
            resource: resource.resource.clone(),
            source,
            facilitator_name: facilitator.map(|info| info.name.clone()),
            facilitator_url: facilitator.map(|info| info.url.clone()),
            resource_type: resource.resource_type.clone(),
            x402_version: resource.x402_version,
            accepts: resource.accepts.clone(),
            metadata: resource.metadata.clone(),
            last_updated: resource.last_updated,
            created_at,
            updated_at: now,
        };

        self.resources.insert(key, serde_json::to_vec(&stored)?)?;
        debug!(resource = %resource.resource, source = source.as_str(), "Upserted resource");
        Ok(())
    }

    /// Upsert a batch, skipping resources with invalid URLs.
    ///
    /// Returns the number of resources written. Storage failures propagate;
    /// invalid URLs only cost a warning because upstream registries do ship
    /// the occasional garbage entry.
    pub fn upsert_batch(
        &self,
        resources: &[DiscoveredResource],
        source: ResourceSource,
        facilitator: Option<&FacilitatorInfo>,
    ) -> Result<usize> {
        let mut written = 0;
        for resource in resources {
            match self.upsert(resource, source, facilitator) {
                Ok(()) => written += 1,
                Err(StoreError::InvalidUrl(url)) => {
                    warn!(url, "Skipping resource with invalid URL");
                }
                Err(other) => return Err(other),
            }
        }
        Ok(written)
    }

    /// Query resources with optional text search and exact-match filters.
    ///
    /// Always returns a best-effort result; storage errors are logged and
    /// yield an empty result rather than propagating.
    pub fn query(&self, options: &ResourceQuery) -> QueryResult {
        let mut filtered = match self.load_all() {
            Ok(resources) => resources,
            Err(err) => {
                error!(error = %err, "Failed to load resources for query");
                return QueryResult {
                    resources: Vec::new(),
                    total: 0,
                };
            }
        };

        if let Some(resource_type) = &options.resource_type {
            filtered.retain(|r| &r.resource_type == resource_type);
        }
        if let Some(source) = options.source {
            filtered.retain(|r| r.source == source);
        }
        if let Some(name) = &options.facilitator_name {
            filtered.retain(|r| r.facilitator_name.as_deref() == Some(name.as_str()));
        }

        let keywords = options
            .query
            .as_deref()
            .map(extract_search_keywords)
            .unwrap_or_default();

        if keywords.is_empty() {
            // No text query: most recently updated first.
            filtered.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));
        } else {
            let mut scored: Vec<(f64, StoredResource)> = filtered
                .into_iter()
                .filter_map(|resource| {
                    let text = resource.searchable_text();
                    if matches_search_keywords(&text, &keywords) {
                        Some((calculate_relevance_score(&text, &keywords), resource))
                    } else {
                        None
                    }
                })
                .collect();
            scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
            filtered = scored.into_iter().map(|(_, resource)| resource).collect();
        }

        let total = filtered.len();
        let offset = options.offset.unwrap_or(0);
        let limit = options.limit.unwrap_or(DEFAULT_QUERY_LIMIT);
        let resources = filtered.into_iter().skip(offset).take(limit).collect();

        QueryResult { resources, total }
    }

    /// Fetch a single resource by its URL. Best-effort.
    pub fn get_by_url(&self, url: &str) -> Option<StoredResource> {
        match self.resources.get(encode_resource_key(url)) {
            Ok(Some(value)) => serde_json::from_slice(&value)
                .map_err(|err| warn!(url, error = %err, "Corrupt stored resource"))
                .ok(),
            Ok(None) => None,
            Err(err) => {
                error!(url, error = %err, "Failed to read resource");
                None
            }
        }
    }

    /// Aggregate counts by source, type, and facilitator. Best-effort.
    pub fn stats(&self) -> ResourceStats {
        let resources = match self.load_all() {
            Ok(resources) => resources,
            Err(err) => {
                error!(error = %err, "Failed to load resources for stats");
                return ResourceStats::default();
            }
        };

        let mut stats = ResourceStats {
            total: resources.len(),
            ..ResourceStats::default()
        };
        for resource in &resources {
            *stats
                .by_source
                .entry(resource.source.as_str().to_string())
                .or_default() += 1;
            *stats
                .by_type
                .entry(resource.resource_type.clone())
                .or_default() += 1;
            if let Some(name) = &resource.facilitator_name {
                *stats.by_facilitator.entry(name.clone()).or_default() += 1;
            }
        }
        stats
    }

    /// Retention sweep: remove resources whose `last_updated` is older than
    /// the cutoff. Returns the number removed.
    pub fn prune_older_than(&self, days: u32) -> Result<usize> {
        let cutoff = Utc::now() - chrono::Duration::days(i64::from(days));
        let mut expired = Vec::new();

        for item in self.resources.iter() {
            let (key, value) = item?;
            let Ok(stored) = serde_json::from_slice::<StoredResource>(&value) else {
                continue;
            };
            if stored.last_updated < cutoff {
                expired.push(key);
            }
        }

        let pruned = expired.len();
        for key in expired {
            self.resources.remove(key)?;
        }

        if pruned > 0 {
            self.keyspace.persist(fjall::PersistMode::SyncAll)?;
        }
        debug!(pruned, days, "Resource retention sweep completed");
        Ok(pruned)
    }

    fn load_all(&self) -> Result<Vec<StoredResource>> {
        let mut resources = Vec::new();
        for item in self.resources.iter() {
            let (_, value) = item?;
            match serde_json::from_slice(&value) {
                Ok(stored) => resources.push(stored),
                Err(err) => warn!(error = %err, "Skipping corrupt stored resource"),
            }
        }
        Ok(resources)
    }
}
