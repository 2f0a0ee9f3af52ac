//! Periodic sync against the facilitator registry.
//!
//! Each facilitator is queried independently; one operator being down or
//! returning garbage never blocks the others. Results land in the resource
//! store with facilitator provenance.

use futures::future::join_all;
use serde::Serialize;
use tracing::{info, warn};

use super::client::{FacilitatorClient, ListResourcesRequest};
use super::{FacilitatorInfo, known_facilitators};
use crate::model::ResourceSource;
use crate::store::ResourceStore;

const SYNC_CONCURRENCY: usize = 3;

/// Outcome of syncing a single facilitator.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilitatorSyncResult {
    pub facilitator: FacilitatorInfo,
    /// Resources written to the store from this facilitator.
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    /// Total resources written across all facilitators.
    pub total: usize,
    pub results: Vec<FacilitatorSyncResult>,
}

/// Sync every known facilitator into the resource store.
pub async fn sync_all(store: &ResourceStore) -> SyncReport {
    sync_facilitators(store, &known_facilitators()).await
}

/// Sync a specific set of facilitators, a few at a time.
pub async fn sync_facilitators(
    store: &ResourceStore,
    facilitators: &[FacilitatorInfo],
) -> SyncReport {
    let mut results = Vec::with_capacity(facilitators.len());

    for batch in facilitators.chunks(SYNC_CONCURRENCY) {
        let futures = batch.iter().map(|info| sync_one(store, info));
        results.extend(join_all(futures).await);
    }

    let total = results.iter().map(|r| r.count).sum();
    info!(
        total,
        facilitators = facilitators.len(),
        "Facilitator sync completed"
    );
    SyncReport { total, results }
}

async fn sync_one(store: &ResourceStore, info: &FacilitatorInfo) -> FacilitatorSyncResult {
    let client = FacilitatorClient::new(&info.url);

    let response = match client.list_resources(&ListResourcesRequest::default()).await {
        Ok(response) => response,
        Err(err) => {
            warn!(facilitator = %info.name, error = %err, "Facilitator sync failed");
            return FacilitatorSyncResult {
                facilitator: info.clone(),
                count: 0,
                error: Some(err.to_string()),
            };
        }
    };

    match store.upsert_batch(&response.items, ResourceSource::Facilitator, Some(info)) {
        Ok(count) => {
            info!(facilitator = %info.name, count, "Synced facilitator resources");
            FacilitatorSyncResult {
                facilitator: info.clone(),
                count,
                error: None,
            }
        }
        Err(err) => {
            warn!(facilitator = %info.name, error = %err, "Failed to store facilitator resources");
            FacilitatorSyncResult {
                facilitator: info.clone(),
                count: 0,
                error: Some(err.to_string()),
            }
        }
    }
}
