//! Crawl progress tracking.
//!
//! Progress is held in memory behind a lock and mirrored to the `meta`
//! partition so it survives restarts. Persistence is advisory: a write
//! failure must never abort a running crawl, so it only logs.

use std::sync::RwLock;
use std::time::Instant;

use chrono::{DateTime, Utc};
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::crawler::CrawlObserver;
use crate::store::partitions::PROGRESS_KEY;
use crate::store::{Result, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrawlStatus {
    #[default]
    Idle,
    Crawling,
    Validating,
    Completed,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrawlPhase {
    Crawl,
    Validate,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlerProgress {
    pub status: CrawlStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<CrawlPhase>,
    pub total_discovered: usize,
    /// URLs checked so far during validation.
    pub total_processed: usize,
    /// URLs that passed validation so far.
    pub total_validated: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_time_remaining_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

struct Inner {
    progress: CrawlerProgress,
    validation_started: Option<Instant>,
}

pub struct ProgressTracker {
    keyspace: Keyspace,
    meta: PartitionHandle,
    inner: RwLock<Inner>,
}

impl ProgressTracker {
    pub fn new(keyspace: &Keyspace) -> Result<Self> {
        let meta = keyspace.open_partition("meta", PartitionCreateOptions::default())?;
        let progress = match meta.get(PROGRESS_KEY) {
            Ok(Some(value)) => serde_json::from_slice(&value).unwrap_or_default(),
            Ok(None) => CrawlerProgress::default(),
            Err(err) => {
                warn!(error = %err, "Failed to load crawler progress, starting idle");
                CrawlerProgress::default()
            }
        };
        Ok(Self {
            keyspace: keyspace.clone(),
            meta,
            inner: RwLock::new(Inner {
                progress,
                validation_started: None,
            }),
        })
    }

    pub fn snapshot(&self) -> CrawlerProgress {
        self.inner.read().map(|inner| inner.progress.clone()).unwrap_or_default()
    }

    /// Start a new crawl cycle from a clean slate.
    pub fn reset(&self) {
        self.mutate(|inner| {
            inner.progress = CrawlerProgress {
                status: CrawlStatus::Crawling,
                phase: Some(CrawlPhase::Crawl),
                started_at: Some(Utc::now()),
                ..CrawlerProgress::default()
            };
            inner.validation_started = None;
        });
    }

    pub fn update_crawl(&self, source: &str, discovered: usize) {
        self.mutate(|inner| {
            inner.progress.status = CrawlStatus::Crawling;
            inner.progress.phase = Some(CrawlPhase::Crawl);
            inner.progress.current_source = Some(source.to_string());
            inner.progress.total_discovered = discovered;
        });
    }

    /// Record validation progress and recompute the remaining-time estimate
    /// from the observed per-URL throughput.
    pub fn update_validation(&self, total: usize, processed: usize, validated: usize) {
        self.mutate(|inner| {
            let started = *inner.validation_started.get_or_insert_with(Instant::now);

            inner.progress.status = CrawlStatus::Validating;
            inner.progress.phase = Some(CrawlPhase::Validate);
            inner.progress.current_source = None;
            inner.progress.total_discovered = total;
            inner.progress.total_processed = processed;
            inner.progress.total_validated = validated;

            inner.progress.estimated_time_remaining_ms = if processed > 0 {
                let elapsed_ms = started.elapsed().as_millis() as u64;
                let remaining = total.saturating_sub(processed) as u64;
                Some(remaining * elapsed_ms / processed as u64)
            } else {
                None
            };
        });
    }

    pub fn complete(&self) {
        self.mutate(|inner| {
            inner.progress.status = CrawlStatus::Completed;
            inner.progress.phase = None;
            inner.progress.current_source = None;
            inner.progress.completed_at = Some(Utc::now());
            inner.progress.estimated_time_remaining_ms = None;
        });
    }

    pub fn set_error(&self, message: &str) {
        self.mutate(|inner| {
            inner.progress.status = CrawlStatus::Error;
            inner.progress.phase = None;
            inner.progress.error = Some(message.to_string());
            inner.progress.completed_at = Some(Utc::now());
            inner.progress.estimated_time_remaining_ms = None;
        });
    }

    fn mutate(&self, update: impl FnOnce(&mut Inner)) {
        let snapshot = {
            let Ok(mut inner) = self.inner.write() else {
                warn!("Progress lock poisoned, dropping update");
                return;
            };
            update(&mut inner);
            inner.progress.clone()
        };
        if let Err(err) = self.persist(&snapshot) {
            warn!(error = %err, "Failed to persist crawler progress");
        }
    }

    fn persist(&self, progress: &CrawlerProgress) -> Result<()> {
        self.meta
            .insert(PROGRESS_KEY, serde_json::to_vec(progress)?)
            .map_err(StoreError::from)?;
        self.keyspace.persist(fjall::PersistMode::Buffer)?;
        Ok(())
    }
}

impl CrawlObserver for ProgressTracker {
    fn on_source_progress(&self, source: &str, discovered: usize, _source_total: usize) {
        self.update_crawl(source, discovered);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tracker() -> (ProgressTracker, Keyspace, TempDir) {
        let temp = TempDir::new().unwrap();
        let keyspace = crate::store::open_keyspace(temp.path().join("store")).unwrap();
        (ProgressTracker::new(&keyspace).unwrap(), keyspace, temp)
    }

    #[test]
    fn test_initial_state_is_idle() {
        let (tracker, _keyspace, _temp) = tracker();
        let progress = tracker.snapshot();
        assert_eq!(progress.status, CrawlStatus::Idle);
        assert_eq!(progress.total_discovered, 0);
    }

    #[test]
    fn test_cycle_transitions() {
        let (tracker, _keyspace, _temp) = tracker();

        tracker.reset();
        assert_eq!(tracker.snapshot().status, CrawlStatus::Crawling);

        tracker.update_crawl("github", 12);
        let progress = tracker.snapshot();
        assert_eq!(progress.current_source.as_deref(), Some("github"));
        assert_eq!(progress.total_discovered, 12);

        tracker.update_validation(12, 6, 2);
        let progress = tracker.snapshot();
        assert_eq!(progress.status, CrawlStatus::Validating);
        assert_eq!(progress.total_processed, 6);
        assert_eq!(progress.total_validated, 2);
        assert!(progress.estimated_time_remaining_ms.is_some());

        tracker.complete();
        let progress = tracker.snapshot();
        assert_eq!(progress.status, CrawlStatus::Completed);
        assert!(progress.completed_at.is_some());
        assert!(progress.estimated_time_remaining_ms.is_none());
    }

    #[test]
    fn test_eta_absent_before_first_result() {
        let (tracker, _keyspace, _temp) = tracker();
        tracker.reset();
        tracker.update_validation(10, 0, 0);
        assert!(tracker.snapshot().estimated_time_remaining_ms.is_none());
    }

    #[test]
    fn test_error_records_message() {
        let (tracker, _keyspace, _temp) = tracker();
        tracker.reset();
        tracker.set_error("store unavailable");
        let progress = tracker.snapshot();
        assert_eq!(progress.status, CrawlStatus::Error);
        assert_eq!(progress.error.as_deref(), Some("store unavailable"));
    }

    #[test]
    fn test_progress_survives_reopen() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("store");
        {
            let keyspace = crate::store::open_keyspace(&path).unwrap();
            let tracker = ProgressTracker::new(&keyspace).unwrap();
            tracker.reset();
            tracker.update_crawl("ecosystem", 3);
            keyspace.persist(fjall::PersistMode::SyncAll).unwrap();
        }
        let keyspace = crate::store::open_keyspace(&path).unwrap();
        let tracker = ProgressTracker::new(&keyspace).unwrap();
        let progress = tracker.snapshot();
        assert_eq!(progress.status, CrawlStatus::Crawling);
        assert_eq!(progress.total_discovered, 3);
    }
}
