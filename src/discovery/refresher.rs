//! Endpoint list refresh with TTL-based caching.
//!
//! A refresh is expensive (full multi-source crawl plus validation of every
//! candidate), so at most one runs at a time. Callers that arrive while a
//! refresh is in flight join it through a watch channel instead of starting
//! a second crawl.

use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use tokio::sync::{Mutex, watch};
use tracing::{info, warn};

use super::progress::ProgressTracker;
use crate::crawler::{CrawlObserver, EndpointSource, EndpointValidator, crawl_all_sources};
use crate::observability::Metrics;
use crate::store::{EndpointListStore, StoreError};

/// Result of a refresh: the new endpoint list, or an error message.
///
/// The message form (rather than a typed error) is what waiters on the
/// watch channel receive, so it must be cloneable.
pub type RefreshOutcome = std::result::Result<Vec<String>, String>;

type InFlight = Mutex<Option<watch::Receiver<Option<RefreshOutcome>>>>;

pub struct EndpointRefresher {
    sources: Vec<Arc<dyn EndpointSource>>,
    validator: Arc<dyn EndpointValidator>,
    endpoints: EndpointListStore,
    progress: Arc<ProgressTracker>,
    metrics: Arc<Metrics>,
    refresh_ttl: chrono::Duration,
    batch_size: usize,
    in_flight: InFlight,
}

impl EndpointRefresher {
    pub fn new(
        sources: Vec<Arc<dyn EndpointSource>>,
        validator: Arc<dyn EndpointValidator>,
        endpoints: EndpointListStore,
        progress: Arc<ProgressTracker>,
        metrics: Arc<Metrics>,
        refresh_ttl_hours: u32,
        batch_size: usize,
    ) -> Self {
        Self {
            sources,
            validator,
            endpoints,
            progress,
            metrics,
            refresh_ttl: chrono::Duration::hours(i64::from(refresh_ttl_hours)),
            batch_size: batch_size.max(1),
            in_flight: Mutex::new(None),
        }
    }

    /// Return the current endpoint list, refreshing when required.
    ///
    /// Policy:
    /// - fresh cached list and no force: serve from cache
    /// - background mode: return the current list as-is (possibly empty)
    ///   and kick off a refresh without waiting for it; force only skips
    ///   the freshness check
    /// - foreground mode: run (or join) a refresh and return its result
    pub async fn discover_and_update(
        self: &Arc<Self>,
        force: bool,
        background: bool,
    ) -> RefreshOutcome {
        let list = self.endpoints.load();
        let has_endpoints = !list.endpoints.is_empty();
        let fresh = !list.is_stale(self.refresh_ttl);

        if has_endpoints && fresh && !force {
            return Ok(list.endpoints);
        }

        if background {
            info!(
                cached = list.endpoints.len(),
                "Serving current endpoint list, refreshing in background"
            );
            let _ = self.trigger().await;
            return Ok(list.endpoints);
        }

        let mut rx = self.trigger().await;
        loop {
            if let Some(outcome) = rx.borrow_and_update().clone() {
                return outcome;
            }
            if rx.changed().await.is_err() {
                // Refresh task dropped without reporting; fall back to
                // whatever is persisted now.
                return Ok(self.endpoints.load().endpoints);
            }
        }
    }

    /// Start a refresh, or join the one already running.
    ///
    /// Returns a receiver that resolves to the refresh outcome.
    pub async fn trigger(self: &Arc<Self>) -> watch::Receiver<Option<RefreshOutcome>> {
        let mut slot = self.in_flight.lock().await;
        if let Some(rx) = slot.as_ref() {
            return rx.clone();
        }

        let (tx, rx) = watch::channel(None);
        *slot = Some(rx.clone());
        drop(slot);

        let refresher = Arc::clone(self);
        tokio::spawn(async move {
            let outcome = refresher.perform_crawl().await;
            // Clear the slot before publishing so a caller observing the
            // outcome can immediately start a new refresh.
            *refresher.in_flight.lock().await = None;
            let _ = tx.send(Some(outcome));
        });

        rx
    }

    /// One full refresh cycle: crawl all sources, validate candidates in
    /// batches, merge into the persisted list.
    async fn perform_crawl(&self) -> RefreshOutcome {
        self.metrics.crawl_cycle();
        self.progress.reset();

        let observer: &dyn CrawlObserver = self.progress.as_ref();
        let discovered = crawl_all_sources(&self.sources, observer).await;
        self.metrics.urls_discovered(discovered.len() as u64);
        info!(discovered = discovered.len(), "Crawl finished, validating candidates");

        let total = discovered.len();
        let mut valid = Vec::new();
        let mut processed = 0;
        self.progress.update_validation(total, 0, 0);

        for batch in discovered.chunks(self.batch_size) {
            let checks = batch.iter().map(|url| async {
                let ok = self.validator.validate(url).await;
                (url.clone(), ok)
            });
            for (url, ok) in join_all(checks).await {
                processed += 1;
                if ok {
                    valid.push(url);
                }
            }
            self.metrics.endpoints_validated(batch.len() as u64);
            self.progress.update_validation(total, processed, valid.len());
        }

        info!(valid = valid.len(), total, "Validation finished");

        match self.merge_and_save(&discovered, valid) {
            Ok(endpoints) => {
                self.progress.complete();
                Ok(endpoints)
            }
            Err(err) => {
                warn!(error = %err, "Failed to save refreshed endpoint list");
                self.progress.set_error(&err.to_string());
                Err(err.to_string())
            }
        }
    }

    /// Merge newly validated endpoints into the persisted list.
    ///
    /// The list never shrinks on a bad crawl day: endpoints the crawl did
    /// not rediscover are kept. Only endpoints that were rediscovered and
    /// then failed validation drop out.
    fn merge_and_save(
        &self,
        discovered: &[String],
        valid: Vec<String>,
    ) -> std::result::Result<Vec<String>, StoreError> {
        let discovered_set: std::collections::HashSet<&str> =
            discovered.iter().map(String::as_str).collect();

        let mut list = self.endpoints.load();
        let mut merged: Vec<String> = list
            .endpoints
            .iter()
            .filter(|existing| !discovered_set.contains(existing.as_str()))
            .cloned()
            .collect();
        let valid_count = valid.len();
        let mut seen: std::collections::HashSet<String> = merged.iter().cloned().collect();
        for url in valid {
            if seen.insert(url.clone()) {
                merged.push(url);
            }
        }

        list.endpoints = merged;
        list.last_updated = Some(Utc::now());
        list.stats.total_discovered = discovered.len();
        list.stats.total_validated = valid_count;
        list.stats.last_crawl_time = Some(Utc::now());
        list.sources.insert("crawl".to_string(), valid_count);
        self.endpoints.save(&list)?;
        Ok(list.endpoints)
    }
}
