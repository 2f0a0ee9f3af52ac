//! Observability stubs (metrics, tracing)

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics handle for recording counters/gauges
#[derive(Debug, Default)]
pub struct Metrics {
    crawl_cycles: AtomicU64,
    urls_discovered: AtomicU64,
    endpoints_validated: AtomicU64,
    resources_upserted: AtomicU64,
    facilitator_syncs: AtomicU64,
    probe_hits: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn crawl_cycle(&self) {
        self.crawl_cycles.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "crawl_cycles", "Metric incremented");
    }

    pub fn urls_discovered(&self, count: u64) {
        self.urls_discovered.fetch_add(count, Ordering::Relaxed);
        tracing::debug!(counter = "urls_discovered", count, "Metric incremented");
    }

    pub fn endpoints_validated(&self, count: u64) {
        self.endpoints_validated.fetch_add(count, Ordering::Relaxed);
        tracing::debug!(counter = "endpoints_validated", count, "Metric incremented");
    }

    pub fn resources_upserted(&self, count: u64) {
        self.resources_upserted.fetch_add(count, Ordering::Relaxed);
        tracing::debug!(counter = "resources_upserted", count, "Metric incremented");
    }

    pub fn facilitator_sync(&self) {
        self.facilitator_syncs.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "facilitator_syncs", "Metric incremented");
    }

    pub fn probe_hit(&self) {
        self.probe_hits.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "probe_hits", "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            crawl_cycles: self.crawl_cycles.load(Ordering::Relaxed),
            urls_discovered: self.urls_discovered.load(Ordering::Relaxed),
            endpoints_validated: self.endpoints_validated.load(Ordering::Relaxed),
            resources_upserted: self.resources_upserted.load(Ordering::Relaxed),
            facilitator_syncs: self.facilitator_syncs.load(Ordering::Relaxed),
            probe_hits: self.probe_hits.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub crawl_cycles: u64,
    pub urls_discovered: u64,
    pub endpoints_validated: u64,
    pub resources_upserted: u64,
    pub facilitator_syncs: u64,
    pub probe_hits: u64,
}
