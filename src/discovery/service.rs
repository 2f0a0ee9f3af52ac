//! Background crawl and sync scheduler.
//!
//! Owns the periodic work: the full crawl cycle, the facilitator sync, and
//! the retention sweep. The first crawl is delayed a little so the HTTP
//! server is up and serving before any heavy work starts.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::refresher::EndpointRefresher;
use crate::facilitator;
use crate::observability::Metrics;
use crate::store::ResourceStore;

#[derive(Debug, Clone, Copy)]
pub struct ScheduleConfig {
    /// Delay before the first crawl after startup.
    pub initial_delay: Duration,
    pub crawl_interval: Duration,
    pub facilitator_sync_interval: Duration,
    /// Resources untouched for this many days get pruned.
    pub resource_ttl_days: u32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(30),
            crawl_interval: Duration::from_secs(30 * 60),
            facilitator_sync_interval: Duration::from_secs(6 * 60 * 60),
            resource_ttl_days: 90,
        }
    }
}

pub struct CrawlerService {
    refresher: Arc<EndpointRefresher>,
    resources: ResourceStore,
    metrics: Arc<Metrics>,
    schedule: ScheduleConfig,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl CrawlerService {
    pub fn new(
        refresher: Arc<EndpointRefresher>,
        resources: ResourceStore,
        metrics: Arc<Metrics>,
        schedule: ScheduleConfig,
    ) -> Self {
        Self {
            refresher,
            resources,
            metrics,
            schedule,
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Start the periodic loops. Idempotent: calling start on a running
    /// service does nothing.
    pub async fn start(self: &Arc<Self>) {
        let mut tasks = self.tasks.lock().await;
        if !tasks.is_empty() {
            warn!("Crawler service already running");
            return;
        }

        info!(
            initial_delay_secs = self.schedule.initial_delay.as_secs(),
            crawl_interval_secs = self.schedule.crawl_interval.as_secs(),
            sync_interval_secs = self.schedule.facilitator_sync_interval.as_secs(),
            "Starting crawler service"
        );

        let service = Arc::clone(self);
        tasks.push(tokio::spawn(async move {
            tokio::time::sleep(service.schedule.initial_delay).await;
            loop {
                service.run_crawl_cycle().await;
                tokio::time::sleep(service.schedule.crawl_interval).await;
            }
        }));

        // Facilitator registries are external services; the first sync waits
        // a full interval instead of piling onto startup.
        let service = Arc::clone(self);
        tasks.push(tokio::spawn(async move {
            loop {
                tokio::time::sleep(service.schedule.facilitator_sync_interval).await;
                service.run_facilitator_sync().await;
            }
        }));
    }

    /// Stop the periodic loops. In-flight HTTP requests are abandoned.
    pub async fn stop(&self) {
        let mut tasks = self.tasks.lock().await;
        if tasks.is_empty() {
            return;
        }
        info!("Stopping crawler service");
        for task in tasks.drain(..) {
            task.abort();
        }
    }

    pub async fn is_running(&self) -> bool {
        !self.tasks.lock().await.is_empty()
    }

    async fn run_crawl_cycle(&self) {
        info!("Scheduled crawl cycle starting");
        if let Err(error) = self.refresher.discover_and_update(true, false).await {
            warn!(error, "Scheduled crawl cycle failed");
        }
        match self
            .resources
            .prune_older_than(self.schedule.resource_ttl_days)
        {
            Ok(0) => {}
            Ok(pruned) => info!(pruned, "Pruned stale resources"),
            Err(err) => warn!(error = %err, "Retention sweep failed"),
        }
    }

    async fn run_facilitator_sync(&self) {
        info!("Scheduled facilitator sync starting");
        let report = facilitator::sync_all(&self.resources).await;
        self.metrics.facilitator_sync();
        self.metrics.resources_upserted(report.total as u64);
    }
}
