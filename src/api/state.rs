use std::sync::Arc;

use crate::config::Config;
use crate::discovery::{CrawlerService, DirectProber, EndpointRefresher, ProgressTracker};
use crate::observability::Metrics;
use crate::store::{EndpointListStore, ResourceStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub resources: ResourceStore,
    pub endpoints: EndpointListStore,
    pub progress: Arc<ProgressTracker>,
    pub refresher: Arc<EndpointRefresher>,
    pub prober: Arc<DirectProber>,
    pub service: Arc<CrawlerService>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: Config,
        resources: ResourceStore,
        endpoints: EndpointListStore,
        progress: Arc<ProgressTracker>,
        refresher: Arc<EndpointRefresher>,
        prober: Arc<DirectProber>,
        service: Arc<CrawlerService>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            resources,
            endpoints,
            progress,
            refresher,
            prober,
            service,
            metrics,
        }
    }
}
