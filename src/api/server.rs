use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{Router, routing::get, routing::post};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::{
    services::{
        add_endpoint, discover_resources, discovery_progress, discovery_stats, health,
        list_resources, trigger_crawl, trigger_facilitator_sync,
    },
    state::AppState,
};
use crate::config::Config;
use crate::crawler::{EcosystemSource, EndpointSource, GithubSource, HttpValidator};
use crate::discovery::{
    CrawlerService, DirectProber, EndpointRefresher, ProgressTracker, ScheduleConfig,
};
use crate::observability::Metrics;
use crate::store::{EndpointListStore, ResourceStore};

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub async fn run(address: Option<SocketAddr>, config: Config) -> Result<(), AnyError> {
    let address = address.unwrap_or(config.server.bind_addr);

    let state = build_state(config).await?;
    state.service.start().await;

    let app = router(state.clone());

    let listener = TcpListener::bind(address).await?;
    info!(%address, "Discovery API listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.service.stop().await;
    Ok(())
}

/// Wire up every component from configuration.
pub async fn build_state(config: Config) -> Result<AppState, AnyError> {
    info!(path = %config.server.data_path.display(), "Opening store");
    let keyspace = crate::store::open_keyspace(&config.server.data_path)?;
    let resources = ResourceStore::new(&keyspace)?;
    let endpoints = EndpointListStore::new(&keyspace)?;
    let progress = Arc::new(ProgressTracker::new(&keyspace)?);
    let metrics = Arc::new(Metrics::new());

    let sources: Vec<Arc<dyn EndpointSource>> = vec![
        Arc::new(GithubSource::new(config.crawler.github_token.clone())),
        Arc::new(EcosystemSource::new(config.crawler.partners_dir.clone())),
    ];

    let refresher = Arc::new(EndpointRefresher::new(
        sources,
        Arc::new(HttpValidator::new()),
        endpoints.clone(),
        Arc::clone(&progress),
        Arc::clone(&metrics),
        config.crawler.refresh_ttl_hours,
        config.crawler.validation_batch_size,
    ));

    let prober = Arc::new(DirectProber::new(
        Arc::clone(&refresher),
        resources.clone(),
        Arc::clone(&metrics),
    ));

    let schedule = ScheduleConfig {
        initial_delay: Duration::from_secs(config.schedule.initial_delay_secs),
        crawl_interval: Duration::from_secs(config.schedule.crawl_interval_secs),
        facilitator_sync_interval: Duration::from_secs(
            config.schedule.facilitator_sync_interval_secs,
        ),
        resource_ttl_days: config.retention.resource_ttl_days,
    };
    let service = Arc::new(CrawlerService::new(
        Arc::clone(&refresher),
        resources.clone(),
        Arc::clone(&metrics),
        schedule,
    ));

    Ok(AppState::new(
        config, resources, endpoints, progress, refresher, prober, service, metrics,
    ))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/resources", get(list_resources))
        .route("/discovery/resources", get(discover_resources))
        .route("/discovery/stats", get(discovery_stats))
        .route("/discovery/progress", get(discovery_progress))
        .route("/discovery/crawl", post(trigger_crawl))
        .route("/discovery/facilitator-sync", post(trigger_facilitator_sync))
        .route("/endpoints", post(add_endpoint))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm = signal(SignalKind::terminate())
            .expect("failed to install signal handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
