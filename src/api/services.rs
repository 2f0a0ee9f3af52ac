use axum::{Json, extract::Query, extract::State, response::IntoResponse};

use super::{
    models::{
        AddEndpointRequest, AddEndpointResponse, CrawlTriggeredResponse, DiscoveryQueryParams,
        DiscoveryResponse, HealthResponse, ResourceQueryParams, ResourcesResponse, StatsResponse,
    },
    state::AppState,
};
use crate::api::error::ApiError;
use crate::discovery::DiscoveryOptions;
use crate::facilitator;
use crate::model::ResourceSource;
use crate::store::{ResourceQuery, StoreError};

/// Resource listing endpoint (GET /resources)
///
/// Supports free-text search (`q`), exact filters (`type`, `source`,
/// `facilitator`), and pagination (`limit`, `offset`). With a text query
/// results come back relevance-ranked; without one, newest first.
pub async fn list_resources(
    State(state): State<AppState>,
    Query(params): Query<ResourceQueryParams>,
) -> Result<impl IntoResponse, ApiError> {
    let source = params
        .source
        .as_deref()
        .map(|value| {
            value
                .parse::<ResourceSource>()
                .map_err(ApiError::InvalidQuery)
        })
        .transpose()?;

    let result = state.resources.query(&ResourceQuery {
        query: params.q,
        resource_type: params.resource_type,
        source,
        facilitator_name: params.facilitator,
        limit: params.limit,
        offset: params.offset,
    });

    Ok(Json(ResourcesResponse {
        resources: result.resources,
        total: result.total,
    }))
}

/// Live discovery endpoint (GET /discovery/resources)
///
/// Probes the known endpoint list for payment manifests and returns what
/// answered, in the facilitator discovery API shape. A stale endpoint list
/// is served as-is while it refreshes in the background, so this endpoint
/// stays fast even when a crawl is due.
pub async fn discover_resources(
    State(state): State<AppState>,
    Query(params): Query<DiscoveryQueryParams>,
) -> Result<impl IntoResponse, ApiError> {
    let items = state
        .prober
        .discover_resources_from_endpoints(&DiscoveryOptions {
            resource_type: params.resource_type,
            limit: params.limit,
            force_refresh: params.force_refresh,
        })
        .await;

    let total = items.len();
    Ok(Json(DiscoveryResponse {
        x402_version: 1,
        items,
        total,
    }))
}

/// Aggregate statistics endpoint (GET /discovery/stats)
pub async fn discovery_stats(State(state): State<AppState>) -> impl IntoResponse {
    Json(StatsResponse {
        resources: state.resources.stats(),
        endpoints: state.endpoints.stats(),
        metrics: state.metrics.snapshot(),
        crawler_running: state.service.is_running().await,
    })
}

/// Crawl progress endpoint (GET /discovery/progress)
pub async fn discovery_progress(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.progress.snapshot())
}

/// Manual crawl trigger (POST /discovery/crawl)
///
/// Returns 202 immediately; if a crawl is already running the request
/// joins it instead of starting a second one. Progress is observable on
/// GET /discovery/progress.
pub async fn trigger_crawl(State(state): State<AppState>) -> impl IntoResponse {
    let _ = state.refresher.trigger().await;
    (
        axum::http::StatusCode::ACCEPTED,
        Json(CrawlTriggeredResponse { status: "started" }),
    )
}

/// Manual facilitator sync (POST /discovery/facilitator-sync)
///
/// Runs a full sync against every known facilitator and reports the
/// per-facilitator outcome. Unlike the crawl this runs inline: it is
/// bounded work and callers want the report.
pub async fn trigger_facilitator_sync(State(state): State<AppState>) -> impl IntoResponse {
    let report = facilitator::sync_all(&state.resources).await;
    state.metrics.facilitator_sync();
    state.metrics.resources_upserted(report.total as u64);
    Json(report)
}

/// Manual endpoint admission (POST /endpoints)
///
/// Adds a URL straight to the endpoint list, bypassing the crawl. The URL
/// still has to pass probing before any resource is stored for it.
pub async fn add_endpoint(
    State(state): State<AppState>,
    Json(request): Json<AddEndpointRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let added = state.endpoints.add_endpoint(&request.url).map_err(|err| match err {
        StoreError::InvalidUrl(url) => {
            ApiError::InvalidPayload(format!("not an http(s) URL: {url}"))
        }
        other => ApiError::Internal(other.to_string()),
    })?;

    let status = if added {
        axum::http::StatusCode::CREATED
    } else {
        axum::http::StatusCode::OK
    };
    Ok((
        status,
        Json(AddEndpointResponse {
            url: request.url,
            added,
        }),
    ))
}

/// Health check endpoint (GET /health)
///
/// Returns health status of the service components:
/// - api: Axum HTTP server
/// - store: Fjall keyspace
/// - crawler: background scheduler
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    use std::collections::HashMap;

    let mut components = HashMap::new();
    components.insert("api".to_string(), "healthy".to_string());
    components.insert("store".to_string(), "healthy".to_string());
    components.insert(
        "crawler".to_string(),
        if state.service.is_running().await {
            "healthy".to_string()
        } else {
            "stopped".to_string()
        },
    );

    let response = HealthResponse {
        status: "healthy".to_string(),
        components,
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    (axum::http::StatusCode::OK, Json(response))
}
