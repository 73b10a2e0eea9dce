//! HTTP handlers for the Roata server.
//!
//! Read-only views over the state store. Absence is reported as 404, never
//! as an error crossing the store boundary.

use crate::config::Config;
use crate::ingest::{self, IngestStatus};
use crate::metrics;
use anyhow::{Context, Result};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use roata_core::{StateStore, Summary, Tracker, TrackerId};
use roata_transport::{NatsTransport, Transport};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

/// Summary status once the ingestion worker has exited.
const STATUS_DEGRADED: &str = "degraded";

/// Shared server state.
pub struct AppState {
    /// The live vehicle/route store.
    pub store: Arc<StateStore>,
    /// Liveness of the worker feeding the store.
    pub ingest: IngestStatus,
}

impl AppState {
    /// Create new app state over a store and its ingestion worker.
    #[must_use]
    pub fn new(store: Arc<StateStore>, ingest: IngestStatus) -> Self {
        Self { store, ingest }
    }
}

/// Query errors mapped to HTTP responses.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No tracker with this id has been observed.
    #[error("No such tracker")]
    TrackerNotFound(String),

    /// No route with this id has been observed.
    #[error("No such route")]
    RouteNotFound(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (StatusCode::NOT_FOUND, self.to_string()).into_response()
    }
}

/// Build the HTTP router.
///
/// Every path also answers with a trailing slash.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/tracker", get(list_trackers_handler))
        .route("/tracker/", get(list_trackers_handler))
        .route("/tracker/:tracker_id", get(tracker_handler))
        .route("/tracker/:tracker_id/", get(tracker_handler))
        .route("/route/:route_id/trackers", get(route_trackers_handler))
        .route("/route/:route_id/trackers/", get(route_trackers_handler))
        .with_state(state)
}

/// Run the ingestion worker and the HTTP server.
///
/// # Errors
///
/// Returns an error if the bus cannot be reached or the server fails to
/// start.
pub async fn run_server(config: Config) -> Result<()> {
    let store = Arc::new(StateStore::new());

    // Start metrics server if enabled
    if config.metrics.enabled {
        match metrics::start_metrics_server(config.metrics.port) {
            Ok(()) => metrics::init_metrics(),
            Err(e) => error!("Failed to start metrics server: {}", e),
        }
    }

    let mut transport = NatsTransport::connect(&config.broker.nats())
        .await
        .with_context(|| format!("Failed to connect to {}", config.broker.url))?;
    ingest::subscribe_all(&mut transport, &config.broker.topics).await?;

    let status = IngestStatus::new();
    let worker_store = Arc::clone(&store);
    let worker_status = status.clone();
    tokio::spawn(async move {
        let transport: Box<dyn Transport> = Box::new(transport);
        ingest::run(transport, worker_store, worker_status).await;
        error!("Ingestion worker exited; state is no longer updated");
    });

    let app = router(Arc::new(AppState::new(store, status)));

    // Bind and serve
    let addr = config.bind_addr()?;
    let listener = TcpListener::bind(addr).await?;

    info!("Roata server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Health and summary handler.
async fn index_handler(State(state): State<Arc<AppState>>) -> Json<Summary> {
    let mut summary = state.store.summary();
    if !state.ingest.is_running() {
        summary.status = STATUS_DEGRADED.to_string();
    }
    Json(summary)
}

async fn list_trackers_handler(
    State(state): State<Arc<AppState>>,
) -> Json<HashMap<TrackerId, Tracker>> {
    Json(state.store.list_trackers())
}

async fn tracker_handler(
    State(state): State<Arc<AppState>>,
    Path(tracker_id): Path<String>,
) -> Result<Json<Tracker>, ApiError> {
    debug!(tracker = %tracker_id, "Get tracker");
    state
        .store
        .get_tracker(&tracker_id)
        .map(Json)
        .ok_or(ApiError::TrackerNotFound(tracker_id))
}

async fn route_trackers_handler(
    State(state): State<Arc<AppState>>,
    Path(route_id): Path<String>,
) -> Result<Json<HashMap<TrackerId, Tracker>>, ApiError> {
    debug!(route = %route_id, "Get route trackers");
    let trackers = state.store.get_route_trackers(&route_id);
    metrics::record_store_stats(&state.store.stats());
    trackers.map(Json).ok_or(ApiError::RouteNotFound(route_id))
}
