//! HTTP API handlers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::arbitrage::EngineStats;

/// Application state shared with handlers.
#[derive(Clone)]
pub struct AppState {
    /// Whether the engine is running and able to trade.
    pub ready: Arc<AtomicBool>,
    /// Latest decision-loop statistics.
    pub stats: Arc<RwLock<EngineStats>>,
    /// Rendered-metrics handle, when the Prometheus recorder is installed.
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    /// Create new app state.
    pub fn new() -> Self {
        Self {
            ready: Arc::new(AtomicBool::new(false)),
            stats: Arc::new(RwLock::new(EngineStats::default())),
            prometheus: None,
        }
    }

    /// Attach a Prometheus handle for the `/metrics` endpoint.
    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }

    /// Set ready state.
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// Check if ready.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status: "ok".
    pub status: &'static str,
}

/// Readiness check response.
#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    /// Whether the engine is ready.
    pub ready: bool,
}

/// Status response.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// Service status.
    pub status: &'static str,
    /// Decision-loop statistics.
    pub stats: EngineStats,
}

/// `GET /health`: liveness probe.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

/// `GET /ready`: readiness probe.
pub async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    let ready = state.is_ready();
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(ReadyResponse { ready }))
}

/// `GET /api/v1/status`: engine statistics.
pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let stats = state.stats.read().await.clone();
    Json(StatusResponse {
        status: if state.is_ready() { "running" } else { "starting" },
        stats,
    })
}

/// `GET /metrics`: Prometheus exposition.
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    match state.prometheus {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (
            StatusCode::NOT_FOUND,
            "metrics recorder not installed".to_string(),
        ),
    }
}
