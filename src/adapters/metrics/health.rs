//! Health and Metrics Server - Liveness, Readiness, Prometheus
//!
//! Exposes /live, /ready and /metrics via axum 0.7. Readiness turns on
//! after the first routing table rebuild and off again at shutdown.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use tokio::sync::broadcast;
use tracing::{info, instrument, warn};

use super::prometheus::MetricsRegistry;

/// Shared health state polled by readiness checks.
#[derive(Debug)]
pub struct HealthState {
    /// Set once the routing table has published at least once.
    adapters_ready: AtomicBool,
    /// Cleared at shutdown.
    accepting: AtomicBool,
}

impl HealthState {
    pub fn new() -> Self {
        Self {
            adapters_ready: AtomicBool::new(false),
            accepting: AtomicBool::new(true),
        }
    }

    pub fn mark_adapters_ready(&self) {
        self.adapters_ready.store(true, Ordering::Relaxed);
    }

    pub fn mark_shutting_down(&self) {
        self.accepting.store(false, Ordering::Relaxed);
    }

    pub fn is_ready(&self) -> bool {
        self.adapters_ready.load(Ordering::Relaxed) && self.accepting.load(Ordering::Relaxed)
    }
}

impl Default for HealthState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
struct AppState {
    health: Arc<HealthState>,
    metrics: Arc<MetricsRegistry>,
}

/// Axum-based health and metrics HTTP server.
pub struct HealthServer {
    health: Arc<HealthState>,
    metrics: Arc<MetricsRegistry>,
    bind_address: String,
}

impl HealthServer {
    pub const fn new(
        health: Arc<HealthState>,
        metrics: Arc<MetricsRegistry>,
        bind_address: String,
    ) -> Self {
        Self {
            health,
            metrics,
            bind_address,
        }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/live", get(Self::liveness))
            .route("/ready", get(Self::readiness))
            .route("/metrics", get(Self::metrics))
            .with_state(AppState {
                health: Arc::clone(&self.health),
                metrics: Arc::clone(&self.metrics),
            })
    }

    /// Serve until shutdown.
    #[instrument(skip(self, shutdown_rx))]
    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) -> anyhow::Result<()> {
        let app = self.router();
        let listener = tokio::net::TcpListener::bind(&self.bind_address).await?;

        info!(address = %self.bind_address, "Health server started");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await?;

        Ok(())
    }

    async fn liveness() -> impl IntoResponse {
        (StatusCode::OK, "OK")
    }

    async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
        if state.health.is_ready() {
            (StatusCode::OK, "READY")
        } else {
            (StatusCode::SERVICE_UNAVAILABLE, "NOT READY")
        }
    }

    async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
        match state.metrics.encode() {
            Ok(text) => (StatusCode::OK, text),
            Err(e) => {
                warn!(error = %e, "Metrics encoding failed");
                (StatusCode::INTERNAL_SERVER_ERROR, String::new())
            }
        }
    }
}
