//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the scrape and status handlers
//! - Wire up request tracing
//! - Serve on a bound listener until shutdown

use std::sync::Arc;

use axum::{routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use crate::discovery::ProberFleet;
use crate::http::handlers::{get_healthz, get_metrics, get_targets};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub metrics: PrometheusHandle,
    pub fleet: Arc<ProberFleet>,
}

/// HTTP server exposing `/metrics`, `/healthz` and `/targets`.
pub struct MetricsServer {
    router: Router,
}

impl MetricsServer {
    pub fn new(state: AppState) -> Self {
        Self {
            router: Self::build_router(state),
        }
    }

    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/metrics", get(get_metrics))
            .route("/healthz", get(get_healthz))
            .route("/targets", get(get_targets))
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }

    /// Serve on `listener` until `shutdown` is cancelled.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: CancellationToken,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Metrics server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await?;

        tracing::info!("Metrics server stopped");
        Ok(())
    }
}
