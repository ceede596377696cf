//! HTTP server for the Prometheus scrape endpoint.

use crate::collector::Orchestrator;
use crate::config::ExporterConfig;
use crate::model::CONTENT_TYPE;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tower_http::trace::TraceLayer;

/// Errors that can occur during server operations.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listen address could not be bound.
    #[error("failed to bind to address: {0}")]
    Bind(#[from] std::io::Error),

    /// The server stopped with an error.
    #[error("server error: {0}")]
    Server(String),
}

/// Configuration for the metrics server.
#[derive(Debug, Clone)]
pub struct MetricsServerConfig {
    /// Address to bind the server to.
    pub bind_addr: SocketAddr,
}

impl From<&ExporterConfig> for MetricsServerConfig {
    fn from(config: &ExporterConfig) -> Self {
        Self {
            bind_addr: config.bind_addr(),
        }
    }
}

/// Builds the exporter's routes around a shared orchestrator.
pub fn router(orchestrator: Arc<Orchestrator>) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .fallback(not_found_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(orchestrator)
}

/// HTTP server exposing VPN metrics.
pub struct MetricsServer {
    config: MetricsServerConfig,
    orchestrator: Arc<Orchestrator>,
}

impl MetricsServer {
    /// Creates a server that answers scrapes with `orchestrator`.
    pub fn new(config: MetricsServerConfig, orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            config,
            orchestrator,
        }
    }

    /// Starts the HTTP server.
    ///
    /// Runs until SIGINT or SIGTERM is received; in-flight requests are
    /// allowed to finish.
    pub async fn run(self) -> Result<(), ServerError> {
        let app = router(self.orchestrator);

        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;

        tracing::info!(addr = %self.config.bind_addr, "Metrics server listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ServerError::Server(e.to_string()))?;

        tracing::info!("Metrics server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}

/// Handler for the /metrics endpoint.
async fn metrics_handler(State(orchestrator): State<Arc<Orchestrator>>) -> impl IntoResponse {
    let body = orchestrator.render().await;
    (StatusCode::OK, [("content-type", CONTENT_TYPE)], body)
}

/// Handler for the /health endpoint.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Fallback for every other path.
async fn not_found_handler() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not Found")
}
