//! HTTP serving
//!
//! Loads one versioned artifact pair at startup and serves `/health` and
//! `/predict`. If the artifacts are missing or unreadable the server comes
//! up degraded instead of crashing: liveness probes keep working and
//! predictions fall back to a deterministic stand-in.

mod api;
mod error;
mod handlers;
mod state;

pub use api::create_router;
pub use error::ApiError;
pub use handlers::PredictionOut;
pub use state::{AppState, ModelState};

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Path of the pipeline artifact to load at startup
    pub model_path: PathBuf,
    /// Path of the paired metrics record
    pub metrics_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8000),
            model_path: std::env::var("MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("models/model_v0.2.json")),
            metrics_path: std::env::var("METRICS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("models/metrics_v0.2.json")),
        }
    }
}

/// Start the server with the given configuration
pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let start_time = chrono::Utc::now();
    info!(
        model_path = %config.model_path.display(),
        metrics_path = %config.metrics_path.display(),
        started_at = %start_time.to_rfc3339(),
        "loading artifacts"
    );

    let state = Arc::new(AppState::new(config.clone()));
    state.load_artifacts().await;

    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        address = %addr,
        pid = std::process::id(),
        "Triage API listening and ready to accept connections"
    );

    let shutdown_signal = async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C signal handler");
        let uptime = chrono::Utc::now().signed_duration_since(start_time);
        info!(
            uptime_secs = uptime.num_seconds(),
            "Shutdown signal received, stopping server gracefully"
        );
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server shut down cleanly");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 8000);
        assert_eq!(config.model_path, PathBuf::from("models/model_v0.2.json"));
        assert_eq!(
            config.metrics_path,
            PathBuf::from("models/metrics_v0.2.json")
        );
    }
}
