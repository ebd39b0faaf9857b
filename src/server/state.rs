//! Application state: the loaded artifact pair

use crate::artifacts::{self, MetricsRecord};
use crate::error::{Result, TriageError};
use crate::pipeline::Pipeline;
use ndarray::Array2;
use tokio::sync::RwLock;
use tracing::{info, warn};

use super::ServerConfig;

/// What the serving process is backed by
#[derive(Debug)]
pub enum ModelState {
    /// Artifact pair loaded; predictions run the real pipeline
    Loaded {
        pipeline: Pipeline,
        metrics: MetricsRecord,
    },
    /// Artifacts missing or unreadable; predictions come from the
    /// constant-zero stand-in so the process stays reachable
    Degraded,
}

impl ModelState {
    pub fn is_loaded(&self) -> bool {
        matches!(self, ModelState::Loaded { .. })
    }

    pub fn version(&self) -> Option<&str> {
        match self {
            ModelState::Loaded { metrics, .. } => Some(&metrics.version),
            ModelState::Degraded => None,
        }
    }
}

/// Shared state, injectable so tests can stand up independent instances
/// with different artifacts. The model lives behind an `RwLock`: requests
/// take read guards, and a future reload can swap the value atomically.
pub struct AppState {
    pub config: ServerConfig,
    pub model: RwLock<ModelState>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            model: RwLock::new(ModelState::Degraded),
        }
    }

    /// Load the configured artifact pair, degrading instead of failing.
    /// The state is either fully loaded or explicitly degraded, with no
    /// observable in-between.
    pub async fn load_artifacts(&self) {
        let next = match Self::try_load(&self.config) {
            Ok(state) => {
                if let ModelState::Loaded { metrics, .. } = &state {
                    info!(
                        version = %metrics.version,
                        model_type = %metrics.model_type,
                        rmse = metrics.rmse,
                        "model artifacts loaded"
                    );
                }
                state
            }
            Err(e) => {
                warn!(error = %e, "failed to load model artifacts, serving degraded");
                ModelState::Degraded
            }
        };

        *self.model.write().await = next;
    }

    fn try_load(config: &ServerConfig) -> Result<ModelState> {
        let pipeline = artifacts::load_pipeline(&config.model_path)?;
        let metrics = artifacts::load_metrics(&config.metrics_path)?;
        if metrics.y_train_min > metrics.y_train_max {
            return Err(TriageError::PersistenceError(format!(
                "metrics record {} violates y_train_min <= y_train_max",
                config.metrics_path.display()
            )));
        }
        Ok(ModelState::Loaded { pipeline, metrics })
    }

    /// Score a batch of raw feature rows, returning `(progression,
    /// risk_score)` per row in input order. Degraded state yields the
    /// deterministic stand-in: progression 0.0, risk 0.0.
    pub async fn predict(&self, x: &Array2<f64>) -> Result<Vec<(f64, f64)>> {
        let model = self.model.read().await;
        match &*model {
            ModelState::Loaded { pipeline, metrics } => {
                let predictions = pipeline.predict(x)?;
                Ok(predictions
                    .iter()
                    .map(|&p| (p, metrics.risk_score(p)))
                    .collect())
            }
            ModelState::Degraded => Ok(vec![(0.0, 0.0); x.nrows()]),
        }
    }
}
