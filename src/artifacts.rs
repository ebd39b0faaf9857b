//! Versioned artifact pair persistence
//!
//! A training run produces two files under one version key:
//! `model_<version>.json` (the serialized pipeline) and
//! `metrics_<version>.json` (the metrics record). Both are written through
//! a temporary file and renamed into place, so a crashed writer never
//! leaves a truncated file as the apparent final state, and the metrics
//! file only appears after its paired model file does.

use crate::error::{Result, TriageError};
use crate::pipeline::Pipeline;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Evaluation summary persisted alongside a pipeline artifact.
///
/// `y_train_min`/`y_train_max` are the observed training-target bounds and
/// define the affine risk-score rescaling. Contract: `y_train_min <=
/// y_train_max` in every written record; when the range has zero width the
/// rescaling is undefined and [`risk_score`](Self::risk_score) returns the
/// fixed constant 0.5 instead of dividing by zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub version: String,
    pub model_type: String,
    /// Held-out root-mean-square error
    pub rmse: f64,
    pub random_state: u64,
    pub test_size: f64,
    pub n_train: usize,
    pub n_test: usize,
    pub y_train_min: f64,
    pub y_train_max: f64,
    /// RFC3339 timestamp of the training run
    pub trained_at: String,
}

impl MetricsRecord {
    /// Rescale a raw prediction into a bounded [0, 1] risk score
    pub fn risk_score(&self, prediction: f64) -> f64 {
        let width = self.y_train_max - self.y_train_min;
        if !(width > 0.0) || !width.is_finite() {
            return 0.5;
        }
        ((prediction - self.y_train_min) / width).clamp(0.0, 1.0)
    }
}

/// Filesystem store for versioned artifact pairs
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn model_path(&self, version: &str) -> PathBuf {
        self.dir.join(format!("model_{}.json", version))
    }

    pub fn metrics_path(&self, version: &str) -> PathBuf {
        self.dir.join(format!("metrics_{}.json", version))
    }

    /// Persist a pipeline and its metrics record under the record's
    /// version key. Overwrites any existing pair under the same key.
    /// The model file is committed before the metrics file.
    pub fn save_pair(&self, pipeline: &Pipeline, metrics: &MetricsRecord) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            TriageError::PersistenceError(format!(
                "cannot create {}: {}",
                self.dir.display(),
                e
            ))
        })?;

        write_json_atomic(&self.model_path(&metrics.version), pipeline)?;
        write_json_atomic(&self.metrics_path(&metrics.version), metrics)?;
        Ok(())
    }
}

/// Load a serialized pipeline from an explicit path
pub fn load_pipeline(path: &Path) -> Result<Pipeline> {
    read_json(path)
}

/// Load a metrics record from an explicit path
pub fn load_metrics(path: &Path) -> Result<MetricsRecord> {
    read_json(path)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = fs::read_to_string(path).map_err(|e| {
        TriageError::PersistenceError(format!("cannot read {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&contents).map_err(|e| {
        TriageError::PersistenceError(format!("cannot parse {}: {}", path.display(), e))
    })
}

fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, json).map_err(|e| {
        TriageError::PersistenceError(format!("cannot write {}: {}", tmp.display(), e))
    })?;
    fs::rename(&tmp, path).map_err(|e| {
        TriageError::PersistenceError(format!(
            "cannot commit {} into place: {}",
            path.display(),
            e
        ))
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(min: f64, max: f64) -> MetricsRecord {
        MetricsRecord {
            version: "v0.2".to_string(),
            model_type: "linear".to_string(),
            rmse: 30.0,
            random_state: 42,
            test_size: 0.2,
            n_train: 354,
            n_test: 88,
            y_train_min: min,
            y_train_max: max,
            trained_at: "2026-01-01T00:00:00+00:00".to_string(),
        }
    }

    #[test]
    fn test_risk_score_is_affine_inside_range() {
        let m = record(0.0, 200.0);
        assert_eq!(m.risk_score(0.0), 0.0);
        assert_eq!(m.risk_score(100.0), 0.5);
        assert_eq!(m.risk_score(200.0), 1.0);
    }

    #[test]
    fn test_risk_score_clamps_out_of_range_predictions() {
        let m = record(50.0, 150.0);
        assert_eq!(m.risk_score(-1e9), 0.0);
        assert_eq!(m.risk_score(1e9), 1.0);
    }

    #[test]
    fn test_risk_score_zero_width_range_is_constant() {
        let m = record(100.0, 100.0);
        assert_eq!(m.risk_score(0.0), 0.5);
        assert_eq!(m.risk_score(100.0), 0.5);
        assert_eq!(m.risk_score(1e12), 0.5);
    }

    #[test]
    fn test_paths_follow_version_key() {
        let store = ArtifactStore::new("models");
        assert_eq!(
            store.model_path("v0.2"),
            PathBuf::from("models/model_v0.2.json")
        );
        assert_eq!(
            store.metrics_path("v0.2"),
            PathBuf::from("models/metrics_v0.2.json")
        );
    }
}
