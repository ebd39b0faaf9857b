//! Model training
//!
//! One entry point, [`train`], implements the train/evaluate contract:
//! seeded split, scaler fitted on the train partition only, estimator
//! fitted on the scaled train partition, RMSE on the held-out partition,
//! and a metrics record carrying the training-target range used for risk
//! scoring at serve time.

mod cross_validation;
mod forest;
mod linear;
mod tree;

pub use cross_validation::{CVSplit, KFold};
pub use forest::{MaxFeatures, RandomForestRegressor};
pub use linear::LinearRegression;
pub use tree::DecisionTree;

use crate::artifacts::MetricsRecord;
use crate::dataset::Dataset;
use crate::error::{Result, TriageError};
use crate::pipeline::{Estimator, Pipeline};
use crate::preprocessing::StandardScaler;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::info;

/// Ridge regularization strengths searched by cross-validation
pub const RIDGE_ALPHA_GRID: [f64; 4] = [0.1, 1.0, 10.0, 100.0];

const RIDGE_CV_FOLDS: usize = 5;
const FOREST_ESTIMATORS: usize = 200;

/// The closed set of supported model families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelFamily {
    /// Ordinary least squares, no tuning
    Linear,
    /// L2-regularized regression; alpha chosen by 5-fold CV over
    /// [`RIDGE_ALPHA_GRID`]
    Ridge,
    /// Bootstrap ensemble of regression trees, fitted in parallel
    Forest,
}

impl FromStr for ModelFamily {
    type Err = TriageError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "linear" => Ok(ModelFamily::Linear),
            "ridge" => Ok(ModelFamily::Ridge),
            "forest" | "rf" => Ok(ModelFamily::Forest),
            other => Err(TriageError::InvalidConfiguration(format!(
                "unknown model family '{}', expected one of linear, ridge, forest",
                other
            ))),
        }
    }
}

impl fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModelFamily::Linear => "linear",
            ModelFamily::Ridge => "ridge",
            ModelFamily::Forest => "forest",
        };
        f.write_str(name)
    }
}

/// Training run configuration
#[derive(Debug, Clone)]
pub struct TrainConfig {
    /// Artifact version key
    pub version: String,
    pub model_family: ModelFamily,
    /// Held-out fraction, in (0, 1) exclusive
    pub test_fraction: f64,
    /// Seed for the split, CV folds, and any bootstrap sampling
    pub seed: u64,
}

impl TrainConfig {
    pub fn new(version: impl Into<String>, model_family: ModelFamily) -> Self {
        Self {
            version: version.into(),
            model_family,
            test_fraction: 0.2,
            seed: 42,
        }
    }

    pub fn with_test_fraction(mut self, test_fraction: f64) -> Self {
        self.test_fraction = test_fraction;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn validate(&self) -> Result<()> {
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(TriageError::InvalidConfiguration(format!(
                "test_fraction must be in (0, 1) exclusive, got {}",
                self.test_fraction
            )));
        }
        if self.version.is_empty() {
            return Err(TriageError::InvalidConfiguration(
                "version must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Root-mean-square error between predictions and targets
pub fn rmse(predictions: &Array1<f64>, targets: &Array1<f64>) -> f64 {
    let n = predictions.len() as f64;
    let sq_sum: f64 = predictions
        .iter()
        .zip(targets.iter())
        .map(|(p, t)| (p - t) * (p - t))
        .sum();
    (sq_sum / n).sqrt()
}

/// Train a pipeline and evaluate it on the held-out partition.
///
/// The returned pipeline bundles the fitted scaler, so it accepts raw
/// (unscaled) feature matrices; feeding it the held-out partition
/// reproduces the predictions behind the reported RMSE.
pub fn train(dataset: &Dataset, config: &TrainConfig) -> Result<(Pipeline, MetricsRecord)> {
    config.validate()?;

    let (train_set, test_set) = dataset.train_test_split(config.test_fraction, config.seed)?;
    info!(
        family = %config.model_family,
        n_train = train_set.len(),
        n_test = test_set.len(),
        seed = config.seed,
        "fitting pipeline"
    );

    let mut scaler = StandardScaler::new();
    let x_train = scaler.fit_transform(&train_set.x)?;

    let estimator = match config.model_family {
        ModelFamily::Linear => {
            let mut model = LinearRegression::new();
            model.fit(&x_train, &train_set.y)?;
            Estimator::Linear(model)
        }
        ModelFamily::Ridge => {
            let alpha = select_ridge_alpha(&train_set, config.seed)?;
            info!(alpha, "selected ridge regularization strength");
            let mut model = LinearRegression::new().with_alpha(alpha);
            model.fit(&x_train, &train_set.y)?;
            Estimator::Linear(model)
        }
        ModelFamily::Forest => {
            let mut model = RandomForestRegressor::new(FOREST_ESTIMATORS)
                .with_random_state(config.seed);
            model.fit(&x_train, &train_set.y)?;
            Estimator::Forest(model)
        }
    };

    let pipeline = Pipeline::new(scaler, estimator);

    // Evaluate on raw held-out features; the pipeline scales internally.
    let predictions = pipeline.predict(&test_set.x)?;
    let test_rmse = rmse(&predictions, &test_set.y);

    let y_train_min = train_set.y.iter().copied().fold(f64::INFINITY, f64::min);
    let y_train_max = train_set.y.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let metrics = MetricsRecord {
        version: config.version.clone(),
        model_type: config.model_family.to_string(),
        rmse: test_rmse,
        random_state: config.seed,
        test_size: config.test_fraction,
        n_train: train_set.len(),
        n_test: test_set.len(),
        y_train_min,
        y_train_max,
        trained_at: chrono::Utc::now().to_rfc3339(),
    };

    info!(rmse = test_rmse, y_train_min, y_train_max, "training complete");
    Ok((pipeline, metrics))
}

/// Pick the ridge alpha minimizing mean CV RMSE. Each fold fits its own
/// scaler on the fold-train rows, mirroring the evaluation protocol.
fn select_ridge_alpha(train_set: &Dataset, seed: u64) -> Result<f64> {
    let folds = KFold::new(RIDGE_CV_FOLDS, seed).split(train_set.len())?;

    let mut best_alpha = RIDGE_ALPHA_GRID[0];
    let mut best_score = f64::INFINITY;

    for &alpha in &RIDGE_ALPHA_GRID {
        let mut total = 0.0;
        for fold in &folds {
            let fold_train = train_set.select_rows(&fold.train_indices);
            let fold_valid = train_set.select_rows(&fold.test_indices);

            let mut scaler = StandardScaler::new();
            let x_fit = scaler.fit_transform(&fold_train.x)?;
            let mut model = LinearRegression::new().with_alpha(alpha);
            model.fit(&x_fit, &fold_train.y)?;

            let x_valid = scaler.transform(&fold_valid.x)?;
            total += rmse(&model.predict(&x_valid)?, &fold_valid.y);
        }
        let mean_rmse = total / folds.len() as f64;
        if mean_rmse < best_score {
            best_score = mean_rmse;
            best_alpha = alpha;
        }
    }

    Ok(best_alpha)
}
