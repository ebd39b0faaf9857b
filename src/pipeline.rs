//! The fitted pipeline: frozen scaler plus regression estimator
//!
//! A [`Pipeline`] is the unit that gets serialized into a versioned
//! artifact. It accepts raw feature matrices and applies its own scaling,
//! so callers never re-apply (or accidentally refit) preprocessing.

use crate::error::Result;
use crate::preprocessing::StandardScaler;
use crate::training::{LinearRegression, RandomForestRegressor};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// The fitted estimator stage, dispatched as a tagged variant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Estimator {
    /// OLS or ridge (alpha carried inside)
    Linear(LinearRegression),
    /// Bootstrap forest
    Forest(RandomForestRegressor),
}

impl Estimator {
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        match self {
            Estimator::Linear(model) => model.predict(x),
            Estimator::Forest(model) => model.predict(x),
        }
    }
}

/// A fitted scaler + estimator pair, immutable once constructed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pipeline {
    scaler: StandardScaler,
    estimator: Estimator,
}

impl Pipeline {
    pub fn new(scaler: StandardScaler, estimator: Estimator) -> Self {
        Self { scaler, estimator }
    }

    /// Predict raw progression values for unscaled feature rows
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let scaled = self.scaler.transform(x)?;
        self.estimator.predict(&scaled)
    }

    /// Number of features the pipeline expects per row
    pub fn n_features(&self) -> usize {
        self.scaler.n_features()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TriageError;
    use ndarray::array;

    #[test]
    fn test_pipeline_scales_before_estimating() {
        // Estimator fitted on scaled data; pipeline must reproduce its
        // output when handed the raw features.
        let x_raw = array![[10.0, 1.0], [20.0, 2.0], [30.0, 3.0], [40.0, 4.0]];
        let y = array![1.0, 2.0, 3.0, 4.0];

        let mut scaler = StandardScaler::new();
        let x_scaled = scaler.fit_transform(&x_raw).unwrap();
        let mut model = LinearRegression::new();
        model.fit(&x_scaled, &y).unwrap();
        let expected = model.predict(&x_scaled).unwrap();

        let pipeline = Pipeline::new(scaler, Estimator::Linear(model));
        let got = pipeline.predict(&x_raw).unwrap();
        assert_eq!(got, expected);
    }

    #[test]
    fn test_pipeline_rejects_wrong_width() {
        let x = array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]];
        let y = array![1.0, 2.0, 3.0];

        let mut scaler = StandardScaler::new();
        let xs = scaler.fit_transform(&x).unwrap();
        let mut model = LinearRegression::new();
        model.fit(&xs, &y).unwrap();
        let pipeline = Pipeline::new(scaler, Estimator::Linear(model));

        let bad = array![[1.0, 2.0, 3.0]];
        assert!(matches!(
            pipeline.predict(&bad).unwrap_err(),
            TriageError::ShapeError { .. }
        ));
    }
}
