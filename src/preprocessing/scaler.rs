//! Standard (z-score) feature scaling

use crate::error::{Result, TriageError};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Standard scaler: (x - mean) / std per feature column.
///
/// The per-feature statistics are computed by [`fit`](StandardScaler::fit)
/// and never change afterwards. Zero-variance columns get a scale of 1.0 so
/// transforming them is the identity shift.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Array1<f64>,
    scale: Array1<f64>,
    is_fitted: bool,
}

impl Default for StandardScaler {
    fn default() -> Self {
        Self::new()
    }
}

impl StandardScaler {
    pub fn new() -> Self {
        Self {
            mean: Array1::zeros(0),
            scale: Array1::zeros(0),
            is_fitted: false,
        }
    }

    /// Fit the scaler to the data
    pub fn fit(&mut self, x: &Array2<f64>) -> Result<&mut Self> {
        if x.nrows() == 0 {
            return Err(TriageError::ShapeError {
                expected: "at least 1 row".to_string(),
                actual: "0 rows".to_string(),
            });
        }

        self.mean = x
            .mean_axis(Axis(0))
            .ok_or_else(|| TriageError::TrainingError("cannot compute feature means".to_string()))?;

        self.scale = if x.nrows() < 2 {
            Array1::ones(x.ncols())
        } else {
            x.std_axis(Axis(0), 1.0)
                .mapv(|s| if s == 0.0 || !s.is_finite() { 1.0 } else { s })
        };

        self.is_fitted = true;
        Ok(self)
    }

    /// Transform the data using the frozen statistics
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(TriageError::ModelNotFitted);
        }
        if x.ncols() != self.mean.len() {
            return Err(TriageError::ShapeError {
                expected: format!("{} columns", self.mean.len()),
                actual: format!("{} columns", x.ncols()),
            });
        }

        Ok((x - &self.mean) / &self.scale)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.fit(x)?;
        self.transform(x)
    }

    /// Number of features the scaler was fitted on
    pub fn n_features(&self) -> usize {
        self.mean.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_scaled_columns_are_centered() {
        let x = array![[1.0, 10.0], [2.0, 20.0], [3.0, 30.0], [4.0, 40.0], [5.0, 50.0]];
        let mut scaler = StandardScaler::new();
        let scaled = scaler.fit_transform(&x).unwrap();

        for j in 0..2 {
            let mean: f64 = scaled.column(j).mean().unwrap();
            assert!(mean.abs() < 1e-10);
        }
    }

    #[test]
    fn test_zero_variance_column() {
        let x = array![[1.0, 7.0], [2.0, 7.0], [3.0, 7.0]];
        let mut scaler = StandardScaler::new();
        let scaled = scaler.fit_transform(&x).unwrap();

        // constant column is shifted to zero, not divided to NaN
        for v in scaled.column(1).iter() {
            assert_eq!(*v, 0.0);
        }
    }

    #[test]
    fn test_transform_before_fit_fails() {
        let x = array![[1.0, 2.0]];
        let scaler = StandardScaler::new();
        assert!(matches!(
            scaler.transform(&x).unwrap_err(),
            TriageError::ModelNotFitted
        ));
    }

    #[test]
    fn test_transform_rejects_wrong_width() {
        let x = array![[1.0, 2.0], [3.0, 4.0]];
        let mut scaler = StandardScaler::new();
        scaler.fit(&x).unwrap();

        let bad = array![[1.0, 2.0, 3.0]];
        assert!(matches!(
            scaler.transform(&bad).unwrap_err(),
            TriageError::ShapeError { .. }
        ));
    }
}
