//! Linear regression via normal equations
//!
//! Supports plain least squares and L2 regularization (ridge) through the
//! `alpha` knob; the intercept column is never penalized.

use crate::error::{Result, TriageError};
use ndarray::{s, Array1, Array2};
use serde::{Deserialize, Serialize};

/// Cholesky factor of a symmetric positive-definite matrix, L with A = L L^T
fn cholesky_factor(a: &Array2<f64>) -> Option<Array2<f64>> {
    let n = a.nrows();
    let mut l = Array2::zeros((n, n));

    for i in 0..n {
        for j in 0..=i {
            let mut sum = 0.0;
            for k in 0..j {
                sum += l[[i, k]] * l[[j, k]];
            }
            if i == j {
                let diag = a[[i, i]] - sum;
                if diag <= 0.0 {
                    return None;
                }
                l[[i, j]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }

    Some(l)
}

/// Solve A x = b given the Cholesky factor L
fn cholesky_back_substitute(l: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
    let n = l.nrows();

    // Forward substitution: L y = b
    let mut y = Array1::zeros(n);
    for i in 0..n {
        let mut sum = 0.0;
        for j in 0..i {
            sum += l[[i, j]] * y[j];
        }
        y[i] = (b[i] - sum) / l[[i, i]];
    }

    // Backward substitution: L^T x = y
    let mut x = Array1::zeros(n);
    for i in (0..n).rev() {
        let mut sum = 0.0;
        for j in (i + 1)..n {
            sum += l[[j, i]] * x[j];
        }
        x[i] = (y[i] - sum) / l[[i, i]];
    }

    x
}

/// Matrix inversion by Gauss-Jordan elimination (fallback for matrices that
/// fail Cholesky even after jitter)
fn matrix_inverse(m: &Array2<f64>) -> Option<Array2<f64>> {
    let n = m.nrows();
    if n != m.ncols() {
        return None;
    }

    let mut aug = Array2::zeros((n, 2 * n));
    for i in 0..n {
        for j in 0..n {
            aug[[i, j]] = m[[i, j]];
        }
        aug[[i, n + i]] = 1.0;
    }

    for col in 0..n {
        let mut max_row = col;
        for row in col + 1..n {
            if aug[[row, col]].abs() > aug[[max_row, col]].abs() {
                max_row = row;
            }
        }

        if max_row != col {
            for j in 0..2 * n {
                let tmp = aug[[col, j]];
                aug[[col, j]] = aug[[max_row, j]];
                aug[[max_row, j]] = tmp;
            }
        }

        if aug[[col, col]].abs() < 1e-10 {
            return None;
        }

        let pivot = aug[[col, col]];
        for j in 0..2 * n {
            aug[[col, j]] /= pivot;
        }

        for row in 0..n {
            if row != col {
                let factor = aug[[row, col]];
                for j in 0..2 * n {
                    aug[[row, j]] -= factor * aug[[col, j]];
                }
            }
        }
    }

    let mut inv = Array2::zeros((n, n));
    for i in 0..n {
        for j in 0..n {
            inv[[i, j]] = aug[[i, n + j]];
        }
    }

    Some(inv)
}

/// Solve the (possibly regularized) normal equations A x = b.
/// Tries Cholesky, retries once with diagonal jitter, then falls back to
/// Gauss-Jordan via an explicit inverse.
fn solve_normal_equations(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    if let Some(l) = cholesky_factor(a) {
        return Some(cholesky_back_substitute(&l, b));
    }

    let n = a.nrows();
    let jitter = 1e-8 * a.diag().iter().map(|v| v.abs()).sum::<f64>() / n as f64;
    let mut a_reg = a.clone();
    for k in 0..n {
        a_reg[[k, k]] += jitter;
    }
    if let Some(l) = cholesky_factor(&a_reg) {
        return Some(cholesky_back_substitute(&l, b));
    }

    matrix_inverse(a).map(|inv| inv.dot(b))
}

/// Linear regression model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearRegression {
    /// Fitted coefficients
    coefficients: Option<Array1<f64>>,
    /// Fitted intercept
    intercept: Option<f64>,
    /// L2 regularization strength; 0.0 is ordinary least squares
    pub alpha: f64,
    is_fitted: bool,
}

impl Default for LinearRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearRegression {
    pub fn new() -> Self {
        Self {
            coefficients: None,
            intercept: None,
            alpha: 0.0,
            is_fitted: false,
        }
    }

    /// Set regularization strength (ridge regression)
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Fit the model to training data
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(TriageError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 || n_features == 0 {
            return Err(TriageError::ShapeError {
                expected: "non-empty feature matrix".to_string(),
                actual: format!("{}x{}", n_samples, n_features),
            });
        }

        // Design matrix with an intercept column of ones at index 0
        let mut design = Array2::ones((n_samples, n_features + 1));
        design.slice_mut(s![.., 1..]).assign(x);

        let mut xtx = design.t().dot(&design);
        let xty = design.t().dot(y);

        // Penalize every coefficient except the intercept
        if self.alpha > 0.0 {
            for j in 1..=n_features {
                xtx[[j, j]] += self.alpha;
            }
        }

        let weights = solve_normal_equations(&xtx, &xty).ok_or_else(|| {
            TriageError::TrainingError("normal equations are singular".to_string())
        })?;

        self.intercept = Some(weights[0]);
        self.coefficients = Some(weights.slice(s![1..]).to_owned());
        self.is_fitted = true;
        Ok(self)
    }

    /// Predict targets for a feature matrix
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let (coef, intercept) = match (&self.coefficients, self.intercept) {
            (Some(c), Some(b)) if self.is_fitted => (c, b),
            _ => return Err(TriageError::ModelNotFitted),
        };
        if x.ncols() != coef.len() {
            return Err(TriageError::ShapeError {
                expected: format!("{} columns", coef.len()),
                actual: format!("{} columns", x.ncols()),
            });
        }

        Ok(x.dot(coef) + intercept)
    }
}
