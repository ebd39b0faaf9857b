//! Bootstrap forest of regression trees
//!
//! Trees are fitted in parallel; each tree draws its bootstrap sample and
//! split randomness from its own ChaCha8 stream, seeded deterministically
//! from the forest's `random_state`, so fits are reproducible regardless of
//! thread scheduling.

use crate::error::{Result, TriageError};
use super::tree::DecisionTree;
use ndarray::{Array1, Array2, Axis};
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Strategy for the number of features considered per split
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum MaxFeatures {
    /// All features (the regression default)
    All,
    /// Square root of the feature count
    Sqrt,
    /// Fixed number
    Fixed(usize),
}

impl MaxFeatures {
    fn resolve(self, n_features: usize) -> Option<usize> {
        match self {
            MaxFeatures::All => None,
            MaxFeatures::Sqrt => Some(((n_features as f64).sqrt().ceil() as usize).max(1)),
            MaxFeatures::Fixed(k) => Some(k.clamp(1, n_features)),
        }
    }
}

/// Random forest regressor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestRegressor {
    trees: Vec<DecisionTree>,
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
    pub random_state: u64,
    n_features: usize,
}

impl RandomForestRegressor {
    pub fn new(n_estimators: usize) -> Self {
        Self {
            trees: Vec::new(),
            n_estimators,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::All,
            random_state: 0,
            n_features: 0,
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    /// Fit the forest with bootstrap sampling
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n = x.nrows();
        if n != y.len() {
            return Err(TriageError::ShapeError {
                expected: format!("y length = {}", n),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n == 0 {
            return Err(TriageError::ShapeError {
                expected: "at least 1 row".to_string(),
                actual: "0 rows".to_string(),
            });
        }
        if self.n_estimators == 0 {
            return Err(TriageError::InvalidConfiguration(
                "n_estimators must be at least 1".to_string(),
            ));
        }

        self.n_features = x.ncols();
        let max_features = self.max_features.resolve(self.n_features);

        // Per-tree seeds drawn up front so parallel fitting stays deterministic
        let mut seed_rng = ChaCha8Rng::seed_from_u64(self.random_state);
        let seeds: Vec<u64> = (0..self.n_estimators).map(|_| seed_rng.next_u64()).collect();

        let trees: Result<Vec<DecisionTree>> = seeds
            .into_par_iter()
            .map(|seed| {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                let sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                let xb = x.select(Axis(0), &sample);
                let yb = y.select(Axis(0), &sample);

                let mut tree = DecisionTree::new()
                    .with_min_samples_split(self.min_samples_split)
                    .with_min_samples_leaf(self.min_samples_leaf)
                    .with_max_features(max_features);
                if let Some(depth) = self.max_depth {
                    tree = tree.with_max_depth(depth);
                }
                tree.fit(&xb, &yb, &mut rng)?;
                Ok(tree)
            })
            .collect();

        self.trees = trees?;
        Ok(self)
    }

    /// Predict by averaging the trees
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(TriageError::ModelNotFitted);
        }
        if x.ncols() != self.n_features {
            return Err(TriageError::ShapeError {
                expected: format!("{} columns", self.n_features),
                actual: format!("{} columns", x.ncols()),
            });
        }

        let n_trees = self.trees.len() as f64;
        let mut out = Array1::zeros(x.nrows());
        for (i, row) in x.rows().into_iter().enumerate() {
            let sum: f64 = self.trees.iter().map(|t| t.predict_row(&row)).sum();
            out[i] = sum / n_trees;
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn toy_data() -> (Array2<f64>, Array1<f64>) {
        let x = array![
            [1.0, 0.1],
            [2.0, 0.2],
            [3.0, 0.1],
            [4.0, 0.3],
            [5.0, 0.2],
            [6.0, 0.1],
            [7.0, 0.4],
            [8.0, 0.2],
            [9.0, 0.3],
            [10.0, 0.1],
        ];
        let y = array![2.0, 4.1, 5.9, 8.2, 9.8, 12.1, 14.0, 16.2, 17.9, 20.1];
        (x, y)
    }

    #[test]
    fn test_forest_fits_monotone_data() {
        let (x, y) = toy_data();
        let mut forest = RandomForestRegressor::new(25).with_random_state(7);
        forest.fit(&x, &y).unwrap();

        let preds = forest.predict(&x).unwrap();
        // first sample should predict well below the last one
        assert!(preds[0] < preds[9]);
    }

    #[test]
    fn test_forest_is_deterministic_for_fixed_seed() {
        let (x, y) = toy_data();

        let mut a = RandomForestRegressor::new(25).with_random_state(42);
        a.fit(&x, &y).unwrap();
        let mut b = RandomForestRegressor::new(25).with_random_state(42);
        b.fit(&x, &y).unwrap();

        assert_eq!(a.predict(&x).unwrap(), b.predict(&x).unwrap());
    }

    #[test]
    fn test_forest_seeds_change_predictions() {
        let (x, y) = toy_data();

        let mut a = RandomForestRegressor::new(25).with_random_state(1);
        a.fit(&x, &y).unwrap();
        let mut b = RandomForestRegressor::new(25).with_random_state(2);
        b.fit(&x, &y).unwrap();

        assert_ne!(a.predict(&x).unwrap(), b.predict(&x).unwrap());
    }

    #[test]
    fn test_predict_before_fit_fails() {
        let forest = RandomForestRegressor::new(10);
        let x = array![[1.0, 2.0]];
        assert!(matches!(
            forest.predict(&x).unwrap_err(),
            TriageError::ModelNotFitted
        ));
    }
}
