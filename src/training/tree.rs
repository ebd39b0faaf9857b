//! Regression decision tree with variance-reduction splits

use crate::error::{Result, TriageError};
use ndarray::{Array1, Array2, ArrayView1};
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Decision tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf with the mean target of its training samples
    Leaf { value: f64, n_samples: usize },
    /// Internal split: rows with `feature <= threshold` go left
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

/// Regression decision tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    root: Option<TreeNode>,
    /// Maximum depth; `None` grows until leaves are pure or too small
    pub max_depth: Option<usize>,
    /// Minimum samples required to attempt a split
    pub min_samples_split: usize,
    /// Minimum samples per leaf
    pub min_samples_leaf: usize,
    /// Features sampled per split; `None` considers all features
    pub max_features: Option<usize>,
    n_features: usize,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTree {
    pub fn new() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            n_features: 0,
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples;
        self
    }

    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples;
        self
    }

    pub fn with_max_features(mut self, max_features: Option<usize>) -> Self {
        self.max_features = max_features;
        self
    }

    /// Fit the tree. The RNG drives per-split feature subsampling, so two
    /// fits with identically seeded RNGs build identical trees.
    pub fn fit(
        &mut self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        rng: &mut ChaCha8Rng,
    ) -> Result<&mut Self> {
        if x.nrows() != y.len() {
            return Err(TriageError::ShapeError {
                expected: format!("y length = {}", x.nrows()),
                actual: format!("y length = {}", y.len()),
            });
        }
        if x.nrows() == 0 {
            return Err(TriageError::ShapeError {
                expected: "at least 1 row".to_string(),
                actual: "0 rows".to_string(),
            });
        }

        self.n_features = x.ncols();
        let indices: Vec<usize> = (0..x.nrows()).collect();
        self.root = Some(self.build_node(x, y, indices, 0, rng));
        Ok(self)
    }

    fn build_node(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: Vec<usize>,
        depth: usize,
        rng: &mut ChaCha8Rng,
    ) -> TreeNode {
        let n = indices.len();
        let sum: f64 = indices.iter().map(|&i| y[i]).sum();
        let mean = sum / n as f64;

        let depth_exhausted = self.max_depth.is_some_and(|d| depth >= d);
        if n < self.min_samples_split || depth_exhausted {
            return TreeNode::Leaf {
                value: mean,
                n_samples: n,
            };
        }

        let Some((feature_idx, threshold)) = self.best_split(x, y, &indices, rng) else {
            return TreeNode::Leaf {
                value: mean,
                n_samples: n,
            };
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| x[[i, feature_idx]] <= threshold);

        let left = self.build_node(x, y, left_idx, depth + 1, rng);
        let right = self.build_node(x, y, right_idx, depth + 1, rng);

        TreeNode::Split {
            feature_idx,
            threshold,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Pick the split minimizing the summed squared error of the two
    /// children, scanning a (possibly subsampled) set of features.
    fn best_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        rng: &mut ChaCha8Rng,
    ) -> Option<(usize, f64)> {
        let n = indices.len();
        let d = x.ncols();

        let mut features: Vec<usize> = (0..d).collect();
        if let Some(k) = self.max_features {
            if k < d {
                features.shuffle(rng);
                features.truncate(k);
                features.sort_unstable();
            }
        }

        let total_sum: f64 = indices.iter().map(|&i| y[i]).sum();
        let total_sq: f64 = indices.iter().map(|&i| y[i] * y[i]).sum();

        let mut best: Option<(usize, f64, f64)> = None;
        for &f in &features {
            let mut pairs: Vec<(f64, f64)> =
                indices.iter().map(|&i| (x[[i, f]], y[i])).collect();
            pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

            let mut left_sum = 0.0;
            let mut left_sq = 0.0;
            for split_at in 1..n {
                let (v_prev, t_prev) = pairs[split_at - 1];
                left_sum += t_prev;
                left_sq += t_prev * t_prev;

                if v_prev >= pairs[split_at].0 {
                    continue; // equal feature values cannot be separated
                }
                let n_left = split_at;
                let n_right = n - split_at;
                if n_left < self.min_samples_leaf || n_right < self.min_samples_leaf {
                    continue;
                }

                let right_sum = total_sum - left_sum;
                let right_sq = total_sq - left_sq;
                let sse = (left_sq - left_sum * left_sum / n_left as f64)
                    + (right_sq - right_sum * right_sum / n_right as f64);

                if best.map_or(true, |(_, _, s)| sse < s) {
                    let threshold = (v_prev + pairs[split_at].0) / 2.0;
                    best = Some((f, threshold, sse));
                }
            }
        }

        best.map(|(f, threshold, _)| (f, threshold))
    }

    /// Predict a single row. Panics only if called on an unfitted tree;
    /// the forest guarantees fitted trees, and [`predict`](Self::predict)
    /// guards the public path.
    pub(crate) fn predict_row(&self, row: &ArrayView1<f64>) -> f64 {
        let mut node = self.root.as_ref().expect("tree is fitted");
        loop {
            match node {
                TreeNode::Leaf { value, .. } => return *value,
                TreeNode::Split {
                    feature_idx,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature_idx] <= *threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }

    /// Predict targets for a feature matrix
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.root.is_none() {
            return Err(TriageError::ModelNotFitted);
        }
        if x.ncols() != self.n_features {
            return Err(TriageError::ShapeError {
                expected: format!("{} columns", self.n_features),
                actual: format!("{} columns", x.ncols()),
            });
        }

        let mut out = Array1::zeros(x.nrows());
        for (i, row) in x.rows().into_iter().enumerate() {
            out[i] = self.predict_row(&row);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::SeedableRng;

    #[test]
    fn test_tree_fits_step_function() {
        let x = array![[1.0], [2.0], [3.0], [10.0], [11.0], [12.0]];
        let y = array![5.0, 5.0, 5.0, 20.0, 20.0, 20.0];

        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut tree = DecisionTree::new();
        tree.fit(&x, &y, &mut rng).unwrap();

        let preds = tree.predict(&x).unwrap();
        assert_eq!(preds, y);
    }

    #[test]
    fn test_max_depth_limits_tree() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = array![1.0, 2.0, 3.0, 4.0];

        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut tree = DecisionTree::new().with_max_depth(0);
        tree.fit(&x, &y, &mut rng).unwrap();

        // depth 0 means a single leaf predicting the global mean
        let preds = tree.predict(&x).unwrap();
        for p in preds.iter() {
            assert!((p - 2.5).abs() < 1e-12);
        }
    }

    #[test]
    fn test_predict_before_fit_fails() {
        let tree = DecisionTree::new();
        let x = array![[1.0]];
        assert!(matches!(
            tree.predict(&x).unwrap_err(),
            TriageError::ModelNotFitted
        ));
    }
}
