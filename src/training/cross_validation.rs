//! Seeded k-fold cross-validation splitting

use crate::error::{Result, TriageError};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// A single train/validation split
#[derive(Debug, Clone)]
pub struct CVSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
    pub fold_idx: usize,
}

/// K-fold splitter. With `shuffle`, fold assignment comes from a ChaCha8
/// stream seeded with `seed`, so folds are reproducible.
#[derive(Debug, Clone)]
pub struct KFold {
    pub n_splits: usize,
    pub shuffle: bool,
    pub seed: u64,
}

impl KFold {
    pub fn new(n_splits: usize, seed: u64) -> Self {
        Self {
            n_splits,
            shuffle: true,
            seed,
        }
    }

    /// Generate the train/validation splits
    pub fn split(&self, n_samples: usize) -> Result<Vec<CVSplit>> {
        if self.n_splits < 2 {
            return Err(TriageError::ValidationError(
                "n_splits must be at least 2".to_string(),
            ));
        }
        if n_samples < self.n_splits {
            return Err(TriageError::ValidationError(format!(
                "n_samples ({}) must be >= n_splits ({})",
                n_samples, self.n_splits
            )));
        }

        let mut indices: Vec<usize> = (0..n_samples).collect();
        if self.shuffle {
            let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
            indices.shuffle(&mut rng);
        }

        let fold_sizes: Vec<usize> = (0..self.n_splits)
            .map(|i| {
                let base = n_samples / self.n_splits;
                let remainder = n_samples % self.n_splits;
                if i < remainder {
                    base + 1
                } else {
                    base
                }
            })
            .collect();

        let mut splits = Vec::with_capacity(self.n_splits);
        let mut start = 0;
        for (fold_idx, &size) in fold_sizes.iter().enumerate() {
            let test_indices = indices[start..start + size].to_vec();
            let train_indices = indices[..start]
                .iter()
                .chain(indices[start + size..].iter())
                .copied()
                .collect();
            splits.push(CVSplit {
                train_indices,
                test_indices,
                fold_idx,
            });
            start += size;
        }

        Ok(splits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_folds_cover_all_samples_exactly_once() {
        let splits = KFold::new(5, 42).split(23).unwrap();
        assert_eq!(splits.len(), 5);

        let mut seen = HashSet::new();
        for split in &splits {
            for &i in &split.test_indices {
                assert!(seen.insert(i), "index {} appears in two folds", i);
            }
            assert_eq!(split.train_indices.len() + split.test_indices.len(), 23);
        }
        assert_eq!(seen.len(), 23);
    }

    #[test]
    fn test_split_is_deterministic() {
        let a = KFold::new(5, 42).split(50).unwrap();
        let b = KFold::new(5, 42).split(50).unwrap();
        for (sa, sb) in a.iter().zip(b.iter()) {
            assert_eq!(sa.test_indices, sb.test_indices);
        }
    }

    #[test]
    fn test_too_few_samples_rejected() {
        assert!(KFold::new(5, 0).split(3).is_err());
    }
}
