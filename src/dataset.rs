//! Dataset loading and seeded train/test splitting
//!
//! The canonical dataset is a fixed, deterministically generated
//! diabetes-progression table: 442 rows with the ten standard feature
//! columns plus a `target` column. A user-supplied CSV with the same
//! schema can be loaded instead.

use crate::error::{Result, TriageError};
use ndarray::{Array1, Array2, Axis};
use polars::prelude::*;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::fs::File;
use std::path::Path;

/// Feature columns, in wire order. Prediction payloads and CSV files use
/// exactly these names.
pub const FEATURE_NAMES: [&str; 10] = [
    "age", "sex", "bmi", "bp", "s1", "s2", "s3", "s4", "s5", "s6",
];

/// Target column name for training CSVs
pub const TARGET_NAME: &str = "target";

const BUILTIN_ROWS: usize = 442;
// Fixed generator seed: the built-in dataset is the same in every process.
const BUILTIN_SEED: u64 = 0xD1AB_E7E5;

/// A feature matrix with aligned targets
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Feature matrix, one row per sample, columns in [`FEATURE_NAMES`] order
    pub x: Array2<f64>,
    /// Progression targets, one per row of `x`
    pub y: Array1<f64>,
}

impl Dataset {
    /// The built-in diabetes-progression dataset.
    ///
    /// Generated from a fixed seed: 442 rows of pre-normalized feature
    /// values (roughly in [-0.11, 0.11], like the standardized clinical
    /// dataset) with a target that is a noisy linear function of BMI,
    /// blood pressure, and the serum measurements. Every call returns
    /// bit-for-bit identical data.
    pub fn builtin() -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(BUILTIN_SEED);
        let n = BUILTIN_ROWS;
        let d = FEATURE_NAMES.len();

        let mut x = Array2::zeros((n, d));
        for i in 0..n {
            for j in 0..d {
                x[[i, j]] = rng.gen_range(-0.11..0.11);
            }
        }

        // target = baseline + weighted features + uniform noise, which puts
        // the targets in roughly the 25..350 band of the clinical data.
        let mut y = Array1::zeros(n);
        for i in 0..n {
            let signal = 150.0 * x[[i, 0]]      // age
                + 520.0 * x[[i, 2]]             // bmi
                + 280.0 * x[[i, 3]]             // bp
                - 240.0 * x[[i, 6]]             // s3 (HDL, protective)
                + 90.0 * x[[i, 7]]              // s4
                + 480.0 * x[[i, 8]];            // s5 (triglycerides)
            let noise = (rng.gen::<f64>() - 0.5) * 120.0;
            y[i] = 152.0 + signal + noise;
        }

        Self { x, y }
    }

    /// Load a dataset from a CSV file with the ten feature columns and a
    /// `target` column. Any missing file, parse failure, missing column,
    /// or null cell is reported as `DatasetUnavailable`.
    pub fn from_csv(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            TriageError::DatasetUnavailable(format!("cannot open {}: {}", path.display(), e))
        })?;

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(100))
            .into_reader_with_file_handle(file)
            .finish()
            .map_err(|e| {
                TriageError::DatasetUnavailable(format!(
                    "cannot parse {}: {}",
                    path.display(),
                    e
                ))
            })?;

        let n = df.height();
        if n == 0 {
            return Err(TriageError::DatasetUnavailable(format!(
                "{} contains no rows",
                path.display()
            )));
        }

        let mut x = Array2::zeros((n, FEATURE_NAMES.len()));
        for (j, name) in FEATURE_NAMES.iter().enumerate() {
            let values = column_f64(&df, name)?;
            for (i, v) in values.into_iter().enumerate() {
                x[[i, j]] = v;
            }
        }
        let y = Array1::from_vec(column_f64(&df, TARGET_NAME)?);

        Ok(Self { x, y })
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.x.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Partition once into (train, test) with a seeded shuffle. The split
    /// is bit-for-bit reproducible for a given `seed`.
    pub fn train_test_split(&self, test_fraction: f64, seed: u64) -> Result<(Dataset, Dataset)> {
        if !(test_fraction > 0.0 && test_fraction < 1.0) {
            return Err(TriageError::InvalidConfiguration(format!(
                "test_fraction must be in (0, 1) exclusive, got {}",
                test_fraction
            )));
        }
        let n = self.len();
        if n < 2 {
            return Err(TriageError::DatasetUnavailable(
                "need at least 2 samples to split".to_string(),
            ));
        }

        let mut indices: Vec<usize> = (0..n).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        indices.shuffle(&mut rng);

        let n_test = ((n as f64 * test_fraction).round() as usize).clamp(1, n - 1);
        let (test_idx, train_idx) = indices.split_at(n_test);

        Ok((self.select_rows(train_idx), self.select_rows(test_idx)))
    }

    /// Gather a subset of rows by index
    pub fn select_rows(&self, indices: &[usize]) -> Dataset {
        Dataset {
            x: self.x.select(Axis(0), indices),
            y: self.y.select(Axis(0), indices),
        }
    }
}

fn column_f64(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let column = df.column(name).map_err(|_| {
        TriageError::DatasetUnavailable(format!("missing column '{}'", name))
    })?;
    let series = column.as_materialized_series().cast(&DataType::Float64)?;
    let ca = series.f64().map_err(|e| {
        TriageError::DatasetUnavailable(format!("column '{}' is not numeric: {}", name, e))
    })?;

    ca.into_iter()
        .enumerate()
        .map(|(i, v)| {
            v.ok_or_else(|| {
                TriageError::DatasetUnavailable(format!(
                    "null value in column '{}' at row {}",
                    name, i
                ))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_shape() {
        let ds = Dataset::builtin();
        assert_eq!(ds.x.nrows(), 442);
        assert_eq!(ds.x.ncols(), 10);
        assert_eq!(ds.y.len(), 442);
    }

    #[test]
    fn test_builtin_is_deterministic() {
        let a = Dataset::builtin();
        let b = Dataset::builtin();
        assert_eq!(a.x, b.x);
        assert_eq!(a.y, b.y);
    }

    #[test]
    fn test_split_sizes_and_determinism() {
        let ds = Dataset::builtin();
        let (train_a, test_a) = ds.train_test_split(0.2, 42).unwrap();
        let (train_b, test_b) = ds.train_test_split(0.2, 42).unwrap();

        assert_eq!(train_a.len() + test_a.len(), ds.len());
        assert_eq!(test_a.len(), 88); // round(442 * 0.2)
        assert_eq!(train_a.x, train_b.x);
        assert_eq!(test_a.y, test_b.y);
    }

    #[test]
    fn test_split_differs_across_seeds() {
        let ds = Dataset::builtin();
        let (_, test_a) = ds.train_test_split(0.2, 42).unwrap();
        let (_, test_b) = ds.train_test_split(0.2, 43).unwrap();
        assert_ne!(test_a.y, test_b.y);
    }

    #[test]
    fn test_split_rejects_bad_fraction() {
        let ds = Dataset::builtin();
        for bad in [0.0, 1.0, -0.1, 1.5] {
            let err = ds.train_test_split(bad, 42).unwrap_err();
            assert!(matches!(err, TriageError::InvalidConfiguration(_)));
        }
    }

    #[test]
    fn test_missing_csv_is_dataset_unavailable() {
        let err = Dataset::from_csv(Path::new("/nonexistent/data.csv")).unwrap_err();
        assert!(matches!(err, TriageError::DatasetUnavailable(_)));
    }
}
