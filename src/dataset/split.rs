//! Stratified train/test partitioning.
//!
//! Rows are grouped by target class and each group is partitioned on its own,
//! so every class keeps (approximately) its full-set proportion on both sides.
//!
//! # Algorithm
//!
//! 1. Group row indices by class label, visiting classes in sorted order
//! 2. Shuffle each group with one `Pcg64` stream seeded from `seed`
//! 3. Move `round(n * test_fraction)` rows, clamped to `[1, n - 1]`, to test
//! 4. Concatenate the groups and sort each side ascending
//!
//! The last step keeps the original row order inside both partitions.

use crate::preprocessing::error::PreprocessingError;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Disjoint partition of row indices.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Split {
    train: Vec<usize>,
    test: Vec<usize>,
}

impl Split {
    /// Training row indices, ascending.
    pub fn train(&self) -> &[usize] {
        &self.train
    }

    /// Test row indices, ascending.
    pub fn test(&self) -> &[usize] {
        &self.test
    }

    /// Total number of partitioned rows.
    pub fn len(&self) -> usize {
        self.train.len() + self.test.len()
    }

    /// Whether the split holds no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Stratified splitter with a fixed test fraction and seed.
#[derive(Clone, Debug)]
pub struct StratifiedSplitter {
    test_fraction: f64,
    seed: u64,
}

impl StratifiedSplitter {
    /// Create a splitter.
    pub fn new(test_fraction: f64, seed: u64) -> Self {
        Self {
            test_fraction,
            seed,
        }
    }

    /// Fraction of each class assigned to the test partition.
    pub fn test_fraction(&self) -> f64 {
        self.test_fraction
    }

    /// Partition rows by their class labels.
    ///
    /// # Errors
    /// - [`PreprocessingError::InvalidParameter`] if `test_fraction` is not in `(0, 1)`
    /// - [`PreprocessingError::EmptyDataset`] if `labels` is empty
    /// - [`PreprocessingError::InsufficientClassSamples`] if a class has fewer than 2 rows
    pub fn split<L: AsRef<str>>(&self, labels: &[L]) -> Result<Split, PreprocessingError> {
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(PreprocessingError::InvalidParameter(format!(
                "test_fraction must be in (0, 1), got {}",
                self.test_fraction
            )));
        }

        if labels.is_empty() {
            return Err(PreprocessingError::EmptyDataset(
                "Cannot split an empty table".to_string(),
            ));
        }

        let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (row, label) in labels.iter().enumerate() {
            groups.entry(label.as_ref()).or_default().push(row);
        }

        if let Some((class, rows)) = groups.iter().find(|(_, rows)| rows.len() < 2) {
            return Err(PreprocessingError::InsufficientClassSamples {
                class: class.to_string(),
                count: rows.len(),
            });
        }

        let mut rng = Pcg64::seed_from_u64(self.seed);
        let mut train = Vec::with_capacity(labels.len());
        let mut test = Vec::new();

        for rows in groups.values_mut() {
            rows.shuffle(&mut rng);
            let n = rows.len();
            let n_test = ((n as f64) * self.test_fraction).round() as usize;
            let n_test = n_test.clamp(1, n - 1);
            test.extend_from_slice(&rows[..n_test]);
            train.extend_from_slice(&rows[n_test..]);
        }

        train.sort_unstable();
        test.sort_unstable();

        Ok(Split { train, test })
    }
}
