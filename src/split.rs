//! Train / validation / test partitioning.

use log::info;
use polars::prelude::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::errors::PipelineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitPolicy {
    /// Contiguous prefix / middle / suffix in row order.
    Chronological,
    /// Seeded shuffle; identical seeds produce identical partitions.
    Random { seed: u64 },
}

#[derive(Debug, Clone, Copy)]
pub struct SplitFractions {
    pub train: f64,
    pub validation: f64,
    pub test: f64,
}

impl SplitFractions {
    pub fn validate(&self) -> Result<(), PipelineError> {
        let fractions = vec![self.train, self.validation, self.test];
        if fractions.iter().any(|f| *f < 0.0) {
            return Err(PipelineError::InvalidSplit {
                fractions,
                reason: "fractions must be non-negative".to_string(),
            });
        }
        let sum: f64 = fractions.iter().sum();
        if (sum - 1.0).abs() > 1e-6 {
            return Err(PipelineError::InvalidSplit {
                fractions,
                reason: format!("fractions sum to {sum}, expected 1.0"),
            });
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct SplitTables {
    pub train: DataFrame,
    pub validation: DataFrame,
    pub test: DataFrame,
}

/// Partition a table into disjoint train / validation / test subsets that
/// exactly cover the input.
///
/// Train and validation receive `floor(fraction * n)` rows; test takes the
/// remainder. Random partitions are re-sorted into ascending row order, so
/// every subset stays chronologically ordered.
pub fn split_table(
    df: &DataFrame,
    fractions: &SplitFractions,
    policy: &SplitPolicy,
) -> Result<SplitTables, PipelineError> {
    fractions.validate()?;

    let n = df.height();
    let n_train = (fractions.train * n as f64).floor() as usize;
    let n_validation = (fractions.validation * n as f64).floor() as usize;
    let n_test = n - n_train - n_validation;

    let splits = match policy {
        SplitPolicy::Chronological => SplitTables {
            train: df.slice(0, n_train),
            validation: df.slice(n_train as i64, n_validation),
            test: df.slice((n_train + n_validation) as i64, n_test),
        },
        SplitPolicy::Random { seed } => {
            let mut indices: Vec<u32> = (0..n as u32).collect();
            let mut rng = StdRng::seed_from_u64(*seed);
            indices.shuffle(&mut rng);

            let mut train_idx = indices[..n_train].to_vec();
            let mut validation_idx = indices[n_train..n_train + n_validation].to_vec();
            let mut test_idx = indices[n_train + n_validation..].to_vec();
            train_idx.sort_unstable();
            validation_idx.sort_unstable();
            test_idx.sort_unstable();

            SplitTables {
                train: df.take(&IdxCa::from_vec("idx", train_idx))?,
                validation: df.take(&IdxCa::from_vec("idx", validation_idx))?,
                test: df.take(&IdxCa::from_vec("idx", test_idx))?,
            }
        }
    };

    info!(
        "split {} rows into {}/{}/{} (train/validation/test)",
        n,
        splits.train.height(),
        splits.validation.height(),
        splits.test.height()
    );
    Ok(splits)
}
