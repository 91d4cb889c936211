//! Shuffled train/test split.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::error::{LearningError, Result};

/// Row indices of the two splits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffle `n_rows` row indices with `seed` and hold out `test_size` of them.
///
/// The test split size is rounded up, so any non-zero fraction holds out at
/// least one row. Both splits must end up non-empty.
pub fn train_test_split(n_rows: usize, test_size: f64, seed: u64) -> Result<SplitIndices> {
    let n_test = (n_rows as f64 * test_size).ceil() as usize;
    if n_test == 0 || n_test >= n_rows {
        return Err(LearningError::InvalidData(format!(
            "{} rows with test_size {} would leave an empty training or test split",
            n_rows, test_size
        )));
    }

    let mut indices: Vec<usize> = (0..n_rows).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let train = indices.split_off(n_test);
    Ok(SplitIndices {
        train,
        test: indices,
    })
}
