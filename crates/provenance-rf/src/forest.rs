//! Bootstrap aggregation of CART trees.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{debug, info, instrument};

use crate::config::ForestConfig;
use crate::error::RfError;
use crate::tree::{DecisionTree, TreeParams};

/// A fitted forest.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RandomForest {
    pub(crate) trees: Vec<DecisionTree>,
    pub(crate) n_features: usize,
    pub(crate) n_classes: usize,
}

impl RandomForest {
    /// Return the trees.
    #[must_use]
    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    /// Return the number of trees.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Return the row width the forest was trained on.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Return the number of class slots in each distribution.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }
}

/// Check the training matrix and return its width.
fn check_training_set(rows: &[Vec<f64>], labels: &[usize]) -> Result<usize, RfError> {
    let Some(first) = rows.first() else {
        return Err(RfError::EmptyDataset);
    };
    let width = first.len();
    if width == 0 {
        return Err(RfError::ZeroFeatures);
    }
    if labels.len() != rows.len() {
        return Err(RfError::LabelCountMismatch {
            labels: labels.len(),
            rows: rows.len(),
        });
    }
    for (row, values) in rows.iter().enumerate() {
        if values.len() != width {
            return Err(RfError::RaggedRow {
                row,
                expected: width,
                got: values.len(),
            });
        }
        if let Some(column) = values.iter().position(|v| !v.is_finite()) {
            return Err(RfError::NonFiniteValue { row, column });
        }
    }
    Ok(width)
}

#[instrument(skip_all, fields(n_trees = config.n_trees, n_samples = rows.len()))]
pub(crate) fn train(
    config: &ForestConfig,
    rows: &[Vec<f64>],
    labels: &[usize],
) -> Result<RandomForest, RfError> {
    // --- Validate ---
    let n_features = check_training_set(rows, labels)?;
    config.validate()?;
    let max_features = config.max_features.resolve(n_features)?;

    let n_samples = rows.len();
    let n_classes = labels.iter().copied().max().unwrap_or(0) + 1;
    let columns: Vec<Vec<f64>> = (0..n_features)
        .map(|c| rows.iter().map(|r| r[c]).collect())
        .collect();

    info!(
        n_samples,
        n_features,
        n_classes,
        max_features,
        "training random forest"
    );

    let params = TreeParams {
        criterion: config.criterion,
        max_depth: config.max_depth,
        min_samples_split: config.min_samples_split,
        min_samples_leaf: config.min_samples_leaf,
        max_features,
    };

    // Per-tree seeds come from one master stream, so the result does not
    // depend on rayon's scheduling.
    let mut master = ChaCha8Rng::seed_from_u64(config.seed);
    let seeds: Vec<u64> = (0..config.n_trees).map(|_| master.r#gen()).collect();

    let trees: Vec<DecisionTree> = seeds
        .into_par_iter()
        .map(|seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let bag: Vec<usize> = (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect();
            DecisionTree::grow(&columns, labels, &bag, n_classes, params, &mut rng)
        })
        .collect();

    debug!(
        n_leaves = trees.iter().map(DecisionTree::n_leaves).sum::<usize>(),
        "forest grown"
    );

    Ok(RandomForest {
        trees,
        n_features,
        n_classes,
    })
}
