use rand_chacha::ChaCha8Rng;

use crate::error::RfError;
use crate::node::{Node, NodeIndex};
use crate::split::{SplitCriterion, SplitSearch};

/// Shape limits shared by every tree of one forest.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TreeParams {
    pub(crate) criterion: SplitCriterion,
    pub(crate) max_depth: Option<usize>,
    pub(crate) min_samples_split: usize,
    pub(crate) min_samples_leaf: usize,
    pub(crate) max_features: usize,
}

/// A fitted CART tree stored as a node arena; the root is index 0.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
    n_features: usize,
    n_classes: usize,
}

impl DecisionTree {
    /// Grow a tree over the samples in `members`.
    ///
    /// `columns` is column-major and pre-validated by the caller.
    pub(crate) fn grow(
        columns: &[Vec<f64>],
        labels: &[usize],
        members: &[usize],
        n_classes: usize,
        params: TreeParams,
        rng: &mut ChaCha8Rng,
    ) -> Self {
        let mut grower = Grower {
            search: SplitSearch {
                columns,
                labels,
                n_classes,
                criterion: params.criterion,
                max_features: params.max_features,
                min_samples_leaf: params.min_samples_leaf,
            },
            params,
            rng,
            nodes: Vec::new(),
        };
        grower.node(members, 0);
        Self {
            nodes: grower.nodes,
            n_features: columns.len(),
            n_classes,
        }
    }

    /// Return the class distribution of the leaf `row` lands in.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::PredictionWidth`] when `row.len() != n_features`.
    pub fn predict_proba(&self, row: &[f64]) -> Result<&[f64], RfError> {
        if row.len() != self.n_features {
            return Err(RfError::PredictionWidth {
                expected: self.n_features,
                got: row.len(),
            });
        }
        let mut at = 0usize;
        loop {
            match &self.nodes[at] {
                Node::Leaf { distribution, .. } => return Ok(distribution.as_slice()),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    at = if row[feature.index()] <= *threshold {
                        left.index()
                    } else {
                        right.index()
                    };
                }
            }
        }
    }

    /// Return the arena.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Return the number of leaves.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Return the width of the rows this tree was grown on.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Return the length of every leaf distribution.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }
}

struct Grower<'a, 'r> {
    search: SplitSearch<'a>,
    params: TreeParams,
    rng: &'r mut ChaCha8Rng,
    nodes: Vec<Node>,
}

impl Grower<'_, '_> {
    fn node(&mut self, members: &[usize], depth: usize) -> NodeIndex {
        let n = members.len();
        let mut counts = vec![0usize; self.search.n_classes];
        for &s in members {
            counts[self.search.labels[s]] += 1;
        }
        let impurity = self.params.criterion.impurity(&counts, n);

        let stop = impurity.is_pure()
            || n < self.params.min_samples_split
            || self.params.max_depth.is_some_and(|d| depth >= d);
        let partition = if stop {
            None
        } else {
            self.search.best(members, &mut *self.rng)
        };

        let at = NodeIndex::new(self.nodes.len());
        let Some(partition) = partition else {
            let total = n.max(1) as f64;
            self.nodes.push(Node::Leaf {
                distribution: counts.iter().map(|&c| c as f64 / total).collect(),
                impurity,
                n_samples: n,
            });
            return at;
        };

        // Reserve the slot so children land after their parent.
        self.nodes.push(Node::Leaf {
            distribution: Vec::new(),
            impurity,
            n_samples: n,
        });
        let left = self.node(&partition.left, depth + 1);
        let right = self.node(&partition.right, depth + 1);
        self.nodes[at.index()] = Node::Split {
            feature: partition.feature,
            threshold: partition.threshold,
            left,
            right,
            n_samples: n,
        };
        at
    }
}
