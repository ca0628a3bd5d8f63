use std::fmt;

/// Zero-based feature column.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    serde::Serialize, serde::Deserialize,
)]
pub struct FeatureIndex(usize);

impl FeatureIndex {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Return the column position.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for FeatureIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "f{}", self.0)
    }
}

/// Position of a node inside a tree's arena.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    serde::Serialize, serde::Deserialize,
)]
pub struct NodeIndex(usize);

impl NodeIndex {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Return the arena position.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Impurity of a node under the forest's criterion.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, serde::Serialize, serde::Deserialize)]
pub struct Impurity(f64);

impl Impurity {
    pub(crate) fn new(value: f64) -> Self {
        Self(value)
    }

    /// Return the raw value.
    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }

    /// Return `true` for a node holding a single class.
    #[must_use]
    pub fn is_pure(self) -> bool {
        self.0 <= 0.0
    }
}

impl fmt::Display for Impurity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}", self.0)
    }
}

/// A tree node. Children are arena indices, so a tree is a flat `Vec<Node>`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum Node {
    /// Interior node: `row[feature] <= threshold` goes left.
    Split {
        /// Column tested.
        feature: FeatureIndex,
        /// Split point, the midpoint between two adjacent training values.
        threshold: f64,
        /// Left child.
        left: NodeIndex,
        /// Right child.
        right: NodeIndex,
        /// Samples that reached this node during training.
        n_samples: usize,
    },
    /// Terminal node carrying the training class frequencies.
    Leaf {
        /// Class frequencies, normalized to sum to 1.
        distribution: Vec<f64>,
        /// Impurity of the leaf.
        impurity: Impurity,
        /// Samples that reached this leaf during training.
        n_samples: usize,
    },
}

impl Node {
    /// Return the number of training samples that reached this node.
    #[must_use]
    pub fn n_samples(&self) -> usize {
        match self {
            Node::Split { n_samples, .. } | Node::Leaf { n_samples, .. } => *n_samples,
        }
    }

    /// Return `true` for a leaf.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::{FeatureIndex, Impurity, Node, NodeIndex};

    #[test]
    fn index_display_and_order() {
        assert_eq!(FeatureIndex::new(3).to_string(), "f3");
        assert!(NodeIndex::new(1) < NodeIndex::new(2));
        assert_eq!(NodeIndex::new(9).index(), 9);
    }

    #[test]
    fn impurity_purity() {
        assert!(Impurity::new(0.0).is_pure());
        assert!(!Impurity::new(0.25).is_pure());
        assert_eq!(Impurity::new(0.5).to_string(), "0.500000");
    }

    #[test]
    fn node_accessors() {
        let leaf = Node::Leaf {
            distribution: vec![0.25, 0.75],
            impurity: Impurity::new(0.375),
            n_samples: 8,
        };
        let split = Node::Split {
            feature: FeatureIndex::new(0),
            threshold: 1.5,
            left: NodeIndex::new(1),
            right: NodeIndex::new(2),
            n_samples: 16,
        };
        assert!(leaf.is_leaf());
        assert!(!split.is_leaf());
        assert_eq!(leaf.n_samples(), 8);
        assert_eq!(split.n_samples(), 16);
    }
}
