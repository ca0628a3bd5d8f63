use rand::Rng;

use crate::node::{FeatureIndex, Impurity};

/// Node impurity measure used to score candidate splits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SplitCriterion {
    /// `1 - Σ p²`
    Gini,
    /// `-Σ p·ln(p)` over non-empty classes.
    Entropy,
}

impl SplitCriterion {
    /// Impurity of a node with the given class counts. An empty node is pure.
    #[must_use]
    pub fn impurity(&self, counts: &[usize], total: usize) -> Impurity {
        if total == 0 {
            return Impurity::new(0.0);
        }
        let n = total as f64;
        let proportions = counts.iter().filter(|&&c| c > 0).map(|&c| c as f64 / n);
        let value = match self {
            SplitCriterion::Gini => 1.0 - proportions.map(|p| p * p).sum::<f64>(),
            SplitCriterion::Entropy => -proportions.map(|p| p * p.ln()).sum::<f64>(),
        };
        Impurity::new(value.max(0.0))
    }
}

/// A chosen split and the partition it induces.
#[derive(Debug)]
pub(crate) struct Partition {
    pub(crate) feature: FeatureIndex,
    pub(crate) threshold: f64,
    pub(crate) left: Vec<usize>,
    pub(crate) right: Vec<usize>,
}

/// Exhaustive threshold search over a random subset of columns.
///
/// `columns[c][s]` is the value of column `c` for sample `s`; the search
/// only looks at the samples listed in `members`.
pub(crate) struct SplitSearch<'a> {
    pub(crate) columns: &'a [Vec<f64>],
    pub(crate) labels: &'a [usize],
    pub(crate) n_classes: usize,
    pub(crate) criterion: SplitCriterion,
    pub(crate) max_features: usize,
    pub(crate) min_samples_leaf: usize,
}

impl SplitSearch<'_> {
    /// Return the split with the largest weighted impurity decrease, or
    /// `None` when every candidate column is constant over `members` or no
    /// threshold satisfies `min_samples_leaf`.
    pub(crate) fn best(&self, members: &[usize], rng: &mut impl Rng) -> Option<Partition> {
        let n = members.len();
        let width = self.columns.len();
        if n < 2 || width == 0 {
            return None;
        }

        let mut parent = vec![0usize; self.n_classes];
        for &s in members {
            parent[self.labels[s]] += 1;
        }
        let parent_score = n as f64 * self.criterion.impurity(&parent, n).value();

        // Partial Fisher-Yates over the column order.
        let take = self.max_features.min(width);
        let mut order: Vec<usize> = (0..width).collect();
        for i in 0..take {
            let j = rng.gen_range(i..width);
            order.swap(i, j);
        }

        let mut best: Option<(f64, usize, f64)> = None;
        let mut sorted: Vec<(f64, usize)> = Vec::with_capacity(n);
        for &column in &order[..take] {
            let values = &self.columns[column];
            sorted.clear();
            sorted.extend(members.iter().map(|&s| (values[s], self.labels[s])));
            sorted.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));

            let mut left = vec![0usize; self.n_classes];
            let mut right = parent.clone();
            for i in 0..n - 1 {
                let (value, label) = sorted[i];
                left[label] += 1;
                right[label] -= 1;

                let next = sorted[i + 1].0;
                if value == next {
                    continue;
                }
                let n_left = i + 1;
                let n_right = n - n_left;
                if n_left < self.min_samples_leaf || n_right < self.min_samples_leaf {
                    continue;
                }

                let decrease = parent_score
                    - n_left as f64 * self.criterion.impurity(&left, n_left).value()
                    - n_right as f64 * self.criterion.impurity(&right, n_right).value();
                if best.is_none_or(|(d, _, _)| decrease > d) {
                    best = Some((decrease, column, (value + next) / 2.0));
                }
            }
        }

        let (_, column, threshold) = best?;
        let values = &self.columns[column];
        let (left, right): (Vec<usize>, Vec<usize>) =
            members.iter().partition(|&&s| values[s] <= threshold);
        Some(Partition {
            feature: FeatureIndex::new(column),
            threshold,
            left,
            right,
        })
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::{SplitCriterion, SplitSearch};

    #[test]
    fn gini_values() {
        assert!(SplitCriterion::Gini.impurity(&[4, 0], 4).value().abs() < 1e-12);
        assert!((SplitCriterion::Gini.impurity(&[2, 2], 4).value() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn entropy_values() {
        assert!(SplitCriterion::Entropy.impurity(&[0, 7], 7).value().abs() < 1e-12);
        let balanced = SplitCriterion::Entropy.impurity(&[3, 3], 6).value();
        assert!((balanced - 2.0_f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn empty_node_is_pure() {
        assert!(SplitCriterion::Gini.impurity(&[0, 0], 0).is_pure());
    }

    #[test]
    fn finds_separating_threshold() {
        let columns = vec![vec![0.0, 1.0, 2.0, 8.0, 9.0, 10.0]];
        let labels = vec![0, 0, 0, 1, 1, 1];
        let search = SplitSearch {
            columns: &columns,
            labels: &labels,
            n_classes: 2,
            criterion: SplitCriterion::Gini,
            max_features: 1,
            min_samples_leaf: 1,
        };
        let members: Vec<usize> = (0..6).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let split = search.best(&members, &mut rng).unwrap();
        assert_eq!(split.feature.index(), 0);
        assert!((split.threshold - 5.0).abs() < 1e-12);
        assert_eq!(split.left, vec![0, 1, 2]);
        assert_eq!(split.right, vec![3, 4, 5]);
    }

    #[test]
    fn constant_column_has_no_split() {
        let columns = vec![vec![1.0; 4]];
        let labels = vec![0, 1, 0, 1];
        let search = SplitSearch {
            columns: &columns,
            labels: &labels,
            n_classes: 2,
            criterion: SplitCriterion::Entropy,
            max_features: 1,
            min_samples_leaf: 1,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        assert!(search.best(&[0, 1, 2, 3], &mut rng).is_none());
    }

    #[test]
    fn min_leaf_blocks_lopsided_split() {
        let columns = vec![vec![0.0, 5.0, 5.0, 5.0]];
        let labels = vec![1, 0, 0, 0];
        let search = SplitSearch {
            columns: &columns,
            labels: &labels,
            n_classes: 2,
            criterion: SplitCriterion::Gini,
            max_features: 1,
            min_samples_leaf: 2,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        assert!(search.best(&[0, 1, 2, 3], &mut rng).is_none());
    }
}
