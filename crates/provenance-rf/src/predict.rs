//! Forest prediction.

use crate::error::RfError;
use crate::forest::RandomForest;

/// Averaged class probabilities for one row.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDistribution {
    probs: Vec<f64>,
}

impl ClassDistribution {
    /// Return the most probable class; ties go to the lowest index.
    #[must_use]
    pub fn predicted_class(&self) -> usize {
        let mut best = 0;
        for (class, &p) in self.probs.iter().enumerate() {
            if p > self.probs[best] {
                best = class;
            }
        }
        best
    }

    /// Return up to `k` classes with non-zero probability, most probable first.
    /// Equal probabilities keep ascending class order.
    #[must_use]
    pub fn top_k(&self, k: usize) -> Vec<(usize, f64)> {
        let mut ranked: Vec<(usize, f64)> = self
            .probs
            .iter()
            .copied()
            .enumerate()
            .filter(|&(_, p)| p > 0.0)
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(k);
        ranked
    }

    /// Return the probabilities indexed by class.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.probs
    }
}

impl RandomForest {
    /// Average the leaf distributions of every tree for `row`.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::PredictionWidth`] when `row.len() != n_features`.
    pub fn predict_proba(&self, row: &[f64]) -> Result<ClassDistribution, RfError> {
        if row.len() != self.n_features {
            return Err(RfError::PredictionWidth {
                expected: self.n_features,
                got: row.len(),
            });
        }
        let mut probs = vec![0.0f64; self.n_classes];
        for tree in &self.trees {
            for (sum, p) in probs.iter_mut().zip(tree.predict_proba(row)?) {
                *sum += p;
            }
        }
        let n = self.trees.len() as f64;
        probs.iter_mut().for_each(|p| *p /= n);
        Ok(ClassDistribution { probs })
    }

    /// Return the most probable class for `row`.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::PredictionWidth`] when `row.len() != n_features`.
    pub fn predict(&self, row: &[f64]) -> Result<usize, RfError> {
        Ok(self.predict_proba(row)?.predicted_class())
    }
}
