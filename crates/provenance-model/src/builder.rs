//! Turns datums into a dense matrix and trains a forest on it.

use provenance_rf::ForestConfig;
use tracing::{info, instrument};

use crate::class::ClassValue;
use crate::datum::Datum;
use crate::error::ModelError;
use crate::forest::{ColumnKind, ForestSchema, TrainedForest, TrainingMatrix};
use crate::model::FeatureModel;

/// Collects datums for one attribute and trains its forest.
#[derive(Debug)]
pub struct ForestBuilder<C> {
    model: FeatureModel<C>,
    config: ForestConfig,
    data: Vec<Datum<C>>,
    keep_matrix: bool,
}

impl<C: ClassValue> ForestBuilder<C> {
    /// Create a builder for `model`.
    pub fn new(model: FeatureModel<C>, config: ForestConfig) -> Self {
        Self {
            model,
            config,
            data: Vec::new(),
            keep_matrix: false,
        }
    }

    /// Keep the dense training matrix on the trained forest for ARFF export.
    #[must_use]
    pub fn with_keep_matrix(mut self, keep: bool) -> Self {
        self.keep_matrix = keep;
        self
    }

    /// Return the feature model datums should be filled against.
    #[must_use]
    pub fn feature_model(&self) -> &FeatureModel<C> {
        &self.model
    }

    /// Append a datum; `None` is ignored.
    pub fn add_training_data(&mut self, datum: Option<Datum<C>>) {
        if let Some(datum) = datum {
            self.data.push(datum);
        }
    }

    /// Return the number of datums collected.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Return `true` if no datum was collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Close the model's domains, vectorize every datum and train the forest.
    ///
    /// Absent numeric features become `-1.0`; absent or unseen categories
    /// become the `UNK` index 0.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ModelError::NoTrainingData`] | no datum was added |
    /// | [`ModelError::Training`] | the forest failed to train |
    #[instrument(skip_all, fields(target = %self.model.output().name(), n_datums = self.data.len()))]
    pub fn build(self) -> Result<TrainedForest<C>, ModelError> {
        if self.data.is_empty() {
            return Err(ModelError::NoTrainingData {
                target: self.model.output().name().to_string(),
            });
        }
        self.model.close();
        let schema = ForestSchema::from_model(&self.model);

        // --- Vectorize ---
        let mut classes: Vec<Option<C>> = match schema.output().kind() {
            ColumnKind::Nominal(values) => vec![None; values.len()],
            ColumnKind::Numeric => Vec::new(),
        };
        let mut rows = Vec::with_capacity(self.data.len());
        let mut labels = Vec::with_capacity(self.data.len());
        for datum in &self.data {
            rows.push(schema.encode_row(datum.feature_data()));
            let label = schema
                .output()
                .category(&datum.ground_truth().to_text())
                .unwrap_or(0);
            if let Some(slot) = classes.get_mut(label)
                && label > 0
                && slot.is_none()
            {
                *slot = Some(datum.ground_truth().clone());
            }
            labels.push(label);
        }

        // --- Train ---
        info!(
            n_features = schema.inputs().len(),
            n_classes = classes.len().saturating_sub(1),
            "training data vectorized"
        );
        let forest = self.config.fit(&rows, &labels)?;
        info!(n_trees = forest.n_trees(), "forest built");

        let matrix = self.keep_matrix.then_some(TrainingMatrix { rows, labels });
        Ok(TrainedForest::new(self.model, schema, forest, classes, matrix))
    }
}
