//! Training instances validated against their feature model.

use crate::class::{ClassValue, OutputFeature};
use crate::data::FeatureData;
use crate::error::ModelError;
use crate::feature::{FeatureValue, ModelFeature};

/// One labeled training instance.
#[derive(Debug, Clone)]
pub struct Datum<C> {
    ground_truth: C,
    data: FeatureData,
}

impl<C: ClassValue> Datum<C> {
    /// Create a datum, checking the ground truth against the output feature.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidGroundTruth`] if the output feature
    /// rejects `ground_truth`.
    pub fn new(output: &OutputFeature<C>, ground_truth: C) -> Result<Self, ModelError> {
        if output.validate(&ground_truth).is_err() {
            return Err(ModelError::InvalidGroundTruth {
                feature: output.name().to_string(),
                value: ground_truth.to_text(),
            });
        }
        Ok(Self {
            ground_truth,
            data: FeatureData::new(),
        })
    }

    /// Return the ground truth.
    #[must_use]
    pub fn ground_truth(&self) -> &C {
        &self.ground_truth
    }

    /// Return the feature values.
    #[must_use]
    pub fn feature_data(&self) -> &FeatureData {
        &self.data
    }

    /// Return the feature values for filling.
    pub fn feature_data_mut(&mut self) -> &mut FeatureData {
        &mut self.data
    }

    /// Return the value of `feature`, if set.
    #[must_use]
    pub fn feature_value(&self, feature: &ModelFeature) -> Option<&FeatureValue> {
        self.data.get(feature.name())
    }

    /// Set a feature value once.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ModelError::FeatureAlreadySet`] | the feature already holds a value |
    /// | [`ModelError::InvalidValue`] | the value fails the feature's check |
    pub fn set_feature(&mut self, feature: &ModelFeature, value: FeatureValue) -> Result<(), ModelError> {
        self.data.set(feature, value)
    }
}
