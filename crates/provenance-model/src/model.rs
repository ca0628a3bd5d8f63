//! Input and output features of one attribute model.

use serde::{Deserialize, Serialize};

use crate::class::{ClassValue, OutputFeature};
use crate::error::ModelError;
use crate::feature::ModelFeature;

/// Ordered input features plus the output they predict.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct FeatureModel<C> {
    inputs: Vec<ModelFeature>,
    output: OutputFeature<C>,
}

impl<C: ClassValue> FeatureModel<C> {
    /// Create a model with no inputs and an open output feature.
    pub fn new(output_name: impl Into<String>) -> Self {
        Self {
            inputs: Vec::new(),
            output: OutputFeature::new(output_name),
        }
    }

    /// Append an input feature.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::DuplicateFeature`] if a feature with the same
    /// name, ignoring case, is already present.
    pub fn add_input_feature(&mut self, feature: ModelFeature) -> Result<(), ModelError> {
        if self.input_feature(feature.name()).is_some() {
            return Err(ModelError::DuplicateFeature {
                name: feature.name().to_string(),
            });
        }
        self.inputs.push(feature);
        Ok(())
    }

    /// Return the input features in insertion order.
    #[must_use]
    pub fn input_features(&self) -> &[ModelFeature] {
        &self.inputs
    }

    /// Find an input feature by name, ignoring case.
    #[must_use]
    pub fn input_feature(&self, name: &str) -> Option<&ModelFeature> {
        self.inputs.iter().find(|f| f.name().eq_ignore_ascii_case(name))
    }

    /// Return the output feature.
    #[must_use]
    pub fn output(&self) -> &OutputFeature<C> {
        &self.output
    }

    /// Close every enumerated domain, inputs and output alike.
    pub fn close(&self) {
        for feature in &self.inputs {
            feature.close();
        }
        self.output.feature().close();
    }
}
