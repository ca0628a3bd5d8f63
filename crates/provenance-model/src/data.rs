//! Sparse, write-once feature values.

use std::collections::BTreeMap;

use crate::error::ModelError;
use crate::feature::{FeatureValue, ModelFeature};

/// Sparse, write-once feature values keyed by feature name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureData {
    values: BTreeMap<String, FeatureValue>,
}

impl FeatureData {
    /// Create an empty set of values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `true` if `feature` holds a value.
    #[must_use]
    pub fn contains(&self, feature: &str) -> bool {
        self.values.contains_key(feature)
    }

    /// Return the value of `feature`.
    #[must_use]
    pub fn get(&self, feature: &str) -> Option<&FeatureValue> {
        self.values.get(feature)
    }

    /// Set a feature's value once.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ModelError::FeatureAlreadySet`] | the feature already holds a value |
    /// | [`ModelError::InvalidValue`] | the value fails the feature's check |
    pub fn set(&mut self, feature: &ModelFeature, value: FeatureValue) -> Result<(), ModelError> {
        if let Some(current) = self.values.get(feature.name()) {
            return Err(ModelError::FeatureAlreadySet {
                feature: feature.name().to_string(),
                current: current.to_string(),
                new: value.to_string(),
            });
        }
        feature.validate(&value)?;
        self.values.insert(feature.name().to_string(), value);
        Ok(())
    }

    /// Iterate over `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeatureValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Return the number of set features.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Return `true` if nothing is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
