//! Class values and the output feature that holds them.

use std::fmt::{Debug, Display};
use std::hash::Hash;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::feature::{FeatureValue, ModelFeature};

/// A value a forest can predict.
///
/// The canonical text of a class is its trimmed, lowercased `Display` form;
/// it is what the output feature's domain stores.
pub trait ClassValue:
    Clone + Ord + Hash + Debug + Display + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Canonical text of this class.
    fn to_text(&self) -> String {
        self.to_string().trim().to_lowercase()
    }
}

impl<T> ClassValue for T where
    T: Clone + Ord + Hash + Debug + Display + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

/// The ground-truth slot of a model, typed by its class.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct OutputFeature<C> {
    feature: ModelFeature,
    #[serde(skip)]
    marker: PhantomData<fn() -> C>,
}

impl<C: ClassValue> OutputFeature<C> {
    /// Create an open enumerated output named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            feature: ModelFeature::enumerated(name),
            marker: PhantomData,
        }
    }

    /// Return the feature name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.feature.name()
    }

    /// Return the underlying enumerated feature.
    #[must_use]
    pub fn feature(&self) -> &ModelFeature {
        &self.feature
    }

    /// Check a class value, registering it while the domain is open.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidValue`] if the class text is blank or the
    /// domain is closed and has not seen it.
    pub fn validate(&self, class: &C) -> Result<(), ModelError> {
        self.feature.validate(&FeatureValue::Nominal(class.to_text()))
    }
}
