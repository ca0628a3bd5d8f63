use provenance_rf::RfError;
use provenance_text::TextError;

/// Errors from feature validation, forest building and profile training.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Returned when a datum's ground truth fails the output feature's check.
    #[error("invalid ground truth for {feature}: \"{value}\"")]
    InvalidGroundTruth {
        /// Output feature name.
        feature: String,
        /// Canonical text of the rejected value.
        value: String,
    },

    /// Returned when a feature that already holds a value is set again.
    #[error("feature {feature} is already set: current = {current}, new = {new}")]
    FeatureAlreadySet {
        /// Feature name.
        feature: String,
        /// Value already present.
        current: String,
        /// Value that was rejected.
        new: String,
    },

    /// Returned when a value fails a feature's validity check.
    #[error("invalid value for {feature}: {value} ({reason})")]
    InvalidValue {
        /// Feature name.
        feature: String,
        /// Text of the rejected value.
        value: String,
        /// Which check failed.
        reason: String,
    },

    /// Returned when a model already has a feature of the same name.
    #[error("duplicate feature {name}")]
    DuplicateFeature {
        /// Clashing name.
        name: String,
    },

    /// Returned when building a forest from no datums.
    #[error("no training data for {target}")]
    NoTrainingData {
        /// The output being trained.
        target: String,
    },

    /// Returned when a profile is created without any required analyzers.
    #[error("no required analyzers specified")]
    NoRequiredAnalyzers,

    /// Returned when the forest fails to train or predict.
    #[error("random forest failed")]
    Training {
        /// Underlying forest error.
        #[from]
        source: RfError,
    },

    /// Returned when an analyzer fails or is unavailable.
    #[error("analyzer failure")]
    Analyzer {
        /// Underlying analyzer error.
        #[from]
        source: TextError,
    },
}
