//! Feature models, training datums and per-attribute forests for text
//! provenance profiles.
//!
//! A [`Trainer`] turns labeled records into three [`TrainedForest`]s
//! (encoding, language, script) through the feature layouts in
//! [`text_models`], and bundles them as a [`ProfileAnalyzer`].

mod builder;
mod class;
mod data;
mod datum;
mod error;
mod feature;
mod forest;
mod model;
mod profile;
pub mod text_models;
mod trainer;

pub use builder::ForestBuilder;
pub use class::{ClassValue, OutputFeature};
pub use data::FeatureData;
pub use datum::Datum;
pub use error::ModelError;
pub use feature::{FeatureKind, FeatureValue, ModelFeature, ValueDomain};
pub use forest::{
    Column, ColumnKind, ForestSchema, MAX_PREDICTIONS, TrainedForest, UNKNOWN_NOMINAL,
    UNKNOWN_NUMERIC,
};
pub use model::FeatureModel;
pub use profile::ProfileAnalyzer;
pub use trainer::{
    DEFAULT_TREES, ProfileMetadata, Trainer, TrainerConfig, current_user, modified_time,
};
