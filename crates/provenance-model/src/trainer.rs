//! Trains the three attribute forests from labeled records.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use provenance_rf::ForestConfig;
use provenance_text::{AnalyzerId, AnalyzerPool, AnalyzerResults, Attribute, Input, LabeledRecord};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::builder::ForestBuilder;
use crate::class::ClassValue;
use crate::datum::Datum;
use crate::error::ModelError;
use crate::forest::TrainedForest;
use crate::model::FeatureModel;
use crate::profile::ProfileAnalyzer;
use crate::text_models::{
    FeatureScope, encoding_model, fill_features, is_text_analyzer, language_model, script_model,
};

/// Records between progress messages.
const PROGRESS_INTERVAL: usize = 100;

/// Default number of trees per attribute forest.
pub const DEFAULT_TREES: usize = 100;

/// Configuration for [`Trainer`].
///
/// # Defaults
///
/// | Parameter   | Default                       |
/// |-------------|-------------------------------|
/// | `forest`    | 100 trees, other forest defaults |
/// | `keep_arff` | `false`                       |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainerConfig {
    forest: ForestConfig,
    keep_arff: bool,
}

impl TrainerConfig {
    /// Create a config with default settings.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Training`] if the default forest config is rejected.
    pub fn new() -> Result<Self, ModelError> {
        Ok(Self {
            forest: ForestConfig::new(DEFAULT_TREES)?,
            keep_arff: false,
        })
    }

    // --- Setters ---

    /// Set the forest hyper-parameters used for all three attributes.
    #[must_use]
    pub fn with_forest(mut self, forest: ForestConfig) -> Self {
        self.forest = forest;
        self
    }

    /// Keep the training matrices so they can be exported as ARFF.
    #[must_use]
    pub fn with_keep_arff(mut self, keep: bool) -> Self {
        self.keep_arff = keep;
        self
    }

    // --- Getters ---

    /// Return the forest hyper-parameters.
    #[must_use]
    pub fn forest(&self) -> &ForestConfig {
        &self.forest
    }

    /// Return whether training matrices are kept.
    #[must_use]
    pub fn keep_arff(&self) -> bool {
        self.keep_arff
    }
}

/// Provenance of a trained profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileMetadata {
    /// Profile name.
    pub name: String,
    /// Analyzer ids the profile depends on.
    pub required_analyzers: Vec<String>,
    /// When training finished.
    pub created: DateTime<Utc>,
    /// Who ran the training.
    pub trainer: String,
    /// Index file the records came from.
    pub training_file: Option<PathBuf>,
    /// Number of training records.
    pub training_instances: usize,
    /// Last modification time of the index file.
    pub training_file_updated: Option<DateTime<Utc>>,
}

/// Return the login name of the current user, or `"unknown"`.
#[must_use]
pub fn current_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}

/// Return a file's modification time, if it can be read.
#[must_use]
pub fn modified_time(path: &Path) -> Option<DateTime<Utc>> {
    let modified = std::fs::metadata(path).and_then(|m| m.modified()).ok()?;
    Some(DateTime::<Utc>::from(modified))
}

/// Trains encoding, language and script forests over a fixed analyzer set.
#[derive(Debug)]
pub struct Trainer {
    config: TrainerConfig,
    pool: Arc<AnalyzerPool>,
    required: BTreeSet<AnalyzerId>,
}

impl Trainer {
    /// Create a trainer over `required`, which must all be in `pool`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ModelError::NoRequiredAnalyzers`] | `required` is empty |
    /// | [`ModelError::Analyzer`] | a required analyzer is missing from `pool` |
    pub fn new(
        config: TrainerConfig,
        pool: Arc<AnalyzerPool>,
        required: BTreeSet<AnalyzerId>,
    ) -> Result<Self, ModelError> {
        if required.is_empty() {
            return Err(ModelError::NoRequiredAnalyzers);
        }
        pool.select(&required)?;
        Ok(Self {
            config,
            pool,
            required,
        })
    }

    /// Return the configuration.
    #[must_use]
    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Train a profile named `name` from `records`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ModelError::NoTrainingData`] | `records` is empty |
    /// | [`ModelError::InvalidGroundTruth`] | a record's label is rejected |
    /// | [`ModelError::Analyzer`] | an analyzer fails, or `name` is not a valid id |
    /// | [`ModelError::Training`] | a forest fails to train |
    #[instrument(skip_all, fields(profile = name, n_records = records.len()))]
    pub fn train(
        &self,
        name: &str,
        records: &[LabeledRecord],
        training_file: Option<&Path>,
    ) -> Result<(ProfileAnalyzer, ProfileMetadata), ModelError> {
        if records.is_empty() {
            return Err(ModelError::NoTrainingData {
                target: name.to_string(),
            });
        }
        let analyzers = self.pool.select(&self.required)?;

        info!("training encoding model");
        let encoding = self.train_attribute(encoding_model(&analyzers)?, records, false, |r| {
            r.encoding().to_string()
        })?;
        info!("training language model");
        let language = self.train_attribute(language_model(&analyzers)?, records, true, |r| {
            r.language().clone()
        })?;
        info!("training script model");
        let script = self.train_attribute(script_model(&analyzers)?, records, true, |r| {
            r.script().clone()
        })?;

        let profile = ProfileAnalyzer::new(
            name,
            self.required.clone(),
            encoding,
            language,
            script,
            Arc::clone(&self.pool),
        )?;
        let metadata = ProfileMetadata {
            name: profile.name(),
            required_analyzers: self.required.iter().map(ToString::to_string).collect(),
            created: Utc::now(),
            trainer: current_user(),
            training_file: training_file.map(Path::to_path_buf),
            training_instances: records.len(),
            training_file_updated: training_file.and_then(modified_time),
        };
        info!(profile = %metadata.name, "training complete");
        Ok((profile, metadata))
    }

    fn train_attribute<C, F>(
        &self,
        model: FeatureModel<C>,
        records: &[LabeledRecord],
        text_pass: bool,
        truth: F,
    ) -> Result<TrainedForest<C>, ModelError>
    where
        C: ClassValue,
        F: Fn(&LabeledRecord) -> C,
    {
        let required = |id: &AnalyzerId| self.required.contains(id);
        let mut builder = ForestBuilder::new(model, self.config.forest.clone())
            .with_keep_matrix(self.config.keep_arff);

        for (i, record) in records.iter().enumerate() {
            let model = builder.feature_model();
            let info = record.text_info();
            let mut datum = Datum::new(model.output(), truth(record))?;

            let byte_results = self.pool.run(Input::Bytes(record.bytes()), required, |a| {
                a.produces(Attribute::Encoding)
            })?;
            let data = datum.feature_data_mut();
            fill_features(model, data, &info, FeatureScope::Binary, &byte_results, &self.pool)?;

            if text_pass {
                let text_results = match record.decode() {
                    Some(text) => self.pool.run(Input::Text(&text), required, is_text_analyzer)?,
                    None => AnalyzerResults::new(),
                };
                fill_features(model, data, &info, FeatureScope::Text, &text_results, &self.pool)?;
            }

            builder.add_training_data(Some(datum));
            if (i + 1) % PROGRESS_INTERVAL == 0 {
                debug!(processed = i + 1, total = records.len(), "training records processed");
            }
        }
        builder.build()
    }
}
