//! The trained multi-attribute analyzer.

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::sync::Arc;

use provenance_text::encoding::decode;
use provenance_text::{
    Analysis, Analyzer, AnalyzerId, AnalyzerPool, AnalyzerResults, Attribute, Input, InputKind,
    Language, Script, TextError, TextInfo,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::data::FeatureData;
use crate::error::ModelError;
use crate::forest::TrainedForest;
use crate::text_models::{FeatureScope, fill_features, is_text_analyzer};

/// A trained analyzer predicting encoding, then language, then script.
///
/// The three forests share one sparse feature set per call, so byte-level
/// features filled for the encoding forest are also seen by the language and
/// script forests. The pool is not serialized; a loaded profile must be
/// [bound](Self::bind) before use.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileAnalyzer {
    id: AnalyzerId,
    required: BTreeSet<AnalyzerId>,
    encoding: TrainedForest<String>,
    language: TrainedForest<Language>,
    script: TrainedForest<Script>,
    #[serde(skip)]
    pool: Option<Arc<AnalyzerPool>>,
}

impl ProfileAnalyzer {
    /// Bundle three trained forests under the profile name.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ModelError::NoRequiredAnalyzers`] | `required` is empty |
    /// | [`ModelError::Analyzer`] | `name` is not a valid id, or a required analyzer is missing from `pool` |
    pub fn new(
        name: &str,
        required: BTreeSet<AnalyzerId>,
        encoding: TrainedForest<String>,
        language: TrainedForest<Language>,
        script: TrainedForest<Script>,
        pool: Arc<AnalyzerPool>,
    ) -> Result<Self, ModelError> {
        if required.is_empty() {
            return Err(ModelError::NoRequiredAnalyzers);
        }
        let mut profile = Self {
            id: name.parse()?,
            required,
            encoding,
            language,
            script,
            pool: None,
        };
        profile.bind(pool)?;
        Ok(profile)
    }

    /// Attach the pool that supplies the required analyzers.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Analyzer`] wrapping
    /// [`TextError::MissingAnalyzer`] if a required id is not in `pool`.
    pub fn bind(&mut self, pool: Arc<AnalyzerPool>) -> Result<(), ModelError> {
        pool.select(&self.required)?;
        self.pool = Some(pool);
        Ok(())
    }

    /// Return `true` once a pool is attached.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.pool.is_some()
    }

    /// Return the profile name.
    #[must_use]
    pub fn name(&self) -> String {
        self.id.to_string()
    }

    /// Return the analyzers the forests were trained on.
    #[must_use]
    pub fn required(&self) -> &BTreeSet<AnalyzerId> {
        &self.required
    }

    /// Return the encoding forest.
    #[must_use]
    pub fn encoding_forest(&self) -> &TrainedForest<String> {
        &self.encoding
    }

    /// Return the language forest.
    #[must_use]
    pub fn language_forest(&self) -> &TrainedForest<Language> {
        &self.language
    }

    /// Return the script forest.
    #[must_use]
    pub fn script_forest(&self) -> &TrainedForest<Script> {
        &self.script
    }

    fn identify(&self, pool: &AnalyzerPool, input: Input<'_>) -> Result<Analysis, ModelError> {
        let mut info = TextInfo::default();
        let (binary, bytes, mut text) = match input {
            Input::Bytes(bytes) => (true, Cow::Borrowed(bytes), None),
            Input::Text(text) => {
                info.set_encoding("utf-8");
                (false, Cow::Owned(text.as_bytes().to_vec()), Some(text.to_string()))
            }
        };
        info.size = Some(bytes.len());
        let required = |id: &AnalyzerId| self.required.contains(id);
        let mut data = FeatureData::new();

        // --- Encoding ---
        let byte_results = pool.run(Input::Bytes(&bytes), required, |a| {
            a.produces(Attribute::Encoding)
        })?;
        let model = self.encoding.feature_model();
        fill_features(model, &mut data, &info, FeatureScope::Binary, &byte_results, pool)?;
        if binary && let Some((encoding, _)) = self.encoding.classify(&data)?.into_iter().next() {
            info.set_encoding(&encoding);
            text = decode(&bytes, &encoding);
        }

        // --- Language and script ---
        let text_results = match text.as_deref() {
            Some(t) if !t.trim().is_empty() => pool.run(Input::Text(t), required, is_text_analyzer)?,
            _ => AnalyzerResults::new(),
        };
        let model = self.language.feature_model();
        fill_features(model, &mut data, &info, FeatureScope::Text, &text_results, pool)?;
        info.language = self.language.classify(&data)?.into_iter().next().map(|(l, _)| l);

        let model = self.script.feature_model();
        fill_features(model, &mut data, &info, FeatureScope::Text, &text_results, pool)?;
        info.script = self.script.classify(&data)?.into_iter().next().map(|(s, _)| s);

        debug!(
            profile = %self.id,
            encoding = ?info.encoding,
            n_features = data.len(),
            "profile analysis complete"
        );
        Ok(info.to_analysis())
    }
}

impl Analyzer for ProfileAnalyzer {
    fn id(&self) -> &AnalyzerId {
        &self.id
    }

    fn accepts(&self, _kind: InputKind) -> bool {
        true
    }

    fn produces(&self, _attribute: Attribute) -> bool {
        true
    }

    fn analyze(&self, input: Input<'_>) -> Result<Vec<Analysis>, TextError> {
        let failed = |reason: String| TextError::AnalysisFailed {
            id: self.id.to_string(),
            reason,
        };
        let pool = self
            .pool
            .as_deref()
            .ok_or_else(|| failed("profile is not bound to an analyzer pool".to_string()))?;
        match self.identify(pool, input) {
            Ok(analysis) => Ok(vec![analysis]),
            Err(ModelError::Analyzer { source }) => Err(source),
            Err(err) => Err(failed(err.to_string())),
        }
    }
}
