//! Feature models for the three text attributes and how analyzer output
//! fills them.
//!
//! Features derived from byte-level encoding detectors carry the `b_` prefix;
//! features derived from text-level language and script detectors carry `t_`.
//! Per analyzer and rank `r`, features are named
//! `{prefix}{analyzer id}_{enc|lang|script|score}_{r}`.

use std::sync::Arc;

use provenance_text::{
    Analysis, Analyzer, AnalyzerPool, AnalyzerResults, Attribute, InputKind, Language, Script,
    TextInfo,
};

use crate::class::ClassValue;
use crate::data::FeatureData;
use crate::error::ModelError;
use crate::feature::{FeatureValue, ModelFeature};
use crate::model::FeatureModel;

/// Deepest rank turned into features for analyzers that rank.
pub const MAX_RANKINGS: usize = 3;

/// Byte length of the sample.
pub const BINARY_SIZE: &str = "b_size";
/// Encoding detected so far.
pub const DETECTED_ENCODING: &str = "d_enc";
/// Language detected so far.
pub const DETECTED_LANGUAGE: &str = "d_lang";
/// Script detected so far.
pub const DETECTED_SCRIPT: &str = "d_script";
/// Encoding output.
pub const ENCODING_OUTPUT: &str = "o_enc";
/// Language output.
pub const LANGUAGE_OUTPUT: &str = "o_lang";
/// Script output.
pub const SCRIPT_OUTPUT: &str = "o_script";

/// Which analyzer features a fill pass targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureScope {
    /// Encoding detectors run on raw bytes.
    Binary,
    /// Language and script detectors run on decoded text.
    Text,
}

impl FeatureScope {
    /// Feature name prefix for this scope.
    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            FeatureScope::Binary => "b_",
            FeatureScope::Text => "t_",
        }
    }
}

/// Return `true` for analyzers feeding the `b_` features.
#[must_use]
pub fn is_encoding_analyzer(analyzer: &dyn Analyzer) -> bool {
    analyzer.accepts(InputKind::Bytes) && analyzer.produces(Attribute::Encoding)
}

/// Return `true` for analyzers feeding the `t_` features.
#[must_use]
pub fn is_text_analyzer(analyzer: &dyn Analyzer) -> bool {
    analyzer.produces(Attribute::Language) || analyzer.produces(Attribute::Script)
}

fn rankings(analyzer: &dyn Analyzer) -> usize {
    if analyzer.produces_rankings() {
        MAX_RANKINGS
    } else {
        1
    }
}

fn add_analyzer_features<C: ClassValue>(
    model: &mut FeatureModel<C>,
    scope: FeatureScope,
    analyzer: &dyn Analyzer,
) -> Result<(), ModelError> {
    let stem = format!("{}{}", scope.prefix(), analyzer.id());
    for r in 1..=rankings(analyzer) {
        if analyzer.produces(Attribute::Encoding) {
            model.add_input_feature(ModelFeature::enumerated(format!("{stem}_enc_{r}")))?;
        }
        if analyzer.produces(Attribute::Language) {
            model.add_input_feature(ModelFeature::enumerated(format!("{stem}_lang_{r}")))?;
        }
        if analyzer.produces(Attribute::Script) {
            model.add_input_feature(ModelFeature::enumerated(format!("{stem}_script_{r}")))?;
        }
        if analyzer.produces_scores() {
            model.add_input_feature(ModelFeature::real(format!("{stem}_score_{r}")))?;
        }
    }
    Ok(())
}

fn add_scope<C: ClassValue>(
    model: &mut FeatureModel<C>,
    scope: FeatureScope,
    analyzers: &[Arc<dyn Analyzer>],
) -> Result<(), ModelError> {
    let wanted: fn(&dyn Analyzer) -> bool = match scope {
        FeatureScope::Binary => is_encoding_analyzer,
        FeatureScope::Text => is_text_analyzer,
    };
    for analyzer in analyzers {
        if wanted(analyzer.as_ref()) {
            add_analyzer_features(model, scope, analyzer.as_ref())?;
        }
    }
    Ok(())
}

/// Build the encoding model: sample size plus byte-level encoding detectors.
///
/// `analyzers` are the required analyzers in id order.
///
/// # Errors
///
/// Returns [`ModelError::DuplicateFeature`] if two analyzers map to the same
/// feature name.
pub fn encoding_model(analyzers: &[Arc<dyn Analyzer>]) -> Result<FeatureModel<String>, ModelError> {
    let mut model = FeatureModel::new(ENCODING_OUTPUT);
    model.add_input_feature(ModelFeature::count(BINARY_SIZE))?;
    add_scope(&mut model, FeatureScope::Binary, analyzers)?;
    Ok(model)
}

fn text_model<C: ClassValue>(
    output: &str,
    analyzers: &[Arc<dyn Analyzer>],
) -> Result<FeatureModel<C>, ModelError> {
    let mut model = FeatureModel::new(output);
    model.add_input_feature(ModelFeature::count(BINARY_SIZE))?;
    model.add_input_feature(ModelFeature::enumerated(DETECTED_ENCODING))?;
    add_scope(&mut model, FeatureScope::Binary, analyzers)?;
    add_scope(&mut model, FeatureScope::Text, analyzers)?;
    Ok(model)
}

/// Build the language model: size, detected encoding, encoding detectors and
/// language/script detectors.
///
/// # Errors
///
/// Returns [`ModelError::DuplicateFeature`] if two analyzers map to the same
/// feature name.
pub fn language_model(
    analyzers: &[Arc<dyn Analyzer>],
) -> Result<FeatureModel<Language>, ModelError> {
    text_model(LANGUAGE_OUTPUT, analyzers)
}

/// Build the script model; same inputs as [`language_model`].
///
/// # Errors
///
/// Returns [`ModelError::DuplicateFeature`] if two analyzers map to the same
/// feature name.
pub fn script_model(analyzers: &[Arc<dyn Analyzer>]) -> Result<FeatureModel<Script>, ModelError> {
    text_model(SCRIPT_OUTPUT, analyzers)
}

/// Set one feature unless it is absent from the model, the value is missing
/// or invalid, or the same value is already there.
fn fill_feature<C: ClassValue>(
    model: &FeatureModel<C>,
    data: &mut FeatureData,
    name: &str,
    value: Option<FeatureValue>,
) -> Result<(), ModelError> {
    let (Some(feature), Some(value)) = (model.input_feature(name), value) else {
        return Ok(());
    };
    if feature.validate(&value).is_err() {
        return Ok(());
    }
    if data.get(feature.name()) == Some(&value) {
        return Ok(());
    }
    data.set(feature, value)
}

fn nominal(text: &str) -> FeatureValue {
    FeatureValue::Nominal(text.trim().to_lowercase())
}

fn fill_analysis<C: ClassValue>(
    model: &FeatureModel<C>,
    data: &mut FeatureData,
    stem: &str,
    rank: usize,
    analyzer: &dyn Analyzer,
    analysis: &Analysis,
) -> Result<(), ModelError> {
    if analyzer.produces(Attribute::Encoding) {
        let value = analysis.encoding().map(nominal);
        fill_feature(model, data, &format!("{stem}_enc_{rank}"), value)?;
    }
    if analyzer.produces(Attribute::Language) {
        let value = analysis.language().map(|l| nominal(l.code()));
        fill_feature(model, data, &format!("{stem}_lang_{rank}"), value)?;
    }
    if analyzer.produces(Attribute::Script) {
        let value = analysis.script().map(|s| nominal(s.code()));
        fill_feature(model, data, &format!("{stem}_script_{rank}"), value)?;
    }
    if analyzer.produces_scores() {
        let value = analysis.score().map(FeatureValue::Numeric);
        fill_feature(model, data, &format!("{stem}_score_{rank}"), value)?;
    }
    Ok(())
}

/// Fill `data` for `model` from the working state and one scope's results.
///
/// `results` must come from the input form matching `scope`: raw bytes for
/// [`FeatureScope::Binary`], decoded text for [`FeatureScope::Text`].
/// Analyzers not in `pool` are skipped.
///
/// # Errors
///
/// Returns [`ModelError::FeatureAlreadySet`] if a feature already holds a
/// different value.
pub fn fill_features<C: ClassValue>(
    model: &FeatureModel<C>,
    data: &mut FeatureData,
    info: &TextInfo,
    scope: FeatureScope,
    results: &AnalyzerResults,
    pool: &AnalyzerPool,
) -> Result<(), ModelError> {
    // --- Working state ---
    let size = info.size.map(|s| FeatureValue::Numeric(s as f64));
    fill_feature(model, data, BINARY_SIZE, size)?;
    fill_feature(model, data, DETECTED_ENCODING, info.encoding.as_deref().map(nominal))?;
    let language = info.language.as_ref().map(|l| nominal(l.code()));
    fill_feature(model, data, DETECTED_LANGUAGE, language)?;
    let script = info.script.as_ref().map(|s| nominal(s.code()));
    fill_feature(model, data, DETECTED_SCRIPT, script)?;

    // --- Analyzer output ---
    for (id, analyses) in results {
        let Some(analyzer) = pool.get(id) else {
            continue;
        };
        let stem = format!("{}{}", scope.prefix(), id);
        for (i, analysis) in analyses.iter().take(rankings(analyzer.as_ref())).enumerate() {
            fill_analysis(model, data, &stem, i + 1, analyzer.as_ref(), analysis)?;
        }
    }
    Ok(())
}
