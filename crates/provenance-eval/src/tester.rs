//! Runs a candidate analyzer, the vote over its inputs and every pool
//! analyzer over labeled records, scoring each on six tracks.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use provenance_text::encoding::lenient_equivalent;
use provenance_text::{
    Analysis, Analyzer, AnalyzerId, AnalyzerPool, Attribute, Input, InputKind, LabeledRecord,
    Language, Script, VotingAnalyzer,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::error::EvalError;
use crate::eval::AnalyzerEval;

/// Records between progress messages.
const PROGRESS_INTERVAL: usize = 100;

/// Id of the vote over the candidate's required analyzers.
pub const VOTING_ID: &str = "voting";

/// Accumulators for one track, keyed by analyzer id.
pub type Track<K> = BTreeMap<String, AnalyzerEval<K>>;

/// Configuration for [`Tester`].
///
/// # Defaults
///
/// | Parameter | Default |
/// |-----------|---------|
/// | `raw`     | `false` |
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TesterConfig {
    raw: bool,
}

impl TesterConfig {
    /// Create a config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep every analyzer's answer for every record.
    #[must_use]
    pub fn with_raw(mut self, raw: bool) -> Self {
        self.raw = raw;
        self
    }

    /// Return whether raw answers are kept.
    #[must_use]
    pub fn raw(&self) -> bool {
        self.raw
    }
}

/// One member of the tested ensemble.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnsembleMember {
    /// Analyzer id as displayed.
    pub id: String,
    /// Whether it answers encoding.
    pub encoding: bool,
    /// Whether it answers language.
    pub language: bool,
    /// Whether it answers script.
    pub script: bool,
}

impl EnsembleMember {
    fn of(id: String, analyzer: &dyn Analyzer) -> Self {
        Self {
            id,
            encoding: analyzer.produces(Attribute::Encoding),
            language: analyzer.produces(Attribute::Language),
            script: analyzer.produces(Attribute::Script),
        }
    }

    /// Return `true` if it answers `attribute`.
    #[must_use]
    pub fn produces(&self, attribute: Attribute) -> bool {
        match attribute {
            Attribute::Encoding => self.encoding,
            Attribute::Language => self.language,
            Attribute::Script => self.script,
        }
    }

    fn produces_all(&self) -> bool {
        self.encoding && self.language && self.script
    }
}

/// One analyzer's answer for a raw record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawAnswer {
    /// Analyzer id.
    pub analyzer: String,
    /// Its first-ranked answer.
    pub analysis: Analysis,
}

/// Every answer for one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    /// File name of the record.
    pub file: String,
    /// Declared labels.
    pub truth: Analysis,
    /// Answers in ensemble order.
    pub answers: Vec<RawAnswer>,
}

/// Outcome of a [`Tester::run`], with statistics already computed.
#[derive(Debug)]
pub struct TestReport {
    /// Candidate name.
    pub name: String,
    /// Ensemble in evaluation order: candidate, vote, then pool ids.
    pub analyzers: Vec<EnsembleMember>,
    /// Number of records tested.
    pub records: usize,
    /// Encoding answers compared by name.
    pub encoding: Track<String>,
    /// Encoding answers, accepting names that decode the record identically.
    pub lenient_encoding: Track<String>,
    /// Language answers.
    pub language: Track<Language>,
    /// Script answers.
    pub script: Track<Script>,
    /// Joint `encoding:language:script` answers.
    pub composite: Track<String>,
    /// Joint answers with the lenient encoding rule.
    pub lenient_composite: Track<String>,
    /// Per-record answers, when requested.
    pub raw: Option<Vec<RawRecord>>,
}

impl TestReport {
    fn new(name: String, analyzers: Vec<EnsembleMember>) -> Self {
        let mut report = Self {
            name,
            analyzers: Vec::new(),
            records: 0,
            encoding: Track::new(),
            lenient_encoding: Track::new(),
            language: Track::new(),
            script: Track::new(),
            composite: Track::new(),
            lenient_composite: Track::new(),
            raw: None,
        };
        for member in &analyzers {
            let id = || member.id.clone();
            if member.encoding {
                report.encoding.insert(id(), AnalyzerEval::new());
                report.lenient_encoding.insert(id(), AnalyzerEval::new());
            }
            if member.language {
                report.language.insert(id(), AnalyzerEval::new());
            }
            if member.script {
                report.script.insert(id(), AnalyzerEval::new());
            }
            if member.produces_all() {
                report.composite.insert(id(), AnalyzerEval::new());
                report.lenient_composite.insert(id(), AnalyzerEval::new());
            }
        }
        report.analyzers = analyzers;
        report
    }

    fn update(&self, member: &EnsembleMember, record: &LabeledRecord, result: &Analysis) {
        let id = member.id.as_str();
        let truth_encoding = record.encoding();
        let detected = result.encoding();
        let lenient = lenient_equivalent(record.bytes(), truth_encoding, detected);

        if member.encoding {
            let truth = Some(truth_encoding.to_string());
            let actual = detected.map(str::to_string);
            if let Some(eval) = self.lenient_encoding.get(id) {
                let lenient_actual = if lenient { truth.clone() } else { actual.clone() };
                eval.add_test_result(truth.clone(), lenient_actual);
            }
            if let Some(eval) = self.encoding.get(id) {
                eval.add_test_result(truth, actual);
            }
        }
        if member.language
            && let Some(eval) = self.language.get(id)
        {
            eval.add_test_result(
                Some(record.language().clone()),
                result.language().cloned(),
            );
        }
        if member.script
            && let Some(eval) = self.script.get(id)
        {
            eval.add_test_result(Some(record.script().clone()), result.script().cloned());
        }
        if member.produces_all() {
            let truth = composite_key(
                Some(truth_encoding),
                Some(record.language()),
                Some(record.script()),
            );
            let actual = composite_key(detected, result.language(), result.script());
            if let Some(eval) = self.lenient_composite.get(id) {
                let lenient_actual = if lenient {
                    composite_key(Some(truth_encoding), result.language(), result.script())
                } else {
                    actual.clone()
                };
                eval.add_test_result(Some(truth.clone()), Some(lenient_actual));
            }
            if let Some(eval) = self.composite.get(id) {
                eval.add_test_result(Some(truth), Some(actual));
            }
        }
    }

    fn compute_stats(&self) {
        self.encoding.values().for_each(AnalyzerEval::compute_stats);
        self.lenient_encoding
            .values()
            .for_each(AnalyzerEval::compute_stats);
        self.language.values().for_each(AnalyzerEval::compute_stats);
        self.script.values().for_each(AnalyzerEval::compute_stats);
        self.composite.values().for_each(AnalyzerEval::compute_stats);
        self.lenient_composite
            .values()
            .for_each(AnalyzerEval::compute_stats);
    }
}

/// Joint class key: trimmed encoding and lowercase codes, blank when absent.
#[must_use]
pub fn composite_key(
    encoding: Option<&str>,
    language: Option<&Language>,
    script: Option<&Script>,
) -> String {
    format!(
        "{}:{}:{}",
        encoding.map(str::trim).unwrap_or_default(),
        language
            .map(|l| l.code().to_lowercase())
            .unwrap_or_default(),
        script.map(|s| s.code().to_lowercase()).unwrap_or_default(),
    )
}

/// Scores a candidate analyzer against the vote and the whole pool.
#[derive(Debug)]
pub struct Tester {
    config: TesterConfig,
    pool: Arc<AnalyzerPool>,
}

impl Tester {
    /// Create a tester over `pool`.
    #[must_use]
    pub fn new(config: TesterConfig, pool: Arc<AnalyzerPool>) -> Self {
        Self { config, pool }
    }

    /// Return the configuration.
    #[must_use]
    pub fn config(&self) -> &TesterConfig {
        &self.config
    }

    /// Evaluate `candidate`, a vote over `required`, and every pool analyzer
    /// on `records`.
    ///
    /// Byte-accepting analyzers see the raw bytes. Analyzers that accept
    /// only text see the bytes decoded with the declared encoding. Only the
    /// first-ranked answer is scored; no answer scores as `None` on every
    /// track the analyzer produces.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`EvalError::NoTestData`] | `records` is empty |
    /// | [`EvalError::DuplicateAnalyzer`] | the candidate's id clashes with the vote or the pool |
    /// | [`EvalError::Analyzer`] | a required id is missing, or an analyzer fails |
    #[instrument(skip_all, fields(candidate = %candidate.id(), n_records = records.len()))]
    pub fn run(
        &self,
        candidate: Arc<dyn Analyzer>,
        required: &BTreeSet<AnalyzerId>,
        records: &[LabeledRecord],
    ) -> Result<TestReport, EvalError> {
        let name = candidate.id().to_string();
        if records.is_empty() {
            return Err(EvalError::NoTestData { name });
        }
        let ensemble = self.ensemble(candidate, required)?;
        let members = ensemble
            .iter()
            .map(|(id, analyzer)| EnsembleMember::of(id.clone(), analyzer.as_ref()))
            .collect();
        let mut report = TestReport::new(name, members);
        let mut raw = self.config.raw.then(Vec::new);

        info!(analyzers = ensemble.len(), "testing ensemble");
        for (i, record) in records.iter().enumerate() {
            let answers = run_record(&ensemble, record)?;
            for (member, answer) in report.analyzers.iter().zip(&answers) {
                report.update(member, record, answer);
            }
            if let Some(raw) = raw.as_mut() {
                raw.push(RawRecord {
                    file: record.file_name(),
                    truth: record.text_info().to_analysis(),
                    answers: ensemble
                        .iter()
                        .zip(answers)
                        .map(|((id, _), analysis)| RawAnswer {
                            analyzer: id.clone(),
                            analysis,
                        })
                        .collect(),
                });
            }
            if (i + 1) % PROGRESS_INTERVAL == 0 {
                info!(processed = i + 1, total = records.len(), "test records processed");
            }
        }

        report.records = records.len();
        report.raw = raw;
        report.compute_stats();
        info!(name = %report.name, "test run complete");
        Ok(report)
    }

    fn ensemble(
        &self,
        candidate: Arc<dyn Analyzer>,
        required: &BTreeSet<AnalyzerId>,
    ) -> Result<Vec<(String, Arc<dyn Analyzer>)>, EvalError> {
        let voting: Arc<dyn Analyzer> =
            Arc::new(VotingAnalyzer::new(required.clone(), Arc::clone(&self.pool))?);
        let mut ensemble = vec![
            (candidate.id().to_string(), candidate),
            (VOTING_ID.to_string(), voting),
        ];
        ensemble.extend(
            self.pool
                .iter()
                .map(|analyzer| (analyzer.id().to_string(), Arc::clone(analyzer))),
        );

        let mut seen = BTreeSet::new();
        for (id, _) in &ensemble {
            if !seen.insert(id.as_str()) {
                return Err(EvalError::DuplicateAnalyzer { id: id.clone() });
            }
        }
        Ok(ensemble)
    }
}

/// First answer of every ensemble member on one record, in ensemble order.
fn run_record(
    ensemble: &[(String, Arc<dyn Analyzer>)],
    record: &LabeledRecord,
) -> Result<Vec<Analysis>, EvalError> {
    let mut answers = vec![Analysis::default(); ensemble.len()];

    for (slot, (_, analyzer)) in answers.iter_mut().zip(ensemble) {
        if analyzer.accepts(InputKind::Bytes) {
            *slot = first(analyzer.analyze(Input::Bytes(record.bytes()))?);
        }
    }

    let text_only =
        |a: &Arc<dyn Analyzer>| a.accepts(InputKind::Text) && !a.accepts(InputKind::Bytes);
    if ensemble.iter().any(|(_, a)| text_only(a)) {
        match record.decode() {
            Some(text) => {
                for (slot, (_, analyzer)) in answers.iter_mut().zip(ensemble) {
                    if text_only(analyzer) {
                        *slot = first(analyzer.analyze(Input::Text(&text))?);
                    }
                }
            }
            None => debug!(
                file = %record.path().display(),
                "record does not decode, text analyzers skipped"
            ),
        }
    }
    Ok(answers)
}

fn first(results: Vec<Analysis>) -> Analysis {
    results.into_iter().next().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Arc;

    use provenance_text::{
        Analysis, Analyzer, AnalyzerId, AnalyzerPool, Attribute, Input, InputKind, IsoRegistry,
        LabeledRecord, TextError,
    };

    use super::{Tester, TesterConfig, composite_key};
    use crate::error::EvalError;
    use crate::stats::Statistic;

    /// Always answers the same encoding, language and script.
    #[derive(Debug)]
    struct Constant {
        id: AnalyzerId,
        answer: Analysis,
    }

    impl Analyzer for Constant {
        fn id(&self) -> &AnalyzerId {
            &self.id
        }

        fn accepts(&self, kind: InputKind) -> bool {
            kind == InputKind::Bytes
        }

        fn produces(&self, _attribute: Attribute) -> bool {
            true
        }

        fn analyze(&self, _input: Input<'_>) -> Result<Vec<Analysis>, TextError> {
            Ok(vec![self.answer.clone()])
        }
    }

    fn registry() -> IsoRegistry {
        IsoRegistry::builtin()
    }

    fn record(text: &str, encoding: &str) -> LabeledRecord {
        let registry = registry();
        LabeledRecord::new(
            format!("corpus/{encoding}.txt").into(),
            text.as_bytes().to_vec(),
            encoding,
            registry.language("en").unwrap().clone(),
            registry.script("Latn").unwrap().clone(),
        )
    }

    fn candidate(encoding: &str) -> Arc<dyn Analyzer> {
        let registry = registry();
        Arc::new(Constant {
            id: "candidate".parse().unwrap(),
            answer: Analysis::new()
                .with_encoding(encoding)
                .with_language(registry.language("en").unwrap().clone())
                .with_script(registry.script("Latn").unwrap().clone()),
        })
    }

    fn pool() -> Arc<AnalyzerPool> {
        Arc::new(AnalyzerPool::with_builtins(Arc::new(registry())))
    }

    #[test]
    fn composite_key_format() {
        let registry = registry();
        let key = composite_key(
            Some(" utf-8 "),
            registry.language("English"),
            registry.script("latn"),
        );
        assert_eq!(key, "utf-8:en:latn");
        assert_eq!(composite_key(None, None, None), "::");
    }

    #[test]
    fn ensemble_order_is_candidate_vote_pool() {
        let tester = Tester::new(TesterConfig::new(), pool());
        let required: BTreeSet<AnalyzerId> = ["bom".parse().unwrap()].into_iter().collect();
        let report = tester
            .run(candidate("utf-8"), &required, &[record("hello", "us-ascii")])
            .unwrap();
        let ids: Vec<&str> = report.analyzers.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["candidate", "voting", "bom", "unicode"]);
        assert!(report.raw.is_none());
        assert!(!report.encoding.contains_key("unicode"));
        assert!(report.script.contains_key("unicode"));
        assert!(!report.composite.contains_key("bom"));
    }

    #[test]
    fn lenient_track_accepts_equivalent_names() {
        let tester = Tester::new(TesterConfig::new().with_raw(true), pool());
        let records = [record("plain ascii", "us-ascii"), record("more", "us-ascii")];
        let report = tester
            .run(candidate("utf-8"), &BTreeSet::new(), &records)
            .unwrap();

        let strict = &report.encoding["candidate"];
        let lenient = &report.lenient_encoding["candidate"];
        assert_eq!(strict.correct(), 0);
        assert_eq!(lenient.correct(), 2);
        assert!((lenient.statistic(Statistic::Recall) - 1.0).abs() < 1e-10);

        assert_eq!(report.composite["candidate"].correct(), 0);
        assert_eq!(report.lenient_composite["candidate"].correct(), 2);
        assert_eq!(report.language["candidate"].correct(), 2);

        let raw = report.raw.as_ref().unwrap();
        assert_eq!(raw.len(), 2);
        assert_eq!(raw[0].file, "us-ascii.txt");
        assert_eq!(raw[0].answers[0].analyzer, "candidate");
        assert_eq!(raw[0].answers.len(), report.analyzers.len());
    }

    #[test]
    fn high_bytes_are_not_lenient() {
        let tester = Tester::new(TesterConfig::new(), pool());
        let report = tester
            .run(candidate("us-ascii"), &BTreeSet::new(), &[record("Grüße", "utf-8")])
            .unwrap();
        assert_eq!(report.lenient_encoding["candidate"].correct(), 0);
        assert_eq!(
            report.encoding["candidate"]
                .confusion_count(&Some("utf-8".into()), &Some("us-ascii".into())),
            1
        );
    }

    #[test]
    fn rejects_clashing_candidate_and_empty_input() {
        let tester = Tester::new(TesterConfig::new(), pool());
        let clash: Arc<dyn Analyzer> = Arc::new(Constant {
            id: "bom".parse().unwrap(),
            answer: Analysis::default(),
        });
        let err = tester
            .run(clash, &BTreeSet::new(), &[record("x", "utf-8")])
            .unwrap_err();
        assert!(matches!(err, EvalError::DuplicateAnalyzer { id } if id == "bom"));

        let err = tester
            .run(candidate("utf-8"), &BTreeSet::new(), &[])
            .unwrap_err();
        assert!(matches!(err, EvalError::NoTestData { .. }));
    }

    #[test]
    fn missing_required_analyzer_is_an_error() {
        let tester = Tester::new(TesterConfig::new(), pool());
        let required: BTreeSet<AnalyzerId> = ["cld2".parse().unwrap()].into_iter().collect();
        let err = tester
            .run(candidate("utf-8"), &required, &[record("x", "utf-8")])
            .unwrap_err();
        assert!(matches!(err, EvalError::Analyzer { .. }));
    }
}
