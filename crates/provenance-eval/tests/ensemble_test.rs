//! Trains a profile on a three-language corpus and scores it against the
//! vote and the built-in analyzers.

use std::collections::BTreeSet;
use std::sync::Arc;

use provenance_eval::{Statistic, TestReport, Tester, TesterConfig, VOTING_ID};
use provenance_model::{Trainer, TrainerConfig};
use provenance_rf::ForestConfig;
use provenance_text::{Analyzer, AnalyzerId, AnalyzerPool, IsoRegistry, LabeledRecord};

const SAMPLES: &[(&str, &str, &str, &str)] = &[
    ("the quick brown fox", "us-ascii", "en", "Latn"),
    ("jumps over the lazy dog", "us-ascii", "en", "Latn"),
    ("plain ascii sentence here", "us-ascii", "en", "Latn"),
    ("another short line of text", "us-ascii", "en", "Latn"),
    ("reading and writing files", "us-ascii", "en", "Latn"),
    ("привет мир", "utf-8", "ru", "Cyrl"),
    ("съешь же ещё этих мягких булок", "utf-8", "ru", "Cyrl"),
    ("да выпей чаю", "utf-8", "ru", "Cyrl"),
    ("короткая строка текста", "utf-8", "ru", "Cyrl"),
    ("чтение и запись файлов", "utf-8", "ru", "Cyrl"),
    ("γειά σου κόσμε", "utf-8", "el", "Grek"),
    ("ξεσκεπάζω την ψυχοφθόρα", "utf-8", "el", "Grek"),
    ("σύντομη γραμμή κειμένου", "utf-8", "el", "Grek"),
    ("ανάγνωση και γραφή", "utf-8", "el", "Grek"),
    ("μικρές λέξεις", "utf-8", "el", "Grek"),
];

fn records(registry: &IsoRegistry) -> Vec<LabeledRecord> {
    SAMPLES
        .iter()
        .enumerate()
        .map(|(i, &(text, encoding, language, script))| {
            LabeledRecord::new(
                format!("{language}/{i}.txt").into(),
                text.as_bytes().to_vec(),
                encoding,
                registry.language(language).unwrap().clone(),
                registry.script(script).unwrap().clone(),
            )
        })
        .collect()
}

fn run(raw: bool) -> TestReport {
    let registry = Arc::new(IsoRegistry::builtin());
    let pool = Arc::new(AnalyzerPool::with_builtins(Arc::clone(&registry)));
    let required: BTreeSet<AnalyzerId> = pool.ids().cloned().collect();
    let config = TrainerConfig::new()
        .unwrap()
        .with_forest(ForestConfig::new(25).unwrap().with_seed(3));
    let trainer = Trainer::new(config, Arc::clone(&pool), required.clone()).unwrap();
    let records = records(&registry);
    let (profile, _) = trainer.train("demo", &records, None).unwrap();

    let candidate: Arc<dyn Analyzer> = Arc::new(profile);
    Tester::new(TesterConfig::new().with_raw(raw), pool)
        .run(candidate, &required, &records)
        .unwrap()
}

// ---------------------------------------------------------------------------
// Ensemble layout
// ---------------------------------------------------------------------------

#[test]
fn every_track_holds_its_producers() {
    let report = run(false);
    assert_eq!(report.name, "demo");
    assert_eq!(report.records, SAMPLES.len());

    let ids: Vec<&str> = report.analyzers.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, ["demo", VOTING_ID, "bom", "unicode"]);

    let encoding: Vec<&String> = report.encoding.keys().collect();
    assert_eq!(encoding, ["bom", "demo", "voting"]);
    let script: Vec<&String> = report.script.keys().collect();
    assert_eq!(script, ["demo", "unicode", "voting"]);
    assert_eq!(report.composite.len(), 2);
    assert_eq!(report.lenient_composite.len(), 2);
}

// ---------------------------------------------------------------------------
// Scores
// ---------------------------------------------------------------------------

#[test]
fn deterministic_analyzers_score_exactly() {
    let report = run(false);
    let n = SAMPLES.len();

    // Sniffer answers us-ascii for ASCII and utf-8 for valid non-ASCII UTF-8
    assert_eq!(report.encoding["bom"].correct(), n);
    assert_eq!(report.script["unicode"].correct(), n);

    // Nothing in the pool produces a language, so the vote never answers one
    let voting_language = &report.language[VOTING_ID];
    assert_eq!(voting_language.correct(), 0);
    for truth in voting_language.truth_values() {
        assert_eq!(voting_language.confusion_count(&truth, &None), 5);
    }
    assert_eq!(report.composite[VOTING_ID].correct(), 0);
}

#[test]
fn trained_profile_learns_its_training_set() {
    let report = run(false);
    let script = &report.script["demo"];
    assert!(script.percent_correct() > 0.9);
    assert!(report.language["demo"].statistic(Statistic::F1Score) > 0.8);

    let strict = report.encoding["demo"].correct();
    let lenient = report.lenient_encoding["demo"].correct();
    assert!(lenient >= strict);
    assert!(report.lenient_composite["demo"].correct() >= report.composite["demo"].correct());
}

#[test]
fn statistics_respect_count_invariants() {
    let report = run(false);
    for eval in report.encoding.values().chain(report.lenient_encoding.values()) {
        assert_eq!(eval.tests(), SAMPLES.len());
        let by_truth: usize = eval.truth_values().iter().map(|t| eval.tests_for(t)).sum();
        assert_eq!(by_truth, eval.tests());
        for stat in Statistic::ALL.into_iter().filter(|s| s.is_unit_interval()) {
            let v = eval.statistic(stat);
            assert!((0.0..=1.0).contains(&v), "{stat} = {v}");
        }
    }
}

#[test]
fn raw_answers_follow_ensemble_order() {
    let report = run(true);
    let raw = report.raw.as_ref().unwrap();
    assert_eq!(raw.len(), SAMPLES.len());
    let first = &raw[0];
    assert_eq!(first.file, "0.txt");
    assert_eq!(first.truth.encoding(), Some("us-ascii"));
    let order: Vec<&str> = first.answers.iter().map(|a| a.analyzer.as_str()).collect();
    assert_eq!(order, ["demo", "voting", "bom", "unicode"]);
    assert_eq!(first.answers[2].analysis.encoding(), Some("us-ascii"));
    assert!(first.answers[3].analysis.encoding().is_none());
}
