//! End-to-end behavior of the pool, the built-in analyzers and the vote.

use std::collections::BTreeSet;
use std::sync::Arc;

use provenance_text::encoding::{decode, lenient_equivalent};
use provenance_text::{
    Analysis, Analyzer, AnalyzerId, AnalyzerPool, Attribute, Input, IsoRegistry, LabeledRecord,
    VotingAnalyzer,
};

fn registry() -> Arc<IsoRegistry> {
    Arc::new(IsoRegistry::builtin())
}

fn record(bytes: &[u8], encoding: &str, language: &str, script: &str) -> LabeledRecord {
    let registry = registry();
    LabeledRecord::new(
        "corpus/sample.txt".into(),
        bytes.to_vec(),
        encoding,
        registry.language(language).unwrap().clone(),
        registry.script(script).unwrap().clone(),
    )
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[test]
fn record_exposes_ground_truth() {
    let rec = record("Grüße".as_bytes(), " UTF-8 ", "German", "latn");
    assert_eq!(rec.encoding(), "utf-8");
    assert_eq!(rec.file_name(), "sample.txt");
    assert_eq!(rec.decode().as_deref(), Some("Grüße"));
    let info = rec.text_info();
    assert_eq!(info.size, Some(7));
    assert_eq!(info.language.unwrap().code(), "de");
    assert_eq!(info.script.unwrap().code(), "Latn");
}

#[test]
fn record_with_wrong_declared_encoding_does_not_decode() {
    let rec = record(&[0x47, 0xFC], "utf-8", "de", "Latn");
    assert!(rec.decode().is_none());
    assert_eq!(decode(rec.bytes(), "windows-1252").as_deref(), Some("Gü"));
}

// ---------------------------------------------------------------------------
// Ensemble
// ---------------------------------------------------------------------------

#[test]
fn builtin_vote_over_utf8_bytes() {
    let pool = Arc::new(AnalyzerPool::with_builtins(registry()));
    let voter = VotingAnalyzer::new(BTreeSet::new(), Arc::clone(&pool)).unwrap();
    assert!(voter.produces(Attribute::Language));
    assert!(!voter.produces_rankings());

    let bytes = "Ελληνικά κείμενα".as_bytes();
    let result = &voter.analyze(Input::Bytes(bytes)).unwrap()[0];
    assert_eq!(result.encoding(), Some("utf-8"));
    assert_eq!(result.script().unwrap().code(), "Grek");
    assert!(lenient_equivalent(bytes, "UTF8", result.encoding()));
}

#[test]
fn voting_ignores_analyzers_outside_required_set() {
    let pool = Arc::new(AnalyzerPool::with_builtins(registry()));
    let required: BTreeSet<AnalyzerId> = ["bom".parse().unwrap()].into_iter().collect();
    let voter = VotingAnalyzer::new(required, pool).unwrap();
    let result = &voter.analyze(Input::Bytes(b"plain ascii")).unwrap()[0];
    assert_eq!(result.encoding(), Some("us-ascii"));
    assert!(result.script().is_none());
}

#[test]
fn analysis_serializes_with_codes() {
    let registry = registry();
    let analysis = Analysis::new()
        .with_encoding("KOI8-R")
        .with_language(registry.language("ru").unwrap().clone())
        .with_score(0.5);
    let json = serde_json::to_value(&analysis).unwrap();
    assert_eq!(json["encoding"], "koi8-r");
    assert_eq!(json["language"]["code"], "ru");
    assert_eq!(json["score"], 0.5);
}
