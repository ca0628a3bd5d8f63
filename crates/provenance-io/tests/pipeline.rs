//! End-to-end: index -> train -> artifact -> load -> test -> JSON report.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use provenance_eval::{Tester, TesterConfig};
use provenance_io::{
    FORMAT_VERSION, InputParser, IoError, ProfileArtifact, ReportMetadata, ReportWriter,
};
use provenance_model::{Trainer, TrainerConfig};
use provenance_rf::ForestConfig;
use provenance_text::{Analyzer, AnalyzerId, AnalyzerPool, IsoRegistry};
use tempfile::TempDir;

const SAMPLES: &[(&str, &str, &str, &str)] = &[
    ("the quick brown fox", "us-ascii", "English", "Latn"),
    ("jumps over the lazy dog", "us-ascii", "English", "Latn"),
    ("plain ascii sentence", "us-ascii", "English", "Latn"),
    ("привет мир", "utf-8", "Russian", "Cyrl"),
    ("да выпей чаю", "utf-8", "Russian", "Cyrl"),
    ("короткая строка", "utf-8", "Russian", "Cyrl"),
    ("γειά σου κόσμε", "utf-8", "Greek", "Grek"),
    ("μικρές λέξεις", "utf-8", "Greek", "Grek"),
    ("καλημέρα", "utf-8", "Greek", "Grek"),
];

/// Write the samples under `root/data` and return the index path.
fn write_corpus(root: &Path) -> PathBuf {
    fs::create_dir(root.join("data")).unwrap();
    let mut index = String::from("file,encoding,language,script\n");
    for (i, (text, encoding, language, script)) in SAMPLES.iter().enumerate() {
        fs::write(root.join(format!("data/{i}.txt")), text).unwrap();
        index.push_str(&format!("data/{i}.txt,{encoding},{language},{script}\n"));
    }
    // skipped: unknown script
    index.push_str("data/0.txt,us-ascii,English,Xxxx\n");
    let path = root.join("index.csv");
    fs::write(&path, index).unwrap();
    path
}

fn pool() -> (Arc<IsoRegistry>, Arc<AnalyzerPool>) {
    let registry = Arc::new(IsoRegistry::builtin());
    let pool = Arc::new(AnalyzerPool::with_builtins(Arc::clone(&registry)));
    (registry, pool)
}

fn train(dir: &Path, keep_arff: bool) -> (PathBuf, PathBuf) {
    let (registry, pool) = pool();
    let index = write_corpus(dir);
    let records = InputParser::new(registry).parse(&index).unwrap();
    assert_eq!(records.len(), SAMPLES.len());

    let required: BTreeSet<AnalyzerId> = pool.ids().cloned().collect();
    let config = TrainerConfig::new()
        .unwrap()
        .with_forest(ForestConfig::new(15).unwrap().with_seed(11))
        .with_keep_arff(keep_arff);
    let trainer = Trainer::new(config, pool, required).unwrap();
    let (profile, metadata) = trainer.train("pipeline", &records, Some(&index)).unwrap();
    let artifact_dir = ProfileArtifact::new(profile, metadata)
        .write(&dir.join("profiles"))
        .unwrap();
    (artifact_dir, index)
}

// ---------------------------------------------------------------------------
// Artifact
// ---------------------------------------------------------------------------

#[test]
fn artifact_round_trip() {
    let dir = TempDir::new().unwrap();
    let (artifact_dir, index) = train(dir.path(), true);

    assert!(artifact_dir.ends_with("profiles/pipeline"));
    for file in ["manifest.json", "profile.json", "model.bin", "encoding.arff", "script.arff"] {
        assert!(artifact_dir.join(file).is_file(), "{file}");
    }
    let manifest: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(artifact_dir.join("manifest.json")).unwrap())
            .unwrap();
    assert_eq!(manifest["format_version"], FORMAT_VERSION);
    assert_eq!(manifest["name"], "pipeline");

    let (_, pool) = pool();
    let loaded = ProfileArtifact::load(&artifact_dir, pool).unwrap();
    assert!(loaded.analyzer.is_bound());
    assert_eq!(loaded.metadata.training_instances, SAMPLES.len());
    assert_eq!(loaded.metadata.training_file.as_deref(), Some(index.as_path()));
    assert!(loaded.metadata.training_file_updated.is_some());
    assert_eq!(loaded.analyzer.id().to_string(), "pipeline");
}

#[test]
fn arff_is_optional() {
    let dir = TempDir::new().unwrap();
    let (artifact_dir, _) = train(dir.path(), false);
    assert!(artifact_dir.join("model.bin").is_file());
    assert!(!artifact_dir.join("language.arff").exists());
}

#[test]
fn load_requires_the_training_analyzers() {
    let dir = TempDir::new().unwrap();
    let (artifact_dir, _) = train(dir.path(), false);
    let err = ProfileArtifact::load(&artifact_dir, Arc::new(AnalyzerPool::new())).unwrap_err();
    assert!(matches!(err, IoError::MissingAnalyzer { id } if id == "bom"));
}

#[test]
fn load_rejects_other_format_versions() {
    let dir = TempDir::new().unwrap();
    let (artifact_dir, _) = train(dir.path(), false);
    let manifest_path = artifact_dir.join("manifest.json");
    let manifest = fs::read_to_string(&manifest_path)
        .unwrap()
        .replace(&format!("\"format_version\": {FORMAT_VERSION}"), "\"format_version\": 42");
    fs::write(&manifest_path, manifest).unwrap();

    let (_, pool) = pool();
    let err = ProfileArtifact::load(&artifact_dir, pool).unwrap_err();
    assert!(matches!(err, IoError::IncompatibleVersion { found: 42, .. }));
}

#[test]
fn missing_artifact_is_file_not_found() {
    let dir = TempDir::new().unwrap();
    let (_, pool) = pool();
    let err = ProfileArtifact::load(&dir.path().join("nothing"), pool).unwrap_err();
    assert!(matches!(err, IoError::FileNotFound { .. }));
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[test]
fn test_run_writes_report() {
    let dir = TempDir::new().unwrap();
    let (artifact_dir, index) = train(dir.path(), false);
    let (registry, pool) = pool();
    let loaded = ProfileArtifact::load(&artifact_dir, Arc::clone(&pool)).unwrap();
    let records = InputParser::new(registry).parse(&index).unwrap();

    let required = loaded.analyzer.required().clone();
    let candidate: Arc<dyn Analyzer> = Arc::new(loaded.analyzer);
    let report = Tester::new(TesterConfig::new().with_raw(true), pool)
        .run(candidate, &required, &records)
        .unwrap();

    let metadata = ReportMetadata::new(
        &report.name,
        required.iter().map(ToString::to_string).collect(),
        Some(&index),
        records.len(),
    );
    let writer = ReportWriter::new(&dir.path().join("reports")).unwrap();
    let path = writer.write(&report, &metadata).unwrap();
    assert!(path.ends_with("reports/pipeline_report.json"));

    let content: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(content["metadata"]["profile"], "pipeline");
    assert_eq!(content["metadata"]["test_records"], SAMPLES.len());
    assert_eq!(content["metadata"]["required_analyzers"][0], "bom");

    let statistics = content["statistics"].as_array().unwrap();
    let tracks: Vec<&str> = statistics
        .iter()
        .map(|s| s["track"].as_str().unwrap())
        .collect();
    assert_eq!(
        tracks,
        [
            "Strict Encoding",
            "Lenient Encoding",
            "Language",
            "Script",
            "Strict Composite",
            "Lenient Composite"
        ]
    );
    let strict = statistics[0]["rows"].as_array().unwrap();
    let analyzers: Vec<&str> = strict
        .iter()
        .map(|r| r["analyzer"].as_str().unwrap())
        .collect();
    assert_eq!(analyzers, ["pipeline", "voting", "bom"]);
    assert_eq!(strict[0]["candidate"], true);
    assert_eq!(strict[2]["correct"], "100.0000%");

    let sheets = content["matrices"].as_array().unwrap();
    assert_eq!(sheets.len(), 4);
    let script_tables = sheets[3]["matrices"].as_array().unwrap();
    assert_eq!(script_tables.len(), 3);
    assert_eq!(script_tables[2]["title"], "unicode Script Confusion Matrix");

    let raw = content["raw"].as_array().unwrap();
    assert_eq!(raw.len(), SAMPLES.len());
    assert_eq!(raw[0]["answers"].as_array().unwrap().len(), 4);
}
