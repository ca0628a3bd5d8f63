//! Trains a small profile over the built-in analyzers and checks what it
//! predicts.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use provenance_model::{ModelError, ProfileAnalyzer, Trainer, TrainerConfig};
use provenance_rf::ForestConfig;
use provenance_text::builtin::BomSniffer;
use provenance_text::{
    Analysis, Analyzer, AnalyzerId, AnalyzerPool, Attribute, Input, InputKind, IsoRegistry,
    LabeledRecord, TextError,
};

const ENGLISH: &[&str] = &[
    "the quick brown fox",
    "jumps over the lazy dog",
    "plain ascii sentence here",
    "another short line of text",
    "reading and writing files",
    "small words make a corpus",
    "tests need some data",
    "hello there",
];

const RUSSIAN: &[&str] = &[
    "привет мир",
    "съешь же ещё этих мягких булок",
    "да выпей чаю",
    "короткая строка текста",
    "чтение и запись файлов",
    "маленькие слова",
    "тестам нужны данные",
    "здравствуйте",
];

const GREEK: &[&str] = &[
    "γειά σου κόσμε",
    "ξεσκεπάζω την ψυχοφθόρα",
    "βδελυγμία",
    "σύντομη γραμμή κειμένου",
    "ανάγνωση και γραφή",
    "μικρές λέξεις",
    "τα τεστ χρειάζονται δεδομένα",
    "καλημέρα",
];

fn corpus(registry: &IsoRegistry) -> Vec<LabeledRecord> {
    let mut records = Vec::new();
    let groups = [
        (ENGLISH, "us-ascii", "en", "Latn"),
        (RUSSIAN, "utf-8", "ru", "Cyrl"),
        (GREEK, "utf-8", "el", "Grek"),
    ];
    for (texts, encoding, language, script) in groups {
        for (i, text) in texts.iter().enumerate() {
            records.push(LabeledRecord::new(
                format!("{language}/{i}.txt").into(),
                text.as_bytes().to_vec(),
                encoding,
                registry.language(language).unwrap().clone(),
                registry.script(script).unwrap().clone(),
            ));
        }
    }
    records
}

fn setup() -> (Arc<AnalyzerPool>, Vec<LabeledRecord>, Trainer) {
    let registry = Arc::new(IsoRegistry::builtin());
    let pool = Arc::new(AnalyzerPool::with_builtins(Arc::clone(&registry)));
    let required: BTreeSet<AnalyzerId> = pool.ids().cloned().collect();
    let config = TrainerConfig::new()
        .unwrap()
        .with_forest(ForestConfig::new(25).unwrap().with_seed(9))
        .with_keep_arff(true);
    let trainer = Trainer::new(config, Arc::clone(&pool), required).unwrap();
    (pool, corpus(&registry), trainer)
}

// ---------------------------------------------------------------------------
// Training
// ---------------------------------------------------------------------------

#[test]
fn trained_profile_identifies_training_samples() {
    let (_pool, records, trainer) = setup();
    let (profile, metadata) = trainer.train("demo", &records, None).unwrap();

    assert_eq!(metadata.name, "demo");
    assert_eq!(metadata.training_instances, 24);
    assert_eq!(metadata.required_analyzers, ["bom", "unicode"]);
    assert!(metadata.training_file.is_none());

    assert!(profile.produces(Attribute::Script));
    assert!(!profile.produces_rankings());
    assert!(!profile.produces_scores());

    let result = profile.analyze(Input::Bytes(RUSSIAN[1].as_bytes())).unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].encoding(), Some("utf-8"));
    assert_eq!(result[0].script().unwrap().code(), "Cyrl");
    assert_eq!(result[0].language().unwrap().code(), "ru");

    let result = profile.analyze(Input::Bytes(ENGLISH[0].as_bytes())).unwrap();
    assert_eq!(result[0].encoding(), Some("us-ascii"));
    assert_eq!(result[0].script().unwrap().code(), "Latn");
}

#[test]
fn text_input_is_utf8() {
    let (_pool, records, trainer) = setup();
    let (profile, _) = trainer.train("demo", &records, None).unwrap();
    let result = profile.analyze(Input::Text(GREEK[3])).unwrap();
    assert_eq!(result[0].encoding(), Some("utf-8"));
    assert_eq!(result[0].script().unwrap().code(), "Grek");
}

#[test]
fn arff_is_kept_on_request() {
    let (_pool, records, trainer) = setup();
    let (profile, _) = trainer.train("demo", &records, None).unwrap();
    let arff = profile.language_forest().to_arff("language").unwrap();
    assert!(arff.starts_with("@relation language"));
    assert!(arff.contains("@attribute o_lang {UNK,en,ru,el}"));
    assert_eq!(arff.lines().skip_while(|l| *l != "@data").count(), 25);
}

#[test]
fn empty_corpus_is_rejected() {
    let (_pool, _records, trainer) = setup();
    let err = trainer.train("demo", &[], None).unwrap_err();
    assert!(matches!(err, ModelError::NoTrainingData { .. }));
}

#[test]
fn trainer_requires_known_analyzers() {
    let pool = Arc::new(AnalyzerPool::new());
    let required: BTreeSet<AnalyzerId> = ["bom".parse().unwrap()].into_iter().collect();
    let err = Trainer::new(TrainerConfig::new().unwrap(), pool, required).unwrap_err();
    assert!(matches!(
        err,
        ModelError::Analyzer {
            source: TextError::MissingAnalyzer { .. }
        }
    ));
    let err = Trainer::new(
        TrainerConfig::new().unwrap(),
        Arc::new(AnalyzerPool::new()),
        BTreeSet::new(),
    )
    .unwrap_err();
    assert!(matches!(err, ModelError::NoRequiredAnalyzers));
}

/// Language analyzer that remembers every text it was given.
struct TextLog {
    id: AnalyzerId,
    seen: Mutex<Vec<String>>,
}

impl Analyzer for TextLog {
    fn id(&self) -> &AnalyzerId {
        &self.id
    }

    fn accepts(&self, kind: InputKind) -> bool {
        kind == InputKind::Text
    }

    fn produces(&self, attribute: Attribute) -> bool {
        attribute == Attribute::Language
    }

    fn analyze(&self, input: Input<'_>) -> Result<Vec<Analysis>, TextError> {
        if let Input::Text(text) = input {
            self.seen.lock().unwrap().push(text.to_string());
        }
        Ok(Vec::new())
    }
}

#[test]
fn whitespace_text_reaches_text_analyzers() {
    let registry = IsoRegistry::builtin();
    let log = Arc::new(TextLog {
        id: "textlog".parse().unwrap(),
        seen: Mutex::new(Vec::new()),
    });
    let mut pool = AnalyzerPool::new();
    pool.register(Arc::new(BomSniffer::new())).unwrap();
    pool.register(Arc::clone(&log) as Arc<dyn Analyzer>).unwrap();
    let pool = Arc::new(pool);
    let required: BTreeSet<AnalyzerId> = pool.ids().cloned().collect();
    let config = TrainerConfig::new()
        .unwrap()
        .with_forest(ForestConfig::new(5).unwrap().with_seed(1));
    let trainer = Trainer::new(config, pool, required).unwrap();

    let mut records = corpus(&registry);
    records.push(LabeledRecord::new(
        "en/blank.txt".into(),
        b"   ".to_vec(),
        "us-ascii",
        registry.language("en").unwrap().clone(),
        registry.script("Latn").unwrap().clone(),
    ));
    trainer.train("blank", &records, None).unwrap();

    let seen = log.seen.lock().unwrap();
    assert!(seen.iter().any(|text| text == "   "));
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[test]
fn serialized_profile_must_be_rebound() {
    let (pool, records, trainer) = setup();
    let (profile, _) = trainer.train("demo", &records, None).unwrap();
    let expected = profile.analyze(Input::Bytes(GREEK[0].as_bytes())).unwrap();

    let bytes = bincode::serialize(&profile).unwrap();
    let mut restored: ProfileAnalyzer = bincode::deserialize(&bytes).unwrap();
    assert!(!restored.is_bound());
    assert!(!restored.language_forest().has_training_matrix());
    let err = restored.analyze(Input::Bytes(b"x")).unwrap_err();
    assert!(matches!(err, TextError::AnalysisFailed { .. }));

    restored.bind(pool).unwrap();
    let actual = restored.analyze(Input::Bytes(GREEK[0].as_bytes())).unwrap();
    assert_eq!(actual, expected);
}
