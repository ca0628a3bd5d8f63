use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{error, info, warn};

use provenance_eval::{TestReport, Tester, TesterConfig, Track};
use provenance_io::{InputParser, IoError, ProfileArtifact, ReportMetadata, ReportWriter};
use provenance_model::{DEFAULT_TREES, ProfileAnalyzer, Trainer, TrainerConfig};
use provenance_rf::ForestConfig;
use provenance_text::{
    Analyzer, AnalyzerId, AnalyzerPool, Attribute, InputKind, IsoRegistry, LabeledRecord,
};

#[derive(Parser)]
#[command(name = "provenance")]
#[command(about = "Train and evaluate encoding, language and script classifier profiles")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// RNG seed for reproducibility
    #[arg(long, default_value_t = 42, global = true)]
    seed: u64,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for parallel computation (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

#[derive(Subcommand)]
enum Command {
    /// Train a profile from a labeled corpus index
    Train {
        /// Profile name, also the artifact directory name
        #[arg(long)]
        name: String,

        /// Corpus index CSV: path,encoding,language,script
        #[arg(long)]
        train: PathBuf,

        /// Comma-separated analyzer ids to train on (defaults to the whole pool)
        #[arg(long, value_delimiter = ',')]
        analyzers: Option<Vec<String>>,

        /// Directory receiving the profile artifact and any report
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        /// Also write the training matrices as ARFF files
        #[arg(long, default_value_t = false)]
        arff: bool,

        /// Corpus index to test the new profile on
        #[arg(long)]
        test: Option<PathBuf>,

        /// Include every analyzer's answer per record in the report
        #[arg(long, default_value_t = false)]
        raw: bool,

        /// Number of trees per attribute forest
        #[arg(long, default_value_t = DEFAULT_TREES)]
        trees: usize,
    },

    /// Test a trained profile against the vote and the analyzer pool
    Test {
        /// Profile name
        #[arg(long)]
        name: String,

        /// Profile artifact directory (defaults to <output-dir>/<name>)
        #[arg(long)]
        profile: Option<PathBuf>,

        /// Corpus index CSV: path,encoding,language,script
        #[arg(long)]
        test: PathBuf,

        /// Include every analyzer's answer per record in the report
        #[arg(long, default_value_t = false)]
        raw: bool,

        /// Directory receiving the report
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// List the available analyzers
    Analyzers,
}

// --- Exit codes ---

/// Why the process stopped early; each maps to a negative exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExitReason {
    FatalError,
    NoProfile,
    NoTraining,
    NoAnalyzers,
    MissingAnalyzer,
}

impl ExitReason {
    fn code(self) -> i32 {
        match self {
            ExitReason::FatalError => -1,
            ExitReason::NoProfile => -2,
            ExitReason::NoTraining => -3,
            ExitReason::NoAnalyzers => -4,
            ExitReason::MissingAnalyzer => -5,
        }
    }
}

#[derive(Debug)]
struct Failure {
    reason: ExitReason,
    error: anyhow::Error,
}

impl Failure {
    fn new(reason: ExitReason, error: anyhow::Error) -> Self {
        Self { reason, error }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#}", self.error)
    }
}

impl From<anyhow::Error> for Failure {
    fn from(error: anyhow::Error) -> Self {
        Self::new(ExitReason::FatalError, error)
    }
}

type Result<T> = std::result::Result<T, Failure>;

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct TrainOutput {
    profile: String,
    artifact: PathBuf,
    training_records: usize,
    required_analyzers: Vec<String>,
    test: Option<TestOutput>,
}

#[derive(Serialize)]
struct TestOutput {
    profile: String,
    report: PathBuf,
    test_records: usize,
    analyzers: Vec<AnalyzerScores>,
}

/// Fraction correct per track; absent where the analyzer does not answer.
#[derive(Serialize)]
struct AnalyzerScores {
    analyzer: String,
    strict_encoding: Option<f64>,
    lenient_encoding: Option<f64>,
    language: Option<f64>,
    script: Option<f64>,
    strict_composite: Option<f64>,
    lenient_composite: Option<f64>,
}

#[derive(Serialize)]
struct AnalyzerOutput {
    id: String,
    accepts: Vec<&'static str>,
    produces: Vec<&'static str>,
    rankings: bool,
    scores: bool,
}

fn percent_correct<K: Ord + Clone>(track: &Track<K>, id: &str) -> Option<f64> {
    track.get(id).map(|eval| eval.percent_correct())
}

fn scores(report: &TestReport) -> Vec<AnalyzerScores> {
    report
        .analyzers
        .iter()
        .map(|member| {
            let id = member.id.as_str();
            AnalyzerScores {
                analyzer: member.id.clone(),
                strict_encoding: percent_correct(&report.encoding, id),
                lenient_encoding: percent_correct(&report.lenient_encoding, id),
                language: percent_correct(&report.language, id),
                script: percent_correct(&report.script, id),
                strict_composite: percent_correct(&report.composite, id),
                lenient_composite: percent_correct(&report.lenient_composite, id),
            }
        })
        .collect()
}

fn print_json<T: Serialize>(output: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(output).context("failed to serialize output")?;
    println!("{json}");
    Ok(())
}

// --- Commands ---

fn require_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Failure::new(
            ExitReason::NoProfile,
            anyhow!("no profile name specified"),
        ));
    }
    Ok(name)
}

fn load_records(
    registry: &Arc<IsoRegistry>,
    index: &Path,
    what: &str,
) -> Result<Vec<LabeledRecord>> {
    if !index.is_file() {
        return Err(Failure::new(
            ExitReason::NoTraining,
            anyhow!("could not find {what} input file: {}", index.display()),
        ));
    }
    let records = InputParser::new(Arc::clone(registry))
        .parse(index)
        .with_context(|| format!("failed to read {what} index {}", index.display()))?;
    if records.is_empty() {
        return Err(Failure::new(
            ExitReason::NoTraining,
            anyhow!("no usable {what} records in {}", index.display()),
        ));
    }
    Ok(records)
}

fn resolve_analyzers(
    pool: &AnalyzerPool,
    requested: Option<Vec<String>>,
) -> Result<BTreeSet<AnalyzerId>> {
    if pool.is_empty() {
        return Err(Failure::new(
            ExitReason::NoAnalyzers,
            anyhow!("no core analyzers are available"),
        ));
    }
    let Some(requested) = requested else {
        return Ok(pool.ids().cloned().collect());
    };
    let mut required = BTreeSet::new();
    for raw in requested.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        let id: AnalyzerId = raw
            .parse()
            .with_context(|| format!("invalid analyzer id: {raw}"))?;
        if !pool.contains(&id) {
            return Err(Failure::new(
                ExitReason::MissingAnalyzer,
                anyhow!("required core analyzer not available: {id}"),
            ));
        }
        required.insert(id);
    }
    if required.is_empty() {
        return Err(Failure::new(
            ExitReason::NoAnalyzers,
            anyhow!("no analyzers requested"),
        ));
    }
    Ok(required)
}

#[allow(clippy::too_many_arguments)]
fn train(
    cli: &Cli,
    registry: &Arc<IsoRegistry>,
    pool: &Arc<AnalyzerPool>,
    name: &str,
    train_index: &Path,
    analyzers: Option<Vec<String>>,
    output_dir: &Path,
    arff: bool,
    test_index: Option<&Path>,
    raw: bool,
    trees: usize,
) -> Result<TrainOutput> {
    let name = require_name(name)?;
    let required = resolve_analyzers(pool, analyzers)?;
    let test_index = test_index.filter(|index| {
        let found = index.is_file();
        if !found {
            warn!(path = %index.display(), "could not find testing input file");
        }
        found
    });
    let records = load_records(registry, train_index, "training")?;

    let forest = ForestConfig::new(trees)
        .context("invalid forest configuration")?
        .with_seed(cli.seed);
    let config = TrainerConfig::new()
        .context("invalid trainer configuration")?
        .with_forest(forest)
        .with_keep_arff(arff);
    let trainer =
        Trainer::new(config, Arc::clone(pool), required).context("failed to set up trainer")?;
    let (profile, metadata) = trainer
        .train(name, &records, Some(train_index))
        .context("training failed")?;

    let artifact = ProfileArtifact::new(profile, metadata);
    let artifact_dir = artifact
        .write(output_dir)
        .context("failed to write profile artifact")?;
    info!(path = %artifact_dir.display(), "profile saved");

    let ProfileArtifact { analyzer, metadata } = artifact;
    let test = match test_index {
        Some(index) => Some(test(registry, pool, analyzer, index, raw, output_dir)?),
        None => None,
    };

    Ok(TrainOutput {
        profile: metadata.name,
        artifact: artifact_dir,
        training_records: metadata.training_instances,
        required_analyzers: metadata.required_analyzers,
        test,
    })
}

fn load_profile(pool: &Arc<AnalyzerPool>, name: &str, dir: &Path) -> Result<ProfileAnalyzer> {
    match ProfileArtifact::load(dir, Arc::clone(pool)) {
        Ok(artifact) => {
            if artifact.metadata.name != name {
                warn!(
                    requested = name,
                    found = %artifact.metadata.name,
                    "profile name differs from the artifact"
                );
            }
            Ok(artifact.analyzer)
        }
        Err(e @ IoError::FileNotFound { .. }) => Err(Failure::new(
            ExitReason::NoProfile,
            anyhow::Error::new(e).context(format!("profile {name} is not available")),
        )),
        Err(e @ IoError::MissingAnalyzer { .. }) => Err(Failure::new(
            ExitReason::MissingAnalyzer,
            anyhow::Error::new(e).context(format!("cannot run profile {name}")),
        )),
        Err(e) => Err(anyhow::Error::new(e)
            .context(format!("failed to load profile {name}"))
            .into()),
    }
}

fn test(
    registry: &Arc<IsoRegistry>,
    pool: &Arc<AnalyzerPool>,
    profile: ProfileAnalyzer,
    test_index: &Path,
    raw: bool,
    output_dir: &Path,
) -> Result<TestOutput> {
    let records = load_records(registry, test_index, "testing")?;
    let required = profile.required().clone();
    let candidate: Arc<dyn Analyzer> = Arc::new(profile);

    let report = Tester::new(TesterConfig::new().with_raw(raw), Arc::clone(pool))
        .run(candidate, &required, &records)
        .context("test run failed")?;

    let metadata = ReportMetadata::new(
        &report.name,
        required.iter().map(ToString::to_string).collect(),
        Some(test_index),
        records.len(),
    );
    let path = ReportWriter::new(output_dir)
        .and_then(|writer| writer.write(&report, &metadata))
        .context("failed to write report")?;

    Ok(TestOutput {
        profile: report.name.clone(),
        report: path,
        test_records: report.records,
        analyzers: scores(&report),
    })
}

fn list_analyzers(pool: &AnalyzerPool) -> Vec<AnalyzerOutput> {
    pool.iter()
        .map(|analyzer| {
            let accepts = [(InputKind::Bytes, "bytes"), (InputKind::Text, "text")]
                .into_iter()
                .filter(|&(kind, _)| analyzer.accepts(kind))
                .map(|(_, label)| label)
                .collect();
            let produces = Attribute::ALL
                .into_iter()
                .filter(|&attribute| analyzer.produces(attribute))
                .map(Attribute::as_str)
                .collect();
            AnalyzerOutput {
                id: analyzer.id().to_string(),
                accepts,
                produces,
                rankings: analyzer.produces_rankings(),
                scores: analyzer.produces_scores(),
            }
        })
        .collect()
}

fn run(cli: Cli) -> Result<()> {
    // Configure Rayon thread pool
    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    let registry = Arc::new(IsoRegistry::builtin());
    let pool = Arc::new(AnalyzerPool::with_builtins(Arc::clone(&registry)));

    match &cli.command {
        Command::Train {
            name,
            train: train_index,
            analyzers,
            output_dir,
            arff,
            test: test_index,
            raw,
            trees,
        } => {
            let output = train(
                &cli,
                &registry,
                &pool,
                name,
                train_index,
                analyzers.clone(),
                output_dir,
                *arff,
                test_index.as_deref(),
                *raw,
                *trees,
            )?;
            print_json(&output)
        }

        Command::Test {
            name,
            profile,
            test: test_index,
            raw,
            output_dir,
        } => {
            let name = require_name(name)?;
            let dir = profile.clone().unwrap_or_else(|| output_dir.join(name));
            let analyzer = load_profile(&pool, name, &dir)?;
            let output = test(&registry, &pool, analyzer, test_index, *raw, output_dir)?;
            print_json(&output)
        }

        Command::Analyzers => print_json(&list_analyzers(&pool)),
    }
}

fn main() {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(failure) = run(cli) {
        let code = failure.reason.code();
        error!(code, reason = ?failure.reason, "exiting on error: {failure}");
        std::process::exit(code);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use clap::Parser;
    use provenance_text::{AnalyzerPool, IsoRegistry};

    use super::{Cli, Command, ExitReason, list_analyzers, resolve_analyzers};

    fn pool() -> AnalyzerPool {
        AnalyzerPool::with_builtins(Arc::new(IsoRegistry::builtin()))
    }

    #[test]
    fn exit_codes_are_negative_and_distinct() {
        let reasons = [
            ExitReason::FatalError,
            ExitReason::NoProfile,
            ExitReason::NoTraining,
            ExitReason::NoAnalyzers,
            ExitReason::MissingAnalyzer,
        ];
        let codes: Vec<i32> = reasons.iter().map(|r| r.code()).collect();
        assert_eq!(codes, [-1, -2, -3, -4, -5]);
    }

    #[test]
    fn analyzers_default_to_the_pool() {
        let required = resolve_analyzers(&pool(), None).unwrap();
        let ids: Vec<String> = required.iter().map(ToString::to_string).collect();
        assert_eq!(ids, ["bom", "unicode"]);
    }

    #[test]
    fn unknown_analyzer_is_missing() {
        let err = resolve_analyzers(&pool(), Some(vec!["bom".into(), "cld2".into()])).unwrap_err();
        assert_eq!(err.reason, ExitReason::MissingAnalyzer);
        let err = resolve_analyzers(&AnalyzerPool::new(), None).unwrap_err();
        assert_eq!(err.reason, ExitReason::NoAnalyzers);
    }

    #[test]
    fn train_arguments_parse() {
        let cli = Cli::try_parse_from([
            "provenance",
            "train",
            "--name",
            "demo",
            "--train",
            "index.csv",
            "--analyzers",
            "bom,unicode",
            "--trees",
            "10",
            "--seed",
            "7",
        ])
        .unwrap();
        assert_eq!(cli.seed, 7);
        let Command::Train {
            analyzers, trees, ..
        } = cli.command
        else {
            panic!("expected train");
        };
        assert_eq!(analyzers.unwrap(), ["bom", "unicode"]);
        assert_eq!(trees, 10);
    }

    #[test]
    fn pool_listing_reports_capabilities() {
        let listing = list_analyzers(&pool());
        assert_eq!(listing.len(), 2);
        assert_eq!(listing[0].id, "bom");
        assert_eq!(listing[0].accepts, ["bytes"]);
        assert_eq!(listing[0].produces, ["encoding"]);
        assert_eq!(listing[1].accepts, ["text"]);
        assert_eq!(listing[1].produces, ["script"]);
    }
}
