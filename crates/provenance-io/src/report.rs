//! JSON evaluation report for a test run.

use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use provenance_eval::{AnalyzerEval, RawRecord, Statistic, TestReport, Track};
use provenance_model::{current_user, modified_time};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::artifact::write_json;

/// Top-left cell of every confusion matrix.
pub const MATRIX_CORNER: &str = "actual \\ truth";

/// Who tested what, and when.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Profile under test.
    pub profile: String,
    /// Analyzer ids the profile depends on, sorted.
    pub required_analyzers: Vec<String>,
    /// When the test ran.
    pub test_date: DateTime<Utc>,
    /// Who ran it.
    pub tester: String,
    /// Index file the records came from.
    pub test_file: Option<PathBuf>,
    /// Number of test records.
    pub test_records: usize,
    /// Last modification time of the index file.
    pub test_file_updated: Option<DateTime<Utc>>,
}

impl ReportMetadata {
    /// Describe a test run happening now.
    #[must_use]
    pub fn new(
        profile: &str,
        mut required_analyzers: Vec<String>,
        test_file: Option<&Path>,
        test_records: usize,
    ) -> Self {
        required_analyzers.sort();
        Self {
            profile: profile.to_string(),
            required_analyzers,
            test_date: Utc::now(),
            tester: current_user(),
            test_file: test_file.map(Path::to_path_buf),
            test_records,
            test_file_updated: test_file.and_then(modified_time),
        }
    }
}

/// One analyzer's headline scores on a track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsRow {
    pub analyzer: String,
    /// `true` for the profile under test.
    pub candidate: bool,
    pub correct: String,
    pub precision: String,
    pub recall: String,
    pub f1: String,
}

/// Every analyzer's scores on one track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsSection {
    pub track: String,
    pub rows: Vec<StatisticsRow>,
}

/// One row of a confusion matrix: counts for one answer across every truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfusionRow {
    pub actual: String,
    pub counts: Vec<usize>,
}

/// A labeled confusion matrix. Rows are answers, columns are truths, and
/// both follow `classes`, with "no answer" (blank) first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfusionTable {
    pub title: String,
    pub label: String,
    pub classes: Vec<String>,
    pub rows: Vec<ConfusionRow>,
}

impl ConfusionTable {
    /// Lay out `eval` as a table.
    #[must_use]
    pub fn from_eval<K: Ord + Clone + Display>(title: String, eval: &AnalyzerEval<K>) -> Self {
        let classes = eval.class_values();
        let rows = classes
            .iter()
            .map(|actual| ConfusionRow {
                actual: class_label(actual),
                counts: classes
                    .iter()
                    .map(|truth| eval.confusion_count(truth, actual))
                    .collect(),
            })
            .collect();
        Self {
            title,
            label: MATRIX_CORNER.to_string(),
            classes: classes.iter().map(class_label).collect(),
            rows,
        }
    }
}

/// Confusion matrices for one attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixSheet {
    pub sheet: String,
    pub matrices: Vec<ConfusionTable>,
}

/// The whole report file.
#[derive(Debug, Serialize)]
struct ReportArtifact<'a> {
    metadata: &'a ReportMetadata,
    statistics: Vec<StatisticsSection>,
    matrices: Vec<MatrixSheet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    raw: Option<&'a [RawRecord]>,
}

fn class_label<K: Display>(value: &Option<K>) -> String {
    value
        .as_ref()
        .map(|v| v.to_string().trim().to_string())
        .unwrap_or_default()
}

fn percent(value: f64) -> String {
    format!("{:.4}%", value * 100.0)
}

fn statistics_section<K: Ord + Clone>(
    title: &str,
    report: &TestReport,
    track: &Track<K>,
) -> StatisticsSection {
    let rows = report
        .analyzers
        .iter()
        .filter_map(|member| {
            let eval = track.get(&member.id)?;
            Some(StatisticsRow {
                analyzer: member.id.clone(),
                candidate: member.id == report.name,
                correct: percent(eval.percent_correct()),
                precision: percent(eval.statistic(Statistic::Precision)),
                recall: percent(eval.statistic(Statistic::Recall)),
                f1: percent(eval.statistic(Statistic::F1Score)),
            })
        })
        .collect();
    StatisticsSection {
        track: title.to_string(),
        rows,
    }
}

fn matrix_sheet<K: Ord + Clone + Display>(
    sheet: &str,
    attribute: &str,
    report: &TestReport,
    track: &Track<K>,
) -> MatrixSheet {
    let matrices = report
        .analyzers
        .iter()
        .filter_map(|member| {
            let eval = track.get(&member.id)?;
            let title = format!("{} {attribute} Confusion Matrix", member.id);
            Some(ConfusionTable::from_eval(title, eval))
        })
        .collect();
    MatrixSheet {
        sheet: sheet.to_string(),
        matrices,
    }
}

/// Writes test reports to `{name}_report.json`.
///
/// Creates the output directory on construction if it does not exist.
#[derive(Debug)]
pub struct ReportWriter {
    output_dir: PathBuf,
}

impl ReportWriter {
    /// Create a writer targeting `output_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display()))]
    pub fn new(output_dir: &Path) -> Result<Self, IoError> {
        fs::create_dir_all(output_dir).map_err(|e| IoError::OutputDirCreate {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
        })
    }

    /// Write `report` and return the file path.
    ///
    /// Statistics come in track order (strict encoding, lenient encoding,
    /// language, script, strict composite, lenient composite), each listing
    /// the ensemble in test order. An existing report is replaced.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::Json`] | Report cannot be serialized |
    /// | [`IoError::WriteFile`] | File cannot be written |
    #[instrument(skip_all, fields(name = %report.name))]
    pub fn write(&self, report: &TestReport, metadata: &ReportMetadata) -> Result<PathBuf, IoError> {
        let path = self.output_dir.join(format!("{}_report.json", report.name));

        let statistics = vec![
            statistics_section("Strict Encoding", report, &report.encoding),
            statistics_section("Lenient Encoding", report, &report.lenient_encoding),
            statistics_section("Language", report, &report.language),
            statistics_section("Script", report, &report.script),
            statistics_section("Strict Composite", report, &report.composite),
            statistics_section("Lenient Composite", report, &report.lenient_composite),
        ];
        let matrices = vec![
            matrix_sheet("Encoding (Strict)", "Encoding", report, &report.encoding),
            matrix_sheet("Encoding (Lenient)", "Encoding", report, &report.lenient_encoding),
            matrix_sheet("Language", "Language", report, &report.language),
            matrix_sheet("Script", "Script", report, &report.script),
        ];

        let artifact = ReportArtifact {
            metadata,
            statistics,
            matrices,
            raw: report.raw.as_deref(),
        };
        write_json(&path, &artifact)?;

        info!(path = %path.display(), "report written");
        Ok(path)
    }
}
