//! Labeled corpus index reader.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use provenance_text::encoding::decode;
use provenance_text::{IsoRegistry, LabeledRecord};
use tracing::{error, info, instrument};

use crate::IoError;

/// Rows between progress messages.
const PROGRESS_INTERVAL: usize = 100;

/// Columns per index row: path, encoding, language, script.
const COLUMNS: usize = 4;

/// Reads a corpus index into labeled records.
///
/// Expected CSV format:
/// - Header row, ignored
/// - `path,encoding,language,script`
/// - `path` is relative to the index's directory; language and script are
///   ISO codes or names
///
/// Rows that cannot become a record are logged at error level and skipped:
/// wrong column count, missing or unreadable file, blank encoding, unknown
/// language or script, or bytes that do not decode under the declared
/// encoding.
#[derive(Debug, Clone)]
pub struct InputParser {
    registry: Arc<IsoRegistry>,
}

impl InputParser {
    /// Create a parser resolving labels through `registry`.
    #[must_use]
    pub fn new(registry: Arc<IsoRegistry>) -> Self {
        Self { registry }
    }

    /// Read every valid record listed in `index`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::FileNotFound`] | Index doesn't exist or is unreadable |
    /// | [`IoError::CsvParse`] | Malformed CSV record |
    #[instrument(skip(self), fields(index = %index.display()))]
    pub fn parse(&self, index: &Path) -> Result<Vec<LabeledRecord>, IoError> {
        let file = std::fs::File::open(index).map_err(|e| IoError::FileNotFound {
            path: index.to_path_buf(),
            source: e,
        })?;
        let data_root = index.parent().unwrap_or_else(|| Path::new(""));

        // flexible(true) so short or long rows reach the column check below
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let rows: Vec<csv::StringRecord> = rdr
            .records()
            .collect::<Result<_, _>>()
            .map_err(|e| IoError::CsvParse {
                path: index.to_path_buf(),
                offset: e.position().map_or(0, |p| p.byte()),
                source: e,
            })?;

        let mut records = Vec::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            let line = row.position().map_or(i as u64 + 2, csv::Position::line);
            if let Some(record) = self.parse_row(data_root, line, row) {
                records.push(record);
            }
            if (i + 1) % PROGRESS_INTERVAL == 0 {
                info!(processed = i + 1, total = rows.len(), "index rows read");
            }
        }

        info!(
            n_records = records.len(),
            n_skipped = rows.len() - records.len(),
            "index loaded"
        );
        Ok(records)
    }

    fn parse_row(
        &self,
        data_root: &Path,
        line: u64,
        row: &csv::StringRecord,
    ) -> Option<LabeledRecord> {
        if row.len() != COLUMNS {
            error!(line, got = row.len(), expected = COLUMNS, "wrong number of columns");
            return None;
        }
        let field = |i: usize| row.get(i).unwrap_or_default();

        let path: PathBuf = data_root.join(field(0));
        if !path.is_file() {
            error!(line, path = %path.display(), "input file not found");
            return None;
        }
        let encoding = field(1);
        if encoding.is_empty() {
            error!(line, "no encoding");
            return None;
        }
        let Some(language) = self.registry.language(field(2)) else {
            error!(line, language = field(2), "invalid language");
            return None;
        };
        let Some(script) = self.registry.script(field(3)) else {
            error!(line, script = field(3), "invalid script");
            return None;
        };
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) => {
                error!(line, path = %path.display(), error = %e, "could not load data");
                return None;
            }
        };
        if decode(&bytes, encoding).is_none() {
            error!(line, path = %path.display(), encoding, "could not decode data");
            return None;
        }

        Some(LabeledRecord::new(
            path,
            bytes,
            encoding,
            language.clone(),
            script.clone(),
        ))
    }
}
