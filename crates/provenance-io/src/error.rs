//! I/O error types for provenance-io.

use std::path::PathBuf;

use provenance_model::ModelError;

/// Errors from index parsing, profile artifacts and report writing.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Returned when a file does not exist or cannot be opened.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when the CSV parser encounters a malformed record.
    #[error("CSV parse error in {path} at byte offset {offset}")]
    CsvParse {
        /// Path to the CSV file.
        path: PathBuf,
        /// Byte offset where the error occurred.
        offset: u64,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// Returned when a profile name cannot be used as a directory name.
    #[error("invalid profile name \"{name}\": must match [a-zA-Z0-9.]+")]
    InvalidProfileName {
        /// The invalid name.
        name: String,
    },

    /// Returned when the output directory cannot be created.
    #[error("cannot create output directory {path}")]
    OutputDirCreate {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when an artifact file cannot be read.
    #[error("cannot read file {path}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when an output file cannot be written.
    #[error("cannot write file {path}")]
    WriteFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when JSON cannot be produced or parsed.
    #[error("JSON error in {path}")]
    Json {
        /// File being written or read.
        path: PathBuf,
        /// Underlying serde_json error.
        source: serde_json::Error,
    },

    /// Returned when the model file cannot be encoded or decoded.
    #[error("model encoding error in {path}")]
    Bincode {
        /// File being written or read.
        path: PathBuf,
        /// Underlying bincode error.
        source: bincode::Error,
    },

    /// Returned when an artifact was written by an incompatible format version.
    #[error("{path} has format version {found}, expected {expected}")]
    IncompatibleVersion {
        /// Artifact file.
        path: PathBuf,
        /// Version found in the file.
        found: u32,
        /// Version this build reads.
        expected: u32,
    },

    /// Returned when a profile needs an analyzer the pool does not have.
    #[error("required analyzer {id} is not available")]
    MissingAnalyzer {
        /// The missing id.
        id: String,
    },

    /// Returned when the loaded profile cannot be bound to the pool.
    #[error("profile error")]
    Model {
        /// Underlying model error.
        #[from]
        source: ModelError,
    },
}
