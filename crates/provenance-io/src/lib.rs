//! Corpus index parsing, profile artifacts and JSON reports for the
//! provenance pipeline.

mod artifact;
mod error;
mod input;
mod report;

pub use artifact::{FORMAT_VERSION, Manifest, ProfileArtifact, ProfileEnvelope};
pub use error::IoError;
pub use input::InputParser;
pub use report::{
    ConfusionRow, ConfusionTable, MATRIX_CORNER, MatrixSheet, ReportMetadata, ReportWriter,
    StatisticsRow, StatisticsSection,
};
