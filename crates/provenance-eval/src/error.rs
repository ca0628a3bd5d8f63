use provenance_text::TextError;

/// Errors from an ensemble test run.
#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    /// Returned when the test run is given no records.
    #[error("no test records for {name}")]
    NoTestData {
        /// Candidate analyzer name.
        name: String,
    },

    /// Returned when two analyzers in the ensemble share an id.
    #[error("analyzer id {id} appears twice in the ensemble")]
    DuplicateAnalyzer {
        /// The clashing id.
        id: String,
    },

    /// Returned when an analyzer fails or a required analyzer is missing.
    #[error("analyzer failure")]
    Analyzer {
        /// Underlying analyzer error.
        #[from]
        source: TextError,
    },
}
