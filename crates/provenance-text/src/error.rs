/// Errors from analyzer identification, pooling and execution.
#[derive(Debug, thiserror::Error)]
pub enum TextError {
    /// Returned when an analyzer id string cannot be parsed.
    #[error("invalid analyzer id \"{raw}\"")]
    InvalidAnalyzerId {
        /// The rejected text.
        raw: String,
    },

    /// Returned when registering an id that is already in the pool.
    #[error("analyzer {id} is already registered")]
    DuplicateAnalyzer {
        /// The clashing id.
        id: String,
    },

    /// Returned when a required analyzer is not in the pool.
    #[error("required analyzer {id} is not available")]
    MissingAnalyzer {
        /// The missing id.
        id: String,
    },

    /// Returned when an analyzer fails on an input.
    #[error("analyzer {id} failed: {reason}")]
    AnalysisFailed {
        /// The failing analyzer.
        id: String,
        /// Human-readable cause.
        reason: String,
    },
}
