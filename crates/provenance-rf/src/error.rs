/// Errors from forest configuration, training and prediction.
#[derive(Debug, thiserror::Error)]
pub enum RfError {
    /// Returned when the forest is configured with zero trees.
    #[error("a forest needs at least one tree, got {n_trees}")]
    InvalidTreeCount {
        /// The rejected tree count.
        n_trees: usize,
    },

    /// Returned when `max_depth` is `Some(0)`.
    #[error("max_depth must be at least 1, got {max_depth}")]
    InvalidMaxDepth {
        /// The rejected depth.
        max_depth: usize,
    },

    /// Returned when `min_samples_split` is below 2.
    #[error("min_samples_split must be at least 2, got {min_samples_split}")]
    InvalidMinSamplesSplit {
        /// The rejected value.
        min_samples_split: usize,
    },

    /// Returned when `min_samples_leaf` is zero.
    #[error("min_samples_leaf must be at least 1, got {min_samples_leaf}")]
    InvalidMinSamplesLeaf {
        /// The rejected value.
        min_samples_leaf: usize,
    },

    /// Returned when the feature subset size resolves outside `[1, n_features]`.
    #[error("max_features resolved to {max_features}, outside [1, {n_features}]")]
    InvalidMaxFeatures {
        /// The resolved subset size.
        max_features: usize,
        /// Number of feature columns in the training set.
        n_features: usize,
    },

    /// Returned when the training set has no rows.
    #[error("training set has no rows")]
    EmptyDataset,

    /// Returned when the training rows have no columns.
    #[error("training rows have no feature columns")]
    ZeroFeatures,

    /// Returned when the label vector and the row matrix disagree in length.
    #[error("{labels} labels supplied for {rows} rows")]
    LabelCountMismatch {
        /// Number of labels.
        labels: usize,
        /// Number of rows.
        rows: usize,
    },

    /// Returned when a training row is shorter or longer than the first row.
    #[error("row {row} has {got} columns, expected {expected}")]
    RaggedRow {
        /// Zero-based row index.
        row: usize,
        /// Column count of the first row.
        expected: usize,
        /// Column count of the offending row.
        got: usize,
    },

    /// Returned when a training value is NaN or infinite.
    #[error("non-finite value at row {row}, column {column}")]
    NonFiniteValue {
        /// Zero-based row index.
        row: usize,
        /// Zero-based column index.
        column: usize,
    },

    /// Returned when a prediction input has the wrong width.
    #[error("prediction input has {got} columns, the forest expects {expected}")]
    PredictionWidth {
        /// Width the forest was trained on.
        expected: usize,
        /// Width supplied.
        got: usize,
    },
}
