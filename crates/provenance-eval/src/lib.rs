//! Classification statistics and ensemble evaluation for text provenance
//! analyzers.
//!
//! [`AnalyzerEval`] accumulates a confusion matrix for one analyzer on one
//! attribute and derives one-vs-rest [`AnalyzerStats`] per class plus their
//! macro-average. [`Tester`] runs a trained candidate, the vote over its
//! inputs and every pool analyzer over labeled records and fills six such
//! tracks per analyzer.

mod error;
mod eval;
mod stats;
mod tester;

pub use error::EvalError;
pub use eval::AnalyzerEval;
pub use stats::{AnalyzerStats, Statistic};
pub use tester::{
    EnsembleMember, RawAnswer, RawRecord, TestReport, Tester, TesterConfig, Track, VOTING_ID,
    composite_key,
};
