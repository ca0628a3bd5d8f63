//! Shared vocabulary for text provenance analysis.
//!
//! Defines the attributes being classified, the ISO language and script
//! registry, the [`Analyzer`] capability trait and the pool that runs
//! analyzers, strict charset decoding with lenient name comparison, and the
//! rank-voting ensemble built on top of a pool.

mod analysis;
mod analyzer;
mod attribute;
pub mod builtin;
pub mod encoding;
mod election;
mod error;
mod iso;
mod pool;
mod record;
mod voting;

pub use analysis::{Analysis, TextInfo};
pub use analyzer::{Analyzer, AnalyzerId};
pub use attribute::{Attribute, Input, InputKind};
pub use election::Election;
pub use error::TextError;
pub use iso::{IsoRegistry, Language, Script};
pub use pool::{AnalyzerPool, AnalyzerResults};
pub use record::LabeledRecord;
pub use voting::VotingAnalyzer;
