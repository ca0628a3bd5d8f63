use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::analysis::Analysis;
use crate::attribute::{Attribute, Input, InputKind};
use crate::error::TextError;

/// Identifier of an analyzer: a base id plus optional configuration options.
///
/// Written as `base` or `base_opt1-opt2`. Ordered by base id, then by the
/// number of options, then by the options themselves.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct AnalyzerId {
    base: String,
    options: Vec<String>,
}

impl AnalyzerId {
    /// Create an id without options.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::InvalidAnalyzerId`] if `base` is blank or contains
    /// `_`, `-` or whitespace.
    pub fn new(base: &str) -> Result<Self, TextError> {
        Self::with_options(base, &[])
    }

    /// Create an id with options.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::InvalidAnalyzerId`] if the base or any option is
    /// blank or contains a separator character.
    pub fn with_options(base: &str, options: &[&str]) -> Result<Self, TextError> {
        let valid = |part: &str| {
            !part.is_empty() && !part.contains(|c: char| c == '_' || c == '-' || c.is_whitespace())
        };
        let base = base.trim().to_lowercase();
        let options: Vec<String> = options.iter().map(|o| o.trim().to_lowercase()).collect();
        if !valid(&base) || !options.iter().all(|o| valid(o)) {
            let raw = if options.is_empty() {
                base
            } else {
                format!("{base}_{}", options.join("-"))
            };
            return Err(TextError::InvalidAnalyzerId { raw });
        }
        Ok(Self { base, options })
    }

    /// Id for built-in analyzers whose base is a known-good literal.
    pub(crate) fn builtin(base: &str) -> Self {
        Self {
            base: base.to_string(),
            options: Vec::new(),
        }
    }

    /// Return the base id.
    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Return the options.
    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }
}

impl Ord for AnalyzerId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.base
            .cmp(&other.base)
            .then_with(|| self.options.len().cmp(&other.options.len()))
            .then_with(|| self.options.cmp(&other.options))
    }
}

impl PartialOrd for AnalyzerId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for AnalyzerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base)?;
        if !self.options.is_empty() {
            write!(f, "_{}", self.options.join("-"))?;
        }
        Ok(())
    }
}

impl FromStr for AnalyzerId {
    type Err = TextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().split_once('_') {
            None => Self::new(s),
            Some((base, opts)) => {
                let options: Vec<&str> = opts.split('-').collect();
                Self::with_options(base, &options)
            }
        }
    }
}

/// A pluggable detector of encoding, language and/or script.
///
/// Implementations advertise what they consume and what they produce; the
/// trainer and tester only ever talk to analyzers through this trait.
pub trait Analyzer: Send + Sync {
    /// Return the analyzer's id.
    fn id(&self) -> &AnalyzerId;

    /// Return `true` if the analyzer can consume this kind of input.
    fn accepts(&self, kind: InputKind) -> bool;

    /// Return `true` if results carry a value for `attribute`.
    fn produces(&self, attribute: Attribute) -> bool;

    /// Return `true` if the analyzer returns several ranked results.
    fn produces_rankings(&self) -> bool {
        false
    }

    /// Return `true` if results carry a score.
    fn produces_scores(&self) -> bool {
        false
    }

    /// Analyze one input, best result first. An empty list means no answer.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::AnalysisFailed`] when the analyzer cannot run.
    fn analyze(&self, input: Input<'_>) -> Result<Vec<Analysis>, TextError>;
}
