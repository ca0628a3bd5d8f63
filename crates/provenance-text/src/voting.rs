use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::hash::Hash;
use std::sync::Arc;

use tracing::{debug, error};

use crate::analysis::{Analysis, TextInfo};
use crate::analyzer::{Analyzer, AnalyzerId};
use crate::attribute::{Attribute, Input, InputKind};
use crate::election::Election;
use crate::encoding;
use crate::error::TextError;
use crate::pool::{AnalyzerPool, AnalyzerResults};

/// Deepest rank counted from any single analyzer.
pub const MAX_VOTES: usize = 5;

/// An ensemble that elects each attribute from the ranked answers of the
/// pool's analyzers.
///
/// Every analyzer gets the same total say: when one base id answers several
/// times (once per input form, or under several option sets), each of its
/// result lists is down-weighted accordingly.
#[derive(Debug, Clone)]
pub struct VotingAnalyzer {
    id: AnalyzerId,
    required: BTreeSet<AnalyzerId>,
    pool: Arc<AnalyzerPool>,
}

impl VotingAnalyzer {
    /// Create a voter over `required`, or over the whole pool if it is empty.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`TextError::MissingAnalyzer`] | a required id is not in the pool |
    pub fn new(required: BTreeSet<AnalyzerId>, pool: Arc<AnalyzerPool>) -> Result<Self, TextError> {
        pool.select(&required)?;
        Ok(Self {
            id: AnalyzerId::builtin("voting"),
            required,
            pool,
        })
    }

    /// Return the ids that get a vote; empty means every pool analyzer.
    #[must_use]
    pub fn required(&self) -> &BTreeSet<AnalyzerId> {
        &self.required
    }

    fn allowed(&self, id: &AnalyzerId) -> bool {
        self.required.is_empty() || self.required.contains(id)
    }

    fn elect<C, F>(
        &self,
        working: &mut Working<'_>,
        attribute: Attribute,
        value: F,
    ) -> Result<Option<C>, TextError>
    where
        C: Clone + Eq + Hash,
        F: Fn(&Analysis) -> Option<C>,
    {
        let runs = working.run(&self.pool, |id| self.allowed(id), attribute)?;
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for results in &runs {
            for id in results.keys() {
                *counts.entry(id.base()).or_default() += 1;
            }
        }
        let mut election = Election::new(MAX_VOTES);
        for results in &runs {
            for (id, analyses) in results {
                let weight = 1.0 / counts[id.base()] as f64;
                for (rank, analysis) in analyses.iter().enumerate() {
                    if let Some(candidate) = value(analysis) {
                        election.add_weighted(candidate, rank + 1, weight);
                    }
                }
            }
        }
        Ok(election.results().into_iter().next().map(|(winner, _)| winner))
    }
}

impl Analyzer for VotingAnalyzer {
    fn id(&self) -> &AnalyzerId {
        &self.id
    }

    fn accepts(&self, _kind: InputKind) -> bool {
        true
    }

    fn produces(&self, _attribute: Attribute) -> bool {
        true
    }

    fn analyze(&self, input: Input<'_>) -> Result<Vec<Analysis>, TextError> {
        let mut working = Working::start(input);

        if working.binary && !working.bytes.is_empty() {
            let winner = self.elect(&mut working, Attribute::Encoding, |a| {
                let normalized = encoding::normalize_encoding(a.encoding()?);
                (!normalized.is_empty()).then_some(normalized)
            })?;
            match winner {
                Some(label) => working.set_encoding(&label),
                None => error!(analyzer = %self.id, "could not determine encoding for binary input"),
            }
        }

        if working.has_text() {
            working.info.language =
                self.elect(&mut working, Attribute::Language, |a| a.language().cloned())?;
            working.info.script = self.elect(&mut working, Attribute::Script, |a| a.script().cloned())?;
        }

        debug!(
            analyzer = %self.id,
            encoding = ?working.info.encoding,
            language = ?working.info.language.as_ref().map(|l| l.code().to_string()),
            "vote complete"
        );
        Ok(vec![working.info.to_analysis()])
    }
}

/// Per-call state: both input forms plus results already computed for them.
struct Working<'a> {
    binary: bool,
    bytes: std::borrow::Cow<'a, [u8]>,
    text: Option<String>,
    info: TextInfo,
    byte_results: AnalyzerResults,
    text_results: AnalyzerResults,
}

impl<'a> Working<'a> {
    fn start(input: Input<'a>) -> Self {
        let mut info = TextInfo::default();
        let (binary, bytes, text) = match input {
            Input::Bytes(bytes) => (true, std::borrow::Cow::Borrowed(bytes), None),
            Input::Text(text) => {
                info.set_encoding("utf-8");
                (
                    false,
                    std::borrow::Cow::Owned(text.as_bytes().to_vec()),
                    Some(text.to_string()),
                )
            }
        };
        info.size = Some(bytes.len());
        Self {
            binary,
            bytes,
            text,
            info,
            byte_results: BTreeMap::new(),
            text_results: BTreeMap::new(),
        }
    }

    fn has_text(&self) -> bool {
        self.text.as_deref().is_some_and(|t| !t.trim().is_empty())
    }

    fn set_encoding(&mut self, label: &str) {
        self.info.set_encoding(label);
        self.text = encoding::decode(&self.bytes, label);
        self.text_results.clear();
    }

    /// Run the matching analyzers on every available input form, reusing
    /// earlier results for analyzers already run on that form.
    fn run<F>(
        &mut self,
        pool: &AnalyzerPool,
        allowed: F,
        attribute: Attribute,
    ) -> Result<Vec<AnalyzerResults>, TextError>
    where
        F: Fn(&AnalyzerId) -> bool,
    {
        let mut runs = Vec::with_capacity(2);
        if !self.bytes.is_empty() {
            runs.push(run_cached(
                pool,
                Input::Bytes(&self.bytes),
                &mut self.byte_results,
                &allowed,
                attribute,
            )?);
        }
        if let Some(text) = self.text.as_deref()
            && !text.trim().is_empty()
        {
            runs.push(run_cached(
                pool,
                Input::Text(text),
                &mut self.text_results,
                &allowed,
                attribute,
            )?);
        }
        Ok(runs)
    }
}

fn run_cached<F>(
    pool: &AnalyzerPool,
    input: Input<'_>,
    cache: &mut AnalyzerResults,
    allowed: &F,
    attribute: Attribute,
) -> Result<AnalyzerResults, TextError>
where
    F: Fn(&AnalyzerId) -> bool,
{
    let fresh = pool.run(
        input,
        |id| allowed(id) && !cache.contains_key(id),
        |a| a.produces(attribute),
    )?;
    cache.extend(fresh);
    Ok(cache
        .iter()
        .filter(|(id, _)| {
            allowed(id)
                && pool
                    .get(id)
                    .is_some_and(|a| a.produces(attribute) && a.accepts(input.kind()))
        })
        .map(|(id, results)| (id.clone(), results.clone()))
        .collect())
}
