use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::debug;

use crate::analysis::Analysis;
use crate::analyzer::{Analyzer, AnalyzerId};
use crate::attribute::Input;
use crate::builtin::{BomSniffer, UnicodeScriptProfiler};
use crate::error::TextError;
use crate::iso::IsoRegistry;

/// Results of one pool run, keyed by analyzer id.
pub type AnalyzerResults = BTreeMap<AnalyzerId, Vec<Analysis>>;

/// A sorted registry of analyzers.
#[derive(Clone, Default)]
pub struct AnalyzerPool {
    analyzers: BTreeMap<AnalyzerId, Arc<dyn Analyzer>>,
}

impl std::fmt::Debug for AnalyzerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.analyzers.keys()).finish()
    }
}

impl AnalyzerPool {
    /// Create an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pool holding the built-in reference analyzers.
    #[must_use]
    pub fn with_builtins(registry: Arc<IsoRegistry>) -> Self {
        let mut analyzers: BTreeMap<AnalyzerId, Arc<dyn Analyzer>> = BTreeMap::new();
        let bom = BomSniffer::new();
        analyzers.insert(bom.id().clone(), Arc::new(bom));
        let unicode = UnicodeScriptProfiler::new(registry);
        analyzers.insert(unicode.id().clone(), Arc::new(unicode));
        Self { analyzers }
    }

    /// Add an analyzer.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::DuplicateAnalyzer`] if the id is taken.
    pub fn register(&mut self, analyzer: Arc<dyn Analyzer>) -> Result<(), TextError> {
        let id = analyzer.id().clone();
        if self.analyzers.contains_key(&id) {
            return Err(TextError::DuplicateAnalyzer { id: id.to_string() });
        }
        self.analyzers.insert(id, analyzer);
        Ok(())
    }

    /// Look up an analyzer.
    #[must_use]
    pub fn get(&self, id: &AnalyzerId) -> Option<&Arc<dyn Analyzer>> {
        self.analyzers.get(id)
    }

    /// Return `true` if the id is registered.
    #[must_use]
    pub fn contains(&self, id: &AnalyzerId) -> bool {
        self.analyzers.contains_key(id)
    }

    /// Iterate over ids in order.
    pub fn ids(&self) -> impl Iterator<Item = &AnalyzerId> {
        self.analyzers.keys()
    }

    /// Iterate over analyzers in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Analyzer>> {
        self.analyzers.values()
    }

    /// Return the number of analyzers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.analyzers.len()
    }

    /// Return `true` if no analyzers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.analyzers.is_empty()
    }

    /// Return the analyzers named by `required`, in id order.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::MissingAnalyzer`] for the first id not in the pool.
    pub fn select(
        &self,
        required: &BTreeSet<AnalyzerId>,
    ) -> Result<Vec<Arc<dyn Analyzer>>, TextError> {
        required
            .iter()
            .map(|id| {
                self.analyzers
                    .get(id)
                    .cloned()
                    .ok_or_else(|| TextError::MissingAnalyzer { id: id.to_string() })
            })
            .collect()
    }

    /// Run every analyzer passing both filters that accepts the input's kind.
    ///
    /// Analyzers rejected by a filter or unable to take the input are absent
    /// from the result.
    ///
    /// # Errors
    ///
    /// Returns the first analyzer failure.
    pub fn run<F, G>(
        &self,
        input: Input<'_>,
        id_filter: F,
        analyzer_filter: G,
    ) -> Result<AnalyzerResults, TextError>
    where
        F: Fn(&AnalyzerId) -> bool,
        G: Fn(&dyn Analyzer) -> bool,
    {
        let kind = input.kind();
        let mut results = AnalyzerResults::new();
        for (id, analyzer) in &self.analyzers {
            if !id_filter(id) || !analyzer.accepts(kind) || !analyzer_filter(analyzer.as_ref()) {
                continue;
            }
            let analyses = analyzer.analyze(input)?;
            debug!(analyzer = %id, results = analyses.len(), "analyzer ran");
            results.insert(id.clone(), analyses);
        }
        Ok(results)
    }
}
