//! Thread-safe confusion-matrix accumulator for one analyzer on one track.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::stats::{AnalyzerStats, Statistic};

#[derive(Debug)]
struct EvalState<K> {
    tests: usize,
    correct: usize,
    truth_counts: BTreeMap<Option<K>, usize>,
    confusion: BTreeMap<Option<K>, BTreeMap<Option<K>, usize>>,
    truth_stats: BTreeMap<Option<K>, AnalyzerStats>,
    overall: AnalyzerStats,
}

impl<K> Default for EvalState<K> {
    fn default() -> Self {
        Self {
            tests: 0,
            correct: 0,
            truth_counts: BTreeMap::new(),
            confusion: BTreeMap::new(),
            truth_stats: BTreeMap::new(),
            overall: AnalyzerStats::default(),
        }
    }
}

/// Accumulates (truth, actual) pairs and derives per-class and macro-averaged
/// statistics from them.
///
/// `None` is the "no answer" class and is counted like any other value.
/// Writers and readers share one mutex. Each read locks independently, so
/// reads taken while a writer is active are not mutually consistent.
///
/// # Examples
///
/// ```
/// use provenance_eval::{AnalyzerEval, Statistic};
///
/// let eval = AnalyzerEval::new();
/// eval.add_test_result(Some("a"), Some("a"));
/// eval.add_test_result(Some("a"), None);
/// eval.compute_stats();
/// assert_eq!(eval.tests(), 2);
/// assert!((eval.statistic_for(Some(&Some("a")), Statistic::Recall) - 0.5).abs() < 1e-10);
/// ```
#[derive(Debug)]
pub struct AnalyzerEval<K> {
    state: Mutex<EvalState<K>>,
}

impl<K> Default for AnalyzerEval<K> {
    fn default() -> Self {
        Self {
            state: Mutex::new(EvalState::default()),
        }
    }
}

impl<K: Ord + Clone> AnalyzerEval<K> {
    /// Create an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, EvalState<K>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record one test outcome.
    pub fn add_test_result(&self, truth: Option<K>, actual: Option<K>) {
        let mut state = self.lock();
        state.tests += 1;
        if truth == actual {
            state.correct += 1;
        }
        *state.truth_counts.entry(truth.clone()).or_insert(0) += 1;
        *state
            .confusion
            .entry(truth)
            .or_default()
            .entry(actual)
            .or_insert(0) += 1;
    }

    /// Derive one-vs-rest stats for every truth class and their macro-average.
    ///
    /// Idempotent. Call after the last [`add_test_result`](Self::add_test_result).
    pub fn compute_stats(&self) {
        let mut state = self.lock();

        let mut column_sums: BTreeMap<&Option<K>, usize> = BTreeMap::new();
        for row in state.confusion.values() {
            for (actual, &count) in row {
                *column_sums.entry(actual).or_insert(0) += count;
            }
        }

        let mut truth_stats = BTreeMap::new();
        for (truth, &row_sum) in &state.truth_counts {
            let tp = state
                .confusion
                .get(truth)
                .and_then(|row| row.get(truth))
                .copied()
                .unwrap_or(0);
            let fn_ = row_sum - tp;
            let fp = column_sums.get(truth).copied().unwrap_or(0) - tp;
            let tn = state.tests - tp - fn_ - fp;
            truth_stats.insert(
                truth.clone(),
                AnalyzerStats::new(tp as f64, tn as f64, fp as f64, fn_ as f64),
            );
        }

        state.overall = AnalyzerStats::mean(truth_stats.values());
        state.truth_stats = truth_stats;
    }

    // --- Counts ---

    /// Number of recorded tests.
    #[must_use]
    pub fn tests(&self) -> usize {
        self.lock().tests
    }

    /// Number of tests whose actual value equalled the truth.
    #[must_use]
    pub fn correct(&self) -> usize {
        self.lock().correct
    }

    /// Number of tests whose truth was `class`.
    #[must_use]
    pub fn tests_for(&self, class: &Option<K>) -> usize {
        self.lock().truth_counts.get(class).copied().unwrap_or(0)
    }

    /// Number of correct tests whose truth was `class`.
    #[must_use]
    pub fn correct_for(&self, class: &Option<K>) -> usize {
        self.confusion_count(class, class)
    }

    /// Fraction of tests answered correctly, or 0 with no tests.
    #[must_use]
    pub fn percent_correct(&self) -> f64 {
        let state = self.lock();
        if state.tests == 0 {
            0.0
        } else {
            state.correct as f64 / state.tests as f64
        }
    }

    /// Fraction of `class` tests answered correctly, or 0 with no such tests.
    #[must_use]
    pub fn percent_correct_for(&self, class: &Option<K>) -> f64 {
        let tests = self.tests_for(class);
        if tests == 0 {
            0.0
        } else {
            self.correct_for(class) as f64 / tests as f64
        }
    }

    /// Classes seen as truth, `None` first.
    #[must_use]
    pub fn truth_values(&self) -> Vec<Option<K>> {
        self.lock().truth_counts.keys().cloned().collect()
    }

    /// Classes seen as truth or as an answer, `None` first.
    #[must_use]
    pub fn class_values(&self) -> Vec<Option<K>> {
        let state = self.lock();
        let mut values: BTreeSet<Option<K>> = BTreeSet::new();
        for (truth, row) in &state.confusion {
            values.insert(truth.clone());
            values.extend(row.keys().cloned());
        }
        values.into_iter().collect()
    }

    /// Count of tests with this truth and answer, 0 if never seen.
    #[must_use]
    pub fn confusion_count(&self, truth: &Option<K>, actual: &Option<K>) -> usize {
        self.lock()
            .confusion
            .get(truth)
            .and_then(|row| row.get(actual))
            .copied()
            .unwrap_or(0)
    }

    // --- Statistics ---

    /// Macro-averaged stats from the last [`compute_stats`](Self::compute_stats).
    #[must_use]
    pub fn stats(&self) -> AnalyzerStats {
        self.lock().overall
    }

    /// Stats for `class`, zeroed if it never occurred as truth.
    #[must_use]
    pub fn stats_for(&self, class: &Option<K>) -> AnalyzerStats {
        self.lock()
            .truth_stats
            .get(class)
            .copied()
            .unwrap_or_default()
    }

    /// Evaluate `statistic` on the overall stats.
    #[must_use]
    pub fn statistic(&self, statistic: Statistic) -> f64 {
        statistic.apply(&self.stats())
    }

    /// Evaluate `statistic` on one class's stats, or on the overall stats
    /// when `class` is `None`.
    #[must_use]
    pub fn statistic_for(&self, class: Option<&Option<K>>, statistic: Statistic) -> f64 {
        match class {
            Some(class) => statistic.apply(&self.stats_for(class)),
            None => self.statistic(statistic),
        }
    }
}
