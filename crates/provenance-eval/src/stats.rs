//! One-vs-rest base counts and the metrics derived from them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Divide, returning 0 when the denominator is 0 or the result is not finite.
fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }
    let value = numerator / denominator;
    if value.is_finite() { value } else { 0.0 }
}

/// True/false positive and negative counts for one class, or their
/// macro-average across classes.
///
/// Counts are `f64` because averaged counts are fractional. Every derived
/// metric returns 0 where its formula would divide by zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerStats {
    true_positives: f64,
    true_negatives: f64,
    false_positives: f64,
    false_negatives: f64,
}

impl AnalyzerStats {
    /// Create stats from the four base counts.
    #[must_use]
    pub fn new(
        true_positives: f64,
        true_negatives: f64,
        false_positives: f64,
        false_negatives: f64,
    ) -> Self {
        Self {
            true_positives,
            true_negatives,
            false_positives,
            false_negatives,
        }
    }

    /// Coordinate-wise mean of the base counts. Empty input gives all zeros.
    #[must_use]
    pub fn mean<'a, I>(stats: I) -> Self
    where
        I: IntoIterator<Item = &'a AnalyzerStats>,
    {
        let mut sum = Self::default();
        let mut n = 0usize;
        for s in stats {
            sum.true_positives += s.true_positives;
            sum.true_negatives += s.true_negatives;
            sum.false_positives += s.false_positives;
            sum.false_negatives += s.false_negatives;
            n += 1;
        }
        if n == 0 {
            return sum;
        }
        let n = n as f64;
        Self::new(
            sum.true_positives / n,
            sum.true_negatives / n,
            sum.false_positives / n,
            sum.false_negatives / n,
        )
    }

    // --- Base counts ---

    #[must_use]
    pub fn true_positives(&self) -> f64 {
        self.true_positives
    }

    #[must_use]
    pub fn true_negatives(&self) -> f64 {
        self.true_negatives
    }

    #[must_use]
    pub fn false_positives(&self) -> f64 {
        self.false_positives
    }

    #[must_use]
    pub fn false_negatives(&self) -> f64 {
        self.false_negatives
    }

    /// Sum of the four base counts.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.true_positives + self.true_negatives + self.false_positives + self.false_negatives
    }

    // --- Derived metrics ---

    /// TP / (TP + FP).
    #[must_use]
    pub fn precision(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_positives)
    }

    /// TP / (TP + FN). Also called sensitivity or hit rate.
    #[must_use]
    pub fn recall(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_negatives)
    }

    /// 2TP / (2TP + FP + FN).
    #[must_use]
    pub fn f1_score(&self) -> f64 {
        let tp2 = 2.0 * self.true_positives;
        ratio(tp2, tp2 + self.false_positives + self.false_negatives)
    }

    /// (TP + TN) / total.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        ratio(self.true_positives + self.true_negatives, self.total())
    }

    /// TN / (FP + TN).
    #[must_use]
    pub fn specificity(&self) -> f64 {
        ratio(self.true_negatives, self.false_positives + self.true_negatives)
    }

    /// TN / (TN + FN).
    #[must_use]
    pub fn negative_predictive_value(&self) -> f64 {
        ratio(self.true_negatives, self.true_negatives + self.false_negatives)
    }

    /// FP / (FP + TN).
    #[must_use]
    pub fn fall_out(&self) -> f64 {
        ratio(self.false_positives, self.false_positives + self.true_negatives)
    }

    /// FP / (FP + TP).
    #[must_use]
    pub fn false_discovery_rate(&self) -> f64 {
        ratio(self.false_positives, self.false_positives + self.true_positives)
    }

    /// FN / (FN + TN).
    #[must_use]
    pub fn false_omission_rate(&self) -> f64 {
        ratio(self.false_negatives, self.false_negatives + self.true_negatives)
    }

    /// FN / (FN + TP).
    #[must_use]
    pub fn miss_rate(&self) -> f64 {
        ratio(self.false_negatives, self.false_negatives + self.true_positives)
    }

    /// (FP + FN) / total.
    #[must_use]
    pub fn error_rate(&self) -> f64 {
        ratio(self.false_positives + self.false_negatives, self.total())
    }

    /// Matthews correlation coefficient, in [-1, 1].
    #[must_use]
    pub fn matthews_correlation(&self) -> f64 {
        let (tp, tn, fp, fn_) = (
            self.true_positives,
            self.true_negatives,
            self.false_positives,
            self.false_negatives,
        );
        let radicand = (tp + fp) * (tp + fn_) * (tn + fp) * (tn + fn_);
        if radicand <= 0.0 {
            return 0.0;
        }
        ratio(tp * tn - fp * fn_, radicand.sqrt())
    }

    /// Recall + specificity - 1.
    #[must_use]
    pub fn informedness(&self) -> f64 {
        self.recall() + self.specificity() - 1.0
    }

    /// Precision + NPV - 1.
    #[must_use]
    pub fn markedness(&self) -> f64 {
        self.precision() + self.negative_predictive_value() - 1.0
    }

    /// Recall / fall-out.
    #[must_use]
    pub fn positive_likelihood_ratio(&self) -> f64 {
        ratio(self.recall(), self.fall_out())
    }

    /// Miss rate / specificity.
    #[must_use]
    pub fn negative_likelihood_ratio(&self) -> f64 {
        ratio(self.miss_rate(), self.specificity())
    }

    /// LR+ / LR-.
    #[must_use]
    pub fn diagnostic_odds_ratio(&self) -> f64 {
        ratio(
            self.positive_likelihood_ratio(),
            self.negative_likelihood_ratio(),
        )
    }
}

/// A metric of [`AnalyzerStats`] that can be selected by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Statistic {
    TruePositives,
    TrueNegatives,
    FalsePositives,
    FalseNegatives,
    Precision,
    Recall,
    F1Score,
    Accuracy,
    Specificity,
    NegativePredictiveValue,
    FallOut,
    FalseDiscoveryRate,
    FalseOmissionRate,
    MissRate,
    ErrorRate,
    MatthewsCorrelation,
    Informedness,
    Markedness,
    PositiveLikelihoodRatio,
    NegativeLikelihoodRatio,
    DiagnosticOddsRatio,
}

impl Statistic {
    /// Every statistic, base counts first.
    pub const ALL: [Statistic; 21] = [
        Statistic::TruePositives,
        Statistic::TrueNegatives,
        Statistic::FalsePositives,
        Statistic::FalseNegatives,
        Statistic::Precision,
        Statistic::Recall,
        Statistic::F1Score,
        Statistic::Accuracy,
        Statistic::Specificity,
        Statistic::NegativePredictiveValue,
        Statistic::FallOut,
        Statistic::FalseDiscoveryRate,
        Statistic::FalseOmissionRate,
        Statistic::MissRate,
        Statistic::ErrorRate,
        Statistic::MatthewsCorrelation,
        Statistic::Informedness,
        Statistic::Markedness,
        Statistic::PositiveLikelihoodRatio,
        Statistic::NegativeLikelihoodRatio,
        Statistic::DiagnosticOddsRatio,
    ];

    /// Short snake_case name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Statistic::TruePositives => "true_positives",
            Statistic::TrueNegatives => "true_negatives",
            Statistic::FalsePositives => "false_positives",
            Statistic::FalseNegatives => "false_negatives",
            Statistic::Precision => "precision",
            Statistic::Recall => "recall",
            Statistic::F1Score => "f1_score",
            Statistic::Accuracy => "accuracy",
            Statistic::Specificity => "specificity",
            Statistic::NegativePredictiveValue => "negative_predictive_value",
            Statistic::FallOut => "fall_out",
            Statistic::FalseDiscoveryRate => "false_discovery_rate",
            Statistic::FalseOmissionRate => "false_omission_rate",
            Statistic::MissRate => "miss_rate",
            Statistic::ErrorRate => "error_rate",
            Statistic::MatthewsCorrelation => "matthews_correlation",
            Statistic::Informedness => "informedness",
            Statistic::Markedness => "markedness",
            Statistic::PositiveLikelihoodRatio => "positive_likelihood_ratio",
            Statistic::NegativeLikelihoodRatio => "negative_likelihood_ratio",
            Statistic::DiagnosticOddsRatio => "diagnostic_odds_ratio",
        }
    }

    /// Evaluate this statistic on `stats`.
    #[must_use]
    pub fn apply(self, stats: &AnalyzerStats) -> f64 {
        match self {
            Statistic::TruePositives => stats.true_positives(),
            Statistic::TrueNegatives => stats.true_negatives(),
            Statistic::FalsePositives => stats.false_positives(),
            Statistic::FalseNegatives => stats.false_negatives(),
            Statistic::Precision => stats.precision(),
            Statistic::Recall => stats.recall(),
            Statistic::F1Score => stats.f1_score(),
            Statistic::Accuracy => stats.accuracy(),
            Statistic::Specificity => stats.specificity(),
            Statistic::NegativePredictiveValue => stats.negative_predictive_value(),
            Statistic::FallOut => stats.fall_out(),
            Statistic::FalseDiscoveryRate => stats.false_discovery_rate(),
            Statistic::FalseOmissionRate => stats.false_omission_rate(),
            Statistic::MissRate => stats.miss_rate(),
            Statistic::ErrorRate => stats.error_rate(),
            Statistic::MatthewsCorrelation => stats.matthews_correlation(),
            Statistic::Informedness => stats.informedness(),
            Statistic::Markedness => stats.markedness(),
            Statistic::PositiveLikelihoodRatio => stats.positive_likelihood_ratio(),
            Statistic::NegativeLikelihoodRatio => stats.negative_likelihood_ratio(),
            Statistic::DiagnosticOddsRatio => stats.diagnostic_odds_ratio(),
        }
    }

    /// Return `true` for metrics bounded to [0, 1].
    #[must_use]
    pub fn is_unit_interval(self) -> bool {
        matches!(
            self,
            Statistic::Precision
                | Statistic::Recall
                | Statistic::F1Score
                | Statistic::Accuracy
                | Statistic::Specificity
                | Statistic::NegativePredictiveValue
                | Statistic::FallOut
                | Statistic::FalseDiscoveryRate
                | Statistic::FalseOmissionRate
                | Statistic::MissRate
                | Statistic::ErrorRate
        )
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Statistic {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Statistic::ALL
            .into_iter()
            .find(|stat| stat.name() == wanted)
            .ok_or_else(|| format!("unknown statistic \"{s}\""))
    }
}
