use std::collections::HashMap;
use std::hash::Hash;

/// Bonus given to the tie-break winner.
const TIE_BREAK_BONUS: f64 = 0.001;

#[derive(Debug, Clone, Copy)]
struct Vote {
    rank: usize,
    weight: f64,
}

/// Weighted rank voting over candidate values.
///
/// A vote at rank `r` (1-based) is worth `weight * (max_rank + 1 - r)`; votes
/// ranked below `max_rank` count for nothing. Results are normalized to sum to
/// one and sorted best first.
#[derive(Debug, Clone)]
pub struct Election<C> {
    max_rank: usize,
    candidates: Vec<(C, Vec<Vote>)>,
    index: HashMap<C, usize>,
}

impl<C: Clone + Eq + Hash> Election<C> {
    /// Create an election counting ranks `1..=max_rank`.
    #[must_use]
    pub fn new(max_rank: usize) -> Self {
        Self {
            max_rank,
            candidates: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Cast a vote of weight one.
    pub fn add(&mut self, value: C, rank: usize) {
        self.add_weighted(value, rank, 1.0);
    }

    /// Cast a weighted vote.
    pub fn add_weighted(&mut self, value: C, rank: usize, weight: f64) {
        let slot = match self.index.get(&value) {
            Some(&slot) => slot,
            None => {
                self.index.insert(value.clone(), self.candidates.len());
                self.candidates.push((value, Vec::new()));
                self.candidates.len() - 1
            }
        };
        self.candidates[slot].1.push(Vote { rank, weight });
    }

    fn vote_value(&self, vote: Vote) -> f64 {
        vote.weight * (self.max_rank as f64 + 1.0 - vote.rank as f64)
    }

    /// Tally the votes, best first.
    ///
    /// When several values share the top score, the one with the highest
    /// mean vote wins, then the highest single vote, then the lowest spread.
    /// The winner's score is nudged up so it sorts first.
    #[must_use]
    pub fn results(&self) -> Vec<(C, f64)> {
        let mut total = 0.0;
        let mut scored: Vec<(usize, f64)> = self
            .candidates
            .iter()
            .enumerate()
            .map(|(slot, (_, votes))| {
                let score: f64 = votes
                    .iter()
                    .filter(|v| v.rank <= self.max_rank)
                    .map(|&v| self.vote_value(v))
                    .sum();
                total += score;
                (slot, score)
            })
            .collect();
        if total > 0.0 {
            for (_, score) in &mut scored {
                *score /= total;
            }
        }
        sort_desc(&mut scored);

        if let Some(&(_, top)) = scored.first() {
            let tied: Vec<usize> = scored
                .iter()
                .take_while(|(_, s)| *s == top)
                .map(|&(slot, _)| slot)
                .collect();
            if tied.len() > 1
                && let Some(winner) = self.break_tie(&tied)
                && let Some(entry) = scored.iter_mut().find(|(slot, _)| *slot == winner)
            {
                entry.1 += TIE_BREAK_BONUS;
                sort_desc(&mut scored);
            }
        }

        scored
            .into_iter()
            .map(|(slot, score)| (self.candidates[slot].0.clone(), score))
            .collect()
    }

    fn break_tie(&self, tied: &[usize]) -> Option<usize> {
        let summaries: Vec<(usize, VoteSummary)> = tied
            .iter()
            .map(|&slot| {
                let values: Vec<f64> = self.candidates[slot]
                    .1
                    .iter()
                    .map(|&v| self.vote_value(v))
                    .collect();
                (slot, VoteSummary::of(&values))
            })
            .collect();
        best(&summaries, |s| s.mean, true)
            .or_else(|| best(&summaries, |s| s.max, true))
            .or_else(|| best(&summaries, |s| s.std_dev, false))
    }
}

fn sort_desc(scored: &mut [(usize, f64)]) {
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
}

/// Return the slot that is strictly best on `key`, if there is one.
fn best(
    summaries: &[(usize, VoteSummary)],
    key: impl Fn(&VoteSummary) -> f64,
    high_wins: bool,
) -> Option<usize> {
    let mut ranked: Vec<(usize, f64)> = summaries.iter().map(|(slot, s)| (*slot, key(s))).collect();
    if high_wins {
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    } else {
        ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
    }
    match ranked.as_slice() {
        [first, second, ..] if first.1 != second.1 => Some(first.0),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy)]
struct VoteSummary {
    mean: f64,
    max: f64,
    std_dev: f64,
}

impl VoteSummary {
    fn of(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self {
                mean: 0.0,
                max: 0.0,
                std_dev: 0.0,
            };
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        Self {
            mean,
            max,
            std_dev: variance.sqrt(),
        }
    }
}
