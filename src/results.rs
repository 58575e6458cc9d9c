//! Round results and pattern statistics.
//!
//! [`ResultLog`] is the append-only, chronological record of finished
//! rounds.  [`pattern_stats`] derives per-pattern win statistics from it;
//! the derivation is pure, so the same log always yields the same table.

use std::fmt;

use crate::registry::NodeId;

/// Outcome of one completed round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundResult {
    /// Node whose detection report arrived first.
    pub node_id: NodeId,
    pub pattern: String,
    /// Bits broadcast in the round, including the one that triggered the
    /// report.
    pub rolls_count: u32,
}

impl fmt::Display for RoundResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Node {} | Pattern: {} | Rolls: {}",
            self.node_id, self.pattern, self.rolls_count
        )
    }
}

/// Chronological list of round results (index = round - 1).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultLog {
    results: Vec<RoundResult>,
}

impl ResultLog {
    pub fn record(&mut self, result: RoundResult) {
        self.results.push(result);
    }

    pub fn results(&self) -> &[RoundResult] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Per-pattern statistics over `total_rounds` configured rounds.
    pub fn pattern_stats(&self, total_rounds: u32) -> Vec<PatternStats> {
        pattern_stats(&self.results, total_rounds)
    }
}

/// Win statistics for one distinct pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternStats {
    pub pattern: String,
    pub occurrences: u32,
    pub total_rolls: u64,
    /// `occurrences / total_rounds`.
    pub probability: f64,
    /// `total_rolls / occurrences`.
    pub average_rolls: f64,
}

impl fmt::Display for PatternStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Pattern: {}", self.pattern)?;
        writeln!(f, "  Total Wins: {}", self.occurrences)?;
        writeln!(f, "  Probability of Winning: {:.2}%", self.probability * 100.0)?;
        write!(f, "  Average Rolls to Win: {:.2}", self.average_rolls)
    }
}

/// Group `results` by exact pattern string, in order of first appearance.
///
/// `total_rounds` is the configured round count; when it is zero every
/// probability is reported as 0.
pub fn pattern_stats(results: &[RoundResult], total_rounds: u32) -> Vec<PatternStats> {
    let mut stats: Vec<PatternStats> = Vec::new();

    for result in results {
        match stats.iter_mut().find(|s| s.pattern == result.pattern) {
            Some(entry) => {
                entry.occurrences += 1;
                entry.total_rolls += u64::from(result.rolls_count);
            }
            None => stats.push(PatternStats {
                pattern: result.pattern.clone(),
                occurrences: 1,
                total_rolls: u64::from(result.rolls_count),
                probability: 0.0,
                average_rolls: 0.0,
            }),
        }
    }

    for entry in &mut stats {
        if total_rounds > 0 {
            entry.probability = f64::from(entry.occurrences) / f64::from(total_rounds);
        }
        entry.average_rolls = entry.total_rolls as f64 / f64::from(entry.occurrences);
    }

    stats
}
