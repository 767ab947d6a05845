//! Win-probability resolution.
//!
//! Given the score after a kick, estimates the probability that the team
//! which just kicked wins the shootout. Exact answers come first (decided
//! shootouts, the ten-kick tie), then the empirical table, and finally a
//! backward induction over the two outcomes of the next kick for states the
//! table has never observed.

use serde::Serialize;

use super::table::ProbabilityTable;
use crate::shootout::score::{ScoreState, KICKS_PER_TEAM, MAX_KICKS};

/// Make rate of a single kick (221/320) across the World Cup shootout kicks
/// the table is built from. An earlier calibration used a flat 0.7.
pub const DEFAULT_MAKE_PROBABILITY: f64 = 0.690625;

/// Lower bound applied to table and simulated estimates.
pub const DEFAULT_FLOOR: f64 = 0.05;

/// Upper bound applied to table and simulated estimates.
pub const DEFAULT_CEILING: f64 = 0.95;

/// Probability reported for a level score after ten kicks.
pub const REGULATION_TIE_PROBABILITY: f64 = 0.5;

/// Calibration constants for the resolver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolverConfig {
    /// Chance that any single kick is scored.
    pub make_probability: f64,
    /// Estimates at or below this are raised to it.
    pub floor: f64,
    /// Estimates at or above this are lowered to it.
    pub ceiling: f64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig {
            make_probability: DEFAULT_MAKE_PROBABILITY,
            floor: DEFAULT_FLOOR,
            ceiling: DEFAULT_CEILING,
        }
    }
}

/// Where a probability came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// The trailing team can no longer catch up.
    Eliminated,
    /// Level after ten kicks; treated as a coin flip.
    RegulationTie,
    /// Read from the historical table.
    Empirical,
    /// Derived from successor states by backward induction.
    Simulated,
}

impl Source {
    /// Returns true for sources that are exact rather than estimated.
    pub const fn is_exact(self) -> bool {
        matches!(self, Source::Eliminated | Source::RegulationTie)
    }
}

/// One step of resolution for a single state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution {
    /// The state has a value without looking further ahead.
    Resolved { probability: f64, source: Source },
    /// No value is known; the two outcomes of the next kick must be resolved.
    NeedsRecursion { make: ScoreState, miss: ScoreState },
}

/// The final answer for a state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WinEstimate {
    /// Probability that the team which just kicked wins.
    pub probability: f64,
    pub source: Source,
}

const SCORE_SLOTS: usize = KICKS_PER_TEAM as usize + 1;
const KICK_SLOTS: usize = MAX_KICKS as usize + 1;

/// Per-call cache of raw (unclamped) values, indexed like the table.
struct Memo {
    values: [[[Option<f64>; SCORE_SLOTS]; SCORE_SLOTS]; KICK_SLOTS],
}

impl Memo {
    fn new() -> Self {
        Memo {
            values: [[[None; SCORE_SLOTS]; SCORE_SLOTS]; KICK_SLOTS],
        }
    }

    fn slot(&mut self, state: ScoreState) -> &mut Option<f64> {
        &mut self.values[state.kicks_taken() as usize][state.team_1_score() as usize]
            [state.team_2_score() as usize]
    }
}

/// Resolves win probabilities against a borrowed, read-only table.
///
/// Cheap to construct and `Copy`; any number of shootouts may share one
/// table through their own resolvers.
#[derive(Debug, Clone, Copy)]
pub struct WinProbabilityResolver<'t> {
    table: &'t ProbabilityTable,
    config: ResolverConfig,
}

impl<'t> WinProbabilityResolver<'t> {
    pub fn new(table: &'t ProbabilityTable, config: ResolverConfig) -> Self {
        WinProbabilityResolver { table, config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn table(&self) -> &'t ProbabilityTable {
        self.table
    }

    /// Decides how `state` gets its value without recursing.
    pub fn classify(&self, state: ScoreState) -> Resolution {
        if let Some(winner) = state.decided_winner() {
            let probability = if winner == state.last_kicker() { 1.0 } else { 0.0 };
            return Resolution::Resolved {
                probability,
                source: Source::Eliminated,
            };
        }
        if state.is_regulation_tie() {
            return Resolution::Resolved {
                probability: REGULATION_TIE_PROBABILITY,
                source: Source::RegulationTie,
            };
        }
        if let Some(probability) = self.table.get(state) {
            return Resolution::Resolved {
                probability,
                source: Source::Empirical,
            };
        }
        Resolution::NeedsRecursion {
            make: state.after_kick(true),
            miss: state.after_kick(false),
        }
    }

    /// Probability that the team which just kicked to reach `state` wins.
    ///
    /// Decided states and the ten-kick tie are exact; every other value is
    /// clamped to `[floor, ceiling]`.
    pub fn resolve(&self, state: ScoreState) -> WinEstimate {
        let mut memo = Memo::new();
        match self.classify(state) {
            Resolution::Resolved {
                probability,
                source,
            } => WinEstimate {
                probability: if source.is_exact() {
                    probability
                } else {
                    self.clamp(probability)
                },
                source,
            },
            Resolution::NeedsRecursion { make, miss } => WinEstimate {
                probability: self.clamp(self.combine(make, miss, &mut memo)),
                source: Source::Simulated,
            },
        }
    }

    /// Unclamped value of `state` from the perspective of its last kicker.
    fn raw(&self, state: ScoreState, memo: &mut Memo) -> f64 {
        if let Some(p) = *memo.slot(state) {
            return p;
        }
        let p = match self.classify(state) {
            Resolution::Resolved { probability, .. } => probability,
            Resolution::NeedsRecursion { make, miss } => self.combine(make, miss, memo),
        };
        *memo.slot(state) = Some(p);
        p
    }

    /// Weighs the two outcomes of the next kick. Successor values belong to
    /// the next kicker, so the result is flipped back to the current one.
    fn combine(&self, make: ScoreState, miss: ScoreState, memo: &mut Memo) -> f64 {
        let m = self.config.make_probability;
        let next = m * self.raw(make, memo) + (1.0 - m) * self.raw(miss, memo);
        1.0 - next
    }

    fn clamp(&self, p: f64) -> f64 {
        if p >= self.config.ceiling {
            self.config.ceiling
        } else if p <= self.config.floor {
            self.config.floor
        } else {
            p
        }
    }
}
