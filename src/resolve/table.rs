//! Empirical win-probability table.
//!
//! Maps `(kicks_taken, team_1_score, team_2_score)` to the historical rate at
//! which the team that just kicked went on to win. States no historical
//! shootout reached are stored as unobserved.
//!
//! The on-disk artifact is a JSON object keyed by `"<kicks>_<team_1>_<team_2>"`:
//!
//! ```json
//! { "4_2_2": { "n_kicks_attempted": 4, "team_1_score": 2, "team_2_score": 2,
//!              "win_probability": 0.53 } }
//! ```
//!
//! `win_probability` may be `null`, `NaN`, or absent.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::shootout::score::{ScoreError, ScoreState, KICKS_PER_TEAM, MAX_KICKS};

const SCORE_SLOTS: usize = KICKS_PER_TEAM as usize + 1;
const KICK_SLOTS: usize = MAX_KICKS as usize + 1;

/// Errors raised while loading or validating a probability table.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse probability table JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed table key: '{0}'")]
    MalformedKey(String),

    #[error("entry '{key}' records {field} = {found}, key says {expected}")]
    KeyMismatch {
        key: String,
        field: &'static str,
        found: u8,
        expected: u8,
    },

    #[error("entry '{key}' is not a reachable score: {source}")]
    ImpossibleState {
        key: String,
        #[source]
        source: ScoreError,
    },

    #[error("entry '{key}' has win probability {value} outside [0, 1]")]
    InvalidProbability { key: String, value: f64 },

    #[error("no entry for reachable state '{0}'")]
    MissingEntry(String),
}

/// A table slot.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Entry {
    /// The key is not in the table.
    #[default]
    Missing,
    /// The key is present but no historical shootout reached this state.
    Unobserved,
    /// Historical win rate of the team that just kicked.
    Observed(f64),
}

impl Entry {
    /// The observed probability, if any.
    pub fn probability(self) -> Option<f64> {
        match self {
            Entry::Observed(p) => Some(p),
            Entry::Missing | Entry::Unobserved => None,
        }
    }
}

/// Raw JSON record for one key.
#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(default)]
    n_kicks_attempted: Option<u8>,
    #[serde(default)]
    team_1_score: Option<u8>,
    #[serde(default)]
    team_2_score: Option<u8>,
    #[serde(default)]
    win_probability: Option<f64>,
}

/// Read-only probability table indexed by score state.
///
/// Uses fixed-size arrays indexed by `[kicks][team_1][team_2]`; every legal
/// state fits since each team scores at most five.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilityTable {
    entries: [[[Entry; SCORE_SLOTS]; SCORE_SLOTS]; KICK_SLOTS],
    len: usize,
}

impl Default for ProbabilityTable {
    fn default() -> Self {
        Self::empty()
    }
}

impl ProbabilityTable {
    /// Creates a table with no entries; every lookup falls back to simulation.
    pub fn empty() -> Self {
        ProbabilityTable {
            entries: [[[Entry::Missing; SCORE_SLOTS]; SCORE_SLOTS]; KICK_SLOTS],
            len: 0,
        }
    }

    /// Builds a table from `(state, probability)` pairs. `None` marks a
    /// state that is present but unobserved.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (ScoreState, Option<f64>)>,
    {
        let mut table = ProbabilityTable::empty();
        for (state, p) in entries {
            table.insert(state, p);
        }
        table
    }

    /// Loads a table artifact from a JSON file.
    pub fn load(path: &Path) -> Result<Self, TableError> {
        let data = fs::read_to_string(path).map_err(|source| TableError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let table = Self::from_json(&data)?;
        log::info!(
            "loaded probability table from {} ({} entries)",
            path.display(),
            table.len()
        );
        Ok(table)
    }

    /// Parses a table artifact from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, TableError> {
        let cleaned = nan_to_null(json);
        let raw: HashMap<String, RawEntry> = serde_json::from_str(&cleaned)?;

        let mut table = ProbabilityTable::empty();
        for (key, entry) in raw {
            let (k, s1, s2) =
                ScoreState::parse_key(&key).ok_or_else(|| TableError::MalformedKey(key.clone()))?;
            check_field(&key, "n_kicks_attempted", entry.n_kicks_attempted, k)?;
            check_field(&key, "team_1_score", entry.team_1_score, s1)?;
            check_field(&key, "team_2_score", entry.team_2_score, s2)?;

            let state = ScoreState::new(k, s1, s2).map_err(|source| TableError::ImpossibleState {
                key: key.clone(),
                source,
            })?;

            let p = match entry.win_probability {
                Some(p) if !(0.0..=1.0).contains(&p) => {
                    return Err(TableError::InvalidProbability { key, value: p });
                }
                other => other,
            };
            table.insert(state, p);
        }
        Ok(table)
    }

    fn insert(&mut self, state: ScoreState, p: Option<f64>) {
        let slot = &mut self.entries[state.kicks_taken() as usize][state.team_1_score() as usize]
            [state.team_2_score() as usize];
        if *slot == Entry::Missing {
            self.len += 1;
        }
        *slot = match p {
            Some(p) => Entry::Observed(p),
            None => Entry::Unobserved,
        };
    }

    /// Returns the slot for `state`.
    pub fn entry(&self, state: ScoreState) -> Entry {
        self.entries
            .get(state.kicks_taken() as usize)
            .and_then(|row| row.get(state.team_1_score() as usize))
            .and_then(|col| col.get(state.team_2_score() as usize))
            .copied()
            .unwrap_or(Entry::Missing)
    }

    /// Returns the observed probability for `state`, if any.
    pub fn get(&self, state: ScoreState) -> Option<f64> {
        self.entry(state).probability()
    }

    /// Number of keys present, observed or not.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of keys with an observed probability.
    pub fn observed(&self) -> usize {
        self.entries
            .iter()
            .flatten()
            .flatten()
            .filter(|e| matches!(e, Entry::Observed(_)))
            .count()
    }

    /// Checks that every reachable, still-open state after at least one kick
    /// has a key. Decided states and the ten-kick tie never need one.
    pub fn check_complete(&self) -> Result<(), TableError> {
        for state in ScoreState::reachable() {
            if state.kicks_taken() == 0 || state.is_decided() || state.is_regulation_tie() {
                continue;
            }
            if self.entry(state) == Entry::Missing {
                return Err(TableError::MissingEntry(state.key()));
            }
        }
        Ok(())
    }
}

fn check_field(
    key: &str,
    field: &'static str,
    found: Option<u8>,
    expected: u8,
) -> Result<(), TableError> {
    match found {
        Some(found) if found != expected => Err(TableError::KeyMismatch {
            key: key.to_string(),
            field,
            found,
            expected,
        }),
        _ => Ok(()),
    }
}

/// Rewrites bare `NaN` tokens (written by the offline job for states with no
/// games) to `null`. String contents are left alone.
fn nan_to_null(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut rest = json;

    while let Some(c) = rest.chars().next() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
        } else if c == '"' {
            in_string = true;
        } else if rest.starts_with("NaN") {
            out.push_str("null");
            rest = &rest[3..];
            continue;
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }
    out
}
