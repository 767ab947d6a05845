//! Score states and the elimination rule.
//!
//! A `ScoreState` is the triple `(kicks_taken, team_1_score, team_2_score)`
//! that keys the probability table. The elimination check here is shared by
//! the shootout state machine and the win-probability resolver.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::team::{PerTeam, Team, ALL_TEAMS};

/// Regulation kicks per team.
pub const KICKS_PER_TEAM: u8 = 5;

/// Regulation kicks in a shootout. No sudden death is modeled past this.
pub const MAX_KICKS: u8 = 2 * KICKS_PER_TEAM;

/// Errors for score triples that no legal kick sequence can produce.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScoreError {
    #[error("kicks taken {0} exceeds the regulation maximum of 10")]
    TooManyKicks(u8),

    #[error("scores {team_1}-{team_2} exceed {kicks} kicks taken")]
    ScoreExceedsKicks { kicks: u8, team_1: u8, team_2: u8 },

    #[error("{team} score {score} exceeds its {taken} kicks after {kicks} kicks")]
    TeamScoreExceedsKicks {
        team: Team,
        score: u8,
        taken: u8,
        kicks: u8,
    },
}

/// Goals and kicks taken by one team.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    pub score: u8,
    pub kicks_taken: u8,
}

impl Tally {
    /// Regulation kicks this team still has.
    pub const fn remaining(self) -> u8 {
        KICKS_PER_TEAM.saturating_sub(self.kicks_taken)
    }
}

/// Returns the team that has clinched the shootout, if any.
///
/// The trailing team is eliminated when even a perfect run of its remaining
/// regulation kicks cannot reach the leader's current score.
pub fn eliminated_winner(tallies: PerTeam<Tally>) -> Option<Team> {
    let t1 = tallies[Team::Team1];
    let t2 = tallies[Team::Team2];
    let diff = i16::from(t1.score) - i16::from(t2.score);
    if diff == 0 {
        return None;
    }
    let (leader, trailer) = if diff > 0 {
        (Team::Team1, Team::Team2)
    } else {
        (Team::Team2, Team::Team1)
    };
    if i16::from(tallies[trailer].remaining()) < diff.abs() {
        Some(leader)
    } else {
        None
    }
}

/// Score snapshot after `kicks_taken` kicks.
///
/// Only legal triples can be constructed, so every state indexes the
/// `[kicks][team_1][team_2]` arrays used by the table and resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawScore")]
pub struct ScoreState {
    kicks_taken: u8,
    team_1_score: u8,
    team_2_score: u8,
}

/// Unchecked wire form of a `ScoreState`.
#[derive(Deserialize)]
struct RawScore {
    kicks_taken: u8,
    team_1_score: u8,
    team_2_score: u8,
}

impl TryFrom<RawScore> for ScoreState {
    type Error = ScoreError;

    fn try_from(raw: RawScore) -> Result<Self, ScoreError> {
        ScoreState::new(raw.kicks_taken, raw.team_1_score, raw.team_2_score)
    }
}

impl ScoreState {
    /// The state before any kick.
    pub const START: ScoreState = ScoreState {
        kicks_taken: 0,
        team_1_score: 0,
        team_2_score: 0,
    };

    /// Creates a score state, rejecting triples no kick sequence can produce.
    pub fn new(kicks_taken: u8, team_1_score: u8, team_2_score: u8) -> Result<Self, ScoreError> {
        let state = ScoreState {
            kicks_taken,
            team_1_score,
            team_2_score,
        };
        state.validate()?;
        Ok(state)
    }

    fn validate(&self) -> Result<(), ScoreError> {
        let k = self.kicks_taken;
        if k > MAX_KICKS {
            return Err(ScoreError::TooManyKicks(k));
        }
        if u16::from(self.team_1_score) + u16::from(self.team_2_score) > u16::from(k) {
            return Err(ScoreError::ScoreExceedsKicks {
                kicks: k,
                team_1: self.team_1_score,
                team_2: self.team_2_score,
            });
        }
        for team in ALL_TEAMS {
            let taken = self.kicks_by(team);
            let score = self.score(team);
            if score > taken {
                return Err(ScoreError::TeamScoreExceedsKicks {
                    team,
                    score,
                    taken,
                    kicks: k,
                });
            }
        }
        Ok(())
    }

    pub const fn kicks_taken(&self) -> u8 {
        self.kicks_taken
    }

    pub const fn team_1_score(&self) -> u8 {
        self.team_1_score
    }

    pub const fn team_2_score(&self) -> u8 {
        self.team_2_score
    }

    /// Goals scored by `team`.
    pub const fn score(&self, team: Team) -> u8 {
        match team {
            Team::Team1 => self.team_1_score,
            Team::Team2 => self.team_2_score,
        }
    }

    /// Both scores as a pair.
    pub const fn scores(&self) -> PerTeam<u8> {
        PerTeam::new(self.team_1_score, self.team_2_score)
    }

    /// Kicks `team` has taken. `Team1` is one ahead on odd counts.
    pub const fn kicks_by(&self, team: Team) -> u8 {
        match team {
            Team::Team1 => self.kicks_taken.div_ceil(2),
            Team::Team2 => self.kicks_taken / 2,
        }
    }

    /// Regulation kicks `team` still has.
    pub const fn remaining(&self, team: Team) -> u8 {
        KICKS_PER_TEAM.saturating_sub(self.kicks_by(team))
    }

    fn tally(&self, team: Team) -> Tally {
        Tally {
            score: self.score(team),
            kicks_taken: self.kicks_by(team),
        }
    }

    /// Both teams' tallies.
    pub fn tallies(&self) -> PerTeam<Tally> {
        PerTeam::new(self.tally(Team::Team1), self.tally(Team::Team2))
    }

    /// The team that took the most recent kick.
    pub const fn last_kicker(&self) -> Team {
        Team::kicker_of(self.kicks_taken)
    }

    /// The team that takes the next kick.
    pub const fn next_kicker(&self) -> Team {
        Team::kicker_of(self.kicks_taken + 1)
    }

    /// Returns the winner if the shootout is mathematically decided.
    pub fn decided_winner(&self) -> Option<Team> {
        eliminated_winner(self.tallies())
    }

    /// Returns true if the trailing team can no longer catch up.
    pub fn is_decided(&self) -> bool {
        self.decided_winner().is_some()
    }

    /// Returns true for a level score after all regulation kicks.
    pub const fn is_regulation_tie(&self) -> bool {
        self.kicks_taken == MAX_KICKS && self.team_1_score == self.team_2_score
    }

    /// Returns true once no further kicks are accepted.
    pub fn is_over(&self) -> bool {
        self.kicks_taken >= MAX_KICKS || self.is_decided()
    }

    /// The state after the next kicker scores or misses.
    ///
    /// Once the shootout is over the state is returned unchanged, the same
    /// way `ShootoutState::kick` ignores late kicks.
    pub fn after_kick(&self, success: bool) -> ScoreState {
        if self.is_over() {
            return *self;
        }
        let mut next = ScoreState {
            kicks_taken: self.kicks_taken + 1,
            ..*self
        };
        if success {
            match self.next_kicker() {
                Team::Team1 => next.team_1_score += 1,
                Team::Team2 => next.team_2_score += 1,
            }
        }
        next
    }

    /// Table key in the `<kicks>_<team_1>_<team_2>` form.
    pub fn key(&self) -> String {
        format!(
            "{}_{}_{}",
            self.kicks_taken, self.team_1_score, self.team_2_score
        )
    }

    /// Parses a `<kicks>_<team_1>_<team_2>` table key.
    pub fn parse_key(key: &str) -> Option<(u8, u8, u8)> {
        let mut parts = key.split('_');
        let k = parts.next()?.parse().ok()?;
        let s1 = parts.next()?.parse().ok()?;
        let s2 = parts.next()?.parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some((k, s1, s2))
    }

    /// Every state reachable from the start by a legal kick sequence,
    /// including the start and decided terminal states, in order of
    /// increasing `kicks_taken`.
    pub fn reachable() -> Vec<ScoreState> {
        let mut seen = Vec::new();
        let mut queue = VecDeque::from([ScoreState::START]);
        while let Some(state) = queue.pop_front() {
            if seen.contains(&state) {
                continue;
            }
            seen.push(state);
            if state.is_over() {
                continue;
            }
            queue.push_back(state.after_kick(true));
            queue.push_back(state.after_kick(false));
        }
        seen
    }
}

impl fmt::Display for ScoreState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{} after {}",
            self.team_1_score, self.team_2_score, self.kicks_taken
        )
    }
}
