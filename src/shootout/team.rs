//! Team identity and per-team storage.
//!
//! A shootout always has exactly two sides. `Team1` takes the odd-numbered
//! kicks (1st, 3rd, ...) and `Team2` the even-numbered ones.

use std::fmt;
use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

/// One of the two sides in a shootout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    #[serde(rename = "team_1")]
    Team1,
    #[serde(rename = "team_2")]
    Team2,
}

/// Both teams in kicking order.
pub const ALL_TEAMS: [Team; 2] = [Team::Team1, Team::Team2];

impl Team {
    /// Returns the opposing team.
    pub const fn other(self) -> Team {
        match self {
            Team::Team1 => Team::Team2,
            Team::Team2 => Team::Team1,
        }
    }

    /// Returns the team that takes the given 1-based kick number.
    ///
    /// Kick 0 maps to `Team2`, the side that would have kicked just before
    /// the opening kick.
    pub const fn kicker_of(kick_number: u8) -> Team {
        if kick_number % 2 == 1 {
            Team::Team1
        } else {
            Team::Team2
        }
    }

    /// Returns the protocol label (`team_1` / `team_2`).
    pub const fn label(self) -> &'static str {
        match self {
            Team::Team1 => "team_1",
            Team::Team2 => "team_2",
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A pair of values, one per team, indexed by `Team`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PerTeam<T> {
    pub team_1: T,
    pub team_2: T,
}

impl<T> PerTeam<T> {
    pub const fn new(team_1: T, team_2: T) -> Self {
        PerTeam { team_1, team_2 }
    }

    /// Returns the pair with the two slots exchanged.
    pub fn swapped(self) -> Self {
        PerTeam {
            team_1: self.team_2,
            team_2: self.team_1,
        }
    }
}

impl<T: Copy> PerTeam<T> {
    /// Creates a pair holding the same value for both teams.
    pub const fn splat(value: T) -> Self {
        PerTeam {
            team_1: value,
            team_2: value,
        }
    }
}

impl<T> Index<Team> for PerTeam<T> {
    type Output = T;

    fn index(&self, team: Team) -> &T {
        match team {
            Team::Team1 => &self.team_1,
            Team::Team2 => &self.team_2,
        }
    }
}

impl<T> IndexMut<Team> for PerTeam<T> {
    fn index_mut(&mut self, team: Team) -> &mut T {
        match team {
            Team::Team1 => &mut self.team_1,
            Team::Team2 => &mut self.team_2,
        }
    }
}
