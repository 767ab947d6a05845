//! Shootout representation.
//!
//! Contains team identity, score states with the elimination rule, and the
//! kick-by-kick state machine.

pub mod score;
pub mod state;
pub mod team;

pub use score::{eliminated_winner, ScoreError, ScoreState, Tally, KICKS_PER_TEAM, MAX_KICKS};
pub use state::{KickRecord, Shootout, ShootoutState, Status, INITIAL_PROBABILITY};
pub use team::{PerTeam, Team, ALL_TEAMS};
