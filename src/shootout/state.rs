//! Shootout state machine.
//!
//! Tracks one shootout kick by kick: scores, whose turn it is, whether the
//! result is already fixed, and the win probability of each team after every
//! kick.

use serde::Serialize;

use super::score::{ScoreState, KICKS_PER_TEAM, MAX_KICKS};
use super::team::{PerTeam, Team};
use crate::resolve::{Source, WinProbabilityResolver};

/// Win probability of each team before the first kick.
pub const INITIAL_PROBABILITY: f64 = 0.5;

/// Lifecycle of a shootout with respect to `kick()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Kicks remain and the result is open.
    InProgress,
    /// The trailing team can no longer catch up.
    Decided,
    /// All regulation kicks have been taken.
    Complete,
}

impl Status {
    /// Returns the protocol label.
    pub const fn label(self) -> &'static str {
        match self {
            Status::InProgress => "in_progress",
            Status::Decided => "decided",
            Status::Complete => "complete",
        }
    }
}

/// One recorded kick with the state it produced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KickRecord {
    /// 1-based kick number.
    pub kick: u8,
    pub team: Team,
    pub success: bool,
    pub scores: PerTeam<u8>,
    pub probabilities: PerTeam<f64>,
    pub source: Source,
    pub decided: bool,
}

/// Turn-by-turn state of a single shootout.
#[derive(Debug, Clone, PartialEq)]
pub struct ShootoutState {
    score: ScoreState,
    active_team: Team,
    is_decided: bool,
    probabilities: PerTeam<f64>,
    history: Vec<KickRecord>,
}

impl Default for ShootoutState {
    fn default() -> Self {
        Self::new()
    }
}

impl ShootoutState {
    /// Creates a shootout before its first kick.
    pub fn new() -> Self {
        ShootoutState {
            score: ScoreState::START,
            active_team: Team::Team1,
            is_decided: false,
            probabilities: PerTeam::splat(INITIAL_PROBABILITY),
            history: Vec::with_capacity(MAX_KICKS as usize),
        }
    }

    /// Returns every field to its initial value.
    pub fn reset(&mut self) {
        self.score = ScoreState::START;
        self.active_team = Team::Team1;
        self.is_decided = false;
        self.probabilities = PerTeam::splat(INITIAL_PROBABILITY);
        self.history.clear();
    }

    /// Records the active team's kick and updates win probabilities.
    ///
    /// Does nothing once the shootout is decided or all ten kicks are taken.
    pub fn kick(&mut self, success: bool, resolver: &WinProbabilityResolver<'_>) {
        if self.is_over() {
            log::debug!("kick ignored: shootout is over at {}", self.score);
            return;
        }

        let kicker = self.active_team;
        debug_assert_eq!(kicker, self.score.next_kicker());
        self.score = self.score.after_kick(success);

        // Once decided, always decided.
        self.is_decided = self.is_decided || self.score.is_decided();

        let estimate = resolver.resolve(self.score);
        self.probabilities[kicker] = estimate.probability;
        self.probabilities[kicker.other()] = 1.0 - estimate.probability;

        if self.is_decided {
            if let Some(winner) = self.score.decided_winner() {
                log::info!("shootout decided at {}: {} wins", self.score, winner);
            }
        }
        log::debug!(
            "kick {} by {} ({}): {} p={:.4} via {:?}",
            self.score.kicks_taken(),
            kicker,
            if success { "make" } else { "miss" },
            self.score,
            estimate.probability,
            estimate.source,
        );

        self.history.push(KickRecord {
            kick: self.score.kicks_taken(),
            team: kicker,
            success,
            scores: self.score.scores(),
            probabilities: self.probabilities,
            source: estimate.source,
            decided: self.is_decided,
        });

        self.active_team = kicker.other();
    }

    /// Returns true once `kick()` no longer changes anything.
    pub fn is_over(&self) -> bool {
        self.is_decided || self.score.kicks_taken() >= MAX_KICKS
    }

    pub fn status(&self) -> Status {
        if self.score.kicks_taken() >= MAX_KICKS {
            Status::Complete
        } else if self.is_decided {
            Status::Decided
        } else {
            Status::InProgress
        }
    }

    pub fn kicks_taken(&self) -> u8 {
        self.score.kicks_taken()
    }

    pub fn team_1_score(&self) -> u8 {
        self.score.team_1_score()
    }

    pub fn team_2_score(&self) -> u8 {
        self.score.team_2_score()
    }

    /// Goals scored by `team`.
    pub fn score_of(&self, team: Team) -> u8 {
        self.score.score(team)
    }

    /// The current `(kicks_taken, team_1_score, team_2_score)` triple.
    pub fn score_state(&self) -> ScoreState {
        self.score
    }

    /// The team to kick next.
    pub fn active_team(&self) -> Team {
        self.active_team
    }

    pub fn is_decided(&self) -> bool {
        self.is_decided
    }

    /// Last computed win probability of each team.
    pub fn per_team_probability(&self) -> PerTeam<f64> {
        self.probabilities
    }

    /// Last computed win probability of `team`.
    pub fn probability(&self, team: Team) -> f64 {
        self.probabilities[team]
    }

    /// Recorded kicks, oldest first.
    pub fn history(&self) -> &[KickRecord] {
        &self.history
    }

    /// Kicks `team` has attempted.
    pub fn kicks_attempted(&self, team: Team) -> u8 {
        self.score.kicks_by(team)
    }

    /// Regulation kicks `team` has left.
    pub fn kicks_remaining(&self, team: Team) -> u8 {
        KICKS_PER_TEAM - self.score.kicks_by(team)
    }

    /// Number of the kick about to be taken; stays at the last kick once
    /// all regulation kicks are in.
    pub fn next_kick_number(&self) -> u8 {
        (self.score.kicks_taken() + 1).min(MAX_KICKS)
    }

    /// The winning team once the result is fixed. A level score after ten
    /// kicks has no winner.
    pub fn winner(&self) -> Option<Team> {
        if self.is_decided {
            self.score.decided_winner()
        } else {
            None
        }
    }
}

/// A shootout session bound to a resolver, exposing `kick(success)` and
/// `reset()` without the caller threading the resolver through.
pub struct Shootout<'t> {
    state: ShootoutState,
    resolver: WinProbabilityResolver<'t>,
}

impl<'t> Shootout<'t> {
    pub fn new(resolver: WinProbabilityResolver<'t>) -> Self {
        Shootout {
            state: ShootoutState::new(),
            resolver,
        }
    }

    pub fn kick(&mut self, success: bool) {
        self.state.kick(success, &self.resolver);
    }

    pub fn reset(&mut self) {
        self.state.reset();
    }

    pub fn state(&self) -> &ShootoutState {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::{ProbabilityTable, ResolverConfig};

    fn play(table: &ProbabilityTable, kicks: &[bool]) -> ShootoutState {
        let resolver = WinProbabilityResolver::new(table, ResolverConfig::default());
        let mut state = ShootoutState::new();
        for &k in kicks {
            state.kick(k, &resolver);
        }
        state
    }

    #[test]
    fn initial_values() {
        let state = ShootoutState::new();
        assert_eq!(state.kicks_taken(), 0);
        assert_eq!(state.team_1_score(), 0);
        assert_eq!(state.team_2_score(), 0);
        assert_eq!(state.active_team(), Team::Team1);
        assert!(!state.is_decided());
        assert_eq!(state.per_team_probability(), PerTeam::splat(0.5));
        assert!(state.history().is_empty());
        assert_eq!(state.status(), Status::InProgress);
        assert_eq!(state.next_kick_number(), 1);
    }

    #[test]
    fn kick_updates_scores_and_alternates() {
        let table = ProbabilityTable::empty();
        let state = play(&table, &[true, false, true]);
        assert_eq!(state.kicks_taken(), 3);
        assert_eq!(state.team_1_score(), 2);
        assert_eq!(state.team_2_score(), 0);
        assert_eq!(state.active_team(), Team::Team2);
        assert_eq!(state.kicks_attempted(Team::Team1), 2);
        assert_eq!(state.kicks_attempted(Team::Team2), 1);
        assert_eq!(state.kicks_remaining(Team::Team1), 3);
        assert_eq!(state.kicks_remaining(Team::Team2), 4);
        assert_eq!(state.history().len(), 3);
        assert_eq!(state.history()[1].team, Team::Team2);
        assert!(!state.history()[1].success);
    }

    #[test]
    fn probabilities_sum_to_one_after_each_kick() {
        let table = ProbabilityTable::empty();
        let resolver = WinProbabilityResolver::new(&table, ResolverConfig::default());
        let mut state = ShootoutState::new();
        for k in [true, true, false, true, false, false, true, true] {
            state.kick(k, &resolver);
            let p = state.per_team_probability();
            assert_eq!(p.team_1 + p.team_2, 1.0);
        }
    }

    #[test]
    fn decided_shootout_ignores_kicks() {
        let table = ProbabilityTable::empty();
        let resolver = WinProbabilityResolver::new(&table, ResolverConfig::default());
        let mut state = ShootoutState::new();
        // 3-0 after six kicks.
        for k in [true, false, true, false, true, false] {
            state.kick(k, &resolver);
        }
        assert!(state.is_decided());
        assert_eq!(state.status(), Status::Decided);
        assert_eq!(state.winner(), Some(Team::Team1));
        assert_eq!(state.probability(Team::Team1), 1.0);
        assert_eq!(state.probability(Team::Team2), 0.0);

        let before = state.clone();
        state.kick(true, &resolver);
        state.kick(false, &resolver);
        assert_eq!(state, before);
    }

    #[test]
    fn complete_shootout_ignores_kicks() {
        let table = ProbabilityTable::empty();
        let resolver = WinProbabilityResolver::new(&table, ResolverConfig::default());
        let mut state = ShootoutState::new();
        for _ in 0..10 {
            state.kick(true, &resolver);
        }
        assert_eq!(state.kicks_taken(), 10);
        assert_eq!(state.status(), Status::Complete);
        assert!(!state.is_decided());
        assert_eq!(state.winner(), None);
        assert_eq!(state.per_team_probability(), PerTeam::splat(0.5));
        assert_eq!(state.next_kick_number(), 10);

        let before = state.clone();
        state.kick(true, &resolver);
        assert_eq!(state, before);
    }

    #[test]
    fn team_1_clinches_on_ninth_kick() {
        let table = ProbabilityTable::empty();
        let kicks = [true, true, true, true, true, false, true, true, true, true];
        let resolver = WinProbabilityResolver::new(&table, ResolverConfig::default());
        let mut state = ShootoutState::new();
        for (i, &k) in kicks.iter().enumerate() {
            state.kick(k, &resolver);
            if i < 8 {
                assert!(!state.is_decided(), "decided too early at kick {}", i + 1);
            }
        }
        // Kick 9 makes it 5-3 with team 2 on one kick left; kick 10 is ignored.
        assert!(state.is_decided());
        assert_eq!(state.kicks_taken(), 9);
        assert_eq!((state.team_1_score(), state.team_2_score()), (5, 3));
        assert_eq!(state.winner(), Some(Team::Team1));
        assert_eq!(state.probability(Team::Team1), 1.0);
        assert_eq!(state.history().len(), 9);
        assert_eq!(state.history()[8].source, Source::Eliminated);
    }

    #[test]
    fn reset_restores_initial_values() {
        let table = ProbabilityTable::empty();
        let mut state = play(&table, &[true, false, true, false, true, false]);
        state.reset();
        assert_eq!(state, ShootoutState::new());
    }

    #[test]
    fn session_handle_kicks_and_resets() {
        let table = ProbabilityTable::empty();
        let mut shootout = Shootout::new(WinProbabilityResolver::new(
            &table,
            ResolverConfig::default(),
        ));
        shootout.kick(true);
        shootout.kick(false);
        assert_eq!(shootout.state().kicks_taken(), 2);
        assert!(shootout.state().probability(Team::Team1) > 0.5);
        shootout.reset();
        assert_eq!(shootout.state().kicks_taken(), 0);
    }
}
