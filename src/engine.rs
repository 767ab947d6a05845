//! Engine state management.
//!
//! Holds the probability table, engine options, and one shootout for a
//! protocol session, and writes protocol responses.

use std::collections::HashMap;
use std::io::{self, Write};
use std::path::Path;

use crate::resolve::{
    ProbabilityTable, ResolverConfig, TableError, WinProbabilityResolver, DEFAULT_CEILING,
    DEFAULT_FLOOR, DEFAULT_MAKE_PROBABILITY,
};
use crate::shootout::{ShootoutState, Team};

/// Holds the mutable state of the engine between commands.
pub struct Engine {
    table: ProbabilityTable,
    pub state: ShootoutState,
    options: HashMap<String, String>,
    config: ResolverConfig,
    strict_table: bool,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Creates an engine with an empty table, so every state is simulated.
    pub fn new() -> Self {
        Self::with_table(ProbabilityTable::empty())
    }

    /// Creates an engine over an already loaded table.
    pub fn with_table(table: ProbabilityTable) -> Self {
        Engine {
            table,
            state: ShootoutState::new(),
            options: HashMap::new(),
            config: ResolverConfig::default(),
            strict_table: true,
        }
    }

    pub fn table(&self) -> &ProbabilityTable {
        &self.table
    }

    /// Raw option values as last set.
    pub fn options(&self) -> &HashMap<String, String> {
        &self.options
    }

    /// Resolver calibration built from the options accepted so far.
    pub fn resolver_config(&self) -> ResolverConfig {
        self.config
    }

    /// Whether `table` requires every reachable state to have a key.
    pub fn strict_table(&self) -> bool {
        self.strict_table
    }

    /// Resets the shootout. The table and options are kept.
    pub fn new_shootout(&mut self) {
        self.state.reset();
    }

    /// Sets an engine option. Known options are validated here; a rejected
    /// value is logged and the previous setting stays in effect.
    pub fn set_option(&mut self, name: String, value: Option<String>) {
        let value = value.unwrap_or_default();
        match name.as_str() {
            "MakeProbability" => {
                if let Some(p) = parse_probability(&name, &value) {
                    self.config.make_probability = p;
                }
            }
            "ProbabilityFloor" => {
                if let Some(p) = parse_probability(&name, &value) {
                    self.set_bounds(p, self.config.ceiling);
                }
            }
            "ProbabilityCeiling" => {
                if let Some(p) = parse_probability(&name, &value) {
                    self.set_bounds(self.config.floor, p);
                }
            }
            "StrictTable" => match parse_check(&value) {
                Some(strict) => self.strict_table = strict,
                None => log::warn!("ignoring StrictTable = '{}': expected true or false", value),
            },
            _ => log::debug!("storing unrecognized option {}", name),
        }
        self.options.insert(name, value);
    }

    fn set_bounds(&mut self, floor: f64, ceiling: f64) {
        if floor > ceiling {
            log::warn!(
                "ignoring probability bounds [{}, {}]: floor above ceiling",
                floor,
                ceiling
            );
            return;
        }
        self.config.floor = floor;
        self.config.ceiling = ceiling;
    }

    /// Loads and installs a table artifact, returning its entry count.
    /// On failure the current table stays in place.
    pub fn load_table(&mut self, path: &Path) -> Result<usize, TableError> {
        let table = ProbabilityTable::load(path)?;
        if self.strict_table {
            table.check_complete()?;
        }
        let len = table.len();
        self.table = table;
        self.state.reset();
        Ok(len)
    }

    /// Records a kick by the active team.
    pub fn kick(&mut self, success: bool) {
        let resolver = WinProbabilityResolver::new(&self.table, self.config);
        self.state.kick(success, &resolver);
    }

    /// Handles the protocol handshake: writes id, options, protocol_version,
    /// and spkok.
    pub fn handle_spk<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "id name spotkick")?;
        writeln!(out, "id author spotkick")?;
        writeln!(
            out,
            "option name MakeProbability type float default {} min 0 max 1",
            DEFAULT_MAKE_PROBABILITY
        )?;
        writeln!(
            out,
            "option name ProbabilityFloor type float default {} min 0 max 1",
            DEFAULT_FLOOR
        )?;
        writeln!(
            out,
            "option name ProbabilityCeiling type float default {} min 0 max 1",
            DEFAULT_CEILING
        )?;
        writeln!(out, "option name StrictTable type check default true")?;
        writeln!(out, "protocol_version 1")?;
        writeln!(out, "spkok")?;
        out.flush()
    }

    /// Handles the `isready` command.
    pub fn handle_isready<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "readyok")?;
        out.flush()
    }

    /// Handles `table <path>`.
    pub fn handle_table<W: Write>(&mut self, path: &str, out: &mut W) -> io::Result<()> {
        match self.load_table(Path::new(path)) {
            Ok(len) => writeln!(out, "tableok {}", len)?,
            Err(e) => {
                log::error!("table load failed: {}", e);
                writeln!(out, "error {}", e)?;
            }
        }
        out.flush()
    }

    /// Handles `kick <outcome>`: records the kick and reports the new state,
    /// or `over` when the shootout no longer accepts kicks.
    pub fn handle_kick<W: Write>(&mut self, success: bool, out: &mut W) -> io::Result<()> {
        if self.state.is_over() {
            writeln!(out, "over")?;
            return out.flush();
        }
        self.kick(success);
        writeln!(out, "{}", status_line("kick", &self.state))?;
        out.flush()
    }

    /// Handles `status`.
    pub fn handle_status<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "{}", status_line("status", &self.state))?;
        out.flush()
    }

    /// Handles `history`: every recorded kick as one JSON array.
    pub fn handle_history<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let json = serde_json::to_string(self.state.history()).map_err(io::Error::other)?;
        writeln!(out, "history {}", json)?;
        out.flush()
    }
}

/// Parses a probability option value, logging and returning `None` when it
/// is not a number in [0, 1].
fn parse_probability(name: &str, raw: &str) -> Option<f64> {
    match raw.parse::<f64>() {
        Ok(v) if (0.0..=1.0).contains(&v) => Some(v),
        _ => {
            log::warn!("ignoring {} = '{}': expected a number in [0, 1]", name, raw);
            None
        }
    }
}

/// Parses a `check` option value, ignoring ASCII case.
fn parse_check(raw: &str) -> Option<bool> {
    const TRUE: [&str; 3] = ["true", "1", "on"];
    const FALSE: [&str; 3] = ["false", "0", "off"];
    if TRUE.iter().any(|t| raw.eq_ignore_ascii_case(t)) {
        Some(true)
    } else if FALSE.iter().any(|f| raw.eq_ignore_ascii_case(f)) {
        Some(false)
    } else {
        None
    }
}

/// Formats the one-line state report used by `kick` and `status`.
pub fn status_line(tag: &str, state: &ShootoutState) -> String {
    let p = state.per_team_probability();
    let mut line = format!(
        "{} kicks {} score {} {} active {} prob {:.4} {:.4} state {}",
        tag,
        state.kicks_taken(),
        state.score_of(Team::Team1),
        state.score_of(Team::Team2),
        state.active_team(),
        p.team_1,
        p.team_2,
        state.status().label(),
    );
    if let Some(winner) = state.winner() {
        line.push_str(&format!(" winner {}", winner));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shootout::score::ScoreState;

    fn output<F: FnOnce(&mut Vec<u8>) -> io::Result<()>>(f: F) -> String {
        let mut out = Vec::new();
        f(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn new_engine_starts_fresh() {
        let engine = Engine::new();
        assert!(engine.table().is_empty());
        assert_eq!(engine.state, ShootoutState::new());
        assert!(engine.options.is_empty());
    }

    #[test]
    fn handle_spk_outputs_handshake() {
        let engine = Engine::new();
        let text = output(|out| engine.handle_spk(out));
        assert!(text.contains("id name spotkick"));
        assert!(text.contains("option name MakeProbability type float default 0.690625"));
        assert!(text.contains("protocol_version 1"));
        assert_eq!(text.lines().last(), Some("spkok"));
    }

    #[test]
    fn handle_isready_outputs_readyok() {
        let engine = Engine::new();
        assert_eq!(output(|out| engine.handle_isready(out)).trim(), "readyok");
    }

    #[test]
    fn options_feed_resolver_config() {
        let mut engine = Engine::new();
        assert_eq!(engine.resolver_config(), ResolverConfig::default());

        engine.set_option("MakeProbability".to_string(), Some("0.7".to_string()));
        engine.set_option("ProbabilityFloor".to_string(), Some("0.1".to_string()));
        let config = engine.resolver_config();
        assert_eq!(config.make_probability, 0.7);
        assert_eq!(config.floor, 0.1);
        assert_eq!(config.ceiling, DEFAULT_CEILING);
    }

    #[test]
    fn rejected_options_keep_previous_setting() {
        let mut engine = Engine::new();
        engine.set_option("MakeProbability".to_string(), Some("lots".to_string()));
        engine.set_option("ProbabilityCeiling".to_string(), Some("1.5".to_string()));
        assert_eq!(engine.resolver_config(), ResolverConfig::default());

        engine.set_option("MakeProbability".to_string(), Some("0.8".to_string()));
        engine.set_option("MakeProbability".to_string(), Some("-1".to_string()));
        assert_eq!(engine.resolver_config().make_probability, 0.8);

        engine.set_option("ProbabilityFloor".to_string(), Some("0.9".to_string()));
        engine.set_option("ProbabilityCeiling".to_string(), Some("0.2".to_string()));
        let config = engine.resolver_config();
        assert_eq!(config.floor, 0.9);
        assert_eq!(config.ceiling, DEFAULT_CEILING);
        // The raw value is still recorded.
        assert_eq!(engine.options().get("ProbabilityCeiling"), Some(&"0.2".to_string()));
    }

    #[test]
    fn config_is_fixed_between_option_changes() {
        let mut engine = Engine::new();
        engine.set_option("MakeProbability".to_string(), Some("bad".to_string()));
        let before = engine.resolver_config();
        for success in [true, false, true] {
            engine.kick(success);
        }
        assert_eq!(engine.resolver_config(), before);
        assert_eq!(engine.state.kicks_taken(), 3);
    }

    #[test]
    fn strict_table_option_ignores_case() {
        let mut engine = Engine::new();
        assert!(engine.strict_table());
        for value in ["False", "OFF", "0"] {
            engine.set_option("StrictTable".to_string(), Some(value.to_string()));
            assert!(!engine.strict_table(), "{}", value);
            engine.set_option("StrictTable".to_string(), Some("TRUE".to_string()));
            assert!(engine.strict_table());
        }
        engine.set_option("StrictTable".to_string(), Some("maybe".to_string()));
        assert!(engine.strict_table());
        engine.set_option("StrictTable".to_string(), None);
        assert!(engine.strict_table());
    }

    #[test]
    fn kick_reports_status_line() {
        let mut engine = Engine::new();
        let text = output(|out| engine.handle_kick(true, out));
        assert!(text.starts_with("kick kicks 1 score 1 0 active team_2 prob "));
        assert!(text.trim_end().ends_with("state in_progress"));
    }

    #[test]
    fn kicks_after_decision_report_over() {
        let mut engine = Engine::new();
        for success in [true, false, true, false, true, false] {
            engine.kick(success);
        }
        let text = output(|out| engine.handle_status(out));
        assert_eq!(
            text.trim(),
            "status kicks 6 score 3 0 active team_1 prob 1.0000 0.0000 state decided winner team_1"
        );
        assert_eq!(output(|out| engine.handle_kick(true, out)).trim(), "over");
        assert_eq!(engine.state.kicks_taken(), 6);
    }

    #[test]
    fn history_is_json() {
        let mut engine = Engine::new();
        engine.kick(true);
        engine.kick(false);
        let text = output(|out| engine.handle_history(out));
        let json = text.trim().strip_prefix("history ").unwrap();
        let value: serde_json::Value = serde_json::from_str(json).unwrap();
        let kicks = value.as_array().unwrap();
        assert_eq!(kicks.len(), 2);
        assert_eq!(kicks[0]["team"], "team_1");
        assert_eq!(kicks[0]["success"], true);
        assert_eq!(kicks[1]["scores"]["team_1"], 1);
        assert_eq!(kicks[1]["source"], "simulated");
    }

    #[test]
    fn strict_table_load_rejects_incomplete_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.json");
        std::fs::write(&path, r#"{"1_1_0": {"win_probability": 0.6}}"#).unwrap();

        let mut engine = Engine::new();
        engine.kick(true);
        assert!(matches!(
            engine.load_table(&path),
            Err(TableError::MissingEntry(_))
        ));
        // Failed load keeps the session untouched.
        assert!(engine.table().is_empty());
        assert_eq!(engine.state.kicks_taken(), 1);

        engine.set_option("StrictTable".to_string(), Some("false".to_string()));
        assert_eq!(engine.load_table(&path).unwrap(), 1);
        assert_eq!(engine.state.kicks_taken(), 0);
        assert_eq!(engine.table().get(ScoreState::new(1, 1, 0).unwrap()), Some(0.6));
    }

    #[test]
    fn table_command_reports_errors() {
        let mut engine = Engine::new();
        let text = output(|out| engine.handle_table("/nonexistent/table.json", out));
        assert!(text.starts_with("error failed to read /nonexistent/table.json"));
    }
}
