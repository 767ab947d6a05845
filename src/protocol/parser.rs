//! Shootout protocol command parser.
//!
//! Parses incoming protocol lines into structured `Command` variants that the
//! main loop dispatches on.

/// A parsed client-to-engine command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Protocol handshake.
    Spk,

    /// Synchronization ping; engine must reply `readyok`.
    IsReady,

    /// Set an engine option: `setoption name <id> [value <x>]`.
    SetOption { name: String, value: Option<String> },

    /// Load a probability table artifact from a file path.
    Table { path: String },

    /// Reset the shootout to its initial state.
    NewShootout,

    /// Record the active team's kick.
    Kick { success: bool },

    /// Report the current shootout state.
    Status,

    /// Report every recorded kick as JSON.
    History,

    /// Terminate the engine process.
    Quit,
}

/// Parses a single line of input into a `Command`.
///
/// Returns `None` for empty lines or unrecognized commands. Malformed
/// arguments for known commands also return `None` after logging a warning.
pub fn parse_command(line: &str) -> Option<Command> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    let tokens: Vec<&str> = trimmed.split_whitespace().collect();

    match tokens[0] {
        "spk" => Some(Command::Spk),
        "isready" => Some(Command::IsReady),
        "quit" => Some(Command::Quit),
        "newshootout" => Some(Command::NewShootout),
        "status" => Some(Command::Status),
        "history" => Some(Command::History),

        "setoption" => parse_setoption(&tokens),
        "table" => parse_table(trimmed),
        "kick" => parse_kick(&tokens),

        other => {
            log::warn!("unknown command: {}", other);
            None
        }
    }
}

/// Parses `setoption name <id> [value <x>]`.
fn parse_setoption(tokens: &[&str]) -> Option<Command> {
    if tokens.len() < 3 || tokens[1] != "name" {
        log::warn!("malformed setoption: expected 'setoption name <id> [value <x>]'");
        return None;
    }

    let value_idx = tokens.iter().position(|&t| t == "value");

    let (name, value) = match value_idx {
        Some(vi) => {
            let name_parts = &tokens[2..vi];
            let value_parts = &tokens[vi + 1..];
            if name_parts.is_empty() {
                log::warn!("malformed setoption: empty name");
                return None;
            }
            let value = if value_parts.is_empty() {
                None
            } else {
                Some(value_parts.join(" "))
            };
            (name_parts.join(" "), value)
        }
        None => (tokens[2..].join(" "), None),
    };

    Some(Command::SetOption { name, value })
}

/// Parses `table <path>`. The path is the rest of the line and may contain
/// spaces.
fn parse_table(trimmed: &str) -> Option<Command> {
    let path = trimmed.strip_prefix("table").unwrap_or("").trim();
    if path.is_empty() {
        log::warn!("malformed table: expected 'table <path>'");
        return None;
    }
    Some(Command::Table {
        path: path.to_string(),
    })
}

/// Parses `kick <make|miss>`.
fn parse_kick(tokens: &[&str]) -> Option<Command> {
    if tokens.len() != 2 {
        log::warn!("malformed kick: expected 'kick <make|miss>'");
        return None;
    }
    let success = match tokens[1] {
        "make" | "goal" | "score" | "1" => true,
        "miss" | "save" | "0" => false,
        other => {
            log::warn!("malformed kick: unknown outcome '{}'", other);
            return None;
        }
    };
    Some(Command::Kick { success })
}
