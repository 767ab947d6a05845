//! Spotkick -- a penalty shootout win-probability engine.
//!
//! This binary reads protocol commands from stdin and writes responses to
//! stdout. Logs go to stderr; set `RUST_LOG` to see them.

use std::io::{self, BufRead};

use spotkick::engine::Engine;
use spotkick::protocol::{parse_command, Command};

/// Runs the main protocol loop, reading commands from stdin and writing
/// responses to stdout.
fn main() -> io::Result<()> {
    env_logger::init();

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    let mut engine = Engine::new();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };

        let cmd = match parse_command(&line) {
            Some(c) => c,
            None => continue,
        };

        match cmd {
            Command::Spk => engine.handle_spk(&mut out)?,
            Command::IsReady => engine.handle_isready(&mut out)?,
            Command::SetOption { name, value } => engine.set_option(name, value),
            Command::Table { path } => engine.handle_table(&path, &mut out)?,
            Command::NewShootout => engine.new_shootout(),
            Command::Kick { success } => engine.handle_kick(success, &mut out)?,
            Command::Status => engine.handle_status(&mut out)?,
            Command::History => engine.handle_history(&mut out)?,
            Command::Quit => break,
        }
    }
    Ok(())
}
