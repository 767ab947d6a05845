//! Line protocol handling.
//!
//! Parses the one-command-per-line protocol the engine binary speaks on
//! stdin/stdout.

pub mod parser;

pub use parser::{parse_command, Command};
