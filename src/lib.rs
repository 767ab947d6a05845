//! Spotkick engine library.
//!
//! Exposes the shootout state machine, the win-probability resolver, the
//! protocol parser, and batch simulation for use by integration tests and the
//! binary entry points.

pub mod engine;
pub mod protocol;
pub mod resolve;
pub mod shootout;
pub mod simulate;
