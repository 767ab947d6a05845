//! Win-probability resolution.
//!
//! Looks up the empirical table for a score state and falls back to
//! backward induction over the next kick when the table has no value.

pub mod resolver;
pub mod table;

pub use resolver::{
    Resolution, ResolverConfig, Source, WinEstimate, WinProbabilityResolver, DEFAULT_CEILING,
    DEFAULT_FLOOR, DEFAULT_MAKE_PROBABILITY, REGULATION_TIE_PROBABILITY,
};
pub use table::{Entry, ProbabilityTable, TableError};
