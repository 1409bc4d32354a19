//! Depth-first backtracking search.
//!
//! [`SearchEngine`] digests a compiled problem into propagation tables
//! and hands out [`Solutions`] — a lazy, deterministic stream of
//! satisfying [`Assignment`]s that the caller pulls from. Dropping the
//! stream cancels the search; exhaustion with no solutions is the
//! infeasible outcome, reported by the enumerator as an ordinary
//! status, never as an error.

mod config;
mod engine;
mod types;

pub use config::SearchConfig;
pub use engine::{SearchEngine, Solutions};
pub use types::{Assignment, SearchStats, SearchStatus};
