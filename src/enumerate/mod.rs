//! Solution enumeration.
//!
//! Drives the search engine under a caller-supplied bound, collects the
//! assignments it produces, and reports the terminal status together
//! with the run's counters. Presentation of solutions belongs to the
//! caller: pass an observer to stream assignments as they are found.

#[cfg(feature = "parallel")]
mod parallel;

use crate::compile::CompiledProblem;
use crate::search::{Assignment, SearchConfig, SearchEngine, SearchStats, SearchStatus};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Outcome of one enumeration run.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Enumeration {
    /// Terminal status: feasible, infeasible, or cancelled.
    pub status: SearchStatus,
    /// Every assignment found, in emission order.
    pub assignments: Vec<Assignment>,
    /// Counters accumulated during the run.
    pub stats: SearchStats,
}

/// Executes search runs against a compiled problem.
///
/// # Examples
///
/// ```
/// use u_rostering::compile::compile;
/// use u_rostering::enumerate::Enumerator;
/// use u_rostering::model::{RosterProblem, Route, Train};
/// use u_rostering::search::{SearchConfig, SearchStatus};
///
/// let problem = RosterProblem::new(
///     vec![Train::new("T1", 0), Train::new("T2", 0)],
///     vec![
///         Route::new("R1", 10, "06:00", "08:00").unwrap(),
///         Route::new("R2", 10, "09:00", "10:00").unwrap(),
///     ],
/// )
/// .unwrap();
///
/// let result = Enumerator::run(&compile(&problem), &SearchConfig::default());
/// assert_eq!(result.status, SearchStatus::Feasible);
/// assert_eq!(result.assignments.len(), 2);
/// ```
pub struct Enumerator;

impl Enumerator {
    /// Runs the search until exhaustion or the configured bound.
    pub fn run(compiled: &CompiledProblem, config: &SearchConfig) -> Enumeration {
        Self::run_inner(compiled, config, None, |_| {})
    }

    /// Runs with an external cancellation flag, checked at every node.
    pub fn run_with_cancel(
        compiled: &CompiledProblem,
        config: &SearchConfig,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Enumeration {
        Self::run_inner(compiled, config, cancel, |_| {})
    }

    /// Runs with an observer invoked once per assignment as it is
    /// found, before the run completes. The assignment is still
    /// collected into the returned [`Enumeration`].
    pub fn run_with_observer<F>(
        compiled: &CompiledProblem,
        config: &SearchConfig,
        on_solution: F,
    ) -> Enumeration
    where
        F: FnMut(&Assignment),
    {
        Self::run_inner(compiled, config, None, on_solution)
    }

    fn run_inner<F>(
        compiled: &CompiledProblem,
        config: &SearchConfig,
        cancel: Option<Arc<AtomicBool>>,
        mut on_solution: F,
    ) -> Enumeration
    where
        F: FnMut(&Assignment),
    {
        debug_assert!(compiled.validate().is_ok(), "invalid compiled problem");

        let engine = SearchEngine::new(compiled);
        let mut stream = engine.solutions_with(config.deadline, cancel);
        let mut assignments = Vec::new();
        loop {
            if let Some(bound) = config.max_solutions {
                if assignments.len() >= bound {
                    break;
                }
            }
            match stream.next() {
                Some(assignment) => {
                    on_solution(&assignment);
                    assignments.push(assignment);
                }
                None => break,
            }
        }

        let bound_reached = config
            .max_solutions
            .is_some_and(|bound| assignments.len() >= bound);
        let status = if stream.was_cancelled() || bound_reached {
            SearchStatus::Cancelled
        } else if assignments.is_empty() {
            SearchStatus::Infeasible
        } else {
            SearchStatus::Feasible
        };
        let stats = stream.stats();

        log::debug!(
            "enumeration finished: {:?}, {} solution(s), {} nodes, {} conflicts in {:?}",
            status,
            stats.solutions,
            stats.nodes,
            stats.conflicts,
            stats.elapsed
        );

        Enumeration {
            status,
            assignments,
            stats,
        }
    }
}
