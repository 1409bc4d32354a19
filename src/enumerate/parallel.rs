//! Parallel enumeration over top-level branches.
//!
//! Each train that could take the first route roots an independent
//! subtree, explored by its own worker. Workers share only the found
//! counter enforcing the solution bound and a cancellation flag checked
//! at every node, so a hit bound may over-shoot by at most
//! (workers - 1) solutions. Branch results are merged in train order,
//! which keeps full enumeration identical to the sequential run.

use super::{Enumeration, Enumerator};
use crate::compile::CompiledProblem;
use crate::search::{Assignment, SearchConfig, SearchEngine, SearchStats, SearchStatus};
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

impl Enumerator {
    /// Runs the search with one worker per first-route train choice.
    ///
    /// Equivalent to [`Enumerator::run`] for exhaustive enumeration;
    /// with `max_solutions` set, the returned set may differ from the
    /// sequential prefix and may over-shoot the bound by up to
    /// (workers - 1) solutions.
    pub fn run_parallel(compiled: &CompiledProblem, config: &SearchConfig) -> Enumeration {
        if compiled.num_routes == 0
            || compiled.num_trains == 0
            || config.max_solutions == Some(0)
        {
            return Self::run(compiled, config);
        }

        let started = Instant::now();
        let found = AtomicUsize::new(0);
        let cancel = Arc::new(AtomicBool::new(false));

        let branches: Vec<(Vec<Assignment>, SearchStats, bool)> = (0..compiled.num_trains)
            .into_par_iter()
            .map(|train| {
                let engine = SearchEngine::new(compiled);
                let mut stream = engine.solutions_from_first_choice(
                    train,
                    config.deadline,
                    Some(Arc::clone(&cancel)),
                );
                let mut local = Vec::new();
                for assignment in stream.by_ref() {
                    local.push(assignment);
                    let so_far = found.fetch_add(1, Ordering::Relaxed) + 1;
                    if config.max_solutions.is_some_and(|bound| so_far >= bound) {
                        cancel.store(true, Ordering::Relaxed);
                        break;
                    }
                }
                (local, stream.stats(), stream.was_cancelled())
            })
            .collect();

        let mut assignments = Vec::new();
        let mut stats = SearchStats::default();
        let mut any_cancelled = false;
        for (local, branch_stats, cancelled) in branches {
            assignments.extend(local);
            stats.nodes += branch_stats.nodes;
            stats.conflicts += branch_stats.conflicts;
            stats.solutions += branch_stats.solutions;
            any_cancelled |= cancelled;
        }
        stats.elapsed = started.elapsed();

        let bound_reached = config
            .max_solutions
            .is_some_and(|bound| assignments.len() >= bound);
        let status = if any_cancelled || bound_reached {
            SearchStatus::Cancelled
        } else if assignments.is_empty() {
            SearchStatus::Infeasible
        } else {
            SearchStatus::Feasible
        };

        log::debug!(
            "parallel enumeration finished: {:?}, {} solution(s) across {} branches",
            status,
            assignments.len(),
            compiled.num_trains
        );

        Enumeration {
            status,
            assignments,
            stats,
        }
    }
}
