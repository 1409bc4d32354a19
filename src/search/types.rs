//! Search result types.

use crate::model::RosterProblem;
use std::time::Duration;

/// Terminal outcome of a search run.
///
/// `Infeasible` and `Cancelled` are ordinary outcomes the caller
/// branches on, not error values: malformed input is rejected much
/// earlier, at model construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SearchStatus {
    /// The tree was fully explored and at least one solution was found.
    Feasible,
    /// The tree was fully explored and admits no solution.
    Infeasible,
    /// The search stopped early: solution bound reached, deadline
    /// exceeded, or external cancellation. Solutions found before the
    /// stop are still returned.
    Cancelled,
}

/// Counters accumulated during a search run, read-only afterwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchStats {
    /// Branches attempted (one per candidate train tried for a route).
    pub nodes: u64,
    /// Branches rejected by a constraint violation.
    pub conflicts: u64,
    /// Complete solutions yielded.
    pub solutions: u64,
    /// Wall-clock time spent searching.
    pub elapsed: Duration,
}

/// A complete, constraint-satisfying assignment of routes to trains.
///
/// Maps every route index to exactly one train index. Immutable once
/// emitted by the search.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Assignment {
    train_for_route: Vec<usize>,
}

impl Assignment {
    pub(crate) fn new(train_for_route: Vec<usize>) -> Self {
        Self { train_for_route }
    }

    /// The train performing the given route.
    pub fn train_of(&self, route: usize) -> usize {
        self.train_for_route[route]
    }

    /// Routes assigned to the given train, in route order.
    pub fn routes_of(&self, train: usize) -> Vec<usize> {
        self.train_for_route
            .iter()
            .enumerate()
            .filter(|&(_, &t)| t == train)
            .map(|(r, _)| r)
            .collect()
    }

    /// Number of routes covered (always the problem's full route count).
    pub fn num_routes(&self) -> usize {
        self.train_for_route.len()
    }

    /// The raw route-to-train mapping.
    pub fn train_for_route(&self) -> &[usize] {
        &self.train_for_route
    }

    /// The train's cumulative mileage after performing its assigned
    /// routes today.
    pub fn end_of_day_km(&self, problem: &RosterProblem, train: usize) -> i64 {
        let assigned: i64 = self
            .train_for_route
            .iter()
            .enumerate()
            .filter(|&(_, &t)| t == train)
            .map(|(r, _)| problem.routes()[r].length_km)
            .sum();
        problem.trains()[train].prior_km + assigned
    }
}
