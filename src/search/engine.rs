//! Backtracking search over the compiled constraint space.

use super::types::{Assignment, SearchStats};
use crate::compile::{CompiledProblem, Constraint, VarId};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Depth-first backtracking engine.
///
/// Digests a [`CompiledProblem`] into propagation tables once, then
/// hands out lazy [`Solutions`] iterators. Branching is fixed for
/// determinism: routes in declaration order, trains in ascending index
/// within a route, so identical input always yields the identical
/// ordered solution sequence.
///
/// The digestion reads the constraint families in their compiled roles:
/// the per-route `ExactlyOne` coverage clauses define the branching
/// scheme (each route receives exactly one train by construction),
/// `CountBetween` and `LinearCap` are keyed by the train their
/// variables belong to, and `Exclusion` clauses become a per-variable
/// adjacency list checked on every candidate placement.
pub struct SearchEngine {
    num_trains: usize,
    num_routes: usize,
    /// Per-train workload bounds.
    min_routes: Vec<usize>,
    max_routes: Vec<usize>,
    /// Per-train remaining mileage before any assignment (cap - base).
    slack_init: Vec<i64>,
    /// Per-variable mileage weight, indexed `train * num_routes + route`.
    weight: Vec<i64>,
    /// Per-variable list of variables it may not be true alongside.
    excluded: Vec<Vec<VarId>>,
}

impl SearchEngine {
    /// Builds the engine's propagation tables from a compiled problem.
    pub fn new(compiled: &CompiledProblem) -> Self {
        let num_trains = compiled.num_trains;
        let num_routes = compiled.num_routes;
        let mut min_routes = vec![0; num_trains];
        let mut max_routes = vec![num_routes; num_trains];
        let mut slack_init = vec![i64::MAX; num_trains];
        let mut weight = vec![0i64; num_trains * num_routes];
        let mut excluded = vec![Vec::new(); num_trains * num_routes];

        for constraint in &compiled.constraints {
            match constraint {
                Constraint::ExactlyOne { .. } => {
                    // Coverage is realized by the branching scheme itself:
                    // each route is assigned to exactly one train.
                }
                Constraint::CountBetween { vars, min, max } => {
                    if let Some(first) = vars.first() {
                        min_routes[first.train] = *min;
                        max_routes[first.train] = *max;
                    }
                }
                Constraint::LinearCap { terms, base, cap } => {
                    if let Some(&(first, _)) = terms.first() {
                        slack_init[first.train] = cap - base;
                    }
                    for &(var, w) in terms {
                        weight[var.train * num_routes + var.route] = w;
                    }
                }
                Constraint::Exclusion { first, second } => {
                    excluded[first.train * num_routes + first.route].push(*second);
                    excluded[second.train * num_routes + second.route].push(*first);
                }
            }
        }

        Self {
            num_trains,
            num_routes,
            min_routes,
            max_routes,
            slack_init,
            weight,
            excluded,
        }
    }

    /// A lazy iterator over every satisfying assignment, in branching
    /// order. The caller stops the search by dropping the iterator.
    pub fn solutions(&self) -> Solutions<'_> {
        self.solutions_with(None, None)
    }

    /// As [`solutions`](Self::solutions), with an optional wall-clock
    /// deadline and an optional external cancellation flag, both
    /// checked at every node.
    pub fn solutions_with(
        &self,
        deadline: Option<Duration>,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Solutions<'_> {
        let started = Instant::now();
        Solutions {
            engine: self,
            depth: 0,
            choice: vec![0; self.num_routes],
            next_try: vec![0; self.num_routes],
            count: vec![0; self.num_trains],
            slack: self.slack_init.clone(),
            deficit: self.min_routes.iter().sum(),
            at_leaf: false,
            finished: false,
            cancelled: false,
            started,
            deadline: deadline.map(|d| started + d),
            cancel,
            stats: SearchStats::default(),
        }
    }

    /// An iterator confined to the subtree where the first route is
    /// performed by `train`. Used to split the search across workers.
    #[cfg(feature = "parallel")]
    pub(crate) fn solutions_from_first_choice(
        &self,
        train: usize,
        deadline: Option<Duration>,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Solutions<'_> {
        debug_assert!(self.num_routes > 0 && train < self.num_trains);
        let mut solutions = self.solutions_with(deadline, cancel);
        solutions.stats.nodes += 1;
        if solutions.admissible(0, train) {
            solutions.place(0, train);
        } else {
            solutions.stats.conflicts += 1;
            solutions.finished = true;
        }
        // Exhaust the root's remaining candidates so the subtree ends
        // when the search retreats back to depth zero.
        solutions.next_try[0] = self.num_trains;
        solutions
    }
}

/// Lazy stream of satisfying assignments.
///
/// Pulling the next item resumes the depth-first search from where the
/// previous solution was emitted; no work happens between pulls. The
/// stream is finite and not restartable mid-way — obtain a fresh one
/// from the engine to search again.
pub struct Solutions<'e> {
    engine: &'e SearchEngine,
    /// Routes `[0, depth)` are assigned.
    depth: usize,
    /// Chosen train per route, valid below `depth`.
    choice: Vec<usize>,
    /// Next candidate train to try at each depth.
    next_try: Vec<usize>,
    /// Routes currently assigned per train.
    count: Vec<usize>,
    /// Remaining mileage per train.
    slack: Vec<i64>,
    /// Total routes still needed for trains below their minimum.
    deficit: usize,
    at_leaf: bool,
    finished: bool,
    cancelled: bool,
    started: Instant,
    deadline: Option<Instant>,
    cancel: Option<Arc<AtomicBool>>,
    stats: SearchStats,
}

impl Solutions<'_> {
    /// Counters accumulated so far.
    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    /// Whether the stream ended due to the deadline or the cancel flag.
    pub fn was_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Whether the decision tree has been fully explored.
    pub fn is_exhausted(&self) -> bool {
        self.finished && !self.cancelled
    }

    fn should_stop(&self) -> bool {
        if let Some(ref flag) = self.cancel {
            if flag.load(Ordering::Relaxed) {
                return true;
            }
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return true;
            }
        }
        false
    }

    /// Checks every constraint touching the variable (train, route)
    /// against the current partial assignment.
    fn admissible(&self, route: usize, train: usize) -> bool {
        let e = self.engine;

        // Workload upper bound.
        if self.count[train] >= e.max_routes[train] {
            return false;
        }

        // Mileage cap.
        let w = e.weight[train * e.num_routes + route];
        if self.slack[train] < w {
            return false;
        }

        // Workload lower bound: after this placement, the routes still
        // unassigned must suffice to bring every train to its minimum.
        let shortfall_drop = usize::from(self.count[train] < e.min_routes[train]);
        let remaining_after = e.num_routes - route - 1;
        if self.deficit - shortfall_drop > remaining_after {
            return false;
        }

        // Pairwise exclusions against already-assigned variables.
        for other in &e.excluded[train * e.num_routes + route] {
            if other.route < route && self.choice[other.route] == other.train {
                return false;
            }
        }

        true
    }

    fn place(&mut self, route: usize, train: usize) {
        let e = self.engine;
        if self.count[train] < e.min_routes[train] {
            self.deficit -= 1;
        }
        self.count[train] += 1;
        self.slack[train] -= e.weight[train * e.num_routes + route];
        self.choice[route] = train;
        self.depth += 1;
        if self.depth < e.num_routes {
            self.next_try[self.depth] = 0;
        }
    }

    /// Undoes the most recent placement; at the root, the tree is
    /// exhausted.
    fn retreat(&mut self) {
        if self.depth == 0 {
            self.finished = true;
            return;
        }
        self.depth -= 1;
        let route = self.depth;
        let train = self.choice[route];
        self.count[train] -= 1;
        if self.count[train] < self.engine.min_routes[train] {
            self.deficit += 1;
        }
        self.slack[train] += self.engine.weight[train * self.engine.num_routes + route];
    }

    fn advance(&mut self) -> Option<Assignment> {
        loop {
            if self.finished {
                return None;
            }
            if self.should_stop() {
                self.cancelled = true;
                self.finished = true;
                return None;
            }
            if self.depth == self.engine.num_routes {
                // A leaf with unmet minimums can only arise on an empty
                // route set; mid-search the lower-bound prune forbids it.
                if self.deficit > 0 {
                    self.retreat();
                    continue;
                }
                self.at_leaf = true;
                self.stats.solutions += 1;
                return Some(Assignment::new(self.choice.clone()));
            }
            let route = self.depth;
            let train = self.next_try[route];
            if train == self.engine.num_trains {
                self.retreat();
                continue;
            }
            self.next_try[route] = train + 1;
            self.stats.nodes += 1;
            if self.admissible(route, train) {
                self.place(route, train);
            } else {
                self.stats.conflicts += 1;
            }
        }
    }
}

impl Iterator for Solutions<'_> {
    type Item = Assignment;

    fn next(&mut self) -> Option<Assignment> {
        if self.finished {
            return None;
        }
        if self.at_leaf {
            // Resume past the previously emitted leaf.
            self.at_leaf = false;
            self.retreat();
        }
        let item = self.advance();
        self.stats.elapsed = self.started.elapsed();
        item
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::compile;
    use crate::model::{reference_problem, RosterProblem, Route, Train};

    fn assert_valid(problem: &RosterProblem, assignment: &Assignment) {
        assert_eq!(assignment.num_routes(), problem.routes().len());
        for train in 0..problem.trains().len() {
            let routes = assignment.routes_of(train);
            assert!(
                (1..=2).contains(&routes.len()),
                "train {train} carries {} routes",
                routes.len()
            );
            assert!(
                assignment.end_of_day_km(problem, train) <= problem.km_cap(),
                "train {train} exceeds the mileage cap"
            );
            for i in 0..routes.len() {
                for j in (i + 1)..routes.len() {
                    let pair = (routes[i], routes[j]);
                    assert!(
                        !problem.conflicting_route_pairs().contains(&pair),
                        "train {train} holds conflicting routes {pair:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_reference_first_solution() {
        let problem = reference_problem();
        let engine = SearchEngine::new(&compile(&problem));
        let first = engine.solutions().next().expect("reference is feasible");
        assert_valid(&problem, &first);

        // Deterministic branching pins the exact first leaf:
        // R11->T28, R32->T38, R16->T15, R41->T32, R42->T11, R43->T24,
        // R44->T32, R45->T11.
        assert_eq!(first.train_for_route(), &[3, 2, 4, 0, 1, 5, 0, 1]);
        assert_eq!(first.end_of_day_km(&problem, 2), 24_800); // T38 lands on the cap
    }

    #[test]
    fn test_reference_exhaustive_enumeration() {
        let problem = reference_problem();
        let engine = SearchEngine::new(&compile(&problem));
        let all: Vec<Assignment> = engine.solutions().collect();

        // Only {R41,R44} and {R42,R45} can share a train, which forces
        // six single-train groups; 3 trains can take R11, 3*2 remain
        // for R32/R16, and the three short groups permute over the
        // rest: 3 * 6 * 6 = 108.
        assert_eq!(all.len(), 108);
        for assignment in &all {
            assert_valid(&problem, assignment);
        }

        // No duplicates.
        let mut seen = all.clone();
        seen.sort_by(|a, b| a.train_for_route().cmp(b.train_for_route()));
        seen.dedup();
        assert_eq!(seen.len(), all.len());
    }

    #[test]
    fn test_deterministic_replay() {
        let compiled = compile(&reference_problem());
        let engine = SearchEngine::new(&compiled);
        let first_run: Vec<Assignment> = engine.solutions().collect();
        let second_run: Vec<Assignment> = engine.solutions().collect();
        assert_eq!(first_run, second_run);
    }

    #[test]
    fn test_zero_cap_is_infeasible() {
        let problem = reference_problem();
        let zeroed = RosterProblem::with_cap(
            problem.trains().to_vec(),
            problem.routes().to_vec(),
            0,
        )
        .unwrap();
        let engine = SearchEngine::new(&compile(&zeroed));
        let mut solutions = engine.solutions();
        assert!(solutions.next().is_none());
        assert!(solutions.is_exhausted());
        assert!(!solutions.was_cancelled());
        assert_eq!(solutions.stats().solutions, 0);
    }

    #[test]
    fn test_two_trains_two_routes_in_branch_order() {
        let problem = RosterProblem::new(
            vec![Train::new("T1", 0), Train::new("T2", 0)],
            vec![
                Route::new("R1", 10, "06:00", "08:00").unwrap(),
                Route::new("R2", 10, "09:00", "10:00").unwrap(),
            ],
        )
        .unwrap();
        let engine = SearchEngine::new(&compile(&problem));
        let all: Vec<Assignment> = engine.solutions().collect();

        // Both routes on one train would leave the other idle, so only
        // the two perfect matchings remain, in train-ascending order.
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].train_for_route(), &[0, 1]);
        assert_eq!(all[1].train_for_route(), &[1, 0]);
    }

    #[test]
    fn test_single_train_takes_disjoint_pair() {
        let trains = vec![Train::new("T1", 0)];
        let disjoint = RosterProblem::new(
            trains.clone(),
            vec![
                Route::new("R1", 10, "06:00", "08:00").unwrap(),
                Route::new("R2", 10, "09:00", "10:00").unwrap(),
            ],
        )
        .unwrap();
        let all: Vec<Assignment> = SearchEngine::new(&compile(&disjoint)).solutions().collect();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].train_for_route(), &[0, 0]);

        let overlapping = RosterProblem::new(
            trains,
            vec![
                Route::new("R1", 10, "06:00", "09:00").unwrap(),
                Route::new("R2", 10, "08:00", "10:00").unwrap(),
            ],
        )
        .unwrap();
        let engine = SearchEngine::new(&compile(&overlapping));
        let mut solutions = engine.solutions();
        assert!(solutions.next().is_none());
        assert!(solutions.is_exhausted());
    }

    #[test]
    fn test_workload_maximum_enforced() {
        // Three disjoint routes cannot fit on one train (max two).
        let problem = RosterProblem::new(
            vec![Train::new("T1", 0)],
            vec![
                Route::new("R1", 10, "06:00", "07:00").unwrap(),
                Route::new("R2", 10, "08:00", "09:00").unwrap(),
                Route::new("R3", 10, "10:00", "11:00").unwrap(),
            ],
        )
        .unwrap();
        let engine = SearchEngine::new(&compile(&problem));
        let mut solutions = engine.solutions();
        assert!(solutions.next().is_none());
    }

    #[test]
    fn test_stats_accumulate() {
        let engine = SearchEngine::new(&compile(&reference_problem()));
        let mut solutions = engine.solutions();
        while solutions.next().is_some() {}
        let stats = solutions.stats();
        assert_eq!(stats.solutions, 108);
        assert!(stats.nodes > stats.solutions);
        assert!(stats.conflicts > 0);
        assert!(stats.nodes >= stats.conflicts);
    }

    #[test]
    fn test_preset_cancel_flag() {
        let engine = SearchEngine::new(&compile(&reference_problem()));
        let cancel = Arc::new(AtomicBool::new(true));
        let mut solutions = engine.solutions_with(None, Some(cancel));
        assert!(solutions.next().is_none());
        assert!(solutions.was_cancelled());
        assert!(!solutions.is_exhausted());
    }

    #[test]
    fn test_zero_deadline_cancels() {
        let engine = SearchEngine::new(&compile(&reference_problem()));
        let mut solutions = engine.solutions_with(Some(Duration::ZERO), None);
        assert!(solutions.next().is_none());
        assert!(solutions.was_cancelled());
    }

    #[test]
    fn test_lazy_resume_yields_distinct_solutions() {
        let engine = SearchEngine::new(&compile(&reference_problem()));
        let mut solutions = engine.solutions();
        let a = solutions.next().unwrap();
        let b = solutions.next().unwrap();
        let c = solutions.next().unwrap();
        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_ne!(a, c);
        assert_eq!(solutions.stats().solutions, 3);
    }
}
