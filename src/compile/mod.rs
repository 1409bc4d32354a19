//! Constraint compilation.
//!
//! Translates a [`RosterProblem`](crate::model::RosterProblem) into one
//! boolean decision variable per (train, route) pair and four constraint
//! families over those variables:
//!
//! - **Coverage**: each route is performed by exactly one train.
//! - **Workload**: each train performs between [`MIN_ROUTES_PER_TRAIN`]
//!   and [`MAX_ROUTES_PER_TRAIN`] routes.
//! - **Mileage**: each train's prior mileage plus the lengths of its
//!   assigned routes stays within the cap, expressed as a bounded
//!   linear sum.
//! - **Non-overlap**: for every conflicting route pair, no single train
//!   may take both.
//!
//! The compiled form is independent of how the search stores or
//! propagates constraints; the engine digests it into its own tables.

use crate::model::RosterProblem;

/// Minimum routes every train must perform in a day.
pub const MIN_ROUTES_PER_TRAIN: usize = 1;

/// Maximum routes any train may perform in a day.
pub const MAX_ROUTES_PER_TRAIN: usize = 2;

/// A boolean decision variable: "train `train` performs route `route`".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VarId {
    /// Train index into the problem's fleet.
    pub train: usize,
    /// Route index into the problem's route table.
    pub route: usize,
}

impl VarId {
    /// Creates a variable for the given train/route indices.
    pub fn new(train: usize, route: usize) -> Self {
        Self { train, route }
    }
}

/// A constraint clause over the decision variables.
///
/// Stored abstractly; nothing here prescribes a propagation strategy.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Constraint {
    /// Exactly one of `vars` is true.
    ExactlyOne { vars: Vec<VarId> },

    /// Between `min` and `max` of `vars` are true (inclusive).
    CountBetween {
        vars: Vec<VarId>,
        min: usize,
        max: usize,
    },

    /// `base + Σ (var * weight)` over `terms` must not exceed `cap`.
    ///
    /// The bounded sum is the auxiliary end-of-day quantity: its domain
    /// is `[0, cap]`, which gives the search a per-train slack to
    /// propagate incrementally.
    LinearCap {
        terms: Vec<(VarId, i64)>,
        base: i64,
        cap: i64,
    },

    /// `first` and `second` cannot both be true.
    Exclusion { first: VarId, second: VarId },
}

/// The compiled variable/constraint space of one rostering problem.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CompiledProblem {
    /// Number of trains (variable rows).
    pub num_trains: usize,
    /// Number of routes (variable columns, also the branching order).
    pub num_routes: usize,
    /// All constraint clauses.
    pub constraints: Vec<Constraint>,
}

impl CompiledProblem {
    /// Total number of decision variables.
    pub fn var_count(&self) -> usize {
        self.num_trains * self.num_routes
    }

    /// Number of constraint clauses.
    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Validates a hand-built instance for consistency.
    ///
    /// [`compile`] always produces a valid instance; this check exists
    /// for compiled problems assembled manually.
    pub fn validate(&self) -> Result<(), String> {
        let in_range = |var: &VarId| var.train < self.num_trains && var.route < self.num_routes;
        for constraint in &self.constraints {
            match constraint {
                Constraint::ExactlyOne { vars } => {
                    if vars.is_empty() {
                        return Err("exactly-one over empty variable set".into());
                    }
                    for var in vars {
                        if !in_range(var) {
                            return Err(format!("variable out of range: {var:?}"));
                        }
                    }
                }
                Constraint::CountBetween { vars, min, max } => {
                    if min > max {
                        return Err(format!("count bounds inverted: min {min} > max {max}"));
                    }
                    if *min > vars.len() {
                        return Err(format!(
                            "count minimum {min} exceeds variable count {}",
                            vars.len()
                        ));
                    }
                    for var in vars {
                        if !in_range(var) {
                            return Err(format!("variable out of range: {var:?}"));
                        }
                    }
                }
                Constraint::LinearCap { terms, .. } => {
                    for (var, _) in terms {
                        if !in_range(var) {
                            return Err(format!("variable out of range: {var:?}"));
                        }
                    }
                }
                Constraint::Exclusion { first, second } => {
                    if !in_range(first) || !in_range(second) {
                        return Err(format!("variable out of range: {first:?} / {second:?}"));
                    }
                    if first == second {
                        return Err(format!("exclusion of a variable with itself: {first:?}"));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Compiles a problem into its variable set and constraint clauses.
///
/// Emission order is fixed: coverage (one per route, route order), then
/// workload and mileage (one each per train, train order), then
/// exclusions (conflict-pair order × train order). The search derives
/// its deterministic branching order from this.
pub fn compile(problem: &RosterProblem) -> CompiledProblem {
    let num_trains = problem.trains().len();
    let num_routes = problem.routes().len();
    let mut constraints = Vec::with_capacity(
        num_routes + 2 * num_trains + problem.conflicting_route_pairs().len() * num_trains,
    );

    // Coverage: each route is assigned to exactly one train.
    for route in 0..num_routes {
        constraints.push(Constraint::ExactlyOne {
            vars: (0..num_trains).map(|t| VarId::new(t, route)).collect(),
        });
    }

    // Workload: each train performs at least one, at most two routes.
    for train in 0..num_trains {
        constraints.push(Constraint::CountBetween {
            vars: (0..num_routes).map(|r| VarId::new(train, r)).collect(),
            min: MIN_ROUTES_PER_TRAIN,
            max: MAX_ROUTES_PER_TRAIN,
        });
    }

    // Mileage: prior km plus assigned route lengths stays within cap.
    for (train, t) in problem.trains().iter().enumerate() {
        constraints.push(Constraint::LinearCap {
            terms: problem
                .routes()
                .iter()
                .enumerate()
                .map(|(r, route)| (VarId::new(train, r), route.length_km))
                .collect(),
            base: t.prior_km,
            cap: problem.km_cap(),
        });
    }

    // Non-overlap: a conflicting route pair excludes itself per train.
    for &(r1, r2) in problem.conflicting_route_pairs() {
        for train in 0..num_trains {
            constraints.push(Constraint::Exclusion {
                first: VarId::new(train, r1),
                second: VarId::new(train, r2),
            });
        }
    }

    CompiledProblem {
        num_trains,
        num_routes,
        constraints,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::reference_problem;

    #[test]
    fn test_compile_reference_counts() {
        let problem = reference_problem();
        let compiled = compile(&problem);

        assert_eq!(compiled.num_trains, 6);
        assert_eq!(compiled.num_routes, 8);
        assert_eq!(compiled.var_count(), 48);

        let conflicts = problem.conflicting_route_pairs().len();
        // 8 coverage + 6 workload + 6 mileage + conflicts * 6 exclusions
        assert_eq!(compiled.constraint_count(), 8 + 6 + 6 + conflicts * 6);
        assert!(compiled.validate().is_ok());
    }

    #[test]
    fn test_coverage_spans_all_trains() {
        let compiled = compile(&reference_problem());
        let mut covered_routes = Vec::new();
        for constraint in &compiled.constraints {
            if let Constraint::ExactlyOne { vars } = constraint {
                assert_eq!(vars.len(), compiled.num_trains);
                let route = vars[0].route;
                assert!(vars.iter().all(|v| v.route == route));
                covered_routes.push(route);
            }
        }
        assert_eq!(covered_routes, (0..compiled.num_routes).collect::<Vec<_>>());
    }

    #[test]
    fn test_workload_bounds() {
        let compiled = compile(&reference_problem());
        let bounds: Vec<_> = compiled
            .constraints
            .iter()
            .filter_map(|c| match c {
                Constraint::CountBetween { vars, min, max } => Some((vars.len(), *min, *max)),
                _ => None,
            })
            .collect();
        assert_eq!(bounds.len(), 6);
        for (len, min, max) in bounds {
            assert_eq!(len, 8);
            assert_eq!(min, MIN_ROUTES_PER_TRAIN);
            assert_eq!(max, MAX_ROUTES_PER_TRAIN);
        }
    }

    #[test]
    fn test_mileage_terms_use_route_lengths() {
        let problem = reference_problem();
        let compiled = compile(&problem);
        for constraint in &compiled.constraints {
            if let Constraint::LinearCap { terms, base, cap } = constraint {
                assert_eq!(*cap, problem.km_cap());
                let train = terms[0].0.train;
                assert_eq!(*base, problem.trains()[train].prior_km);
                for (var, weight) in terms {
                    assert_eq!(var.train, train);
                    assert_eq!(*weight, problem.routes()[var.route].length_km);
                }
            }
        }
    }

    #[test]
    fn test_exclusions_are_per_train() {
        let problem = reference_problem();
        let compiled = compile(&problem);
        let exclusions: Vec<_> = compiled
            .constraints
            .iter()
            .filter_map(|c| match c {
                Constraint::Exclusion { first, second } => Some((*first, *second)),
                _ => None,
            })
            .collect();
        assert_eq!(
            exclusions.len(),
            problem.conflicting_route_pairs().len() * compiled.num_trains
        );
        for (first, second) in exclusions {
            assert_eq!(first.train, second.train);
            assert!(problem
                .conflicting_route_pairs()
                .contains(&(first.route, second.route)));
        }
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let compiled = CompiledProblem {
            num_trains: 2,
            num_routes: 2,
            constraints: vec![Constraint::ExactlyOne {
                vars: vec![VarId::new(5, 0)],
            }],
        };
        assert!(compiled.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_self_exclusion() {
        let compiled = CompiledProblem {
            num_trains: 1,
            num_routes: 1,
            constraints: vec![Constraint::Exclusion {
                first: VarId::new(0, 0),
                second: VarId::new(0, 0),
            }],
        };
        assert!(compiled.validate().is_err());
    }
}
