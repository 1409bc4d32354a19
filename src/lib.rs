//! Daily fleet rostering as exhaustive constraint search.
//!
//! Assigns a fixed fleet of trains to a fixed set of daily routes,
//! subject to four constraint families, and enumerates every feasible
//! assignment:
//!
//! - **Coverage**: each route is performed by exactly one train.
//! - **Workload**: each train performs one or two routes per day.
//! - **Mileage**: a train's prior cumulative distance plus its assigned
//!   route lengths must stay within a cap.
//! - **Non-overlap**: two routes whose operating windows overlap in
//!   time (midnight wraparound included) cannot share a train.
//!
//! # Pipeline
//!
//! Raw train/route tables → [`model::RosterProblem`] (validation,
//! conflict-pair derivation) → [`compile::compile`] (boolean decision
//! variables and constraint clauses) → [`search::SearchEngine`]
//! (deterministic backtracking, lazy solution stream) →
//! [`enumerate::Enumerator`] (bounds, counters, terminal status).
//!
//! # Outcomes
//!
//! Malformed input fails at model construction with
//! [`model::ModelError`]. An exhausted tree with no solutions is the
//! *infeasible* outcome; a bound, deadline, or external flag stopping
//! the search early is the *cancelled* outcome — both are ordinary
//! [`search::SearchStatus`] values, never errors.
//!
//! # Features
//!
//! - `serde`: serialization derives on the public data types.
//! - `parallel`: rayon-backed enumeration splitting the search across
//!   top-level branches.

pub mod compile;
pub mod enumerate;
pub mod model;
pub mod search;
pub mod time;
