//! Rostering problem model.
//!
//! Owns the train and route tables, validates raw input, and derives
//! the conflict-pair set (routes whose operating windows overlap and
//! therefore cannot share a train). Instances are immutable once
//! constructed; the conflict set is computed once and cached.

use crate::time::TimeWindow;
use thiserror::Error;

/// Default end-of-day cumulative mileage cap per train, in km.
pub const DEFAULT_KM_CAP: i64 = 24_800;

/// Rejected input at model construction.
///
/// All variants are malformed-input conditions: they abort the
/// construction call and carry enough context to report which record
/// was bad. Search-space outcomes (infeasible, cancelled) are *not*
/// errors and are reported separately by the search layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// A route's start or end time string is not a valid `HH:MM` time.
    #[error("route {route}: malformed time of day {input:?} (expected HH:MM)")]
    MalformedTime { route: String, input: String },

    /// A route's length must be a positive number of kilometres.
    #[error("route {route}: non-positive length {length_km} km")]
    NonPositiveLength { route: String, length_km: i64 },

    /// A train's prior cumulative mileage must be non-negative.
    #[error("train {train}: negative prior mileage {prior_km} km")]
    NegativeMileage { train: String, prior_km: i64 },

    /// Train identifiers must be unique.
    #[error("duplicate train id {id}")]
    DuplicateTrain { id: String },

    /// Route identifiers must be unique.
    #[error("duplicate route id {id}")]
    DuplicateRoute { id: String },
}

/// A train in the fleet.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Train {
    /// Unique identifier.
    pub id: String,
    /// Cumulative kilometres accrued before today.
    pub prior_km: i64,
}

impl Train {
    /// Creates a train. Mileage is validated at problem construction.
    pub fn new(id: impl Into<String>, prior_km: i64) -> Self {
        Self {
            id: id.into(),
            prior_km,
        }
    }
}

/// A daily route to be covered by exactly one train.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Route {
    /// Unique identifier.
    pub id: String,
    /// Route length in kilometres.
    pub length_km: i64,
    /// Operating window; may wrap past midnight.
    pub window: TimeWindow,
}

impl Route {
    /// Creates a route from raw input fields.
    ///
    /// `start` and `end` are 24-hour `HH:MM` strings; an end before the
    /// start means the route runs past midnight.
    ///
    /// # Examples
    ///
    /// ```
    /// use u_rostering::model::Route;
    ///
    /// let r = Route::new("R11", 700, "05:00", "00:00").unwrap();
    /// assert!(r.window.wraps());
    ///
    /// assert!(Route::new("R99", 10, "25:00", "09:00").is_err());
    /// ```
    pub fn new(
        id: impl Into<String>,
        length_km: i64,
        start: &str,
        end: &str,
    ) -> Result<Self, ModelError> {
        let id = id.into();
        if length_km <= 0 {
            return Err(ModelError::NonPositiveLength {
                route: id,
                length_km,
            });
        }
        let window = match TimeWindow::parse(start, end) {
            Some(window) => window,
            None => {
                let input = if crate::time::parse_time_of_day(start).is_none() {
                    start
                } else {
                    end
                };
                return Err(ModelError::MalformedTime {
                    route: id,
                    input: input.to_string(),
                });
            }
        };
        Ok(Self {
            id,
            length_km,
            window,
        })
    }
}

/// A validated daily rostering problem.
///
/// Holds the fleet, the routes, and the mileage cap, plus the cached
/// set of conflicting route pairs. Construction fails with
/// [`ModelError`] on malformed input; a well-formed problem with no
/// feasible assignment is *not* an error here — the search reports
/// that as an infeasible outcome.
///
/// # Examples
///
/// ```
/// use u_rostering::model::{RosterProblem, Route, Train};
///
/// let trains = vec![Train::new("T1", 100), Train::new("T2", 200)];
/// let routes = vec![
///     Route::new("R1", 50, "06:00", "08:00").unwrap(),
///     Route::new("R2", 50, "07:00", "09:00").unwrap(),
/// ];
/// let problem = RosterProblem::new(trains, routes).unwrap();
/// assert_eq!(problem.conflicting_route_pairs(), &[(0, 1)]);
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RosterProblem {
    trains: Vec<Train>,
    routes: Vec<Route>,
    km_cap: i64,
    conflicts: Vec<(usize, usize)>,
}

impl RosterProblem {
    /// Creates a problem with the default mileage cap of
    /// [`DEFAULT_KM_CAP`] km.
    pub fn new(trains: Vec<Train>, routes: Vec<Route>) -> Result<Self, ModelError> {
        Self::with_cap(trains, routes, DEFAULT_KM_CAP)
    }

    /// Creates a problem with an explicit per-train mileage cap.
    pub fn with_cap(
        trains: Vec<Train>,
        routes: Vec<Route>,
        km_cap: i64,
    ) -> Result<Self, ModelError> {
        for (i, train) in trains.iter().enumerate() {
            if train.prior_km < 0 {
                return Err(ModelError::NegativeMileage {
                    train: train.id.clone(),
                    prior_km: train.prior_km,
                });
            }
            if trains[..i].iter().any(|t| t.id == train.id) {
                return Err(ModelError::DuplicateTrain {
                    id: train.id.clone(),
                });
            }
        }
        for (i, route) in routes.iter().enumerate() {
            if routes[..i].iter().any(|r| r.id == route.id) {
                return Err(ModelError::DuplicateRoute {
                    id: route.id.clone(),
                });
            }
        }

        let conflicts = derive_conflicts(&routes);
        Ok(Self {
            trains,
            routes,
            km_cap,
            conflicts,
        })
    }

    /// The fleet, in declaration order.
    pub fn trains(&self) -> &[Train] {
        &self.trains
    }

    /// The routes, in declaration order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Per-train end-of-day mileage cap in km.
    pub fn km_cap(&self) -> i64 {
        self.km_cap
    }

    /// Unordered pairs of route indices whose windows overlap.
    ///
    /// Each pair is reported once with the lower index first. Derived
    /// once at construction (O(R²)) and cached.
    pub fn conflicting_route_pairs(&self) -> &[(usize, usize)] {
        &self.conflicts
    }
}

fn derive_conflicts(routes: &[Route]) -> Vec<(usize, usize)> {
    let mut conflicts = Vec::new();
    for i in 0..routes.len() {
        for j in (i + 1)..routes.len() {
            if routes[i].window.overlaps(&routes[j].window) {
                conflicts.push((i, j));
            }
        }
    }
    conflicts
}

/// The 6-train / 8-route fleet from the reference data set, shared by
/// tests across the crate.
#[cfg(test)]
pub(crate) fn reference_problem() -> RosterProblem {
    let trains = vec![
        Train::new("T32", 24_300),
        Train::new("T11", 24_300),
        Train::new("T38", 24_200),
        Train::new("T28", 600),
        Train::new("T15", 200),
        Train::new("T24", 100),
    ];
    let routes = vec![
        Route::new("R11", 700, "05:00", "00:00").unwrap(),
        Route::new("R32", 600, "06:00", "00:50").unwrap(),
        Route::new("R16", 600, "05:20", "23:40").unwrap(),
        Route::new("R41", 10, "11:15", "12:30").unwrap(),
        Route::new("R42", 10, "11:45", "13:00").unwrap(),
        Route::new("R43", 10, "12:15", "13:30").unwrap(),
        Route::new("R44", 10, "12:45", "14:00").unwrap(),
        Route::new("R45", 10, "13:20", "14:35").unwrap(),
    ];
    RosterProblem::new(trains, routes).unwrap()
}
