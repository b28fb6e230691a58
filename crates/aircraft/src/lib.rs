//! Aircraft mission planning: point-mass dynamics with energy depletion, route
//! constraints, the route planner and the Monte-Carlo robustness runner.

pub mod constraints;
pub mod model;
pub mod monte_carlo;
pub mod planner;
pub mod simulate;
pub mod wind;

use thiserror::Error;

pub use model::{AircraftModel, ResolvedWaypoint, VehicleType, resolve_altitudes};
pub use monte_carlo::{RobustnessSummary, run_monte_carlo, run_trials};
pub use planner::{AircraftReport, RouteState, plan_aircraft_mission, plan_route};
pub use simulate::{AircraftState, CrashEvent, CrashReason, FlightLog, simulate_route, trace_route};
pub use wind::{CalmWind, SampledWind, UniformWind, WindField, WindVector};

/// Errors raised while building an aircraft model or simulating a route.
#[derive(Debug, Clone, Error)]
pub enum AircraftError {
    #[error("waypoint {index} has invalid coordinates ({lat}, {lon})")]
    InvalidWaypoint { index: usize, lat: f64, lon: f64 },
    #[error("route has no waypoints")]
    EmptyRoute,
    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: f64 },
    #[error("altitude envelope is inverted: min {min} m above max {max} m")]
    InvertedEnvelope { min: f64, max: f64 },
    #[error("no-fly zone {index} needs at least three valid vertices")]
    DegenerateZone { index: usize },
    #[error("speed list has {speeds} entries for {legs} legs")]
    SpeedCountMismatch { speeds: usize, legs: usize },
    #[error("wind sample at t={t_s} s is not finite")]
    NonFiniteWind { t_s: f64 },
}
