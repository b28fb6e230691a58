//! Route planning on the shared solver and the aircraft mission report.

use mission_config::{AircraftConfig, ObjectiveKind};
use mission_core::geo::GeoPoint;
use mission_solver::{
    Constraint, ConstraintReport, DecisionVariables, Direction, Objective, Solution, SolveStatus,
    SolverConfig, solve,
};
use serde::Serialize;

use crate::AircraftError;
use crate::constraints::{self, GeofenceConstraint, NoFlyZone, route_constraints};
use crate::model::{AircraftModel, ResolvedWaypoint, VehicleType, resolve_altitudes};
use crate::monte_carlo::{RobustnessSummary, run_monte_carlo};
use crate::simulate::{CrashReason, FlightLog, RoutePoint, simulate_route};
use crate::wind::CalmWind;

/// Partial route: the visiting order so far with per-leg speeds and the nominal flight.
#[derive(Debug, Clone)]
pub struct RouteState {
    /// Indices into the resolved waypoint list.
    pub order: Vec<usize>,
    pub speeds_ms: Vec<f64>,
    /// Resolved waypoints in visiting order.
    pub route: Vec<ResolvedWaypoint>,
    pub flight: FlightLog,
    /// Set when the nominal flight could not be simulated.
    pub simulation_error: Option<AircraftError>,
}

impl RouteState {
    /// Same order and speeds, flown as `flight`.
    pub fn with_flight(&self, flight: FlightLog) -> Self {
        Self {
            order: self.order.clone(),
            speeds_ms: self.speeds_ms.clone(),
            route: self.route.clone(),
            flight,
            simulation_error: None,
        }
    }
}

/// Next waypoint and the airspeed for the leg leading to it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteChoice {
    pub waypoint: usize,
    pub speed_ms: f64,
}

/// Visiting order plus per-leg speed. The route always starts at the first waypoint;
/// when that waypoint lies in a no-fly zone nothing can be planned.
pub struct RouteVariables {
    model: AircraftModel,
    waypoints: Vec<ResolvedWaypoint>,
    /// Waypoints inside a no-fly zone can never be visited.
    unreachable: Vec<bool>,
    fixed_order: bool,
}

impl RouteVariables {
    pub fn new(
        model: AircraftModel,
        waypoints: Vec<ResolvedWaypoint>,
        zones: &[NoFlyZone],
        fixed_order: bool,
    ) -> Self {
        let unreachable = waypoints
            .iter()
            .map(|wp| zones.iter().any(|zone| zone.contains(wp.position)))
            .collect();
        Self {
            model,
            waypoints,
            unreachable,
            fixed_order,
        }
    }

    fn state_for(&self, order: Vec<usize>, speeds_ms: Vec<f64>) -> RouteState {
        let route: Vec<ResolvedWaypoint> = order.iter().map(|&i| self.waypoints[i]).collect();
        let (flight, simulation_error) = if route.is_empty() {
            (FlightLog::default(), None)
        } else {
            match simulate_route(&self.model, &route, &speeds_ms, &CalmWind) {
                Ok(flight) => (flight, None),
                Err(err) => {
                    log::warn!("nominal simulation of {order:?} failed: {err}");
                    (FlightLog::default(), Some(err))
                }
            }
        };
        RouteState {
            order,
            speeds_ms,
            route,
            flight,
            simulation_error,
        }
    }
}

impl DecisionVariables for RouteVariables {
    type State = RouteState;
    type Choice = RouteChoice;

    fn initial_state(&self) -> RouteState {
        let order = match self.unreachable.first().copied() {
            Some(false) => vec![0],
            Some(true) => {
                log::warn!("start waypoint lies inside a no-fly zone");
                Vec::new()
            }
            None => Vec::new(),
        };
        self.state_for(order, Vec::new())
    }

    fn candidates(&self, state: &RouteState) -> Vec<RouteChoice> {
        if state.order.is_empty() {
            return Vec::new();
        }
        let next: Vec<usize> = if self.fixed_order {
            vec![state.order.len()]
        } else {
            (0..self.waypoints.len())
                .filter(|i| !state.order.contains(i))
                .collect()
        };
        next.into_iter()
            .filter(|&i| i < self.waypoints.len() && !self.unreachable[i])
            .flat_map(|waypoint| {
                self.model
                    .speed_options_ms
                    .iter()
                    .map(move |&speed_ms| RouteChoice { waypoint, speed_ms })
            })
            .collect()
    }

    fn apply(&self, state: &RouteState, choice: &RouteChoice) -> RouteState {
        let mut order = state.order.clone();
        let mut speeds_ms = state.speeds_ms.clone();
        order.push(choice.waypoint);
        speeds_ms.push(choice.speed_ms);
        self.state_for(order, speeds_ms)
    }

    fn is_complete(&self, state: &RouteState) -> bool {
        state.order.len() >= self.waypoints.len()
    }
}

/// Total nominal flight time of the route.
pub struct MinTime;

impl Objective<RouteState> for MinTime {
    fn name(&self) -> &str {
        "min_time"
    }

    fn direction(&self) -> Direction {
        Direction::Minimize
    }

    fn evaluate(&self, state: &RouteState) -> f64 {
        state.flight.planned_time_s
    }
}

/// Total nominal energy demand of the route.
pub struct MinEnergy;

impl Objective<RouteState> for MinEnergy {
    fn name(&self) -> &str {
        "min_energy"
    }

    fn direction(&self) -> Direction {
        Direction::Minimize
    }

    fn evaluate(&self, state: &RouteState) -> f64 {
        state.flight.planned_energy_j
    }
}

/// Solve for a visiting order and leg speeds.
pub fn plan_route(
    model: &AircraftModel,
    waypoints: &[ResolvedWaypoint],
    zones: &[NoFlyZone],
    fixed_order: bool,
    objective: ObjectiveKind,
    solver: &SolverConfig,
) -> Solution<RouteState, RouteChoice> {
    let variables = RouteVariables::new(model.clone(), waypoints.to_vec(), zones, fixed_order);
    let checks: Vec<Box<dyn Constraint<RouteState>>> = route_constraints(model, zones)
        .into_iter()
        .map(|check| check as Box<dyn Constraint<RouteState>>)
        .collect();
    let objective: Box<dyn Objective<RouteState>> = match objective {
        ObjectiveKind::MinTime => Box::new(MinTime),
        ObjectiveKind::MinEnergy => Box::new(MinEnergy),
    };
    solve(&variables, &checks, objective.as_ref(), solver)
}

/// Depletion block of the report.
#[derive(Debug, Clone, Serialize)]
pub struct CrashDepletion {
    pub occurred: bool,
    pub reason: CrashReason,
    pub at_position: GeoPoint,
    pub at_time_s: f64,
    pub segment_index: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AircraftChecks {
    /// Nominal flight finished without running dry.
    pub energy_ok: bool,
    pub endurance_respected: bool,
    pub maneuver_limits_ok: bool,
    pub geofence_violations: usize,
    pub altitude_within_envelope: bool,
}

/// Complete result of one aircraft planning invocation.
#[derive(Debug, Clone, Serialize)]
pub struct AircraftReport {
    pub vehicle_type: VehicleType,
    pub status: SolveStatus,
    pub objective: ObjectiveKind,
    pub model: AircraftModel,
    pub waypoints_corrected_altitude: Vec<ResolvedWaypoint>,
    pub visit_order: Vec<usize>,
    pub leg_speeds_ms: Vec<f64>,
    pub planned_route: Vec<RoutePoint>,
    pub energy_remaining_at_waypoints: Vec<f64>,
    pub crash_depletion: Option<CrashDepletion>,
    pub total_time_s: f64,
    pub total_energy: f64,
    pub constraint_checks: AircraftChecks,
    pub constraint_reports: Vec<ConstraintReport>,
    pub robustness: RobustnessSummary,
    /// Planned route in visiting order, for dense tracing.
    #[serde(skip)]
    pub route: Vec<ResolvedWaypoint>,
}

/// Plan, simulate and stress-test the configured aircraft mission.
pub fn plan_aircraft_mission(
    config: &AircraftConfig,
    solver: &SolverConfig,
) -> Result<AircraftReport, AircraftError> {
    let model = AircraftModel::from_config(config)?;
    let waypoints = resolve_altitudes(&model, &config.waypoints)?;
    let zones = constraints::zones_from_config(&config.no_fly_zones)?;

    let solution = plan_route(
        &model,
        &waypoints,
        &zones,
        config.fixed_order,
        config.objective,
        solver,
    );
    let state = &solution.state;
    let flight = &state.flight;
    let complete = state.order.len() == waypoints.len();

    let report_ok = |name: &str| {
        solution
            .reports
            .iter()
            .find(|r| r.name == name)
            .is_none_or(|r| r.result.feasible)
    };
    let geofence_violations = GeofenceConstraint {
        zones: zones.clone(),
    }
    .violations(state);
    let constraint_checks = AircraftChecks {
        energy_ok: !flight.crashed(),
        endurance_respected: report_ok(constraints::ENDURANCE),
        maneuver_limits_ok: report_ok(constraints::MANEUVER),
        geofence_violations,
        altitude_within_envelope: report_ok(constraints::ALTITUDE),
    };

    let robustness = if complete {
        let checks = route_constraints(&model, &zones);
        run_monte_carlo(&model, state, &checks, &config.monte_carlo)
    } else {
        log::warn!(
            "route incomplete ({} of {} waypoints); skipping robustness runs",
            state.order.len(),
            waypoints.len()
        );
        RobustnessSummary::default()
    };

    let energy_remaining_at_waypoints = flight
        .waypoint_points()
        .iter()
        .map(|p| (model.capacity_j - p.energy_used).max(0.0))
        .collect();
    let crash_depletion = flight.crash.map(|crash| CrashDepletion {
        occurred: true,
        reason: crash.reason,
        at_position: crash.at_position,
        at_time_s: crash.at_time_s,
        segment_index: crash.segment_index,
    });

    log::info!(
        "aircraft plan {:?}: {} legs, {:.0} s, {:.0} J{}",
        solution.status,
        flight.legs.len(),
        flight.total_time_s,
        flight.total_energy_j,
        if flight.crashed() { " (depleted)" } else { "" }
    );

    Ok(AircraftReport {
        vehicle_type: model.vehicle,
        status: solution.status,
        objective: config.objective,
        waypoints_corrected_altitude: waypoints,
        visit_order: state.order.clone(),
        leg_speeds_ms: state.speeds_ms.clone(),
        planned_route: flight.points.clone(),
        energy_remaining_at_waypoints,
        crash_depletion,
        total_time_s: flight.total_time_s,
        total_energy: flight.total_energy_j,
        constraint_checks,
        constraint_reports: solution.reports.clone(),
        robustness,
        route: state.route.clone(),
        model,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::SimulationConstraint;
    use mission_config::WaypointConfig;

    fn variables() -> RouteVariables {
        let config = AircraftConfig {
            waypoints: vec![
                WaypointConfig {
                    lat: 50.0,
                    lon: 10.0,
                    alt_m: None,
                },
                WaypointConfig {
                    lat: 50.1,
                    lon: 10.0,
                    alt_m: None,
                },
            ],
            ..AircraftConfig::default()
        };
        let model = AircraftModel::from_config(&config).unwrap();
        let waypoints = resolve_altitudes(&model, &config.waypoints).unwrap();
        RouteVariables::new(model, waypoints, &[], false)
    }

    #[test]
    fn failed_nominal_simulation_is_kept_on_the_state() {
        let variables = variables();
        let broken = variables.state_for(vec![0, 1], Vec::new());
        assert!(matches!(
            broken.simulation_error,
            Some(AircraftError::SpeedCountMismatch { speeds: 0, legs: 1 })
        ));
        assert!(!SimulationConstraint.check(&broken).feasible);

        let start = variables.initial_state();
        assert!(start.simulation_error.is_none());
        assert!(SimulationConstraint.check(&start).feasible);
    }

    #[test]
    fn empty_order_offers_no_candidates() {
        let variables = variables();
        let empty = variables.state_for(Vec::new(), Vec::new());
        assert!(empty.simulation_error.is_none());
        assert!(variables.candidates(&empty).is_empty());
        assert!(!variables.candidates(&variables.initial_state()).is_empty());
    }
}
