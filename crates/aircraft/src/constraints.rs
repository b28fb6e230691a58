//! Route constraints evaluated on a [`RouteState`].

use mission_config::NoFlyZoneConfig;
use mission_core::geo::{self, GeoPoint};
use mission_solver::{Constraint, ConstraintKind, ConstraintResult};
use serde::Serialize;

use crate::AircraftError;
use crate::model::AircraftModel;
use crate::planner::RouteState;

pub const ENDURANCE: &str = "endurance";
pub const MANEUVER: &str = "maneuver";
pub const GEOFENCE: &str = "geofence";
pub const ALTITUDE: &str = "altitude";
pub const SIMULATION: &str = "simulation";

/// Constraints shared by the planner and the robustness trials.
pub type RouteConstraint = Box<dyn Constraint<RouteState> + Send + Sync>;

/// Every check a flown route must pass.
pub fn route_constraints(model: &AircraftModel, zones: &[NoFlyZone]) -> Vec<RouteConstraint> {
    vec![
        Box::new(SimulationConstraint),
        Box::new(EnduranceConstraint {
            capacity_j: model.capacity_j,
        }),
        Box::new(ManeuverConstraint {
            max_turn_rate_deg_s: model.max_turn_rate_deg_s,
        }),
        Box::new(GeofenceConstraint {
            zones: zones.to_vec(),
        }),
        Box::new(AltitudeConstraint::for_model(model)),
    ]
}

/// Polygon the route must not enter.
#[derive(Debug, Clone, Serialize)]
pub struct NoFlyZone {
    pub name: Option<String>,
    pub vertices: Vec<GeoPoint>,
}

impl NoFlyZone {
    pub fn contains(&self, point: GeoPoint) -> bool {
        geo::point_in_polygon(point, &self.vertices)
    }

    pub fn blocks_segment(&self, a: GeoPoint, b: GeoPoint) -> bool {
        geo::segment_intersects_polygon(a, b, &self.vertices)
    }
}

/// Validate configured polygons; vertices are `[lat, lon]`.
pub fn zones_from_config(zones: &[NoFlyZoneConfig]) -> Result<Vec<NoFlyZone>, AircraftError> {
    zones
        .iter()
        .enumerate()
        .map(|(index, zone)| {
            let vertices: Vec<GeoPoint> = zone
                .vertices
                .iter()
                .map(|[lat, lon]| GeoPoint::new(*lat, *lon))
                .collect();
            if vertices.len() < 3 || vertices.iter().any(|v| !v.is_valid()) {
                return Err(AircraftError::DegenerateZone { index });
            }
            Ok(NoFlyZone {
                name: zone.name.clone(),
                vertices,
            })
        })
        .collect()
}

/// The route could be flown at all; a simulation error rules it out.
pub struct SimulationConstraint;

impl Constraint<RouteState> for SimulationConstraint {
    fn name(&self) -> &str {
        SIMULATION
    }

    fn kind(&self) -> ConstraintKind {
        ConstraintKind::Structural
    }

    fn check(&self, state: &RouteState) -> ConstraintResult {
        match &state.simulation_error {
            None => ConstraintResult::satisfied(),
            Some(err) => ConstraintResult::violated(1.0, err.to_string()),
        }
    }
}

/// Cumulative energy demand stays within the tank or battery.
pub struct EnduranceConstraint {
    pub capacity_j: f64,
}

impl Constraint<RouteState> for EnduranceConstraint {
    fn name(&self) -> &str {
        ENDURANCE
    }

    fn check(&self, state: &RouteState) -> ConstraintResult {
        let demand = state.flight.planned_energy_j;
        if demand <= self.capacity_j + crate::simulate::ENERGY_EPSILON_J {
            ConstraintResult::satisfied()
        } else {
            ConstraintResult::violated(
                (demand - self.capacity_j) / self.capacity_j,
                format!("needs {demand:.0} J of {:.0} J", self.capacity_j),
            )
        }
    }
}

/// Turn rate at every waypoint stays under the airframe limit.
pub struct ManeuverConstraint {
    pub max_turn_rate_deg_s: f64,
}

impl Constraint<RouteState> for ManeuverConstraint {
    fn name(&self) -> &str {
        MANEUVER
    }

    fn check(&self, state: &RouteState) -> ConstraintResult {
        let limit = self.max_turn_rate_deg_s;
        let excess: f64 = state
            .flight
            .legs
            .iter()
            .filter(|leg| leg.turn_rate_deg_s > limit)
            .map(|leg| (leg.turn_rate_deg_s - limit) / limit)
            .sum();
        if excess > 0.0 {
            ConstraintResult::violated(
                excess,
                format!("peak turn rate {:.2} deg/s", state.flight.max_turn_rate_deg_s()),
            )
        } else {
            ConstraintResult::satisfied()
        }
    }
}

/// No leg crosses a no-fly polygon; violation is the number of offending legs.
pub struct GeofenceConstraint {
    pub zones: Vec<NoFlyZone>,
}

impl GeofenceConstraint {
    pub fn violations(&self, state: &RouteState) -> usize {
        state
            .route
            .windows(2)
            .filter(|pair| {
                self.zones
                    .iter()
                    .any(|zone| zone.blocks_segment(pair[0].position, pair[1].position))
            })
            .count()
    }
}

impl Constraint<RouteState> for GeofenceConstraint {
    fn name(&self) -> &str {
        GEOFENCE
    }

    fn check(&self, state: &RouteState) -> ConstraintResult {
        match self.violations(state) {
            0 => ConstraintResult::satisfied(),
            n => ConstraintResult::violated(n as f64, format!("{n} legs enter a no-fly zone")),
        }
    }
}

/// Resolved altitudes sit inside the envelope.
pub struct AltitudeConstraint {
    pub min_altitude_m: f64,
    pub max_altitude_m: f64,
}

impl AltitudeConstraint {
    pub fn for_model(model: &AircraftModel) -> Self {
        Self {
            min_altitude_m: model.min_altitude_m,
            max_altitude_m: model.max_altitude_m,
        }
    }
}

impl Constraint<RouteState> for AltitudeConstraint {
    fn name(&self) -> &str {
        ALTITUDE
    }

    fn kind(&self) -> ConstraintKind {
        ConstraintKind::Hard
    }

    fn check(&self, state: &RouteState) -> ConstraintResult {
        let envelope = self.min_altitude_m..=self.max_altitude_m;
        let outside = state
            .route
            .iter()
            .filter(|wp| !wp.within_envelope || !envelope.contains(&wp.alt_m))
            .count();
        if outside == 0 {
            ConstraintResult::satisfied()
        } else {
            ConstraintResult::violated(outside as f64, format!("{outside} waypoints outside envelope"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulate::FlightLog;

    fn state(simulation_error: Option<AircraftError>) -> RouteState {
        RouteState {
            order: vec![0, 1],
            speeds_ms: vec![25.0],
            route: Vec::new(),
            flight: FlightLog::default(),
            simulation_error,
        }
    }

    #[test]
    fn simulation_error_is_structural() {
        let check = SimulationConstraint;
        assert_eq!(check.kind(), ConstraintKind::Structural);
        assert!(check.check(&state(None)).feasible);

        let failed = check.check(&state(Some(AircraftError::NonFiniteWind { t_s: 12.0 })));
        assert!(!failed.feasible);
        assert!(failed.detail.contains("not finite"));
    }

    #[test]
    fn unfinished_simulation_fails_the_whole_check_set() {
        let model = AircraftModel::from_config(&mission_config::AircraftConfig::default()).unwrap();
        let checks = route_constraints(&model, &[]);
        let broken = state(Some(AircraftError::SpeedCountMismatch { speeds: 2, legs: 1 }));
        let failing: Vec<&str> = checks
            .iter()
            .filter(|c| !c.check(&broken).feasible)
            .map(|c| c.name())
            .collect();
        assert_eq!(failing, vec![SIMULATION]);
    }
}
