//! Segment-by-segment route simulation with depletion detection, and the dense
//! point-mass stepper used for plotting.

use mission_core::geo::{self, GeoPoint};
use serde::Serialize;

use crate::AircraftError;
use crate::model::{AircraftModel, ResolvedWaypoint, VehicleType};
use crate::wind::{WindField, WindVector};

/// Slack when comparing cumulative energy with capacity.
pub const ENERGY_EPSILON_J: f64 = 1e-6;

const MAX_TRACE_STEPS: usize = 200_000;

/// Why the vehicle went down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CrashReason {
    NoFuel,
    NoBattery,
}

impl From<VehicleType> for CrashReason {
    fn from(vehicle: VehicleType) -> Self {
        match vehicle {
            VehicleType::Plane => CrashReason::NoFuel,
            VehicleType::Uav => CrashReason::NoBattery,
        }
    }
}

/// Point where the energy state reached zero mid-segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CrashEvent {
    pub reason: CrashReason,
    pub at_position: GeoPoint,
    pub at_time_s: f64,
    /// Zero-based index of the leg being flown.
    pub segment_index: usize,
    /// Fraction of the leg distance covered before depletion.
    pub fraction: f64,
}

/// One time-stamped point of the flown route.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RoutePoint {
    pub lat: f64,
    pub lon: f64,
    pub alt_m: f64,
    pub t: f64,
    pub energy_used: f64,
}

/// Derived data for one leg between consecutive route waypoints.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Leg {
    pub from: usize,
    pub to: usize,
    pub distance_m: f64,
    pub heading_deg: f64,
    /// Heading change at the start of the leg.
    pub turn_deg: f64,
    pub airspeed_ms: f64,
    pub ground_speed_ms: f64,
    pub start_t: f64,
    /// Turn at the maximum rate, included in `duration_s`.
    pub turn_time_s: f64,
    pub duration_s: f64,
    pub energy_j: f64,
    /// `|turn_deg|` spread over the leg duration.
    pub turn_rate_deg_s: f64,
}

/// Result of flying a route once.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FlightLog {
    pub legs: Vec<Leg>,
    /// Reached waypoints, then the crash point if the energy ran out past the last one.
    pub points: Vec<RoutePoint>,
    /// Leading entries of `points` that are waypoint arrivals.
    pub waypoints_reached: usize,
    pub crash: Option<CrashEvent>,
    /// Time and energy over the traveled portion.
    pub total_time_s: f64,
    pub total_energy_j: f64,
    /// Time and energy the full route would need.
    pub planned_time_s: f64,
    pub planned_energy_j: f64,
}

impl FlightLog {
    pub fn crashed(&self) -> bool {
        self.crash.is_some()
    }

    /// Route points at waypoints, excluding any crash point.
    pub fn waypoint_points(&self) -> &[RoutePoint] {
        &self.points[..self.waypoints_reached.min(self.points.len())]
    }

    pub fn max_turn_rate_deg_s(&self) -> f64 {
        self.legs.iter().map(|l| l.turn_rate_deg_s).fold(0.0, f64::max)
    }
}

/// Fly `route` in order at the per-leg `speeds_ms` through `wind`.
///
/// Each leg opens with the heading change flown at the maximum turn rate, then the
/// straight flight; wind is sampled at the leg midpoint once the turn is done. When
/// the energy runs out inside a leg, the draw is interpolated linearly over the turn
/// and then over distance to place the crash. Energy exhausted exactly on arrival
/// counts as reaching that waypoint, and the crash is placed at the start of the
/// next leg without a second route point. The traveled totals stop at the crash
/// while the planned totals keep covering the full route.
pub fn simulate_route(
    model: &AircraftModel,
    route: &[ResolvedWaypoint],
    speeds_ms: &[f64],
    wind: &dyn WindField,
) -> Result<FlightLog, AircraftError> {
    let Some(first) = route.first() else {
        return Err(AircraftError::EmptyRoute);
    };
    let legs = route.len() - 1;
    if speeds_ms.len() != legs {
        return Err(AircraftError::SpeedCountMismatch {
            speeds: speeds_ms.len(),
            legs,
        });
    }

    let mut flight = FlightLog {
        points: vec![RoutePoint {
            lat: first.position.lat,
            lon: first.position.lon,
            alt_m: first.alt_m,
            t: 0.0,
            energy_used: 0.0,
        }],
        waypoints_reached: 1,
        ..FlightLog::default()
    };
    let mut heading: Option<f64> = None;
    let mut t = 0.0;
    let mut used = 0.0;

    for (k, pair) in route.windows(2).enumerate() {
        let (a, b) = (&pair[0], &pair[1]);
        let airspeed = speeds_ms[k];
        let power = model.power_w(airspeed);
        let distance_m = geo::distance_m(a.position, b.position);

        let (heading_deg, turn_deg, turn_time_s, ground_speed_ms, fly_time_s) = if distance_m < 1e-6 {
            (heading.unwrap_or(0.0), 0.0, 0.0, airspeed, 0.0)
        } else {
            let bearing = geo::bearing_deg(a.position, b.position);
            let turn = heading.map_or(0.0, |h| geo::turn_angle_deg(h, bearing));
            let turn_time = model.turn_time_s(turn);
            let mid = geo::interpolate(a.position, b.position, 0.5);
            let w = checked_wind(wind, t + turn_time, mid)?;
            let gs = model.ground_speed_ms(airspeed, bearing, w);
            (bearing, turn, turn_time, gs, distance_m / gs)
        };

        let duration_s = turn_time_s + fly_time_s;
        let turn_energy = model.turn_energy_j(turn_deg);
        let turning_energy = power * turn_time_s;
        let cruise_energy = power * fly_time_s;
        let energy_j = turn_energy + turning_energy + cruise_energy;
        let turn_rate_deg_s = if duration_s > 0.0 {
            turn_deg.abs() / duration_s
        } else {
            0.0
        };

        if flight.crash.is_none() && used + energy_j > model.capacity_j + ENERGY_EPSILON_J {
            let left = (model.capacity_j - used - turn_energy).max(0.0);
            let (fraction, at_time_s) = if left < turning_energy {
                (0.0, t + left / power)
            } else {
                let fraction = if cruise_energy > 0.0 {
                    ((left - turning_energy) / cruise_energy).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                (fraction, t + turn_time_s + fraction * fly_time_s)
            };
            let at_position = geo::interpolate(a.position, b.position, fraction);
            if at_time_s > t {
                flight.points.push(RoutePoint {
                    lat: at_position.lat,
                    lon: at_position.lon,
                    alt_m: a.alt_m + (b.alt_m - a.alt_m) * fraction,
                    t: at_time_s,
                    energy_used: model.capacity_j,
                });
            }
            flight.total_time_s = at_time_s;
            flight.total_energy_j = model.capacity_j;
            flight.crash = Some(CrashEvent {
                reason: model.vehicle.into(),
                at_position,
                at_time_s,
                segment_index: k,
                fraction,
            });
            log::debug!(
                "depleted on leg {k} at {:.1}% ({:.4}, {:.4}) t={at_time_s:.1} s",
                fraction * 100.0,
                at_position.lat,
                at_position.lon
            );
        }

        flight.legs.push(Leg {
            from: a.index,
            to: b.index,
            distance_m,
            heading_deg,
            turn_deg,
            airspeed_ms: airspeed,
            ground_speed_ms,
            start_t: t,
            turn_time_s,
            duration_s,
            energy_j,
            turn_rate_deg_s,
        });

        t += duration_s;
        used += energy_j;
        if distance_m >= 1e-6 {
            heading = Some(heading_deg);
        }

        if flight.crash.is_none() {
            flight.points.push(RoutePoint {
                lat: b.position.lat,
                lon: b.position.lon,
                alt_m: b.alt_m,
                t,
                energy_used: used,
            });
            flight.waypoints_reached += 1;
            flight.total_time_s = t;
            flight.total_energy_j = used;
        }
    }

    flight.planned_time_s = t;
    flight.planned_energy_j = used;
    Ok(flight)
}

fn checked_wind(wind: &dyn WindField, t_s: f64, at: GeoPoint) -> Result<WindVector, AircraftError> {
    let w = wind.wind_at(t_s, at.lat, at.lon);
    if w.is_finite() {
        Ok(w)
    } else {
        Err(AircraftError::NonFiniteWind { t_s })
    }
}

/// Instantaneous point-mass state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AircraftState {
    pub position: GeoPoint,
    pub heading_deg: f64,
    pub t_s: f64,
    pub energy_used_j: f64,
}

impl AircraftState {
    /// Step `dt_s` towards `target`: heading turns at most `max_turn_rate * dt`,
    /// ground velocity is air velocity plus wind.
    pub fn advance(
        &self,
        model: &AircraftModel,
        target: GeoPoint,
        airspeed_ms: f64,
        wind: &dyn WindField,
        dt_s: f64,
    ) -> Result<Self, AircraftError> {
        let desired = geo::bearing_deg(self.position, target);
        let max_turn = model.max_turn_rate_deg_s * dt_s;
        let turn = geo::turn_angle_deg(self.heading_deg, desired).clamp(-max_turn, max_turn);
        let heading_deg = (self.heading_deg + turn).rem_euclid(360.0);

        let w = checked_wind(wind, self.t_s, self.position)?;
        let h = heading_deg.to_radians();
        let north = (airspeed_ms * h.cos() + w.north_ms) * dt_s;
        let east = (airspeed_ms * h.sin() + w.east_ms) * dt_s;

        Ok(Self {
            position: geo::displace(self.position, north, east),
            heading_deg,
            t_s: self.t_s + dt_s,
            energy_used_j: self.energy_used_j
                + model.power_w(airspeed_ms) * dt_s
                + model.turn_energy_j(turn),
        })
    }
}

/// Dense track of the route sampled every `dt_s`, stopping at the last waypoint,
/// at energy depletion, or after a fixed step cap.
pub fn trace_route(
    model: &AircraftModel,
    route: &[ResolvedWaypoint],
    speeds_ms: &[f64],
    wind: &dyn WindField,
    dt_s: f64,
) -> Result<Vec<AircraftState>, AircraftError> {
    if !(dt_s > 0.0) {
        return Err(AircraftError::NonPositive {
            name: "dt_s",
            value: dt_s,
        });
    }
    let Some(first) = route.first() else {
        return Err(AircraftError::EmptyRoute);
    };
    let initial_heading = route
        .get(1)
        .map_or(0.0, |next| geo::bearing_deg(first.position, next.position));
    let mut state = AircraftState {
        position: first.position,
        heading_deg: initial_heading,
        t_s: 0.0,
        energy_used_j: 0.0,
    };
    let mut track = vec![state];

    for (k, target) in route.iter().skip(1).enumerate() {
        let airspeed = speeds_ms.get(k).copied().unwrap_or(model.cruise_speed_ms);
        let capture_m = (airspeed * dt_s).max(1.0);
        while geo::distance_m(state.position, target.position) > capture_m {
            if track.len() >= MAX_TRACE_STEPS || state.energy_used_j > model.capacity_j {
                return Ok(track);
            }
            state = state.advance(model, target.position, airspeed, wind, dt_s)?;
            track.push(state);
        }
    }
    Ok(track)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wind::{CalmWind, UniformWind};
    use mission_config::AircraftConfig;

    fn model() -> AircraftModel {
        AircraftModel::from_config(&AircraftConfig {
            turn_penalty_j_per_deg: 0.0,
            energy_budget_j: 1.0e9,
            fuel_tank_capacity_j: None,
            ..AircraftConfig::default()
        })
        .unwrap()
    }

    fn waypoint(index: usize, lat: f64, lon: f64) -> ResolvedWaypoint {
        ResolvedWaypoint {
            index,
            position: GeoPoint::new(lat, lon),
            requested_alt_m: Some(100.0),
            alt_m: 100.0,
            corrected: false,
            within_envelope: true,
        }
    }

    #[test]
    fn repeated_waypoint_costs_nothing() {
        let route = [waypoint(0, 0.0, 0.0), waypoint(1, 0.0, 0.0), waypoint(2, 0.1, 0.0)];
        let flight = simulate_route(&model(), &route, &[25.0, 25.0], &CalmWind).unwrap();
        assert_eq!(flight.legs[0].duration_s, 0.0);
        assert_eq!(flight.legs[1].turn_deg, 0.0);
        assert_eq!(flight.points.len(), 3);
    }

    #[test]
    fn speed_count_must_match_legs() {
        let route = [waypoint(0, 0.0, 0.0), waypoint(1, 0.1, 0.0)];
        assert!(matches!(
            simulate_route(&model(), &route, &[], &CalmWind),
            Err(AircraftError::SpeedCountMismatch { speeds: 0, legs: 1 })
        ));
    }

    #[test]
    fn non_finite_wind_is_an_error() {
        let route = [waypoint(0, 0.0, 0.0), waypoint(1, 0.1, 0.0)];
        let wind = UniformWind(WindVector::new(f64::NAN, 0.0));
        assert!(matches!(
            simulate_route(&model(), &route, &[25.0], &wind),
            Err(AircraftError::NonFiniteWind { .. })
        ));
    }

    #[test]
    fn right_angle_turn_takes_time_at_the_rate_limit() {
        let m = model();
        let route = [waypoint(0, 0.0, 0.0), waypoint(1, 0.1, 0.0), waypoint(2, 0.1, 0.1)];
        let flight = simulate_route(&m, &route, &[25.0, 25.0], &CalmWind).unwrap();
        let leg = flight.legs[1];
        assert!((leg.turn_deg - 90.0).abs() < 0.01);
        let turn_time = leg.turn_deg.abs() / m.max_turn_rate_deg_s;
        assert!((leg.turn_time_s - turn_time).abs() < 1e-6);
        assert!((leg.duration_s - (turn_time + leg.distance_m / 25.0)).abs() < 1e-6);
        assert!((leg.energy_j - m.power_w(25.0) * leg.duration_s).abs() < 1e-6);
        assert!(leg.turn_rate_deg_s <= m.max_turn_rate_deg_s);
        assert_eq!(flight.legs[0].turn_time_s, 0.0);
        assert!((flight.planned_time_s - (flight.legs[0].duration_s + leg.duration_s)).abs() < 1e-9);
    }

    #[test]
    fn depletion_during_a_turn_stays_at_the_waypoint() {
        let route = [waypoint(0, 0.0, 0.0), waypoint(1, 0.1, 0.0), waypoint(2, 0.1, 0.1)];
        let ample = simulate_route(&model(), &route, &[25.0, 25.0], &CalmWind).unwrap();
        let mut m = model();
        m.capacity_j = ample.legs[0].energy_j + 3.0 * m.power_w(25.0);

        let flight = simulate_route(&m, &route, &[25.0, 25.0], &CalmWind).unwrap();
        let crash = flight.crash.unwrap();
        assert_eq!(crash.segment_index, 1);
        assert_eq!(crash.fraction, 0.0);
        assert_eq!(crash.at_position, route[1].position);
        assert!((crash.at_time_s - (ample.legs[0].duration_s + 3.0)).abs() < 1e-6);
        assert_eq!(flight.points.len(), 3);
        assert_eq!(flight.waypoint_points().len(), 2);
    }

    #[test]
    fn energy_exhausted_on_arrival_adds_no_extra_point() {
        let route = [waypoint(0, 0.0, 0.0), waypoint(1, 0.1, 0.0), waypoint(2, 0.2, 0.0)];
        let ample = simulate_route(&model(), &route, &[25.0, 25.0], &CalmWind).unwrap();
        let mut m = model();
        m.capacity_j = ample.legs[0].energy_j;

        let flight = simulate_route(&m, &route, &[25.0, 25.0], &CalmWind).unwrap();
        let crash = flight.crash.unwrap();
        assert_eq!(crash.segment_index, 1);
        assert_eq!(crash.fraction, 0.0);
        assert_eq!(crash.at_time_s, ample.legs[0].duration_s);
        assert_eq!(flight.points.len(), 2);
        assert_eq!(flight.waypoint_points().len(), 2);
        assert_eq!(flight.total_energy_j, m.capacity_j);
    }

    #[test]
    fn dense_trace_reaches_every_waypoint() {
        let route = [waypoint(0, 0.0, 0.0), waypoint(1, 0.05, 0.0), waypoint(2, 0.05, 0.05)];
        let track = trace_route(&model(), &route, &[25.0, 25.0], &CalmWind, 1.0).unwrap();
        let last = track.last().unwrap();
        assert!(geo::distance_m(last.position, route[2].position) <= 25.0);
        assert!(track.windows(2).all(|w| w[1].energy_used_j >= w[0].energy_used_j));
        let max_turn = model().max_turn_rate_deg_s;
        assert!(track.windows(2).all(|w| {
            geo::turn_angle_deg(w[0].heading_deg, w[1].heading_deg).abs() <= max_turn + 1e-9
        }));
    }
}
