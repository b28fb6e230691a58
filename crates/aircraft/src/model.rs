//! Vehicle parameters, energy draw and waypoint altitude resolution.

use mission_config::{AircraftConfig, VehicleKind, WaypointConfig};
use mission_core::geo::GeoPoint;
use serde::Serialize;

use crate::AircraftError;
use crate::wind::WindVector;

/// Crawl speed used when wind cancels the along-track airspeed.
pub const MIN_GROUND_SPEED_MS: f64 = 1.0;

/// Energy source carried by the vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleType {
    /// Fixed-wing aircraft drawing from a fuel tank.
    Plane,
    /// Electric UAV drawing from a battery.
    Uav,
}

/// Validated point-mass aircraft model.
#[derive(Debug, Clone, Serialize)]
pub struct AircraftModel {
    pub vehicle: VehicleType,
    pub cruise_speed_ms: f64,
    /// Selectable per-leg airspeeds; cruise first.
    pub speed_options_ms: Vec<f64>,
    pub max_turn_rate_deg_s: f64,
    pub capacity_j: f64,
    pub consumption_j_per_s: f64,
    pub turn_penalty_j_per_deg: f64,
    pub speed_exponent: f64,
    pub min_altitude_m: f64,
    pub max_altitude_m: f64,
    pub default_altitude_m: f64,
}

impl AircraftModel {
    /// Convert a configuration record into a validated model.
    pub fn from_config(config: &AircraftConfig) -> Result<Self, AircraftError> {
        positive("cruise_speed_ms", config.cruise_speed_ms)?;
        positive("max_turn_rate_deg_s", config.max_turn_rate_deg_s)?;
        positive("consumption_j_per_s", config.consumption_j_per_s)?;
        if !(config.turn_penalty_j_per_deg >= 0.0) {
            return Err(AircraftError::NonPositive {
                name: "turn_penalty_j_per_deg",
                value: config.turn_penalty_j_per_deg,
            });
        }
        if !(config.min_altitude_m <= config.max_altitude_m) {
            return Err(AircraftError::InvertedEnvelope {
                min: config.min_altitude_m,
                max: config.max_altitude_m,
            });
        }

        let (vehicle, specific) = match config.vehicle_type {
            VehicleKind::Plane => (VehicleType::Plane, config.fuel_tank_capacity_j),
            VehicleKind::Uav => (VehicleType::Uav, config.battery_capacity_j),
        };
        let capacity_j = specific
            .filter(|c| *c > 0.0)
            .unwrap_or(config.energy_budget_j);
        positive("capacity_j", capacity_j)?;

        let mut speed_options_ms = vec![config.cruise_speed_ms];
        for &speed in &config.speed_options_ms {
            positive("speed_options_ms", speed)?;
            if !speed_options_ms.iter().any(|s| (s - speed).abs() < 1e-9) {
                speed_options_ms.push(speed);
            }
        }
        speed_options_ms[1..].sort_by(f64::total_cmp);

        Ok(Self {
            vehicle,
            cruise_speed_ms: config.cruise_speed_ms,
            speed_options_ms,
            max_turn_rate_deg_s: config.max_turn_rate_deg_s,
            capacity_j,
            consumption_j_per_s: config.consumption_j_per_s,
            turn_penalty_j_per_deg: config.turn_penalty_j_per_deg,
            speed_exponent: if config.speed_exponent.is_finite() {
                config.speed_exponent
            } else {
                2.0
            },
            min_altitude_m: config.min_altitude_m,
            max_altitude_m: config.max_altitude_m,
            default_altitude_m: config.default_altitude_m,
        })
    }

    /// Energy draw in J/s at the given airspeed.
    pub fn power_w(&self, airspeed_ms: f64) -> f64 {
        self.consumption_j_per_s * (airspeed_ms / self.cruise_speed_ms).powf(self.speed_exponent)
    }

    /// Energy charged for a heading change.
    pub fn turn_energy_j(&self, turn_deg: f64) -> f64 {
        turn_deg.abs() * self.turn_penalty_j_per_deg
    }

    /// Time spent turning through `turn_deg` at the maximum turn rate.
    pub fn turn_time_s(&self, turn_deg: f64) -> f64 {
        if turn_deg.abs() < 1e-6 {
            0.0
        } else {
            turn_deg.abs() / self.max_turn_rate_deg_s
        }
    }

    /// Along-track ground speed for `airspeed_ms` on `track_deg` in `wind`.
    ///
    /// The aircraft crabs into the crosswind; a crosswind stronger than the airspeed
    /// leaves only the along-track wind component. Never below [`MIN_GROUND_SPEED_MS`].
    pub fn ground_speed_ms(&self, airspeed_ms: f64, track_deg: f64, wind: WindVector) -> f64 {
        let track = track_deg.to_radians();
        let along = wind.north_ms * track.cos() + wind.east_ms * track.sin();
        let cross = -wind.north_ms * track.sin() + wind.east_ms * track.cos();
        let crab = (airspeed_ms * airspeed_ms - cross * cross).max(0.0).sqrt();
        (crab + along).max(MIN_GROUND_SPEED_MS)
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), AircraftError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(AircraftError::NonPositive { name, value })
    }
}

/// Waypoint after altitude resolution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResolvedWaypoint {
    pub index: usize,
    pub position: GeoPoint,
    pub requested_alt_m: Option<f64>,
    pub alt_m: f64,
    /// The altitude differs from what was requested.
    pub corrected: bool,
    /// False only when the altitude could not be brought inside the envelope.
    pub within_envelope: bool,
}

/// Fill missing altitudes with the vehicle default, then clamp into the envelope.
pub fn resolve_altitudes(
    model: &AircraftModel,
    waypoints: &[WaypointConfig],
) -> Result<Vec<ResolvedWaypoint>, AircraftError> {
    if waypoints.is_empty() {
        return Err(AircraftError::EmptyRoute);
    }
    waypoints
        .iter()
        .enumerate()
        .map(|(index, wp)| {
            let position = GeoPoint::new(wp.lat, wp.lon);
            if !position.is_valid() {
                return Err(AircraftError::InvalidWaypoint {
                    index,
                    lat: wp.lat,
                    lon: wp.lon,
                });
            }
            let wanted = wp.alt_m.unwrap_or(model.default_altitude_m);
            let alt_m = wanted.clamp(model.min_altitude_m, model.max_altitude_m);
            let within_envelope =
                alt_m.is_finite() && (model.min_altitude_m..=model.max_altitude_m).contains(&alt_m);
            if alt_m != wanted || wp.alt_m.is_none() {
                log::debug!("waypoint {index}: altitude {:?} resolved to {alt_m} m", wp.alt_m);
            }
            Ok(ResolvedWaypoint {
                index,
                position,
                requested_alt_m: wp.alt_m,
                alt_m,
                corrected: wp.alt_m != Some(alt_m),
                within_envelope,
            })
        })
        .collect()
}
