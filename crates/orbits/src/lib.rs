//! Two-body orbit propagation around a spherical, uniformly rotating Earth.
//!
//! Inertial frame axes are aligned with the Earth-fixed frame at `t = 0`.

pub mod passes;

use std::f64::consts::TAU;

use mission_core::constants::{EARTH_RADIUS_KM, EARTH_ROTATION_RAD_S, MU_EARTH_KM3_S2};
use mission_core::geo::{GeoPoint, normalize_angle_deg};
use mission_core::vector::{self, Vector3};
use serde::Serialize;
use thiserror::Error;

pub use passes::{GroundSite, LookAngles, Pass, find_passes, look_angles};

const KEPLER_TOLERANCE: f64 = 1e-12;
const KEPLER_MAX_ITERATIONS: usize = 50;

#[derive(Debug, Error)]
pub enum OrbitError {
    #[error("eccentricity must lie in [0, 1), got {0}")]
    InvalidEccentricity(f64),
    #[error("periapsis radius {periapsis_km:.1} km lies inside the Earth")]
    BelowSurface { periapsis_km: f64 },
    #[error("orbital angle {name} is not finite")]
    InvalidAngle { name: &'static str },
    #[error("sampling step must be positive, got {0} s")]
    InvalidStep(f64),
    #[error("Kepler's equation did not converge (M={mean_anomaly}, e={eccentricity})")]
    NoConvergence { mean_anomaly: f64, eccentricity: f64 },
}

/// Classical orbital elements at epoch `t = 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KeplerianOrbit {
    pub semi_major_axis_km: f64,
    pub eccentricity: f64,
    pub inclination_deg: f64,
    pub raan_deg: f64,
    pub arg_periapsis_deg: f64,
    pub mean_anomaly_deg: f64,
}

/// Inertial position and velocity at time `t`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OrbitState {
    pub t: f64,
    pub position_km: Vector3,
    pub velocity_km_s: Vector3,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GroundTrackPoint {
    pub t: f64,
    pub point: GeoPoint,
}

impl KeplerianOrbit {
    pub fn new(
        semi_major_axis_km: f64,
        eccentricity: f64,
        inclination_deg: f64,
        raan_deg: f64,
        arg_periapsis_deg: f64,
        mean_anomaly_deg: f64,
    ) -> Result<Self, OrbitError> {
        if !(0.0..1.0).contains(&eccentricity) {
            return Err(OrbitError::InvalidEccentricity(eccentricity));
        }
        for (name, value) in [
            ("inclination", inclination_deg),
            ("raan", raan_deg),
            ("argument of periapsis", arg_periapsis_deg),
            ("mean anomaly", mean_anomaly_deg),
        ] {
            if !value.is_finite() {
                return Err(OrbitError::InvalidAngle { name });
            }
        }
        let periapsis_km = semi_major_axis_km * (1.0 - eccentricity);
        if !(periapsis_km > EARTH_RADIUS_KM) {
            return Err(OrbitError::BelowSurface { periapsis_km });
        }
        Ok(Self {
            semi_major_axis_km,
            eccentricity,
            inclination_deg,
            raan_deg,
            arg_periapsis_deg,
            mean_anomaly_deg,
        })
    }

    /// Circular orbit at `altitude_km`, ascending node at the prime meridian at epoch.
    pub fn circular(altitude_km: f64, inclination_deg: f64) -> Result<Self, OrbitError> {
        Self::new(EARTH_RADIUS_KM + altitude_km, 0.0, inclination_deg, 0.0, 0.0, 0.0)
    }

    pub fn period_s(&self) -> f64 {
        TAU / self.mean_motion_rad_s()
    }

    pub fn mean_motion_rad_s(&self) -> f64 {
        (MU_EARTH_KM3_S2 / self.semi_major_axis_km.powi(3)).sqrt()
    }

    /// Mean altitude above the spherical Earth.
    pub fn altitude_km(&self) -> f64 {
        self.semi_major_axis_km - EARTH_RADIUS_KM
    }

    /// Propagate to `t` seconds after epoch.
    pub fn state_at(&self, t: f64) -> Result<OrbitState, OrbitError> {
        let a = self.semi_major_axis_km;
        let e = self.eccentricity;
        let mean_anomaly =
            (self.mean_anomaly_deg.to_radians() + self.mean_motion_rad_s() * t).rem_euclid(TAU);
        let ecc_anomaly = solve_kepler(mean_anomaly, e)?;
        let (sin_e, cos_e) = ecc_anomaly.sin_cos();
        let true_anomaly = ((1.0 - e * e).sqrt() * sin_e).atan2(cos_e - e);
        let radius = a * (1.0 - e * cos_e);
        let p = a * (1.0 - e * e);
        let (sin_v, cos_v) = true_anomaly.sin_cos();
        let speed_scale = (MU_EARTH_KM3_S2 / p).sqrt();

        let r_pf = [radius * cos_v, radius * sin_v, 0.0];
        let v_pf = [-speed_scale * sin_v, speed_scale * (e + cos_v), 0.0];

        Ok(OrbitState {
            t,
            position_km: self.perifocal_to_inertial(&r_pf),
            velocity_km_s: self.perifocal_to_inertial(&v_pf),
        })
    }

    fn perifocal_to_inertial(&self, v: &Vector3) -> Vector3 {
        let (so, co) = self.raan_deg.to_radians().sin_cos();
        let (si, ci) = self.inclination_deg.to_radians().sin_cos();
        let (sw, cw) = self.arg_periapsis_deg.to_radians().sin_cos();
        let p = [co * cw - so * sw * ci, so * cw + co * sw * ci, sw * si];
        let q = [-co * sw - so * cw * ci, -so * sw + co * cw * ci, cw * si];
        vector::add(&vector::scale(&p, v[0]), &vector::scale(&q, v[1]))
    }

    /// Sub-satellite point at `t`.
    pub fn subsatellite_point(&self, t: f64) -> Result<GeoPoint, OrbitError> {
        let state = self.state_at(t)?;
        Ok(ecef_to_geodetic(&eci_to_ecef(&state.position_km, t)))
    }

    /// Sub-satellite points sampled every `step_s` over `[start_s, end_s]`.
    pub fn ground_track(
        &self,
        start_s: f64,
        end_s: f64,
        step_s: f64,
    ) -> Result<Vec<GroundTrackPoint>, OrbitError> {
        if !(step_s > 0.0) {
            return Err(OrbitError::InvalidStep(step_s));
        }
        let mut track = Vec::new();
        let mut k = 0u64;
        loop {
            let t = start_s + k as f64 * step_s;
            if t > end_s {
                break;
            }
            track.push(GroundTrackPoint {
                t,
                point: self.subsatellite_point(t)?,
            });
            k += 1;
        }
        Ok(track)
    }
}

/// Eccentric anomaly for mean anomaly `m` by Newton iteration.
pub fn solve_kepler(m: f64, e: f64) -> Result<f64, OrbitError> {
    let mut ecc = if e < 0.8 { m } else { std::f64::consts::PI };
    for _ in 0..KEPLER_MAX_ITERATIONS {
        let f = ecc - e * ecc.sin() - m;
        let step = f / (1.0 - e * ecc.cos());
        ecc -= step;
        if step.abs() < KEPLER_TOLERANCE {
            return Ok(ecc);
        }
    }
    Err(OrbitError::NoConvergence {
        mean_anomaly: m,
        eccentricity: e,
    })
}

/// Rotate an inertial vector into the Earth-fixed frame at time `t`.
pub fn eci_to_ecef(r: &Vector3, t: f64) -> Vector3 {
    let (s, c) = (EARTH_ROTATION_RAD_S * t).sin_cos();
    [r[0] * c + r[1] * s, -r[0] * s + r[1] * c, r[2]]
}

/// Geocentric latitude/longitude of an Earth-fixed position.
pub fn ecef_to_geodetic(r: &Vector3) -> GeoPoint {
    let radius = vector::norm(r);
    let lat = (r[2] / radius).clamp(-1.0, 1.0).asin().to_degrees();
    let lon = normalize_angle_deg(r[1].atan2(r[0]).to_degrees());
    GeoPoint::new(lat, lon)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iss_like_period_is_about_92_minutes() {
        let orbit = KeplerianOrbit::circular(400.0, 51.6).unwrap();
        let minutes = orbit.period_s() / 60.0;
        assert!((minutes - 92.4).abs() < 0.5, "period {minutes} min");
    }

    #[test]
    fn circular_radius_is_constant() {
        let orbit = KeplerianOrbit::circular(500.0, 97.0).unwrap();
        for t in [0.0, 600.0, 1234.5, 5000.0] {
            let state = orbit.state_at(t).unwrap();
            assert!((vector::norm(&state.position_km) - orbit.semi_major_axis_km).abs() < 1e-6);
        }
    }

    #[test]
    fn latitude_never_exceeds_inclination() {
        let orbit = KeplerianOrbit::circular(400.0, 51.6).unwrap();
        let track = orbit.ground_track(0.0, orbit.period_s(), 60.0).unwrap();
        assert!(track.iter().all(|p| p.point.lat.abs() <= 51.6 + 1e-9));
        assert!(track.iter().any(|p| p.point.lat > 50.0));
    }

    #[test]
    fn ground_track_steps_follow_the_orbital_rate() {
        let orbit = KeplerianOrbit::circular(400.0, 51.6).unwrap();
        let inertial_step = 360.0 * 60.0 / orbit.period_s();
        let track = orbit.ground_track(0.0, orbit.period_s(), 60.0).unwrap();
        for pair in track.windows(2) {
            let step = mission_core::geo::central_angle_deg(pair[0].point, pair[1].point);
            assert!(
                (step - inertial_step).abs() < 0.3,
                "ground step {step} deg vs orbital {inertial_step} deg"
            );
        }
    }

    #[test]
    fn kepler_solution_satisfies_equation() {
        let e = 0.1;
        let m = 1.3;
        let ecc = solve_kepler(m, e).unwrap();
        assert!((ecc - e * ecc.sin() - m).abs() < 1e-10);
    }

    #[test]
    fn orbit_below_surface_is_rejected() {
        assert!(matches!(
            KeplerianOrbit::circular(-100.0, 0.0),
            Err(OrbitError::BelowSurface { .. })
        ));
        assert!(matches!(
            KeplerianOrbit::new(7_000.0, 1.2, 0.0, 0.0, 0.0, 0.0),
            Err(OrbitError::InvalidEccentricity(_))
        ));
    }
}
