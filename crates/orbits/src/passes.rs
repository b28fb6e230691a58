//! Ground-site look angles and pass detection by fixed-step sampling.

use mission_core::constants::EARTH_RADIUS_KM;
use mission_core::geo::GeoPoint;
use mission_core::vector::{self, Vector3};
use serde::Serialize;

use crate::{KeplerianOrbit, OrbitError, eci_to_ecef};

/// Observer on the spherical Earth (ground target or station).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroundSite {
    pub name: String,
    pub position: GeoPoint,
    pub altitude_km: f64,
}

impl GroundSite {
    pub fn new(name: impl Into<String>, position: GeoPoint, altitude_km: f64) -> Self {
        Self {
            name: name.into(),
            position,
            altitude_km,
        }
    }

    pub fn ecef_km(&self) -> Vector3 {
        let r = EARTH_RADIUS_KM + self.altitude_km;
        let (sin_lat, cos_lat) = self.position.lat.to_radians().sin_cos();
        let (sin_lon, cos_lon) = self.position.lon.to_radians().sin_cos();
        [r * cos_lat * cos_lon, r * cos_lat * sin_lon, r * sin_lat]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LookAngles {
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
    pub range_km: f64,
}

/// Azimuth, elevation and range from `site` to an Earth-fixed position.
pub fn look_angles(site: &GroundSite, target_ecef_km: &Vector3) -> LookAngles {
    let dr = vector::sub(target_ecef_km, &site.ecef_km());
    let range_km = vector::norm(&dr);
    let (east, north, up) = ecef_to_enu(
        &dr,
        site.position.lat.to_radians(),
        site.position.lon.to_radians(),
    );
    LookAngles {
        azimuth_deg: east.atan2(north).to_degrees().rem_euclid(360.0),
        elevation_deg: if range_km > 0.0 {
            (up / range_km).asin().to_degrees()
        } else {
            90.0
        },
        range_km,
    }
}

fn ecef_to_enu(dr: &Vector3, lat_rad: f64, lon_rad: f64) -> (f64, f64, f64) {
    let (sin_lat, cos_lat) = lat_rad.sin_cos();
    let (sin_lon, cos_lon) = lon_rad.sin_cos();
    let east = -sin_lon * dr[0] + cos_lon * dr[1];
    let north = -sin_lat * cos_lon * dr[0] - sin_lat * sin_lon * dr[1] + cos_lat * dr[2];
    let up = cos_lat * cos_lon * dr[0] + cos_lat * sin_lon * dr[1] + sin_lat * dr[2];
    (east, north, up)
}

/// Interval during which the satellite stays above the elevation mask.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Pass {
    pub start_t: f64,
    pub end_t: f64,
    pub peak_elevation_deg: f64,
    pub peak_t: f64,
}

impl Pass {
    pub fn duration_s(&self) -> f64 {
        self.end_t - self.start_t
    }
}

/// Passes of `orbit` over `site` within `[start_s, end_s]`.
///
/// A pass opens at the first visible sample and closes at the first sample that is
/// no longer visible, or at `end_s` if the satellite is still up. Boundaries are
/// therefore accurate to one `step_s`.
pub fn find_passes(
    orbit: &KeplerianOrbit,
    site: &GroundSite,
    start_s: f64,
    end_s: f64,
    step_s: f64,
    min_elevation_deg: f64,
) -> Result<Vec<Pass>, OrbitError> {
    if !(step_s > 0.0) {
        return Err(OrbitError::InvalidStep(step_s));
    }
    let mut passes = Vec::new();
    let mut open: Option<Pass> = None;
    let mut k = 0u64;
    loop {
        let t = start_s + k as f64 * step_s;
        if t > end_s {
            break;
        }
        let state = orbit.state_at(t)?;
        let elevation = look_angles(site, &eci_to_ecef(&state.position_km, t)).elevation_deg;
        let visible = elevation >= min_elevation_deg;

        open = match (open, visible) {
            (None, true) => Some(Pass {
                start_t: t,
                end_t: t,
                peak_elevation_deg: elevation,
                peak_t: t,
            }),
            (Some(mut pass), true) => {
                if elevation > pass.peak_elevation_deg {
                    pass.peak_elevation_deg = elevation;
                    pass.peak_t = t;
                }
                Some(pass)
            }
            (Some(mut pass), false) => {
                pass.end_t = t;
                passes.push(pass);
                None
            }
            (None, false) => None,
        };
        k += 1;
    }
    if let Some(mut pass) = open {
        pass.end_t = end_s;
        passes.push(pass);
    }
    Ok(passes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn satellite_overhead_is_at_zenith() {
        let site = GroundSite::new("origin", GeoPoint::new(0.0, 0.0), 0.0);
        let look = look_angles(&site, &[EARTH_RADIUS_KM + 400.0, 0.0, 0.0]);
        assert!((look.elevation_deg - 90.0).abs() < 1e-9);
        assert!((look.range_km - 400.0).abs() < 1e-9);
    }

    #[test]
    fn antipodal_satellite_is_below_horizon() {
        let site = GroundSite::new("origin", GeoPoint::new(0.0, 0.0), 0.0);
        let look = look_angles(&site, &[-(EARTH_RADIUS_KM + 400.0), 0.0, 0.0]);
        assert!(look.elevation_deg < -80.0);
    }

    #[test]
    fn passes_are_ordered_and_respect_the_mask() {
        let orbit = KeplerianOrbit::circular(400.0, 51.6).unwrap();
        let site = GroundSite::new("leiden", GeoPoint::new(52.0, 4.0), 0.0);
        let passes = find_passes(&orbit, &site, 0.0, 86_400.0, 30.0, 10.0).unwrap();
        assert!(!passes.is_empty());
        for pass in &passes {
            assert!(pass.end_t >= pass.start_t);
            assert!(pass.peak_elevation_deg >= 10.0);
            assert!((pass.start_t..=pass.end_t).contains(&pass.peak_t));
        }
        assert!(passes.windows(2).all(|w| w[0].end_t <= w[1].start_t));
    }
}
