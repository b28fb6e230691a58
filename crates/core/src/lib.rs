//! Core units, constants, and shared primitives for the mission planner workspace.

/// Physical constants expressed in SI units (unless stated otherwise).
pub mod constants {
    /// Seconds per day.
    pub const SECONDS_PER_DAY: f64 = 86_400.0;
    /// Mean Earth radius (km) used by the spherical visibility model.
    pub const EARTH_RADIUS_KM: f64 = 6_371.0;
    /// Earth gravitational parameter (km³/s²).
    pub const MU_EARTH_KM3_S2: f64 = 398_600.441_8;
    /// Earth sidereal rotation rate (rad/s).
    pub const EARTH_ROTATION_RAD_S: f64 = 7.292_115e-5;
    /// Metres per degree of latitude in the flat-earth approximation.
    pub const METERS_PER_DEG_LAT: f64 = 111_320.0;
}

/// Basic unit conversion helpers.
pub mod units {
    /// Convert metres to kilometres.
    #[inline]
    pub fn m_to_km(v: f64) -> f64 {
        v / 1_000.0
    }
}

/// Lightweight time utilities shared across crates.
pub mod time {
    use super::constants::SECONDS_PER_DAY;

    /// Convert days to seconds.
    #[inline]
    pub fn days_to_seconds(days: f64) -> f64 {
        days * SECONDS_PER_DAY
    }

    /// Zero-based day index of a mission-elapsed time.
    #[inline]
    pub fn day_index(seconds: f64) -> u32 {
        (seconds.max(0.0) / SECONDS_PER_DAY).floor() as u32
    }
}

/// Minimal vector helpers to avoid ad-hoc `[f64; 3]` math everywhere.
pub mod vector {
    /// Alias for a 3D vector in kilometres or km/s depending on context.
    pub type Vector3 = [f64; 3];

    /// Euclidean norm of a vector.
    #[inline]
    pub fn norm(v: &Vector3) -> f64 {
        dot(v, v).sqrt()
    }

    /// Dot product of two vectors.
    #[inline]
    pub fn dot(a: &Vector3, b: &Vector3) -> f64 {
        a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
    }

    /// Vector addition.
    #[inline]
    pub fn add(a: &Vector3, b: &Vector3) -> Vector3 {
        [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
    }

    /// Vector subtraction.
    #[inline]
    pub fn sub(a: &Vector3, b: &Vector3) -> Vector3 {
        [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
    }

    /// Scale a vector by a scalar.
    #[inline]
    pub fn scale(v: &Vector3, s: f64) -> Vector3 {
        [v[0] * s, v[1] * s, v[2] * s]
    }
}

/// Geodesy helpers on latitude/longitude pairs (degrees).
///
/// Distances use the flat-earth approximation (metres per degree of latitude,
/// longitude scaled by the cosine of the mean latitude), which is adequate for
/// the regional routes the aircraft planner handles.
pub mod geo {
    use serde::{Deserialize, Serialize};

    use super::constants::METERS_PER_DEG_LAT;

    /// A point on the Earth's surface.
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct GeoPoint {
        pub lat: f64,
        pub lon: f64,
    }

    impl GeoPoint {
        pub fn new(lat: f64, lon: f64) -> Self {
            Self { lat, lon }
        }

        /// True when both coordinates are finite and inside the valid ranges.
        pub fn is_valid(&self) -> bool {
            self.lat.is_finite()
                && self.lon.is_finite()
                && (-90.0..=90.0).contains(&self.lat)
                && (-180.0..=180.0).contains(&self.lon)
        }
    }

    /// Normalize an angle to `[-180, 180]` degrees.
    pub fn normalize_angle_deg(a: f64) -> f64 {
        let wrapped = (a + 180.0).rem_euclid(360.0) - 180.0;
        if wrapped == -180.0 && a > 0.0 { 180.0 } else { wrapped }
    }

    /// Initial bearing from `from` to `to` in degrees, `[0, 360)`.
    pub fn bearing_deg(from: GeoPoint, to: GeoPoint) -> f64 {
        if (to.lat - from.lat).abs() < 1e-9 && (to.lon - from.lon).abs() < 1e-9 {
            return 0.0;
        }
        let dlon = (to.lon - from.lon).to_radians();
        let lat1 = from.lat.to_radians();
        let lat2 = to.lat.to_radians();
        let x = dlon.sin() * lat2.cos();
        let y = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
        x.atan2(y).to_degrees().rem_euclid(360.0)
    }

    /// Flat-earth distance between two points in metres.
    pub fn distance_m(a: GeoPoint, b: GeoPoint) -> f64 {
        let (north, east) = local_offset_m(a, b);
        north.hypot(east)
    }

    /// North/east offset in metres from `a` to `b`.
    pub fn local_offset_m(a: GeoPoint, b: GeoPoint) -> (f64, f64) {
        let mean_lat = 0.5 * (a.lat + b.lat);
        let north = (b.lat - a.lat) * METERS_PER_DEG_LAT;
        let east = (b.lon - a.lon) * METERS_PER_DEG_LAT * mean_lat.to_radians().cos();
        (north, east)
    }

    /// Move `p` by a north/east displacement in metres.
    pub fn displace(p: GeoPoint, north_m: f64, east_m: f64) -> GeoPoint {
        let lat = p.lat + north_m / METERS_PER_DEG_LAT;
        let cos_lat = p.lat.to_radians().cos().max(1e-9);
        let lon = p.lon + east_m / (METERS_PER_DEG_LAT * cos_lat);
        GeoPoint::new(lat, lon)
    }

    /// Smallest signed turn from `heading_from` to `heading_to` in degrees.
    pub fn turn_angle_deg(heading_from: f64, heading_to: f64) -> f64 {
        normalize_angle_deg(heading_to - heading_from)
    }

    /// Great-circle central angle between two points in degrees (haversine).
    pub fn central_angle_deg(a: GeoPoint, b: GeoPoint) -> f64 {
        let dlat = (b.lat - a.lat).to_radians();
        let dlon = (b.lon - a.lon).to_radians();
        let h = (dlat / 2.0).sin().powi(2)
            + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (dlon / 2.0).sin().powi(2);
        (2.0 * h.sqrt().min(1.0).asin()).to_degrees()
    }

    /// Linear interpolation between two points; `fraction` is clamped to `[0, 1]`.
    pub fn interpolate(a: GeoPoint, b: GeoPoint, fraction: f64) -> GeoPoint {
        let f = fraction.clamp(0.0, 1.0);
        GeoPoint::new(a.lat + (b.lat - a.lat) * f, a.lon + (b.lon - a.lon) * f)
    }

    /// Ray-casting point-in-polygon test. Polygons with fewer than three vertices contain nothing.
    pub fn point_in_polygon(p: GeoPoint, polygon: &[GeoPoint]) -> bool {
        if polygon.len() < 3 {
            return false;
        }
        let mut inside = false;
        let mut j = polygon.len() - 1;
        for i in 0..polygon.len() {
            let (yi, xi) = (polygon[i].lat, polygon[i].lon);
            let (yj, xj) = (polygon[j].lat, polygon[j].lon);
            if (yi > p.lat) != (yj > p.lat) && p.lon < (xj - xi) * (p.lat - yi) / (yj - yi) + xi {
                inside = !inside;
            }
            j = i;
        }
        inside
    }

    /// True when the segment `a`–`b` enters the polygon (endpoint inside or an edge crossing).
    pub fn segment_intersects_polygon(a: GeoPoint, b: GeoPoint, polygon: &[GeoPoint]) -> bool {
        if polygon.len() < 3 {
            return false;
        }
        if point_in_polygon(a, polygon) || point_in_polygon(b, polygon) {
            return true;
        }
        let mut j = polygon.len() - 1;
        for i in 0..polygon.len() {
            if segments_cross(a, b, polygon[j], polygon[i]) {
                return true;
            }
            j = i;
        }
        false
    }

    fn segments_cross(p1: GeoPoint, p2: GeoPoint, q1: GeoPoint, q2: GeoPoint) -> bool {
        let orient = |a: GeoPoint, b: GeoPoint, c: GeoPoint| {
            (b.lon - a.lon) * (c.lat - a.lat) - (b.lat - a.lat) * (c.lon - a.lon)
        };
        let d1 = orient(q1, q2, p1);
        let d2 = orient(q1, q2, p2);
        let d3 = orient(p1, p2, q1);
        let d4 = orient(p1, p2, q2);
        ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
            && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn normalize_wraps_into_half_open_range() {
            assert!((normalize_angle_deg(190.0) + 170.0).abs() < 1e-12);
            assert!((normalize_angle_deg(-190.0) - 170.0).abs() < 1e-12);
            assert!((normalize_angle_deg(540.0) - 180.0).abs() < 1e-12);
        }

        #[test]
        fn bearing_due_north_and_east() {
            let origin = GeoPoint::new(0.0, 0.0);
            assert!(bearing_deg(origin, GeoPoint::new(1.0, 0.0)).abs() < 1e-9);
            assert!((bearing_deg(origin, GeoPoint::new(0.0, 1.0)) - 90.0).abs() < 1e-9);
        }

        #[test]
        fn segment_crossing_square_is_detected() {
            let square = [
                GeoPoint::new(1.0, 1.0),
                GeoPoint::new(1.0, 2.0),
                GeoPoint::new(2.0, 2.0),
                GeoPoint::new(2.0, 1.0),
            ];
            let a = GeoPoint::new(1.5, 0.0);
            let b = GeoPoint::new(1.5, 3.0);
            assert!(segment_intersects_polygon(a, b, &square));
            assert!(!segment_intersects_polygon(
                GeoPoint::new(0.0, 0.0),
                GeoPoint::new(0.5, 3.0),
                &square
            ));
        }
    }
}
