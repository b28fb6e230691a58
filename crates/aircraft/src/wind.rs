//! Wind fields `w(t, lat, lon)`.

use std::f64::consts::TAU;

use mission_config::MonteCarloConfig;
use rand::Rng;
use serde::Serialize;

/// Horizontal wind velocity in m/s (direction the air moves towards).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct WindVector {
    pub north_ms: f64,
    pub east_ms: f64,
}

impl WindVector {
    pub fn new(north_ms: f64, east_ms: f64) -> Self {
        Self { north_ms, east_ms }
    }

    pub fn speed_ms(&self) -> f64 {
        self.north_ms.hypot(self.east_ms)
    }

    pub fn is_finite(&self) -> bool {
        self.north_ms.is_finite() && self.east_ms.is_finite()
    }
}

/// Anything that can be sampled for wind at a time and place.
pub trait WindField: Sync {
    fn wind_at(&self, t_s: f64, lat: f64, lon: f64) -> WindVector;
}

/// Nominal planning wind: still air.
#[derive(Debug, Clone, Copy, Default)]
pub struct CalmWind;

impl WindField for CalmWind {
    fn wind_at(&self, _t_s: f64, _lat: f64, _lon: f64) -> WindVector {
        WindVector::default()
    }
}

/// Constant wind everywhere.
#[derive(Debug, Clone, Copy)]
pub struct UniformWind(pub WindVector);

impl WindField for UniformWind {
    fn wind_at(&self, _t_s: f64, _lat: f64, _lon: f64) -> WindVector {
        self.0
    }
}

/// One Monte-Carlo wind draw: a constant mean wind plus a sinusoidal gust
/// along the mean-wind direction.
#[derive(Debug, Clone, Copy)]
pub struct SampledWind {
    pub mean: WindVector,
    pub gust_amplitude_ms: f64,
    pub gust_period_s: f64,
    pub gust_phase_rad: f64,
}

impl SampledWind {
    /// Draw a field from `rng` using the Monte-Carlo scales.
    pub fn sample<R: Rng + ?Sized>(rng: &mut R, config: &MonteCarloConfig) -> Self {
        let scale = config.wind_scale_ms.abs();
        let mean = WindVector::new(
            rng.random_range(-scale..=scale),
            rng.random_range(-scale..=scale),
        );
        Self {
            mean,
            gust_amplitude_ms: config.gust_amplitude_ms,
            gust_period_s: config.gust_period_s,
            gust_phase_rad: rng.random_range(0.0..TAU),
        }
    }
}

impl WindField for SampledWind {
    fn wind_at(&self, t_s: f64, _lat: f64, _lon: f64) -> WindVector {
        if self.gust_amplitude_ms == 0.0 || self.gust_period_s <= 0.0 {
            return self.mean;
        }
        let gust = self.gust_amplitude_ms * (TAU * t_s / self.gust_period_s + self.gust_phase_rad).sin();
        let speed = self.mean.speed_ms();
        let (dir_n, dir_e) = if speed > 1e-9 {
            (self.mean.north_ms / speed, self.mean.east_ms / speed)
        } else {
            (1.0, 0.0)
        };
        WindVector::new(self.mean.north_ms + gust * dir_n, self.mean.east_ms + gust * dir_e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg64Mcg;

    #[test]
    fn same_seed_draws_same_field() {
        let config = MonteCarloConfig {
            wind_scale_ms: 10.0,
            gust_amplitude_ms: 3.0,
            ..MonteCarloConfig::default()
        };
        let a = SampledWind::sample(&mut Pcg64Mcg::seed_from_u64(7), &config);
        let b = SampledWind::sample(&mut Pcg64Mcg::seed_from_u64(7), &config);
        assert_eq!(a.wind_at(120.0, 0.0, 0.0), b.wind_at(120.0, 0.0, 0.0));
        assert!(a.mean.north_ms.abs() <= 10.0 && a.mean.east_ms.abs() <= 10.0);
    }

    #[test]
    fn zero_scale_is_calm_without_gusts() {
        let config = MonteCarloConfig {
            wind_scale_ms: 0.0,
            ..MonteCarloConfig::default()
        };
        let field = SampledWind::sample(&mut Pcg64Mcg::seed_from_u64(1), &config);
        assert_eq!(field.wind_at(0.0, 0.0, 0.0).speed_ms(), 0.0);
    }
}
