//! Mission settings records and their loaders.
//!
//! These are plain deserialized records. Validation and conversion into domain
//! models happens in the domain crates (`from_config`).

use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Everything one planner invocation needs. Either half may be absent.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MissionSettings {
    #[serde(default)]
    pub aircraft: Option<AircraftConfig>,
    #[serde(default)]
    pub spacecraft: Option<SpacecraftConfig>,
    #[serde(default)]
    pub solver: SolverSettings,
}

impl MissionSettings {
    /// Built-in mission: the same values shipped in `configs/mission.yaml`.
    pub fn builtin() -> Self {
        Self {
            aircraft: Some(AircraftConfig::default()),
            spacecraft: Some(SpacecraftConfig::default()),
            solver: SolverSettings::default(),
        }
    }
}

/// Iteration budgets handed to the shared solver.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SolverSettings {
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
    #[serde(default = "default_max_repair_iterations")]
    pub max_repair_iterations: usize,
    #[serde(default = "default_repair_tolerance")]
    pub repair_tolerance: f64,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            max_repair_iterations: default_max_repair_iterations(),
            repair_tolerance: default_repair_tolerance(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleKind {
    #[default]
    #[serde(alias = "Plane")]
    Plane,
    #[serde(alias = "UAV", alias = "drone")]
    Uav,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveKind {
    #[default]
    MinTime,
    MinEnergy,
}

/// Waypoint as written in a mission file; altitude may be omitted.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct WaypointConfig {
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub alt_m: Option<f64>,
}

/// No-fly polygon; vertices are `[lat, lon]` pairs.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NoFlyZoneConfig {
    #[serde(default)]
    pub name: Option<String>,
    pub vertices: Vec<[f64; 2]>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MonteCarloConfig {
    #[serde(default = "default_runs")]
    pub runs: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Half-width of the uniform north/east wind draw, m/s.
    #[serde(default = "default_wind_scale")]
    pub wind_scale_ms: f64,
    #[serde(default)]
    pub gust_amplitude_ms: f64,
    #[serde(default = "default_gust_period")]
    pub gust_period_s: f64,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            runs: default_runs(),
            seed: default_seed(),
            wind_scale_ms: default_wind_scale(),
            gust_amplitude_ms: 0.0,
            gust_period_s: default_gust_period(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AircraftConfig {
    #[serde(default)]
    pub vehicle_type: VehicleKind,
    #[serde(default = "default_cruise_speed")]
    pub cruise_speed_ms: f64,
    /// Extra per-segment speed choices besides cruise.
    #[serde(default)]
    pub speed_options_ms: Vec<f64>,
    #[serde(default = "default_max_turn_rate")]
    pub max_turn_rate_deg_s: f64,
    /// Fallback when the type-specific capacity is missing.
    #[serde(default = "default_energy_budget")]
    pub energy_budget_j: f64,
    #[serde(default)]
    pub fuel_tank_capacity_j: Option<f64>,
    #[serde(default)]
    pub battery_capacity_j: Option<f64>,
    #[serde(default = "default_consumption")]
    pub consumption_j_per_s: f64,
    #[serde(default = "default_turn_penalty")]
    pub turn_penalty_j_per_deg: f64,
    #[serde(default = "default_speed_exponent")]
    pub speed_exponent: f64,
    #[serde(default)]
    pub min_altitude_m: f64,
    #[serde(default = "default_max_altitude")]
    pub max_altitude_m: f64,
    #[serde(default = "default_altitude")]
    pub default_altitude_m: f64,
    #[serde(default)]
    pub waypoints: Vec<WaypointConfig>,
    #[serde(default)]
    pub no_fly_zones: Vec<NoFlyZoneConfig>,
    #[serde(default)]
    pub fixed_order: bool,
    #[serde(default)]
    pub objective: ObjectiveKind,
    #[serde(default)]
    pub monte_carlo: MonteCarloConfig,
}

impl Default for AircraftConfig {
    fn default() -> Self {
        let waypoint = |lat, lon| WaypointConfig {
            lat,
            lon,
            alt_m: Some(default_altitude()),
        };
        Self {
            vehicle_type: VehicleKind::Plane,
            cruise_speed_ms: default_cruise_speed(),
            speed_options_ms: Vec::new(),
            max_turn_rate_deg_s: default_max_turn_rate(),
            energy_budget_j: default_energy_budget(),
            fuel_tank_capacity_j: Some(default_energy_budget()),
            battery_capacity_j: Some(default_energy_budget()),
            consumption_j_per_s: default_consumption(),
            turn_penalty_j_per_deg: default_turn_penalty(),
            speed_exponent: default_speed_exponent(),
            min_altitude_m: 0.0,
            max_altitude_m: default_max_altitude(),
            default_altitude_m: default_altitude(),
            waypoints: vec![
                waypoint(54.6341, 25.2858),
                waypoint(52.1657, 20.9671),
                waypoint(52.3625, 13.5006),
                waypoint(38.7813, -9.1359),
            ],
            no_fly_zones: Vec::new(),
            fixed_order: false,
            objective: ObjectiveKind::MinTime,
            monte_carlo: MonteCarloConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TargetConfig {
    #[serde(default)]
    pub name: Option<String>,
    pub lat: f64,
    pub lon: f64,
    #[serde(default = "default_target_value")]
    pub value: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StationConfig {
    #[serde(default = "default_station_name")]
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub altitude_m: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SpacecraftConfig {
    #[serde(default = "default_orbit_altitude")]
    pub altitude_km: f64,
    #[serde(default = "default_inclination")]
    pub inclination_deg: f64,
    #[serde(default)]
    pub eccentricity: f64,
    #[serde(default)]
    pub raan_deg: f64,
    #[serde(default)]
    pub targets: Vec<TargetConfig>,
    pub station: StationConfig,
    #[serde(default = "default_min_slew")]
    pub min_slew_s: f64,
    #[serde(default = "default_max_active")]
    pub max_active_per_orbit_s: f64,
    #[serde(default = "default_min_elevation")]
    pub min_elevation_deg: f64,
    #[serde(default = "default_sample_step")]
    pub sample_step_s: f64,
    #[serde(default = "default_min_observation")]
    pub min_observation_s: f64,
    #[serde(default = "default_min_downlink")]
    pub min_downlink_s: f64,
}

impl Default for SpacecraftConfig {
    fn default() -> Self {
        let target = |lat, lon| TargetConfig {
            name: None,
            lat,
            lon,
            value: default_target_value(),
        };
        Self {
            altitude_km: default_orbit_altitude(),
            inclination_deg: default_inclination(),
            eccentricity: 0.0,
            raan_deg: 0.0,
            targets: vec![target(52.5, 4.5), target(53.0, 5.0), target(51.0, 3.0)],
            station: StationConfig {
                name: default_station_name(),
                lat: 52.0,
                lon: 4.0,
                altitude_m: 0.0,
            },
            min_slew_s: default_min_slew(),
            max_active_per_orbit_s: default_max_active(),
            min_elevation_deg: default_min_elevation(),
            sample_step_s: default_sample_step(),
            min_observation_s: default_min_observation(),
            min_downlink_s: default_min_downlink(),
        }
    }
}

/// Errors that can occur while loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read mission file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Load mission settings from a YAML or TOML file (chosen by extension).
pub fn load_mission_settings<P: AsRef<Path>>(path: P) -> Result<MissionSettings, ConfigError> {
    load_record(path)
}

/// Parse mission settings from an in-memory YAML document.
pub fn parse_mission_yaml(contents: &str) -> Result<MissionSettings, ConfigError> {
    Ok(serde_yaml::from_str(contents)?)
}

fn load_record<T, P>(path: P) -> Result<T, ConfigError>
where
    T: for<'de> Deserialize<'de>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if path.extension().map(|ext| ext == "toml").unwrap_or(false) {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    } else {
        let reader = File::open(path)?;
        Ok(serde_yaml::from_reader(reader)?)
    }
}

fn default_max_steps() -> usize {
    1_000
}

fn default_max_repair_iterations() -> usize {
    200
}

fn default_repair_tolerance() -> f64 {
    0.05
}

fn default_runs() -> usize {
    10
}

fn default_seed() -> u64 {
    42
}

fn default_wind_scale() -> f64 {
    2.0
}

fn default_gust_period() -> f64 {
    600.0
}

fn default_cruise_speed() -> f64 {
    25.0
}

fn default_max_turn_rate() -> f64 {
    15.0
}

fn default_energy_budget() -> f64 {
    2.0e6
}

fn default_consumption() -> f64 {
    80.0
}

fn default_turn_penalty() -> f64 {
    2.0
}

fn default_speed_exponent() -> f64 {
    2.0
}

fn default_max_altitude() -> f64 {
    4_000.0
}

fn default_altitude() -> f64 {
    100.0
}

fn default_target_value() -> f64 {
    1.0
}

fn default_station_name() -> String {
    "station".to_string()
}

fn default_orbit_altitude() -> f64 {
    400.0
}

fn default_inclination() -> f64 {
    51.6
}

fn default_min_slew() -> f64 {
    60.0
}

fn default_max_active() -> f64 {
    600.0
}

fn default_min_elevation() -> f64 {
    10.0
}

fn default_sample_step() -> f64 {
    30.0
}

fn default_min_observation() -> f64 {
    30.0
}

fn default_min_downlink() -> f64 {
    60.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn yaml_fills_missing_fields_with_defaults() {
        let settings = parse_mission_yaml(
            "aircraft:\n  vehicle_type: UAV\n  waypoints:\n    - { lat: 1.0, lon: 2.0 }\n",
        )
        .unwrap();
        let aircraft = settings.aircraft.unwrap();
        assert_eq!(aircraft.vehicle_type, VehicleKind::Uav);
        assert_eq!(aircraft.cruise_speed_ms, 25.0);
        assert_eq!(aircraft.waypoints[0].alt_m, None);
        assert_eq!(aircraft.monte_carlo.seed, 42);
        assert!(settings.spacecraft.is_none());
        assert_eq!(settings.solver.max_steps, 1_000);
    }

    #[test]
    fn toml_is_selected_by_extension() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[spacecraft]\naltitude_km = 500.0\n\n[spacecraft.station]\nlat = 52.0\nlon = 4.0\n"
        )
        .unwrap();
        let settings = load_mission_settings(file.path()).unwrap();
        let spacecraft = settings.spacecraft.unwrap();
        assert_eq!(spacecraft.altitude_km, 500.0);
        assert_eq!(spacecraft.min_slew_s, 60.0);
        assert!(spacecraft.targets.is_empty());
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        let err = parse_mission_yaml("aircraft: [unclosed").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
