//! Spacecraft mission planning: visibility windows, slew and power constraints,
//! science-value scoring and the seven-day scheduler.

pub mod constraints;
pub mod planner;
pub mod schedule;
pub mod windows;

use mission_orbits::OrbitError;
use thiserror::Error;

pub use planner::{GroundTarget, SpacecraftMission, SpacecraftReport, plan_spacecraft_mission};
pub use schedule::{
    Activity, ScheduleParams, ScheduleState, ScheduleVariables, ScienceValue, schedule_windows,
    science_value,
};
pub use windows::{ActivityKind, Window, WindowParams, build_windows};

/// Schedule horizon in days.
pub const SCHEDULE_DAYS: u32 = 7;

#[derive(Debug, Error)]
pub enum SpacecraftError {
    #[error("invalid orbit: {0}")]
    Orbit(#[from] OrbitError),
    #[error("target {index} has invalid coordinates ({lat}, {lon})")]
    InvalidTarget { index: usize, lat: f64, lon: f64 },
    #[error("ground station has invalid coordinates ({lat}, {lon})")]
    InvalidStation { lat: f64, lon: f64 },
    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: f64 },
}
