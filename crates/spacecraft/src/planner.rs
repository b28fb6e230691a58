//! Seven-day spacecraft mission planning and its report.

use mission_config::SpacecraftConfig;
use mission_core::geo::GeoPoint;
use mission_core::time::days_to_seconds;
use mission_core::units::m_to_km;
use mission_orbits::{GroundSite, KeplerianOrbit};
use mission_solver::{ConstraintReport, SolveStatus, SolverConfig};
use serde::Serialize;

use crate::constraints::{POWER, SLEW};
use crate::schedule::{Activity, ScheduleParams, schedule_windows, science_value};
use crate::windows::{ActivityKind, Window, WindowParams, build_windows};
use crate::{SCHEDULE_DAYS, SpacecraftError};

#[derive(Debug, Clone, Serialize)]
pub struct GroundTarget {
    pub site: GroundSite,
    pub value: f64,
}

/// Validated spacecraft mission.
#[derive(Debug, Clone)]
pub struct SpacecraftMission {
    pub orbit: KeplerianOrbit,
    pub targets: Vec<GroundTarget>,
    pub station: GroundSite,
    pub min_slew_s: f64,
    pub max_active_per_orbit_s: f64,
    pub window_params: WindowParams,
}

impl SpacecraftMission {
    pub fn from_config(config: &SpacecraftConfig) -> Result<Self, SpacecraftError> {
        let orbit = KeplerianOrbit::new(
            mission_core::constants::EARTH_RADIUS_KM + config.altitude_km,
            config.eccentricity,
            config.inclination_deg,
            config.raan_deg,
            0.0,
            0.0,
        )?;

        let targets = config
            .targets
            .iter()
            .enumerate()
            .map(|(index, target)| {
                let position = GeoPoint::new(target.lat, target.lon);
                if !position.is_valid() {
                    return Err(SpacecraftError::InvalidTarget {
                        index,
                        lat: target.lat,
                        lon: target.lon,
                    });
                }
                let name = target
                    .name
                    .clone()
                    .unwrap_or_else(|| format!("target-{index}"));
                Ok(GroundTarget {
                    site: GroundSite::new(name, position, 0.0),
                    value: target.value,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let station_position = GeoPoint::new(config.station.lat, config.station.lon);
        if !station_position.is_valid() {
            return Err(SpacecraftError::InvalidStation {
                lat: config.station.lat,
                lon: config.station.lon,
            });
        }
        let station = GroundSite::new(
            config.station.name.clone(),
            station_position,
            m_to_km(config.station.altitude_m),
        );

        positive("sample_step_s", config.sample_step_s)?;
        positive("max_active_per_orbit_s", config.max_active_per_orbit_s)?;
        if !(config.min_slew_s >= 0.0) {
            return Err(SpacecraftError::NonPositive {
                name: "min_slew_s",
                value: config.min_slew_s,
            });
        }

        Ok(Self {
            orbit,
            targets,
            station,
            min_slew_s: config.min_slew_s,
            max_active_per_orbit_s: config.max_active_per_orbit_s,
            window_params: WindowParams {
                horizon_s: days_to_seconds(f64::from(SCHEDULE_DAYS)),
                sample_step_s: config.sample_step_s,
                min_elevation_deg: config.min_elevation_deg,
                min_observation_s: config.min_observation_s,
                min_downlink_s: config.min_downlink_s,
            },
        })
    }

    pub fn schedule_params(&self) -> ScheduleParams {
        ScheduleParams {
            target_values: self.targets.iter().map(|t| t.value).collect(),
            horizon_s: self.window_params.horizon_s,
            min_slew_s: self.min_slew_s,
            max_active_per_orbit_s: self.max_active_per_orbit_s,
            orbit_period_s: self.orbit.period_s(),
        }
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), SpacecraftError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(SpacecraftError::NonPositive { name, value })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OrbitParameters {
    pub altitude_km: f64,
    pub semi_major_axis_km: f64,
    pub eccentricity: f64,
    pub inclination_deg: f64,
    pub raan_deg: f64,
    pub period_s: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TargetSummary {
    pub idx: usize,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub value: f64,
    pub observed: bool,
    pub downlinked: bool,
}

/// A visibility window and whether it made it into the schedule.
#[derive(Debug, Clone, Serialize)]
pub struct ContactEvidence {
    pub window_id: usize,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub target_idx: Option<usize>,
    pub start_t: f64,
    pub end_t: f64,
    pub peak_elevation_deg: f64,
    pub peak_t: f64,
    pub day: u32,
    pub scheduled: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpacecraftChecks {
    pub slew_feasible: bool,
    pub power_duty_ok: bool,
}

/// Complete result of one spacecraft planning invocation.
#[derive(Debug, Clone, Serialize)]
pub struct SpacecraftReport {
    pub status: SolveStatus,
    pub orbit_parameters: OrbitParameters,
    pub ground_targets: Vec<TargetSummary>,
    pub ground_station: GroundSite,
    pub schedule_days: u32,
    pub time_ordered_schedule: Vec<Activity>,
    pub visibility_contact_evidence: Vec<ContactEvidence>,
    pub constraint_checks: SpacecraftChecks,
    pub constraint_reports: Vec<ConstraintReport>,
    pub mission_value: f64,
}

/// Generate windows for the configured mission and schedule the seven days.
pub fn plan_spacecraft_mission(
    config: &SpacecraftConfig,
    solver: &SolverConfig,
) -> Result<SpacecraftReport, SpacecraftError> {
    let mission = SpacecraftMission::from_config(config)?;
    let sites: Vec<GroundSite> = mission.targets.iter().map(|t| t.site.clone()).collect();
    let windows = build_windows(&mission.orbit, &sites, &mission.station, &mission.window_params)?;
    log::info!(
        "{} observation and {} downlink windows over {SCHEDULE_DAYS} days",
        windows.iter().filter(|w| w.kind == ActivityKind::Observation).count(),
        windows.iter().filter(|w| w.kind == ActivityKind::Downlink).count()
    );

    let (windows, solution) = schedule_windows(windows, mission.schedule_params(), solver);
    let state = &solution.state;

    let feasible = |name: &str| {
        solution
            .reports
            .iter()
            .find(|r| r.name == name)
            .is_none_or(|r| r.result.feasible)
    };
    let constraint_checks = SpacecraftChecks {
        slew_feasible: feasible(SLEW),
        power_duty_ok: feasible(POWER),
    };

    let ground_targets = mission
        .targets
        .iter()
        .enumerate()
        .map(|(idx, target)| TargetSummary {
            idx,
            name: target.site.name.clone(),
            lat: target.site.position.lat,
            lon: target.site.position.lon,
            value: target.value,
            observed: state.observed[idx],
            downlinked: state.delivered[idx],
        })
        .collect();

    let visibility_contact_evidence = windows.iter().map(|w| evidence(w, state.consumed[w.id])).collect();
    let mission_value = science_value(state);

    log::info!(
        "spacecraft schedule {:?}: {} activities, value {mission_value}",
        solution.status,
        state.activities.len()
    );

    Ok(SpacecraftReport {
        status: solution.status,
        orbit_parameters: OrbitParameters {
            altitude_km: mission.orbit.altitude_km(),
            semi_major_axis_km: mission.orbit.semi_major_axis_km,
            eccentricity: mission.orbit.eccentricity,
            inclination_deg: mission.orbit.inclination_deg,
            raan_deg: mission.orbit.raan_deg,
            period_s: mission.orbit.period_s(),
        },
        ground_targets,
        ground_station: mission.station.clone(),
        schedule_days: SCHEDULE_DAYS,
        time_ordered_schedule: state.activities.clone(),
        visibility_contact_evidence,
        constraint_checks,
        constraint_reports: solution.reports.clone(),
        mission_value,
    })
}

fn evidence(window: &Window, scheduled: bool) -> ContactEvidence {
    ContactEvidence {
        window_id: window.id,
        kind: window.kind,
        target_idx: window.target_idx,
        start_t: window.start_t,
        end_t: window.end_t,
        peak_elevation_deg: window.peak_elevation_deg,
        peak_t: window.peak_t,
        day: window.day,
        scheduled,
    }
}
