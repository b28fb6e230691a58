//! Observation and downlink windows derived from passes.

use mission_core::time::day_index;
use mission_orbits::{GroundSite, KeplerianOrbit, find_passes};
use serde::Serialize;

use crate::SpacecraftError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Observation,
    Downlink,
}

/// One schedulable opportunity: a target pass or a station pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Window {
    pub id: usize,
    pub kind: ActivityKind,
    /// Observed target; `None` for station contacts.
    pub target_idx: Option<usize>,
    pub start_t: f64,
    pub end_t: f64,
    pub peak_elevation_deg: f64,
    pub peak_t: f64,
    pub day: u32,
}

impl Window {
    pub fn observation(target_idx: usize, start_t: f64, end_t: f64) -> Self {
        Self::synthetic(ActivityKind::Observation, Some(target_idx), start_t, end_t)
    }

    pub fn downlink(start_t: f64, end_t: f64) -> Self {
        Self::synthetic(ActivityKind::Downlink, None, start_t, end_t)
    }

    /// Window without pass geometry; ids are reassigned by the scheduler.
    fn synthetic(kind: ActivityKind, target_idx: Option<usize>, start_t: f64, end_t: f64) -> Self {
        Self {
            id: 0,
            kind,
            target_idx,
            start_t,
            end_t,
            peak_elevation_deg: 90.0,
            peak_t: 0.5 * (start_t + end_t),
            day: day_index(start_t),
        }
    }

    pub fn duration_s(&self) -> f64 {
        self.end_t - self.start_t
    }
}

/// Sampling and filtering parameters for window generation.
#[derive(Debug, Clone, Copy)]
pub struct WindowParams {
    pub horizon_s: f64,
    pub sample_step_s: f64,
    pub min_elevation_deg: f64,
    pub min_observation_s: f64,
    pub min_downlink_s: f64,
}

/// All windows over the horizon, sorted by start time, ids in that order.
///
/// Passes shorter than the minimum observation or downlink length are dropped.
pub fn build_windows(
    orbit: &KeplerianOrbit,
    targets: &[GroundSite],
    station: &GroundSite,
    params: &WindowParams,
) -> Result<Vec<Window>, SpacecraftError> {
    let mut windows = Vec::new();
    let mut push = |kind, target_idx, site: &GroundSite, min_len: f64| -> Result<(), SpacecraftError> {
        let passes = find_passes(
            orbit,
            site,
            0.0,
            params.horizon_s,
            params.sample_step_s,
            params.min_elevation_deg,
        )?;
        let total = passes.len();
        let kept: Vec<_> = passes.into_iter().filter(|p| p.duration_s() >= min_len).collect();
        log::debug!("{}: {} of {total} passes long enough", site.name, kept.len());
        windows.extend(kept.into_iter().map(|pass| Window {
            id: 0,
            kind,
            target_idx,
            start_t: pass.start_t,
            end_t: pass.end_t,
            peak_elevation_deg: pass.peak_elevation_deg,
            peak_t: pass.peak_t,
            day: day_index(pass.start_t),
        }));
        Ok(())
    };

    for (idx, target) in targets.iter().enumerate() {
        push(ActivityKind::Observation, Some(idx), target, params.min_observation_s)?;
    }
    push(ActivityKind::Downlink, None, station, params.min_downlink_s)?;

    sort_and_number(&mut windows);
    Ok(windows)
}

/// Sort by start (observations before downlinks on equal start) and renumber.
pub(crate) fn sort_and_number(windows: &mut [Window]) {
    windows.sort_by(|a, b| {
        a.start_t
            .total_cmp(&b.start_t)
            .then_with(|| (a.kind == ActivityKind::Downlink).cmp(&(b.kind == ActivityKind::Downlink)))
            .then_with(|| a.target_idx.cmp(&b.target_idx))
    });
    for (id, window) in windows.iter_mut().enumerate() {
        window.id = id;
    }
}
