//! Schedule state, decision variables and the science-value objective.

use mission_solver::{
    Constraint, DecisionVariables, Direction, Objective, Solution, SolverConfig, solve,
};
use serde::Serialize;

use crate::constraints::{PowerConstraint, SlewConstraint};
use crate::windows::{ActivityKind, Window, sort_and_number};

/// Guidance credit for data observed but not yet on the ground.
pub const PENDING_OBSERVATION_CREDIT: f64 = 0.5;

/// Scheduled activity occupying a whole window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Activity {
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub start_t: f64,
    pub end_t: f64,
    pub target_idx: Option<usize>,
    /// Targets whose data this downlink brings down.
    pub targets_downlinked: Vec<usize>,
    pub window_id: usize,
}

impl Activity {
    pub fn duration_s(&self) -> f64 {
        self.end_t - self.start_t
    }
}

/// Activities so far plus per-target progress.
#[derive(Debug, Clone, Default)]
pub struct ScheduleState {
    pub activities: Vec<Activity>,
    pub consumed: Vec<bool>,
    pub observed: Vec<bool>,
    pub delivered: Vec<bool>,
    /// Observed targets awaiting a downlink, in observation order.
    pub pending: Vec<usize>,
}

impl ScheduleState {
    fn last_end(&self) -> f64 {
        self.activities.last().map_or(f64::NEG_INFINITY, |a| a.end_t)
    }
}

#[derive(Debug, Clone)]
pub struct ScheduleParams {
    pub target_values: Vec<f64>,
    pub horizon_s: f64,
    pub min_slew_s: f64,
    pub max_active_per_orbit_s: f64,
    pub orbit_period_s: f64,
}

/// Window selection. Candidates are the unconsumed windows of the earliest day that
/// still has one starting after the slew gap and fitting the orbit's duty budget,
/// best remaining value first among equal starts.
pub struct ScheduleVariables {
    windows: Vec<Window>,
    params: ScheduleParams,
}

impl ScheduleVariables {
    pub fn new(windows: Vec<Window>, params: ScheduleParams) -> Self {
        Self { windows, params }
    }

    pub fn windows(&self) -> &[Window] {
        &self.windows
    }

    fn remaining_value(&self, state: &ScheduleState, window: &Window) -> f64 {
        match window.kind {
            ActivityKind::Observation => window
                .target_idx
                .map_or(0.0, |t| self.params.target_values.get(t).copied().unwrap_or(0.0)),
            ActivityKind::Downlink => state
                .pending
                .iter()
                .map(|&t| self.params.target_values.get(t).copied().unwrap_or(0.0))
                .sum(),
        }
    }

    /// Active seconds already charged to the orbit `window` starts in.
    fn orbit_load(&self, state: &ScheduleState, window: &Window) -> f64 {
        let orbit = orbit_number(window.start_t, self.params.orbit_period_s);
        state
            .activities
            .iter()
            .filter(|a| orbit_number(a.start_t, self.params.orbit_period_s) == orbit)
            .map(Activity::duration_s)
            .sum()
    }

    fn admissible(&self, state: &ScheduleState, window: &Window) -> bool {
        if state.consumed.get(window.id).copied().unwrap_or(false)
            || window.start_t < state.last_end() + self.params.min_slew_s
            || window.end_t > self.params.horizon_s
            || self.orbit_load(state, window) + window.duration_s()
                > self.params.max_active_per_orbit_s + 1e-9
        {
            return false;
        }
        match (window.kind, window.target_idx) {
            (ActivityKind::Observation, Some(t)) => {
                t < state.observed.len() && !state.observed[t]
            }
            (ActivityKind::Observation, None) => false,
            (ActivityKind::Downlink, _) => !state.pending.is_empty(),
        }
    }
}

impl DecisionVariables for ScheduleVariables {
    type State = ScheduleState;
    type Choice = usize;

    fn initial_state(&self) -> ScheduleState {
        let targets = self.params.target_values.len();
        ScheduleState {
            activities: Vec::new(),
            consumed: vec![false; self.windows.len()],
            observed: vec![false; targets],
            delivered: vec![false; targets],
            pending: Vec::new(),
        }
    }

    fn candidates(&self, state: &ScheduleState) -> Vec<usize> {
        let admissible: Vec<&Window> = self
            .windows
            .iter()
            .filter(|w| self.admissible(state, w))
            .collect();
        let Some(day) = admissible.iter().map(|w| w.day).min() else {
            return Vec::new();
        };
        let mut today: Vec<(&Window, f64)> = admissible
            .into_iter()
            .filter(|w| w.day == day)
            .map(|w| (w, self.remaining_value(state, w)))
            .collect();
        today.sort_by(|(a, va), (b, vb)| {
            a.start_t
                .total_cmp(&b.start_t)
                .then_with(|| vb.total_cmp(va))
                .then_with(|| a.id.cmp(&b.id))
        });
        today.into_iter().map(|(w, _)| w.id).collect()
    }

    fn apply(&self, state: &ScheduleState, choice: &usize) -> ScheduleState {
        let mut next = state.clone();
        let Some(window) = self.windows.get(*choice) else {
            return next;
        };
        let targets_downlinked = match (window.kind, window.target_idx) {
            (ActivityKind::Observation, Some(t)) => {
                next.observed[t] = true;
                next.pending.push(t);
                Vec::new()
            }
            (ActivityKind::Observation, None) => Vec::new(),
            (ActivityKind::Downlink, _) => {
                let sent = std::mem::take(&mut next.pending);
                for &t in &sent {
                    next.delivered[t] = true;
                }
                sent
            }
        };
        next.consumed[window.id] = true;
        next.activities.push(Activity {
            kind: window.kind,
            start_t: window.start_t,
            end_t: window.end_t,
            target_idx: window.target_idx,
            targets_downlinked,
            window_id: window.id,
        });
        next
    }

    fn is_complete(&self, state: &ScheduleState) -> bool {
        self.candidates(state).is_empty()
    }

    fn requires_completion(&self) -> bool {
        false
    }
}

/// Orbit count at `t`; activities are charged to the orbit they start in.
pub(crate) fn orbit_number(t: f64, period_s: f64) -> u64 {
    (t / period_s).floor().max(0.0) as u64
}

/// Number of targets both observed and downlinked afterwards.
pub fn science_value(state: &ScheduleState) -> f64 {
    state.delivered.iter().filter(|d| **d).count() as f64
}

/// +1 per target observed and later downlinked.
pub struct ScienceValue;

impl Objective<ScheduleState> for ScienceValue {
    fn name(&self) -> &str {
        "science_value"
    }

    fn direction(&self) -> Direction {
        Direction::Maximize
    }

    fn evaluate(&self, state: &ScheduleState) -> f64 {
        science_value(state)
    }

    fn estimate(&self, state: &ScheduleState) -> f64 {
        science_value(state) + PENDING_OBSERVATION_CREDIT * state.pending.len() as f64
    }
}

/// Schedule the given windows (renumbered by start time) with slew and power checks.
pub fn schedule_windows(
    mut windows: Vec<Window>,
    params: ScheduleParams,
    solver: &SolverConfig,
) -> (Vec<Window>, Solution<ScheduleState, usize>) {
    sort_and_number(&mut windows);
    let checks: Vec<Box<dyn Constraint<ScheduleState>>> = vec![
        Box::new(SlewConstraint {
            min_slew_s: params.min_slew_s,
        }),
        Box::new(PowerConstraint {
            orbit_period_s: params.orbit_period_s,
            max_active_per_orbit_s: params.max_active_per_orbit_s,
        }),
    ];
    let variables = ScheduleVariables::new(windows, params);
    let solution = solve(&variables, &checks, &ScienceValue, solver);
    (variables.windows, solution)
}
