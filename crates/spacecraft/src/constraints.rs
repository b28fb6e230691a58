//! Slew and power/duty constraints on the activity list.

use std::collections::BTreeMap;

use mission_solver::{Constraint, ConstraintKind, ConstraintResult};

use crate::schedule::{ScheduleState, orbit_number};

pub const SLEW: &str = "slew";
pub const POWER: &str = "power_duty";

/// Consecutive activities leave at least `min_slew_s` to repoint.
pub struct SlewConstraint {
    pub min_slew_s: f64,
}

impl Constraint<ScheduleState> for SlewConstraint {
    fn name(&self) -> &str {
        SLEW
    }

    fn kind(&self) -> ConstraintKind {
        ConstraintKind::Structural
    }

    fn check(&self, state: &ScheduleState) -> ConstraintResult {
        let shortfall: f64 = state
            .activities
            .windows(2)
            .map(|pair| pair[1].start_t - pair[0].end_t)
            .filter(|gap| *gap < self.min_slew_s)
            .map(|gap| self.min_slew_s - gap)
            .sum();
        if shortfall > 0.0 {
            ConstraintResult::violated(shortfall, format!("{shortfall:.0} s short of slew time"))
        } else {
            ConstraintResult::satisfied()
        }
    }
}

/// Active time charged to each orbital period stays under the cap.
///
/// Activities are charged to the period their start falls in.
pub struct PowerConstraint {
    pub orbit_period_s: f64,
    pub max_active_per_orbit_s: f64,
}

impl PowerConstraint {
    /// Active seconds per orbit number.
    pub fn active_per_orbit(&self, state: &ScheduleState) -> BTreeMap<u64, f64> {
        let mut active = BTreeMap::new();
        for activity in &state.activities {
            let orbit = orbit_number(activity.start_t, self.orbit_period_s);
            *active.entry(orbit).or_insert(0.0) += activity.duration_s();
        }
        active
    }
}

impl Constraint<ScheduleState> for PowerConstraint {
    fn name(&self) -> &str {
        POWER
    }

    fn kind(&self) -> ConstraintKind {
        ConstraintKind::Structural
    }

    fn check(&self, state: &ScheduleState) -> ConstraintResult {
        let excess: f64 = self
            .active_per_orbit(state)
            .values()
            .map(|active| (active - self.max_active_per_orbit_s).max(0.0))
            .sum();
        if excess > 1e-9 {
            ConstraintResult::violated(excess, format!("{excess:.0} s over duty cap"))
        } else {
            ConstraintResult::satisfied()
        }
    }
}
