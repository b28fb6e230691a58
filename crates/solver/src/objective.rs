//! Objective contract.

use std::cmp::Ordering;

use serde::Serialize;

/// Optimization direction declared by an objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Minimize,
    Maximize,
}

const SCORE_EPSILON: f64 = 1e-9;

impl Direction {
    /// `Ordering::Less` when `a` is strictly better than `b`, `Equal` within tolerance.
    pub fn compare(self, a: f64, b: f64) -> Ordering {
        let scale = a.abs().max(b.abs()).max(1.0);
        if (a - b).abs() <= SCORE_EPSILON * scale {
            return Ordering::Equal;
        }
        match self {
            Direction::Minimize => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
            Direction::Maximize => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
        }
    }

    /// True when `candidate` is no worse than `reference` by more than `tolerance` (relative).
    pub fn within_tolerance(self, candidate: f64, reference: f64, tolerance: f64) -> bool {
        let slack = tolerance * reference.abs().max(1.0);
        match self {
            Direction::Minimize => candidate <= reference + slack,
            Direction::Maximize => candidate >= reference - slack,
        }
    }
}

/// Scalar scoring function over a plan state.
pub trait Objective<S> {
    fn name(&self) -> &str;

    fn direction(&self) -> Direction;

    /// Score of a (possibly partial) plan.
    fn evaluate(&self, state: &S) -> f64;

    /// Running estimate used to rank greedy candidates; defaults to [`evaluate`](Self::evaluate).
    fn estimate(&self, state: &S) -> f64 {
        self.evaluate(state)
    }
}
