//! Constraint contract and aggregate evaluation.

use serde::Serialize;

/// Outcome of checking one constraint against one plan state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstraintResult {
    pub feasible: bool,
    /// Non-negative; zero when feasible.
    pub violation: f64,
    pub detail: String,
}

impl ConstraintResult {
    pub fn satisfied() -> Self {
        Self {
            feasible: true,
            violation: 0.0,
            detail: String::new(),
        }
    }

    pub fn violated(magnitude: f64, detail: impl Into<String>) -> Self {
        Self {
            feasible: false,
            violation: magnitude.max(0.0),
            detail: detail.into(),
        }
    }
}

/// How the solver treats a violated constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    /// Candidates violating it are never admitted.
    Structural,
    /// Violations are ranked by magnitude and accepted when nothing better exists.
    Hard,
}

/// A pure predicate-with-magnitude over a plan state.
pub trait Constraint<S> {
    fn name(&self) -> &str;

    fn kind(&self) -> ConstraintKind {
        ConstraintKind::Hard
    }

    fn check(&self, state: &S) -> ConstraintResult;
}

/// Named result for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct ConstraintReport {
    pub name: String,
    pub kind: ConstraintKind,
    pub result: ConstraintResult,
}

/// All constraint results for one state.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub structural_ok: bool,
    pub total_violation: f64,
    pub reports: Vec<ConstraintReport>,
}

impl Evaluation {
    pub fn evaluate<S>(constraints: &[Box<dyn Constraint<S>>], state: &S) -> Self {
        let mut structural_ok = true;
        let mut total_violation = 0.0;
        let mut reports = Vec::with_capacity(constraints.len());
        for constraint in constraints {
            let result = constraint.check(state);
            if !result.feasible {
                match constraint.kind() {
                    ConstraintKind::Structural => structural_ok = false,
                    ConstraintKind::Hard => total_violation += result.violation,
                }
            }
            reports.push(ConstraintReport {
                name: constraint.name().to_string(),
                kind: constraint.kind(),
                result,
            });
        }
        Self {
            structural_ok,
            total_violation,
            reports,
        }
    }

    /// Report for the constraint named `name`, if it was evaluated.
    pub fn report(&self, name: &str) -> Option<&ConstraintReport> {
        self.reports.iter().find(|r| r.name == name)
    }
}
