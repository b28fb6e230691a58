//! Greedy construction followed by bounded adjacent-swap repair.

use std::cmp::Ordering;

use serde::Serialize;

use crate::constraint::{Constraint, ConstraintReport, Evaluation};
use crate::objective::{Direction, Objective};
use crate::variables::DecisionVariables;

const VIOLATION_EPSILON: f64 = 1e-9;

/// Budgets for one solver invocation.
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Maximum greedy decisions.
    pub max_steps: usize,
    /// Maximum swap attempts during repair.
    pub max_repair_iterations: usize,
    /// Relative objective degradation a repair may accept.
    pub repair_tolerance: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_steps: 1_000,
            max_repair_iterations: 200,
            repair_tolerance: 0.05,
        }
    }
}

/// Overall plan quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    Feasible,
    FeasibleWithViolations,
    Infeasible,
}

/// Plan produced by [`solve`] together with its status and final constraint reports.
#[derive(Debug, Clone)]
pub struct Solution<S, C> {
    pub state: S,
    pub choices: Vec<C>,
    pub status: SolveStatus,
    pub score: f64,
    pub total_violation: f64,
    pub reports: Vec<ConstraintReport>,
    pub steps: usize,
    pub repairs: usize,
}

struct Scored<S, C> {
    index: usize,
    choice: C,
    state: S,
    violation: f64,
    estimate: f64,
}

impl<S, C> Scored<S, C> {
    fn feasible(&self) -> bool {
        self.violation <= VIOLATION_EPSILON
    }

    /// Strict improvement; candidates are visited in index order, so ties keep the earlier one.
    fn beats(&self, other: &Self, direction: Direction) -> bool {
        match (self.feasible(), other.feasible()) {
            (true, false) => true,
            (false, true) => false,
            (true, true) => match direction.compare(self.estimate, other.estimate) {
                Ordering::Less => true,
                Ordering::Greater => false,
                Ordering::Equal => self.violation < other.violation - VIOLATION_EPSILON,
            },
            (false, false) => {
                if self.violation < other.violation - VIOLATION_EPSILON {
                    true
                } else if other.violation < self.violation - VIOLATION_EPSILON {
                    false
                } else {
                    direction.compare(self.estimate, other.estimate) == Ordering::Less
                }
            }
        }
    }
}

/// Build a plan for `variables` under `constraints`, scored by `objective`.
///
/// Never fails: an unreachable structural requirement yields [`SolveStatus::Infeasible`]
/// with the best partial plan found.
pub fn solve<V, O>(
    variables: &V,
    constraints: &[Box<dyn Constraint<V::State>>],
    objective: &O,
    config: &SolverConfig,
) -> Solution<V::State, V::Choice>
where
    V: DecisionVariables,
    O: Objective<V::State> + ?Sized,
{
    let direction = objective.direction();
    let mut state = variables.initial_state();
    let mut choices: Vec<V::Choice> = Vec::new();
    let mut steps = 0;

    while steps < config.max_steps && !variables.is_complete(&state) {
        let mut best: Option<Scored<V::State, V::Choice>> = None;
        for (index, choice) in variables.candidates(&state).into_iter().enumerate() {
            let next = variables.apply(&state, &choice);
            let evaluation = Evaluation::evaluate(constraints, &next);
            if !evaluation.structural_ok {
                continue;
            }
            let scored = Scored {
                index,
                estimate: objective.estimate(&next),
                violation: evaluation.total_violation,
                choice,
                state: next,
            };
            if best.as_ref().is_none_or(|b| scored.beats(b, direction)) {
                best = Some(scored);
            }
        }

        let Some(best) = best else {
            log::debug!("{}: no admissible candidate after {steps} steps", objective.name());
            break;
        };
        log::trace!(
            "step {steps}: candidate #{} {:?} (violation {:.3}, estimate {:.3})",
            best.index,
            best.choice,
            best.violation,
            best.estimate
        );
        state = best.state;
        choices.push(best.choice);
        steps += 1;
    }

    let mut evaluation = Evaluation::evaluate(constraints, &state);
    let mut score = objective.evaluate(&state);
    let mut repairs = 0;
    let mut iterations = 0;

    'repair: while evaluation.total_violation > VIOLATION_EPSILON && choices.len() > 1 {
        let mut improved = false;
        for i in 0..choices.len() - 1 {
            if iterations >= config.max_repair_iterations {
                break 'repair;
            }
            iterations += 1;

            let mut trial = choices.clone();
            trial.swap(i, i + 1);
            let Some(candidate) = replay(variables, &trial) else {
                continue;
            };
            let candidate_eval = Evaluation::evaluate(constraints, &candidate);
            if !candidate_eval.structural_ok
                || candidate_eval.total_violation >= evaluation.total_violation - VIOLATION_EPSILON
            {
                continue;
            }
            let candidate_score = objective.evaluate(&candidate);
            if !direction.within_tolerance(candidate_score, score, config.repair_tolerance) {
                continue;
            }

            state = candidate;
            choices = trial;
            evaluation = candidate_eval;
            score = candidate_score;
            repairs += 1;
            improved = true;
            break;
        }
        if !improved {
            break;
        }
    }

    let incomplete = variables.requires_completion() && !variables.is_complete(&state);
    let status = if !evaluation.structural_ok || incomplete {
        SolveStatus::Infeasible
    } else if evaluation.total_violation > VIOLATION_EPSILON {
        SolveStatus::FeasibleWithViolations
    } else {
        SolveStatus::Feasible
    };

    log::debug!(
        "{}: {:?} after {steps} steps and {repairs} repairs (score {score:.3}, violation {:.3})",
        objective.name(),
        status,
        evaluation.total_violation
    );

    Solution {
        state,
        choices,
        status,
        score,
        total_violation: evaluation.total_violation,
        reports: evaluation.reports,
        steps,
        repairs,
    }
}

/// Re-apply `choices` from the initial state; `None` when a choice is not admissible in order.
fn replay<V: DecisionVariables>(variables: &V, choices: &[V::Choice]) -> Option<V::State> {
    let mut state = variables.initial_state();
    for choice in choices {
        if !variables.candidates(&state).contains(choice) {
            return None;
        }
        state = variables.apply(&state, choice);
    }
    Some(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::{ConstraintKind, ConstraintResult};

    /// Pick `len` distinct items from `weights`, in any order.
    struct PickItems {
        weights: Vec<f64>,
        len: usize,
    }

    impl DecisionVariables for PickItems {
        type State = Vec<usize>;
        type Choice = usize;

        fn initial_state(&self) -> Vec<usize> {
            Vec::new()
        }

        fn candidates(&self, state: &Vec<usize>) -> Vec<usize> {
            (0..self.weights.len()).filter(|i| !state.contains(i)).collect()
        }

        fn apply(&self, state: &Vec<usize>, choice: &usize) -> Vec<usize> {
            let mut next = state.clone();
            next.push(*choice);
            next
        }

        fn is_complete(&self, state: &Vec<usize>) -> bool {
            state.len() >= self.len
        }
    }

    struct TotalWeight<'a>(&'a [f64]);

    impl Objective<Vec<usize>> for TotalWeight<'_> {
        fn name(&self) -> &str {
            "total_weight"
        }

        fn direction(&self) -> Direction {
            Direction::Maximize
        }

        fn evaluate(&self, state: &Vec<usize>) -> f64 {
            state.iter().map(|&i| self.0[i]).sum()
        }
    }

    struct Forbid(usize, ConstraintKind);

    impl Constraint<Vec<usize>> for Forbid {
        fn name(&self) -> &str {
            "forbid"
        }

        fn kind(&self) -> ConstraintKind {
            self.1
        }

        fn check(&self, state: &Vec<usize>) -> ConstraintResult {
            if state.contains(&self.0) {
                ConstraintResult::violated(1.0, format!("item {} used", self.0))
            } else {
                ConstraintResult::satisfied()
            }
        }
    }

    #[test]
    fn greedy_picks_heaviest_items_first() {
        let weights = vec![1.0, 5.0, 3.0];
        let vars = PickItems {
            weights: weights.clone(),
            len: 2,
        };
        let solution = solve(&vars, &[], &TotalWeight(&weights), &SolverConfig::default());
        assert_eq!(solution.choices, vec![1, 2]);
        assert_eq!(solution.status, SolveStatus::Feasible);
        assert!((solution.score - 8.0).abs() < 1e-12);
    }

    #[test]
    fn equal_scores_prefer_lower_index() {
        let weights = vec![2.0, 2.0, 2.0];
        let vars = PickItems {
            weights: weights.clone(),
            len: 1,
        };
        let solution = solve(&vars, &[], &TotalWeight(&weights), &SolverConfig::default());
        assert_eq!(solution.choices, vec![0]);
    }

    #[test]
    fn structural_exclusion_makes_completion_impossible() {
        let weights = vec![1.0, 2.0];
        let vars = PickItems {
            weights: weights.clone(),
            len: 2,
        };
        let constraints: Vec<Box<dyn Constraint<Vec<usize>>>> =
            vec![Box::new(Forbid(0, ConstraintKind::Structural))];
        let solution = solve(&vars, &constraints, &TotalWeight(&weights), &SolverConfig::default());
        assert_eq!(solution.status, SolveStatus::Infeasible);
        assert_eq!(solution.choices, vec![1]);
    }

    #[test]
    fn hard_violation_is_accepted_as_near_miss() {
        let weights = vec![1.0, 2.0];
        let vars = PickItems {
            weights: weights.clone(),
            len: 2,
        };
        let constraints: Vec<Box<dyn Constraint<Vec<usize>>>> =
            vec![Box::new(Forbid(0, ConstraintKind::Hard))];
        let solution = solve(&vars, &constraints, &TotalWeight(&weights), &SolverConfig::default());
        assert_eq!(solution.status, SolveStatus::FeasibleWithViolations);
        assert_eq!(solution.choices.len(), 2);
        assert!((solution.total_violation - 1.0).abs() < 1e-12);
    }
}
