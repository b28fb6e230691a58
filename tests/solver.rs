use mission_planner::solver::{
    Constraint, ConstraintResult, DecisionVariables, Direction, Objective, SolveStatus,
    SolverConfig, solve,
};

/// Order every task exactly once.
struct Sequence {
    tasks: usize,
}

impl DecisionVariables for Sequence {
    type State = Vec<usize>;
    type Choice = usize;

    fn initial_state(&self) -> Vec<usize> {
        Vec::new()
    }

    fn candidates(&self, state: &Vec<usize>) -> Vec<usize> {
        (0..self.tasks).filter(|t| !state.contains(t)).collect()
    }

    fn apply(&self, state: &Vec<usize>, choice: &usize) -> Vec<usize> {
        let mut next = state.clone();
        next.push(*choice);
        next
    }

    fn is_complete(&self, state: &Vec<usize>) -> bool {
        state.len() == self.tasks
    }
}

/// Task `task` must come first; violation is how far back it sits.
struct MustLead {
    task: usize,
}

impl Constraint<Vec<usize>> for MustLead {
    fn name(&self) -> &str {
        "must_lead"
    }

    fn check(&self, state: &Vec<usize>) -> ConstraintResult {
        match state.iter().position(|t| *t == self.task) {
            Some(position) if position > 0 => {
                ConstraintResult::violated(position as f64, "task placed late")
            }
            _ => ConstraintResult::satisfied(),
        }
    }
}

/// Position-weighted cost: later tasks cost their weight times their position.
struct Delay {
    weights: Vec<f64>,
}

impl Objective<Vec<usize>> for Delay {
    fn name(&self) -> &str {
        "delay"
    }

    fn direction(&self) -> Direction {
        Direction::Minimize
    }

    fn evaluate(&self, state: &Vec<usize>) -> f64 {
        state
            .iter()
            .enumerate()
            .map(|(position, task)| position as f64 * self.weights[*task])
            .sum()
    }
}

fn constraints() -> Vec<Box<dyn Constraint<Vec<usize>>>> {
    vec![Box::new(MustLead { task: 1 })]
}

#[test]
fn repair_swaps_out_a_violation_at_equal_cost() {
    let objective = Delay {
        weights: vec![1.0, 1.0],
    };
    let solution = solve(&Sequence { tasks: 2 }, &constraints(), &objective, &SolverConfig::default());
    assert_eq!(solution.choices, vec![1, 0]);
    assert_eq!(solution.repairs, 1);
    assert_eq!(solution.status, SolveStatus::Feasible);
    assert_eq!(solution.total_violation, 0.0);
}

#[test]
fn repair_refuses_a_swap_that_costs_too_much() {
    let objective = Delay {
        weights: vec![10.0, 1.0],
    };
    let solution = solve(&Sequence { tasks: 2 }, &constraints(), &objective, &SolverConfig::default());
    assert_eq!(solution.choices, vec![0, 1]);
    assert_eq!(solution.repairs, 0);
    assert_eq!(solution.status, SolveStatus::FeasibleWithViolations);
    let report = solution
        .reports
        .iter()
        .find(|r| r.name == "must_lead")
        .expect("report");
    assert!(!report.result.feasible);
    assert_eq!(report.result.violation, 1.0);
}

#[test]
fn repair_budget_of_zero_keeps_the_greedy_plan() {
    let objective = Delay {
        weights: vec![1.0, 1.0],
    };
    let config = SolverConfig {
        max_repair_iterations: 0,
        ..SolverConfig::default()
    };
    let solution = solve(&Sequence { tasks: 2 }, &constraints(), &objective, &config);
    assert_eq!(solution.choices, vec![0, 1]);
    assert_eq!(solution.status, SolveStatus::FeasibleWithViolations);
}

#[test]
fn step_budget_leaves_the_plan_incomplete() {
    let objective = Delay {
        weights: vec![1.0; 4],
    };
    let config = SolverConfig {
        max_steps: 2,
        ..SolverConfig::default()
    };
    let solution = solve(&Sequence { tasks: 4 }, &[], &objective, &config);
    assert_eq!(solution.choices.len(), 2);
    assert_eq!(solution.status, SolveStatus::Infeasible);
}

#[test]
fn identical_inputs_give_identical_plans() {
    let objective = Delay {
        weights: vec![3.0, 1.0, 2.0, 5.0, 4.0],
    };
    let first = solve(&Sequence { tasks: 5 }, &constraints(), &objective, &SolverConfig::default());
    let second = solve(&Sequence { tasks: 5 }, &constraints(), &objective, &SolverConfig::default());
    assert_eq!(first.choices, second.choices);
    assert_eq!(first.score, second.score);
    assert_eq!(first.status, second.status);
}
