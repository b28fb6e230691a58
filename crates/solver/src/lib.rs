//! Planning primitives (decision variables, constraints, objectives) and the single
//! solving procedure shared by the aircraft planner and the spacecraft scheduler.
//!
//! Nothing in this crate knows about routes or orbits: domains plug in through the
//! [`DecisionVariables`], [`Constraint`] and [`Objective`] traits.

pub mod constraint;
pub mod objective;
pub mod solver;
pub mod variables;

pub use constraint::{Constraint, ConstraintKind, ConstraintReport, ConstraintResult, Evaluation};
pub use objective::{Direction, Objective};
pub use solver::{Solution, SolveStatus, SolverConfig, solve};
pub use variables::DecisionVariables;
