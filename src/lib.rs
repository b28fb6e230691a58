//! Aircraft route planning and LEO spacecraft scheduling on one shared solver.
//!
//! The domain logic lives in the workspace crates; this crate re-exports them so
//! front-ends (the `mission` CLI, tests) depend on a single library.

pub use mission_aircraft as aircraft;
pub use mission_config as config;
pub use mission_core as common;
pub use mission_export as export;
pub use mission_orbits as orbits;
pub use mission_solver as solver;
pub use mission_spacecraft as spacecraft;

use mission_config::SolverSettings;
use mission_solver::SolverConfig;

/// Solver budgets from the `solver` block of a settings file.
pub fn solver_config(settings: &SolverSettings) -> SolverConfig {
    SolverConfig {
        max_steps: settings.max_steps,
        max_repair_iterations: settings.max_repair_iterations,
        repair_tolerance: settings.repair_tolerance,
    }
}

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
