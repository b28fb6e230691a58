//! Monte-Carlo robustness runs over sampled wind fields.

use mission_config::MonteCarloConfig;
use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;
use rayon::prelude::*;
use serde::Serialize;

use crate::constraints::RouteConstraint;
use crate::model::AircraftModel;
use crate::planner::RouteState;
use crate::simulate::simulate_route;
use crate::wind::{SampledWind, WindField};

/// Aggregated outcome of a trial batch. Distributions keep trial order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RobustnessSummary {
    /// Successful trials over evaluated trials; zero when nothing was evaluated.
    pub success_rate: f64,
    pub runs: usize,
    pub successes: usize,
    pub crashes: usize,
    /// Trials that broke at least one route constraint.
    pub constraint_failures: usize,
    /// Trials dropped on a modeling error.
    pub excluded: usize,
    pub total_times: Vec<f64>,
    pub total_energies: Vec<f64>,
    pub time_mean_s: f64,
    pub time_std_s: f64,
    pub energy_mean_j: f64,
    pub energy_std_j: f64,
}

struct Trial {
    crashed: bool,
    violated: bool,
    total_time_s: f64,
    total_energy_j: f64,
}

/// Fly the planned route once per trial through an independently sampled wind field.
///
/// A trial succeeds when it reaches the last waypoint without depletion and passes
/// every check in `checks`.
pub fn run_monte_carlo(
    model: &AircraftModel,
    state: &RouteState,
    checks: &[RouteConstraint],
    config: &MonteCarloConfig,
) -> RobustnessSummary {
    run_trials(model, state, checks, config, |_, rng| -> Box<dyn WindField> {
        Box::new(SampledWind::sample(rng, config))
    })
}

/// Trial runner behind [`run_monte_carlo`] with the wind field supplied by `wind_for`.
///
/// Trial `i` gets its own generator seeded with `seed + i`, so results do not depend
/// on thread scheduling. Trials whose simulation fails are excluded from the rates
/// and distributions.
pub fn run_trials<F>(
    model: &AircraftModel,
    state: &RouteState,
    checks: &[RouteConstraint],
    config: &MonteCarloConfig,
    wind_for: F,
) -> RobustnessSummary
where
    F: Fn(usize, &mut Pcg64Mcg) -> Box<dyn WindField> + Sync,
{
    let trials: Vec<Option<Trial>> = (0..config.runs)
        .into_par_iter()
        .map(|trial| {
            let mut rng = Pcg64Mcg::seed_from_u64(config.seed.wrapping_add(trial as u64));
            let wind = wind_for(trial, &mut rng);
            match simulate_route(model, &state.route, &state.speeds_ms, wind.as_ref()) {
                Ok(flight) => {
                    let flown = state.with_flight(flight);
                    Some(Trial {
                        crashed: flown.flight.crashed(),
                        violated: checks.iter().any(|check| !check.check(&flown).feasible),
                        total_time_s: flown.flight.total_time_s,
                        total_energy_j: flown.flight.total_energy_j,
                    })
                }
                Err(err) => {
                    log::warn!("trial {trial} excluded: {err}");
                    None
                }
            }
        })
        .collect();

    let evaluated: Vec<&Trial> = trials.iter().flatten().collect();
    let successes = evaluated.iter().filter(|t| !t.crashed && !t.violated).count();
    let total_times: Vec<f64> = evaluated.iter().map(|t| t.total_time_s).collect();
    let total_energies: Vec<f64> = evaluated.iter().map(|t| t.total_energy_j).collect();
    let (time_mean_s, time_std_s) = mean_std(&total_times);
    let (energy_mean_j, energy_std_j) = mean_std(&total_energies);

    let summary = RobustnessSummary {
        success_rate: if evaluated.is_empty() {
            0.0
        } else {
            successes as f64 / evaluated.len() as f64
        },
        runs: config.runs,
        successes,
        crashes: evaluated.iter().filter(|t| t.crashed).count(),
        constraint_failures: evaluated.iter().filter(|t| t.violated).count(),
        excluded: config.runs - evaluated.len(),
        total_times,
        total_energies,
        time_mean_s,
        time_std_s,
        energy_mean_j,
        energy_std_j,
    };
    log::info!(
        "monte carlo: {}/{} successful ({} crashed, {} off-limits, {} excluded)",
        summary.successes,
        summary.runs,
        summary.crashes,
        summary.constraint_failures,
        summary.excluded
    );
    summary
}

/// Population mean and standard deviation.
fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_std_of_constant_series() {
        assert_eq!(mean_std(&[3.0, 3.0, 3.0]), (3.0, 0.0));
        assert_eq!(mean_std(&[]), (0.0, 0.0));
        let (mean, std) = mean_std(&[1.0, 3.0]);
        assert_eq!(mean, 2.0);
        assert!((std - 1.0).abs() < 1e-12);
    }
}
