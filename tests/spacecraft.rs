use mission_planner::config::SpacecraftConfig;
use mission_planner::solver::{SolveStatus, SolverConfig};
use mission_planner::spacecraft::{
    ActivityKind, ScheduleParams, SpacecraftMission, Window, plan_spacecraft_mission,
    schedule_windows,
};

fn params(targets: usize, min_slew_s: f64) -> ScheduleParams {
    ScheduleParams {
        target_values: vec![1.0; targets],
        horizon_s: 7.0 * 86_400.0,
        min_slew_s,
        max_active_per_orbit_s: 600.0,
        orbit_period_s: 5_554.0,
    }
}

#[test]
fn passes_closer_than_the_slew_time_yield_one_observation() {
    let windows = vec![
        Window::observation(0, 100.0, 200.0),
        Window::observation(1, 230.0, 330.0),
    ];
    let (_, solution) = schedule_windows(windows, params(2, 60.0), &SolverConfig::default());
    let observations: Vec<_> = solution
        .state
        .activities
        .iter()
        .filter(|a| a.kind == ActivityKind::Observation)
        .collect();
    assert_eq!(observations.len(), 1);
    assert_eq!(solution.status, SolveStatus::Feasible);
}

#[test]
fn both_passes_fit_once_the_gap_allows_a_slew() {
    let windows = vec![
        Window::observation(0, 100.0, 200.0),
        Window::observation(1, 230.0, 330.0),
        Window::downlink(6_000.0, 6_200.0),
    ];
    let (_, solution) = schedule_windows(windows, params(2, 20.0), &SolverConfig::default());
    assert_eq!(solution.state.activities.len(), 3);
    assert_eq!(solution.state.activities[2].targets_downlinked, vec![0, 1]);
    assert_eq!(solution.score, 2.0);
}

#[test]
fn default_week_respects_ordering_slew_and_duty() {
    let config = SpacecraftConfig::default();
    let report = plan_spacecraft_mission(&config, &SolverConfig::default()).expect("plan");
    assert_eq!(report.status, SolveStatus::Feasible);
    assert_eq!(report.schedule_days, 7);
    assert!(report.constraint_checks.slew_feasible);
    assert!(report.constraint_checks.power_duty_ok);

    let schedule = &report.time_ordered_schedule;
    for pair in schedule.windows(2) {
        assert!(pair[0].start_t <= pair[1].start_t);
        assert!(pair[0].end_t <= pair[1].start_t, "activities overlap");
        assert!(pair[1].start_t - pair[0].end_t >= config.min_slew_s - 1e-9);
    }

    let period = report.orbit_parameters.period_s;
    let mut per_orbit = std::collections::BTreeMap::<u64, f64>::new();
    for activity in schedule {
        let orbit = (activity.start_t / period).floor() as u64;
        *per_orbit.entry(orbit).or_default() += activity.end_t - activity.start_t;
        assert!(activity.end_t <= 7.0 * 86_400.0);
    }
    assert!(per_orbit.values().all(|s| *s <= config.max_active_per_orbit_s + 1e-9));

    assert!(report.mission_value >= 1.0);
    assert!(report.mission_value <= config.targets.len() as f64);
}

#[test]
fn downlinks_only_carry_previously_observed_targets() {
    let report = plan_spacecraft_mission(&SpacecraftConfig::default(), &SolverConfig::default())
        .expect("plan");
    let mut observed = Vec::new();
    for activity in &report.time_ordered_schedule {
        match activity.kind {
            ActivityKind::Observation => {
                let target = activity.target_idx.expect("observation target");
                assert!(!observed.contains(&target), "target observed twice");
                observed.push(target);
            }
            ActivityKind::Downlink => {
                assert!(!activity.targets_downlinked.is_empty());
                assert!(activity.targets_downlinked.iter().all(|t| observed.contains(t)));
            }
        }
    }
    let delivered = report.ground_targets.iter().filter(|t| t.downlinked).count();
    assert_eq!(report.mission_value, delivered as f64);
}

#[test]
fn contact_evidence_honours_minimum_window_lengths() {
    let config = SpacecraftConfig::default();
    let report = plan_spacecraft_mission(&config, &SolverConfig::default()).expect("plan");
    assert!(report
        .visibility_contact_evidence
        .iter()
        .any(|w| w.kind == ActivityKind::Observation));
    assert!(report
        .visibility_contact_evidence
        .iter()
        .any(|w| w.kind == ActivityKind::Downlink));
    for window in &report.visibility_contact_evidence {
        let minimum = match window.kind {
            ActivityKind::Observation => config.min_observation_s,
            ActivityKind::Downlink => config.min_downlink_s,
        };
        assert!(window.end_t - window.start_t >= minimum);
        assert!(window.peak_elevation_deg >= config.min_elevation_deg);
        assert!(window.peak_t >= window.start_t && window.peak_t <= window.end_t);
    }
    let scheduled = report
        .visibility_contact_evidence
        .iter()
        .filter(|w| w.scheduled)
        .count();
    assert_eq!(scheduled, report.time_ordered_schedule.len());
}

#[test]
fn orbit_below_the_surface_is_rejected() {
    let config = SpacecraftConfig {
        altitude_km: -100.0,
        ..SpacecraftConfig::default()
    };
    assert!(SpacecraftMission::from_config(&config).is_err());
    assert!(plan_spacecraft_mission(&config, &SolverConfig::default()).is_err());
}

#[test]
fn schedule_is_deterministic() {
    let config = SpacecraftConfig::default();
    let first = plan_spacecraft_mission(&config, &SolverConfig::default()).expect("plan");
    let second = plan_spacecraft_mission(&config, &SolverConfig::default()).expect("plan");
    assert_eq!(first.time_ordered_schedule, second.time_ordered_schedule);
}
