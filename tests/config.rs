use std::fs;

use mission_planner::config::{ObjectiveKind, VehicleKind, load_mission_settings};
use mission_planner::solver_config;

#[test]
fn shipped_mission_file_loads() {
    let settings = load_mission_settings("configs/mission.yaml").expect("mission yaml");
    let aircraft = settings.aircraft.expect("aircraft section");
    assert_eq!(aircraft.vehicle_type, VehicleKind::Plane);
    assert_eq!(aircraft.waypoints.len(), 4);
    assert_eq!(aircraft.objective, ObjectiveKind::MinTime);
    assert_eq!(aircraft.monte_carlo.seed, 42);

    let spacecraft = settings.spacecraft.expect("spacecraft section");
    assert_eq!(spacecraft.targets.len(), 3);
    assert_eq!(spacecraft.station.name, "leiden");
    assert_eq!(spacecraft.min_slew_s, 60.0);

    let solver = solver_config(&settings.solver);
    assert_eq!(solver.max_steps, 1_000);
    assert_eq!(solver.max_repair_iterations, 200);
}

#[test]
fn toml_settings_are_selected_by_extension() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("mission.toml");
    fs::write(
        &path,
        r#"
[spacecraft]
altitude_km = 550.0

[spacecraft.station]
lat = 60.0
lon = 10.0

[[spacecraft.targets]]
lat = 59.0
lon = 11.0
value = 2.0
"#,
    )
    .expect("write toml");

    let settings = load_mission_settings(&path).expect("toml settings");
    assert!(settings.aircraft.is_none());
    let spacecraft = settings.spacecraft.expect("spacecraft section");
    assert_eq!(spacecraft.altitude_km, 550.0);
    assert_eq!(spacecraft.station.name, "station");
    assert_eq!(spacecraft.targets[0].value, 2.0);
    assert_eq!(spacecraft.min_elevation_deg, 10.0);
    assert_eq!(settings.solver.repair_tolerance, 0.05);
}

#[test]
fn missing_file_is_an_error() {
    assert!(load_mission_settings("configs/does-not-exist.yaml").is_err());
}
