use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use clap::{Args, Parser, Subcommand};
use mission_planner::aircraft::{AircraftReport, CalmWind, plan_aircraft_mission, trace_route};
use mission_planner::config::{
    AircraftConfig, MissionSettings, SpacecraftConfig, load_mission_settings,
};
use mission_planner::export::plot::{MapPlot, split_at_antimeridian, write_map_png};
use mission_planner::export::report::write_json;
use mission_planner::export::schedule::{ScheduleRow, write_schedule_csv};
use mission_planner::solver::SolverConfig;
use mission_planner::spacecraft::{
    ActivityKind, SpacecraftMission, SpacecraftReport, plan_spacecraft_mission,
};
use mission_planner::solver_config;

const DEFAULT_CONFIG: &str = "configs/mission.yaml";
const PLOT_SIZE: (u32, u32) = (1200, 900);
const TRACE_STEP_S: f64 = 10.0;
const GROUND_TRACK_STEP_S: f64 = 60.0;
const GROUND_TRACK_SPAN_S: f64 = 86_400.0;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Plan aircraft routes and LEO spacecraft schedules"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Plan the aircraft route and run the wind robustness trials
    Aircraft(RunArgs),
    /// Build visibility windows and schedule seven days of activities
    Spacecraft(RunArgs),
    /// Run every mission present in the settings file
    All(RunArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Settings file (YAML or TOML). Falls back to configs/mission.yaml, then built-in values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory receiving the reports
    #[arg(long, default_value = "output")]
    output: PathBuf,

    /// Override the number of Monte-Carlo trials
    #[arg(long)]
    runs: Option<usize>,

    /// Override the Monte-Carlo base seed
    #[arg(long)]
    seed: Option<u64>,

    /// Also render PNG maps
    #[arg(long)]
    plot: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Aircraft(args) => {
            let settings = load_settings(&args)?;
            let aircraft = settings
                .aircraft
                .as_ref()
                .ok_or_else(|| anyhow!("settings contain no aircraft section"))?;
            run_aircraft(aircraft, &solver_config(&settings.solver), &args)?;
        }
        Command::Spacecraft(args) => {
            let settings = load_settings(&args)?;
            let spacecraft = settings
                .spacecraft
                .as_ref()
                .ok_or_else(|| anyhow!("settings contain no spacecraft section"))?;
            run_spacecraft(spacecraft, &solver_config(&settings.solver), &args)?;
        }
        Command::All(args) => {
            let settings = load_settings(&args)?;
            let solver = solver_config(&settings.solver);
            if settings.aircraft.is_none() && settings.spacecraft.is_none() {
                return Err(anyhow!("settings contain neither an aircraft nor a spacecraft section"));
            }
            match &settings.aircraft {
                Some(aircraft) => run_aircraft(aircraft, &solver, &args)?,
                None => log::warn!("no aircraft section; skipping"),
            }
            match &settings.spacecraft {
                Some(spacecraft) => run_spacecraft(spacecraft, &solver, &args)?,
                None => log::warn!("no spacecraft section; skipping"),
            }
        }
    }
    Ok(())
}

fn load_settings(args: &RunArgs) -> anyhow::Result<MissionSettings> {
    let path = match &args.config {
        Some(path) => path.clone(),
        None if Path::new(DEFAULT_CONFIG).exists() => PathBuf::from(DEFAULT_CONFIG),
        None => {
            log::info!("no settings file found; using built-in mission");
            return Ok(MissionSettings::builtin());
        }
    };
    log::info!("loading settings from {}", path.display());
    load_mission_settings(&path).with_context(|| format!("failed to load {}", path.display()))
}

fn run_aircraft(
    config: &AircraftConfig,
    solver: &SolverConfig,
    args: &RunArgs,
) -> anyhow::Result<()> {
    let mut config = config.clone();
    if let Some(runs) = args.runs {
        config.monte_carlo.runs = runs;
    }
    if let Some(seed) = args.seed {
        config.monte_carlo.seed = seed;
    }

    let report = plan_aircraft_mission(&config, solver)?;
    let json_path = args.output.join("aircraft_report.json");
    write_json(&json_path, "mission aircraft", &report)?;

    println!("=== Aircraft Plan ===");
    println!("Status: {:?}", report.status);
    println!("Visit order: {:?}", report.visit_order);
    println!(
        "Total time = {:.1} s, total energy = {:.0} J",
        report.total_time_s, report.total_energy
    );
    if let Some(crash) = &report.crash_depletion {
        println!(
            "Depleted ({:?}) on segment {} at t = {:.1} s",
            crash.reason, crash.segment_index, crash.at_time_s
        );
    }
    println!(
        "Robustness: {}/{} trials succeeded (rate {:.2})",
        report.robustness.successes, report.robustness.runs, report.robustness.success_rate
    );
    println!("Report: {}", json_path.display());

    if args.plot {
        let png_path = args.output.join("aircraft_path.png");
        write_map_png(&png_path, &aircraft_map(&report, &config)?, PLOT_SIZE)?;
        println!("Plot: {}", png_path.display());
    }
    Ok(())
}

fn aircraft_map(report: &AircraftReport, config: &AircraftConfig) -> anyhow::Result<MapPlot> {
    let planned: Vec<(f64, f64)> = report.planned_route.iter().map(|p| (p.lon, p.lat)).collect();
    let mut tracks = vec![planned];
    if report.route.len() > 1 {
        let dense = trace_route(
            &report.model,
            &report.route,
            &report.leg_speeds_ms,
            &CalmWind,
            TRACE_STEP_S,
        )?;
        tracks.push(
            dense
                .iter()
                .map(|s| (s.position.lon, s.position.lat))
                .collect(),
        );
    }
    let zones = config
        .no_fly_zones
        .iter()
        .map(|zone| {
            let mut ring: Vec<(f64, f64)> = zone.vertices.iter().map(|v| (v[1], v[0])).collect();
            if let Some(&first) = ring.first() {
                ring.push(first);
            }
            ring
        })
        .collect();
    Ok(MapPlot {
        tracks,
        waypoints: report
            .waypoints_corrected_altitude
            .iter()
            .map(|w| (w.position.lon, w.position.lat))
            .collect(),
        zones,
        markers: report
            .crash_depletion
            .iter()
            .map(|c| (c.at_position.lon, c.at_position.lat))
            .collect(),
    })
}

fn run_spacecraft(
    config: &SpacecraftConfig,
    solver: &SolverConfig,
    args: &RunArgs,
) -> anyhow::Result<()> {
    let report = plan_spacecraft_mission(config, solver)?;
    let json_path = args.output.join("spacecraft_report.json");
    write_json(&json_path, "mission spacecraft", &report)?;

    let csv_path = args.output.join("spacecraft_schedule.csv");
    write_schedule_csv(&csv_path, &schedule_rows(&report))?;

    println!("=== Spacecraft Schedule ===");
    println!("Status: {:?}", report.status);
    println!(
        "Orbit: {:.0} km, period = {:.1} min",
        report.orbit_parameters.altitude_km,
        report.orbit_parameters.period_s / 60.0
    );
    println!(
        "Activities = {}, science value = {}",
        report.time_ordered_schedule.len(),
        report.mission_value
    );
    println!("Report: {}", json_path.display());
    println!("Schedule: {}", csv_path.display());

    if args.plot {
        let mission = SpacecraftMission::from_config(config)?;
        let track: Vec<(f64, f64)> = mission
            .orbit
            .ground_track(0.0, GROUND_TRACK_SPAN_S, GROUND_TRACK_STEP_S)?
            .iter()
            .map(|p| (p.point.lon, p.point.lat))
            .collect();
        let map = MapPlot {
            tracks: split_at_antimeridian(&track),
            waypoints: mission
                .targets
                .iter()
                .map(|t| (t.site.position.lon, t.site.position.lat))
                .collect(),
            zones: Vec::new(),
            markers: vec![(mission.station.position.lon, mission.station.position.lat)],
        };
        let png_path = args.output.join("spacecraft_ground_track.png");
        write_map_png(&png_path, &map, PLOT_SIZE)?;
        println!("Plot: {}", png_path.display());
    }
    Ok(())
}

fn schedule_rows(report: &SpacecraftReport) -> Vec<ScheduleRow> {
    report
        .time_ordered_schedule
        .iter()
        .map(|a| {
            let kind = match a.kind {
                ActivityKind::Observation => "observation",
                ActivityKind::Downlink => "downlink",
            };
            ScheduleRow::new(kind, a.start_t, a.end_t, a.target_idx)
        })
        .collect()
}
