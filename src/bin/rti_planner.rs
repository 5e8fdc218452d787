// Closed-loop simulation of the real-time iteration planner on a synthetic track.
//
// The simulated vehicle jumps to the second state of every optimized
// trajectory. Once it passes `S_EGO_AT_POPUP` an obstacle appears ahead.
//
// usage: rti_planner [config.yaml]
//
// Exit codes: 1 when the optimizer fails, 2 for a bad config or track at startup.
use std::process;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use rti_planner::planning::CoordinateTransformer;
use rti_planner::utils::visualization::{colors, PathStyle, Visualizer};
use rti_planner::{
    input_channels, Obstacle, ObstacleSet, Path, PlannerConfig, PlannerError, PlanningLoop,
    PositionConstraint, SimulatedOptimizer, SystemClock, Trajectory, TrajectoryPublisher, VehicleState,
};

const TRACK_LENGTH: f64 = 400.0;
const TRACK_HALF_WIDTH: f64 = 4.0;
const DEFAULT_MAX_CYCLES: usize = 100;

// pop-up scenario
const S_EGO_AT_POPUP: f64 = 30.0;
const S_OBS_AT_POPUP: f64 = 60.0;
const D_OBS_AT_POPUP: f64 = 0.0;
const OBS_RADIUS: f64 = 0.5;
const VEHICLE_WIDTH: f64 = 1.8;
const WIGGLE_ROOM: f64 = 1.0;

/// Feeds the optimized trajectory back as the next vehicle state
struct SimulatedVehicle {
    inputs: rti_planner::planning::InputHandle,
    popup: Option<Obstacle>,
    obstacles: ObstacleSet,
    selected: Trajectory,
    constraint: PositionConstraint,
    optimized: Trajectory,
    ego_x: Vec<f64>,
    ego_y: Vec<f64>,
}

impl TrajectoryPublisher for SimulatedVehicle {
    fn publish_selected(&mut self, trajectory: &Trajectory, constraint: &PositionConstraint) {
        self.selected = trajectory.clone();
        self.constraint = constraint.clone();
    }

    fn publish_optimized(&mut self, trajectory: &Trajectory) {
        self.optimized = trajectory.clone();
        if trajectory.has_cartesian() {
            self.ego_x.push(trajectory.x[0]);
            self.ego_y.push(trajectory.y[0]);
        }
        let next = match trajectory.state_at(1) {
            Some(state) => state,
            None => {
                warn!("optimized trajectory too short to advance the vehicle");
                return;
            }
        };
        self.inputs.update_state(next);

        if next.s >= S_EGO_AT_POPUP {
            if let Some(obs) = self.popup.take() {
                info!("obstacle pops up at s = {:.1}, d = {:.1}", obs.s, obs.d);
                self.obstacles.push(obs);
                self.inputs.update_obstacles(self.obstacles.clone());
            }
        }
    }
}

fn synthetic_track() -> Result<Path, PlannerError> {
    let n = 201;
    let x: Vec<f64> = (0..n).map(|i| TRACK_LENGTH * i as f64 / (n - 1) as f64).collect();
    let y: Vec<f64> = x.iter().map(|&xi| 15.0 * (xi / 60.0).sin()).collect();
    Path::from_centerline(&x, &y, TRACK_HALF_WIDTH)
}

fn load_config() -> Result<PlannerConfig, PlannerError> {
    let mut config = match std::env::args().nth(1) {
        Some(file) => {
            info!("loading config from {}", file);
            PlannerConfig::from_yaml_file(file)?
        }
        None => PlannerConfig::default(),
    };
    if config.max_cycles.is_none() {
        config.max_cycles = Some(DEFAULT_MAX_CYCLES);
    }
    Ok(config)
}

fn save_plot<O>(planner: &PlanningLoop<O, SimulatedVehicle, SystemClock>, path: &Path) -> Result<(), PlannerError>
where
    O: rti_planner::OptimizerAdapter,
{
    let vehicle = planner.publisher();
    let mut vis = Visualizer::new();
    vis.set_title(&format!("RTI planner after {} cycles", planner.cycles()));
    vis.plot_path(path)?
        .plot_candidates(planner.candidates())
        .plot_trajectory(&vehicle.selected, &PathStyle::new(colors::SELECTED, "Selected"))
        .plot_trajectory(&vehicle.optimized, &PathStyle::new(colors::OPTIMIZED, "Optimized"))
        .plot_xy(&vehicle.ego_x, &vehicle.ego_y, &PathStyle::new(colors::EGO, "Driven").with_line_width(1.0));
    vis.plot_obstacles(&vehicle.obstacles, path)?;

    // the full corridor spans the whole track, draw the part around the horizon
    let mut corridor = vehicle.constraint.clone();
    if !vehicle.selected.is_empty() && corridor.len() == vehicle.selected.len() {
        corridor.slb = vehicle.selected.s.iter().map(|s| s - 0.5).collect();
        corridor.sub = vehicle.selected.s.iter().map(|s| s + 0.5).collect();
    }
    vis.plot_corridor(&corridor, path)?;

    std::fs::create_dir_all("img")?;
    vis.save_svg("img/rti_planner.svg")
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            process::exit(2);
        }
    };
    let path = match synthetic_track() {
        Ok(path) => path,
        Err(e) => {
            error!("{}", e);
            process::exit(2);
        }
    };

    let (handle, buffer) = input_channels(config.min_vx);
    let start = VehicleState::new(1.0, 0.0, 0.0, 0.0, 5.0, 0.0);
    let start_pose = CoordinateTransformer::new(&path).frenet_to_cartesian(&[start.s], &[start.d], &[start.deltapsi]);
    if let Ok(pose) = start_pose {
        info!("vehicle starts at X = {:.2}, Y = {:.2}", pose.x[0], pose.y[0]);
    }
    handle.update_path(path.clone());
    handle.update_obstacles(ObstacleSet::new());
    handle.update_state(start);

    let vehicle = SimulatedVehicle {
        inputs: handle,
        popup: Some(Obstacle::with_vehicle_margin(
            S_OBS_AT_POPUP,
            D_OBS_AT_POPUP,
            OBS_RADIUS,
            VEHICLE_WIDTH,
            WIGGLE_ROOM,
        )),
        obstacles: ObstacleSet::new(),
        selected: Trajectory::new(),
        constraint: PositionConstraint::default(),
        optimized: Trajectory::new(),
        ego_x: Vec::new(),
        ego_y: Vec::new(),
    };
    let optimizer = SimulatedOptimizer::from_config(&config);
    let mut planner = match PlanningLoop::new(config, optimizer, vehicle, SystemClock::new(), buffer) {
        Ok(planner) => planner,
        Err(e) => {
            error!("{}", e);
            process::exit(2);
        }
    };

    let result = planner.run();
    if let Err(e) = save_plot(&planner, &path) {
        warn!("could not save plot: {}", e);
    }
    match result {
        Ok(cycles) => info!("finished {} cycles at s = {:.1}", cycles, planner.inputs().snapshot().state.s),
        // only an optimizer failure ends the run
        Err(e) => {
            error!("planner stopped: {}", e);
            process::exit(1);
        }
    }
}
