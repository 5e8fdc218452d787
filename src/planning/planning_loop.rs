//! Fixed-period planning loop
//!
//! ```text
//! WaitForInput -> Running -> { Rollout -> Evaluate -> Constrain -> Optimize -> Publish } ... -> Failed
//! ```
//!
//! Each cycle rolls out candidates (plus the previous optimized trajectory
//! shifted by one step), selects the cheapest, builds its corridor, runs one
//! real-time iteration of the optimizer and publishes both trajectories. A
//! nonzero feedback status is terminal. Cycle time is measured and logged but
//! an over-budget cycle is never cut short.

use std::fmt;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::common::error::{PlannerError, PlannerResult};
use crate::common::traits::{Clock, TrajectoryPublisher};
use crate::common::types::{PositionConstraint, Trajectory};
use crate::config::PlannerConfig;
use crate::optimizer::{OptimizerAdapter, STATUS_OK};
use crate::planning::constraints::ConstraintBuilder;
use crate::planning::coordinate_transform::CoordinateTransformer;
use crate::planning::inputs::{InputBuffer, ReadinessGate};
use crate::planning::reference::{ControlMode, ReferenceGenerator};
use crate::planning::trajectory_eval::TrajectorySetEvaluator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoopState {
    WaitForInput,
    /// Between cycles
    Running,
    Rollout,
    Evaluate,
    Constrain,
    Optimize,
    Publish,
    Failed,
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Wall time spent in one cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleTiming {
    pub loop_time: Duration,
    pub rollout_time: Duration,
    pub optimization_time: Duration,
    pub over_budget: bool,
}

/// Outcome of one completed cycle
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub cycle: usize,
    /// Index into the candidate set, `None` when nothing was feasible
    pub selected_index: Option<usize>,
    pub candidate_count: usize,
    pub selected: Trajectory,
    pub optimized: Trajectory,
    pub constraint: PositionConstraint,
    pub path_exhausted: bool,
    pub timing: CycleTiming,
}

pub struct PlanningLoop<O, P, C> {
    config: PlannerConfig,
    optimizer: O,
    publisher: P,
    clock: C,
    inputs: InputBuffer,
    references: ReferenceGenerator,
    evaluator: TrajectorySetEvaluator,
    constraints: ConstraintBuilder,
    control_mode: ControlMode,
    state: LoopState,
    last_status: i32,
    previous: Option<Trajectory>,
    candidates: Vec<Trajectory>,
    cycles: usize,
}

impl<O, P, C> PlanningLoop<O, P, C>
where
    O: OptimizerAdapter,
    P: TrajectoryPublisher,
    C: Clock,
{
    /// Validates the configuration and hands the weights to the optimizer
    pub fn new(
        config: PlannerConfig,
        mut optimizer: O,
        publisher: P,
        clock: C,
        inputs: InputBuffer,
    ) -> PlannerResult<Self> {
        config.validate()?;
        optimizer.configure_weights(
            &config.weights.state,
            &config.weights.control,
            config.weights.slack,
        );
        Ok(Self {
            references: ReferenceGenerator::from_config(&config),
            evaluator: TrajectorySetEvaluator::from_config(&config),
            constraints: ConstraintBuilder::new(),
            control_mode: config.control_mode,
            config,
            optimizer,
            publisher,
            clock,
            inputs,
            state: LoopState::WaitForInput,
            last_status: STATUS_OK,
            previous: None,
            candidates: Vec::new(),
            cycles: 0,
        })
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn control_mode(&self) -> ControlMode {
        self.control_mode
    }

    pub fn set_control_mode(&mut self, mode: ControlMode) {
        if mode != self.control_mode {
            info!("control mode {} -> {}", self.control_mode, mode);
        }
        self.control_mode = mode;
    }

    /// Candidate set of the last cycle, evaluated and in Cartesian form
    pub fn candidates(&self) -> &[Trajectory] {
        &self.candidates
    }

    pub fn cycles(&self) -> usize {
        self.cycles
    }

    pub fn inputs(&self) -> &InputBuffer {
        &self.inputs
    }

    pub fn optimizer(&self) -> &O {
        &self.optimizer
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Block until a usable state and path have arrived
    pub fn wait_for_input(&mut self) -> usize {
        self.state = LoopState::WaitForInput;
        let gate = ReadinessGate::new(self.config.cycle_period());
        let polls = gate.wait(&mut self.inputs, &mut self.clock);
        self.state = LoopState::Running;
        polls
    }

    /// Wait for input, then cycle at the configured rate until `max_cycles`
    /// or an optimizer failure. Returns the number of completed cycles.
    ///
    /// Errors other than an optimizer failure skip the cycle and are logged.
    pub fn run(&mut self) -> PlannerResult<usize> {
        self.wait_for_input();
        let period = self.config.cycle_period();
        loop {
            if let Some(max) = self.config.max_cycles {
                if self.cycles >= max {
                    break;
                }
            }
            let start = self.clock.now();
            match self.run_cycle() {
                Ok(_) => {}
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => warn!("cycle {} skipped: {}", self.cycles, e),
            }
            let elapsed = self.clock.now().saturating_sub(start);
            if elapsed < period {
                self.clock.sleep(period - elapsed);
            }
        }
        Ok(self.cycles)
    }

    /// One planning cycle on the latest inputs
    pub fn run_cycle(&mut self) -> PlannerResult<CycleReport> {
        if self.state == LoopState::Failed {
            return Err(PlannerError::OptimizerFailure { status: self.last_status });
        }
        let snapshot = self.inputs.refresh().clone();
        if !snapshot.is_ready() {
            return Err(PlannerError::InputNotReady(format!(
                "state s = {:.2}, path samples = {}",
                snapshot.state.s,
                snapshot.path.len()
            )));
        }
        let t_loop = self.clock.now();
        let path = snapshot.path.as_ref();
        let obstacles = snapshot.obstacles.as_ref();
        let vehicle = &snapshot.state;
        let transformer = CoordinateTransformer::new(path);
        debug!("cycle {} in {} mode", self.cycles, self.control_mode);

        // rollout
        self.state = LoopState::Rollout;
        let refs = self.references.generate(self.control_mode, vehicle);
        let t_rollout = self.clock.now();
        let mut candidates = self
            .optimizer
            .sample_candidates(vehicle, path, self.config.n_samples);
        let rollout_time = self.clock.now().saturating_sub(t_rollout);
        if let Some(previous) = self.previous.take() {
            if !previous.is_empty() {
                candidates.push(self.optimizer.shift_forward(previous));
            }
        }
        let mut usable = vec![true; candidates.len()];
        for (i, traj) in candidates.iter_mut().enumerate() {
            if let Err(e) = transformer.trajectory_to_cartesian(traj) {
                error!("candidate {} has no cartesian pose: {}", i, e);
                usable[i] = false;
            }
        }

        // evaluate
        self.state = LoopState::Evaluate;
        self.evaluator.score(&mut candidates, path, obstacles, &refs);
        for (traj, &ok) in candidates.iter_mut().zip(&usable) {
            if !ok {
                traj.cost = f64::INFINITY;
            }
        }
        let selected_index = self.evaluator.select(&candidates);
        let selected = match selected_index {
            Some(i) => candidates[i].clone(),
            None => {
                error!(
                    "no trajectory selected: {}",
                    PlannerError::NoFeasibleCandidate { candidates: candidates.len() }
                );
                Trajectory::new()
            }
        };
        info!("selected candidate {:?} with cost {:.3}", selected_index, selected.cost);

        // constrain
        self.state = LoopState::Constrain;
        let mut path_exhausted = false;
        if let (Some(final_s), Some(path_end)) = (selected.final_s(), path.s_max()) {
            if final_s > self.config.path_exhaustion_ratio * path_end {
                warn!("{}", PlannerError::PathExhaustion { final_s, path_end });
                path_exhausted = true;
            }
        }
        let corridor = self.constraints.build(&selected, path).unwrap_or_else(|e| {
            error!("could not build corridor: {}", e);
            PositionConstraint::default()
        });

        // optimize
        self.state = LoopState::Optimize;
        let bounds = self.config.input_bounds;
        self.optimizer.set_input_bounds(bounds.lower, bounds.upper);
        self.optimizer.set_initial_state(vehicle);
        self.optimizer.set_initial_guess(&selected);
        self.optimizer.set_references(&selected, &refs);
        let constraint = self.optimizer.set_position_constraints(
            &selected,
            obstacles,
            &corridor.dub,
            &corridor.dlb,
        );
        let t_opt = self.clock.now();
        self.optimizer.prepare();
        let status = self.optimizer.feedback();
        if status != STATUS_OK {
            error!("optimizer feedback failed with status {}", status);
            self.state = LoopState::Failed;
            self.last_status = status;
            self.candidates = candidates;
            return Err(PlannerError::OptimizerFailure { status });
        }
        let optimization_time = self.clock.now().saturating_sub(t_opt);
        let mut optimized = self.optimizer.current_solution();
        if let Err(e) = transformer.trajectory_to_cartesian(&mut optimized) {
            error!("optimized trajectory has no cartesian pose: {}", e);
        }

        // publish
        self.state = LoopState::Publish;
        self.publisher.publish_selected(&selected, &constraint);
        self.publisher.publish_optimized(&optimized);
        self.previous = Some(optimized.clone());
        self.candidates = candidates;

        let loop_time = self.clock.now().saturating_sub(t_loop);
        let over_budget = loop_time > self.config.cycle_period();
        if over_budget {
            warn!(
                "loop time exceeds cycle period: {:.1} ms > {:.1} ms",
                loop_time.as_secs_f64() * 1e3,
                self.config.cycle_period * 1e3
            );
        } else {
            info!("loop time {:.1} ms", loop_time.as_secs_f64() * 1e3);
        }
        info!("rollout took {:.1} ms", rollout_time.as_secs_f64() * 1e3);
        info!("optimization took {:.1} ms", optimization_time.as_secs_f64() * 1e3);

        let report = CycleReport {
            cycle: self.cycles,
            selected_index,
            candidate_count: self.candidates.len(),
            selected,
            optimized,
            constraint,
            path_exhausted,
            timing: CycleTiming { loop_time, rollout_time, optimization_time, over_budget },
        };
        self.cycles += 1;
        self.state = LoopState::Running;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    use crate::common::traits::RecordingPublisher;
    use crate::common::types::*;
    use crate::optimizer::SimulatedOptimizer;
    use crate::planning::inputs::tests::FakeClock;
    use crate::planning::inputs::{input_channels, InputHandle};

    /// Optimizer returning fixed candidates and a fixed feedback status
    struct ScriptedOptimizer {
        candidates: Vec<Trajectory>,
        status: i32,
        guess: Trajectory,
        guesses: Vec<Trajectory>,
        weights_configured: bool,
    }

    impl ScriptedOptimizer {
        fn new(candidates: Vec<Trajectory>, status: i32) -> Self {
            Self {
                candidates,
                status,
                guess: Trajectory::new(),
                guesses: Vec::new(),
                weights_configured: false,
            }
        }
    }

    impl OptimizerAdapter for ScriptedOptimizer {
        fn configure_weights(&mut self, _: &[f64], _: &[f64], _: f64) {
            self.weights_configured = true;
        }

        fn sample_candidates(&mut self, _: &VehicleState, _: &Path, count: usize) -> Vec<Trajectory> {
            self.candidates.iter().take(count).cloned().collect()
        }

        fn shift_forward(&self, mut trajectory: Trajectory) -> Trajectory {
            for v in trajectory.s.iter_mut() {
                *v += 1.0;
            }
            trajectory.clear_cartesian();
            trajectory
        }

        fn set_input_bounds(&mut self, _: f64, _: f64) {}

        fn set_initial_state(&mut self, _: &VehicleState) {}

        fn set_initial_guess(&mut self, trajectory: &Trajectory) {
            self.guess = trajectory.clone();
            self.guesses.push(trajectory.clone());
        }

        fn set_references(&mut self, _: &Trajectory, _: &ReferenceSet) {}

        fn set_position_constraints(
            &mut self,
            trajectory: &Trajectory,
            _: &ObstacleSet,
            left: &[f64],
            right: &[f64],
        ) -> PositionConstraint {
            PositionConstraint {
                slb: vec![0.0; trajectory.len()],
                sub: vec![100.0; trajectory.len()],
                dlb: right.to_vec(),
                dub: left.to_vec(),
            }
        }

        fn prepare(&mut self) {}

        fn feedback(&mut self) -> i32 {
            self.status
        }

        fn current_solution(&self) -> Trajectory {
            self.guess.clone()
        }
    }

    /// Clock that advances by a fixed step every time it is read
    struct SteppingClock {
        now: Cell<Duration>,
        step: Duration,
    }

    impl Clock for SteppingClock {
        fn now(&self) -> Duration {
            let t = self.now.get() + self.step;
            self.now.set(t);
            t
        }

        fn sleep(&mut self, duration: Duration) {
            self.now.set(self.now.get() + duration);
        }
    }

    fn road(length: f64) -> Path {
        Path::from_centerline(&[0.0, length / 2.0, length], &[0.0, 0.0, 0.0], 2.0).unwrap()
    }

    fn straight_candidate(s0: f64, ds: f64, d: f64, n: usize) -> Trajectory {
        Trajectory {
            s: (0..n).map(|j| s0 + ds * j as f64).collect(),
            d: vec![d; n],
            deltapsi: vec![0.0; n],
            psidot: vec![0.0; n],
            vx: vec![5.0; n],
            vy: vec![0.0; n],
            fyf: vec![0.0; n - 1],
            fx: vec![0.0; n - 1],
            ..Default::default()
        }
    }

    fn small_config() -> PlannerConfig {
        PlannerConfig {
            horizon: 3,
            n_samples: 2,
            control_mode: ControlMode::Track,
            ..Default::default()
        }
    }

    fn ready_inputs(path: Path) -> (InputHandle, InputBuffer) {
        let (handle, buffer) = input_channels(MIN_VX);
        handle.update_path(path);
        handle.update_state(VehicleState::new(10.0, 0.0, 0.0, 0.0, 5.0, 0.0));
        (handle, buffer)
    }

    #[test]
    fn test_cycle_with_simulated_optimizer() {
        let config = PlannerConfig { horizon: 10, ..Default::default() };
        let (_handle, buffer) = ready_inputs(road(500.0));
        let optimizer = SimulatedOptimizer::from_config(&config);
        let mut planner =
            PlanningLoop::new(config, optimizer, RecordingPublisher::new(), FakeClock::new(), buffer).unwrap();

        let report = planner.run_cycle().unwrap();
        assert!(report.selected_index.is_some());
        assert_eq!(report.candidate_count, 6);
        assert_eq!(report.selected.len(), 11);
        assert_eq!(report.constraint.len(), 11);
        assert!(report.optimized.has_cartesian());
        assert_eq!(planner.state(), LoopState::Running);
        assert_eq!(planner.optimizer().input_bounds(), (0.5, 1000.0));
        assert_eq!(planner.optimizer().slack_weight(), 1.0e6);
        assert!(planner.candidates().iter().all(|t| t.has_cartesian()));

        let published = planner.publisher();
        assert_eq!(published.selected.len(), 1);
        assert_eq!(published.optimized.len(), 1);
        assert_eq!(published.selected[0].1, report.constraint);

        // the optimized trajectory comes back as an extra candidate
        let report = planner.run_cycle().unwrap();
        assert_eq!(report.candidate_count, 7);
    }

    #[test]
    fn test_previous_solution_is_shifted_into_candidates() {
        let candidates = vec![straight_candidate(10.0, 1.0, 0.0, 4)];
        let (_handle, buffer) = ready_inputs(road(200.0));
        let mut planner = PlanningLoop::new(
            small_config(),
            ScriptedOptimizer::new(candidates, STATUS_OK),
            RecordingPublisher::new(),
            FakeClock::new(),
            buffer,
        )
        .unwrap();
        assert!(planner.optimizer().weights_configured);

        planner.run_cycle().unwrap();
        let report = planner.run_cycle().unwrap();
        assert_eq!(report.candidate_count, 2);
        assert_eq!(planner.candidates()[1].s, vec![11.0, 12.0, 13.0, 14.0]);
    }

    #[test]
    fn test_collision_free_candidate_selected() {
        let candidates = vec![
            straight_candidate(10.0, 1.0, 0.0, 4),
            straight_candidate(10.0, 1.0, 1.0, 4),
        ];
        let (handle, buffer) = ready_inputs(road(200.0));
        handle.update_obstacles(ObstacleSet::from_obstacles(vec![Obstacle::new(12.0, 0.0, 0.2, 0.5)]));
        let mut planner = PlanningLoop::new(
            small_config(),
            ScriptedOptimizer::new(candidates, STATUS_OK),
            RecordingPublisher::new(),
            FakeClock::new(),
            buffer,
        )
        .unwrap();

        let report = planner.run_cycle().unwrap();
        assert_eq!(report.selected_index, Some(1));
        assert!(planner.candidates()[0].colliding);
        assert_eq!(report.selected.d, vec![1.0; 4]);
        assert_eq!(report.constraint.dub, vec![2.0; 4]);
    }

    #[test]
    fn test_no_feasible_candidate_does_not_abort_cycle() {
        let mut config = small_config();
        config.weights.slack = 1.0;
        // far off the references: running cost alone exceeds the sentinel
        let candidates = vec![straight_candidate(100.0, 1.0, 0.0, 4)];
        let (_handle, buffer) = ready_inputs(road(200.0));
        let mut planner = PlanningLoop::new(
            config,
            ScriptedOptimizer::new(candidates, STATUS_OK),
            RecordingPublisher::new(),
            FakeClock::new(),
            buffer,
        )
        .unwrap();

        let report = planner.run_cycle().unwrap();
        assert_eq!(report.selected_index, None);
        assert!(report.selected.is_empty());
        assert!(report.constraint.is_empty());
        assert_eq!(planner.publisher().selected.len(), 1);
        assert!(planner.optimizer().guesses[0].is_empty());
    }

    #[test]
    fn test_optimizer_failure_is_terminal() {
        let candidates = vec![straight_candidate(10.0, 1.0, 0.0, 4)];
        let (_handle, buffer) = ready_inputs(road(200.0));
        let mut planner = PlanningLoop::new(
            small_config(),
            ScriptedOptimizer::new(candidates, 5),
            RecordingPublisher::new(),
            FakeClock::new(),
            buffer,
        )
        .unwrap();

        let result = planner.run_cycle();
        assert!(matches!(result, Err(PlannerError::OptimizerFailure { status: 5 })));
        assert_eq!(planner.state(), LoopState::Failed);
        assert!(planner.publisher().selected.is_empty());
        assert!(planner.publisher().optimized.is_empty());

        let result = planner.run_cycle();
        assert!(matches!(result, Err(PlannerError::OptimizerFailure { status: 5 })));
        assert_eq!(planner.cycles(), 0);
    }

    #[test]
    fn test_run_stops_on_optimizer_failure() {
        let candidates = vec![straight_candidate(10.0, 1.0, 0.0, 4)];
        let (_handle, buffer) = ready_inputs(road(200.0));
        let mut planner = PlanningLoop::new(
            small_config(),
            ScriptedOptimizer::new(candidates, 1),
            RecordingPublisher::new(),
            FakeClock::new(),
            buffer,
        )
        .unwrap();
        assert!(planner.run().unwrap_err().is_fatal());
    }

    #[test]
    fn test_path_exhaustion_is_only_a_warning() {
        // selected ends at s = 13 on a 13.5 m path
        let candidates = vec![straight_candidate(10.0, 1.0, 0.0, 4)];
        let (_handle, buffer) = ready_inputs(road(13.5));
        let mut planner = PlanningLoop::new(
            small_config(),
            ScriptedOptimizer::new(candidates, STATUS_OK),
            RecordingPublisher::new(),
            FakeClock::new(),
            buffer,
        )
        .unwrap();

        let report = planner.run_cycle().unwrap();
        assert!(report.path_exhausted);
        assert_eq!(planner.publisher().optimized.len(), 1);
    }

    #[test]
    fn test_cycle_before_input_is_not_ready() {
        let (_handle, buffer) = input_channels(MIN_VX);
        let mut planner = PlanningLoop::new(
            small_config(),
            ScriptedOptimizer::new(Vec::new(), STATUS_OK),
            RecordingPublisher::new(),
            FakeClock::new(),
            buffer,
        )
        .unwrap();
        assert!(matches!(planner.run_cycle(), Err(PlannerError::InputNotReady(_))));
        assert_eq!(planner.state(), LoopState::WaitForInput);
    }

    #[test]
    fn test_run_sleeps_out_the_period() {
        let mut config = small_config();
        config.max_cycles = Some(3);
        let period = config.cycle_period();
        let candidates = vec![straight_candidate(10.0, 1.0, 0.0, 4)];
        let (_handle, buffer) = ready_inputs(road(200.0));
        let mut planner = PlanningLoop::new(
            config,
            ScriptedOptimizer::new(candidates, STATUS_OK),
            RecordingPublisher::new(),
            FakeClock::new(),
            buffer,
        )
        .unwrap();

        assert_eq!(planner.run().unwrap(), 3);
        assert_eq!(planner.clock().sleeps, vec![period; 3]);
        assert_eq!(planner.publisher().optimized.len(), 3);
    }

    #[test]
    fn test_run_survives_lost_input() {
        let mut config = small_config();
        config.max_cycles = Some(3);
        let candidates = vec![straight_candidate(10.0, 1.0, 0.0, 4)];
        let (handle, buffer) = ready_inputs(road(200.0));
        let mut clock = FakeClock::new();
        clock.on_sleep = Some(Box::new(move |count| {
            if count == 1 {
                handle.update_state(VehicleState::new(0.0, 0.0, 0.0, 0.0, 5.0, 0.0));
            }
            if count == 2 {
                handle.update_state(VehicleState::new(10.0, 0.0, 0.0, 0.0, 5.0, 0.0));
            }
        }));
        let mut planner = PlanningLoop::new(
            config,
            ScriptedOptimizer::new(candidates, STATUS_OK),
            RecordingPublisher::new(),
            clock,
            buffer,
        )
        .unwrap();

        assert_eq!(planner.run().unwrap(), 3);
        // one period spent on the skipped cycle
        assert_eq!(planner.clock().sleeps.len(), 4);
        assert_eq!(planner.publisher().optimized.len(), 3);
        assert_eq!(planner.state(), LoopState::Running);
    }

    #[test]
    fn test_candidate_without_pose_is_never_selected() {
        let mut heading_lost = straight_candidate(10.0, 1.0, 0.0, 4);
        heading_lost.vx = vec![10.0; 4];
        heading_lost.deltapsi[2] = f64::NAN;
        let candidates = vec![heading_lost, straight_candidate(10.0, 1.0, 1.0, 4)];
        let (_handle, buffer) = ready_inputs(road(200.0));
        let mut planner = PlanningLoop::new(
            small_config(),
            ScriptedOptimizer::new(candidates, STATUS_OK),
            RecordingPublisher::new(),
            FakeClock::new(),
            buffer,
        )
        .unwrap();

        let report = planner.run_cycle().unwrap();
        assert_eq!(report.selected_index, Some(1));
        assert!(report.selected.has_cartesian());
        assert!(!planner.candidates()[0].has_cartesian());
        assert!(planner.candidates()[0].cost.is_infinite());
        assert_eq!(planner.optimizer().guesses[0].d, vec![1.0; 4]);
    }

    #[test]
    fn test_over_budget_cycle_still_completes() {
        let mut config = small_config();
        config.max_cycles = Some(2);
        let candidates = vec![straight_candidate(10.0, 1.0, 0.0, 4)];
        let (_handle, buffer) = ready_inputs(road(200.0));
        let clock = SteppingClock { now: Cell::new(Duration::ZERO), step: Duration::from_millis(30) };
        let mut planner = PlanningLoop::new(
            config,
            ScriptedOptimizer::new(candidates, STATUS_OK),
            RecordingPublisher::new(),
            clock,
            buffer,
        )
        .unwrap();

        let report = planner.run_cycle().unwrap();
        assert!(report.timing.over_budget);
        assert!(report.timing.loop_time > Duration::from_millis(100));
        assert_eq!(planner.publisher().optimized.len(), 1);
        assert_eq!(planner.run().unwrap(), 2);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let (_handle, buffer) = input_channels(MIN_VX);
        let config = PlannerConfig { n_samples: 0, ..Default::default() };
        let result = PlanningLoop::new(
            config,
            ScriptedOptimizer::new(Vec::new(), STATUS_OK),
            RecordingPublisher::new(),
            FakeClock::new(),
            buffer,
        );
        assert!(matches!(result, Err(PlannerError::InvalidConfig(_))));
    }

    #[test]
    fn test_control_mode_switch() {
        let (_handle, buffer) = ready_inputs(road(200.0));
        let mut planner = PlanningLoop::new(
            small_config(),
            ScriptedOptimizer::new(vec![straight_candidate(10.0, 1.0, 0.0, 4)], STATUS_OK),
            RecordingPublisher::new(),
            FakeClock::new(),
            buffer,
        )
        .unwrap();
        assert_eq!(planner.control_mode(), ControlMode::Track);
        planner.set_control_mode(ControlMode::Brake);
        assert_eq!(planner.control_mode(), ControlMode::Brake);
        let report = planner.run_cycle().unwrap();
        assert_eq!(report.selected_index, Some(0));
    }
}
