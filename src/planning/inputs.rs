//! Inbound state, path and obstacle updates
//!
//! Producers on any thread push whole entities through an [`InputHandle`].
//! Each kind of update has a one-message slot; a newer message replaces one
//! the planner has not picked up yet. The planning loop takes the slots only
//! at cycle boundaries, so a cycle always works on one consistent snapshot.

use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use tracing::info;

use crate::common::traits::Clock;
use crate::common::types::{ObstacleSet, Path, VehicleState};

/// Entities a cycle works on
#[derive(Debug, Clone, Default)]
pub struct InputSnapshot {
    pub state: VehicleState,
    pub path: Arc<Path>,
    pub obstacles: Arc<ObstacleSet>,
}

impl InputSnapshot {
    /// A state past the path origin and a non-empty path have been seen
    pub fn is_ready(&self) -> bool {
        self.state.s > 0.0 && !self.path.is_empty()
    }
}

/// Single-message channel whose pending message is replaced by a newer one
#[derive(Debug, Clone)]
struct LatestSlot<T> {
    tx: Sender<T>,
    rx: Receiver<T>,
}

impl<T> LatestSlot<T> {
    fn new() -> Self {
        let (tx, rx) = bounded(1);
        Self { tx, rx }
    }

    /// Returns true if an update the planner had not picked up was dropped
    fn put(&self, mut value: T) -> bool {
        let mut replaced = false;
        loop {
            match self.tx.try_send(value) {
                Ok(()) => return replaced,
                Err(TrySendError::Full(v)) => {
                    replaced |= self.rx.try_recv().is_ok();
                    value = v;
                }
                // both ends live in the slot
                Err(TrySendError::Disconnected(_)) => return replaced,
            }
        }
    }

    fn take(&self) -> Option<T> {
        self.rx.try_recv().ok()
    }
}

/// Sending side, cheap to clone
#[derive(Debug, Clone)]
pub struct InputHandle {
    state: LatestSlot<VehicleState>,
    path: LatestSlot<Arc<Path>>,
    obstacles: LatestSlot<Arc<ObstacleSet>>,
    min_vx: f64,
}

impl InputHandle {
    /// Returns true if this replaced a state the planner never saw
    pub fn update_state(&self, state: VehicleState) -> bool {
        self.state.put(state.clamped_to(self.min_vx))
    }

    pub fn update_path(&self, path: Path) -> bool {
        self.path.put(Arc::new(path))
    }

    pub fn update_obstacles(&self, obstacles: ObstacleSet) -> bool {
        self.obstacles.put(Arc::new(obstacles))
    }
}

/// Receiving side owned by the planning loop
#[derive(Debug)]
pub struct InputBuffer {
    state: LatestSlot<VehicleState>,
    path: LatestSlot<Arc<Path>>,
    obstacles: LatestSlot<Arc<ObstacleSet>>,
    snapshot: InputSnapshot,
}

impl InputBuffer {
    /// Swap in the latest message of each kind
    pub fn refresh(&mut self) -> &InputSnapshot {
        if let Some(state) = self.state.take() {
            self.snapshot.state = state;
        }
        if let Some(path) = self.path.take() {
            self.snapshot.path = path;
        }
        if let Some(obstacles) = self.obstacles.take() {
            self.snapshot.obstacles = obstacles;
        }
        &self.snapshot
    }

    pub fn snapshot(&self) -> &InputSnapshot {
        &self.snapshot
    }
}

/// Connected handle and buffer; incoming `vx` is clamped to `min_vx`.
/// At most one update of each kind waits for the planner.
pub fn input_channels(min_vx: f64) -> (InputHandle, InputBuffer) {
    let (state, path, obstacles) = (LatestSlot::new(), LatestSlot::new(), LatestSlot::new());
    let handle = InputHandle {
        state: state.clone(),
        path: path.clone(),
        obstacles: obstacles.clone(),
        min_vx,
    };
    let buffer = InputBuffer {
        state,
        path,
        obstacles,
        snapshot: InputSnapshot::default(),
    };
    (handle, buffer)
}

/// Blocks until the inputs are usable, polling once per period
#[derive(Debug, Clone, Copy)]
pub struct ReadinessGate {
    poll_period: Duration,
}

impl ReadinessGate {
    pub fn new(poll_period: Duration) -> Self {
        Self { poll_period }
    }

    /// Returns the number of polls that found the inputs not ready
    pub fn wait<C: Clock>(&self, inputs: &mut InputBuffer, clock: &mut C) -> usize {
        let mut polls = 0;
        while !inputs.refresh().is_ready() {
            info!("waiting for state and path");
            polls += 1;
            clock.sleep(self.poll_period);
        }
        polls
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::common::types::MIN_VX;

    /// Clock that advances only when slept on and can run a hook per sleep
    pub(crate) struct FakeClock {
        pub now: Duration,
        pub sleeps: Vec<Duration>,
        pub on_sleep: Option<Box<dyn FnMut(usize)>>,
    }

    impl FakeClock {
        pub fn new() -> Self {
            Self { now: Duration::ZERO, sleeps: Vec::new(), on_sleep: None }
        }
    }

    impl Clock for FakeClock {
        fn now(&self) -> Duration {
            self.now
        }

        fn sleep(&mut self, duration: Duration) {
            self.now += duration;
            self.sleeps.push(duration);
            let count = self.sleeps.len();
            if let Some(hook) = self.on_sleep.as_mut() {
                hook(count);
            }
        }
    }

    fn road() -> Path {
        Path::from_centerline(&[0.0, 50.0, 100.0], &[0.0, 0.0, 0.0], 2.0).unwrap()
    }

    #[test]
    fn test_latest_update_wins() {
        let (handle, mut buffer) = input_channels(MIN_VX);
        handle.update_state(VehicleState::new(1.0, 0.0, 0.0, 0.0, 3.0, 0.0));
        handle.update_state(VehicleState::new(2.0, 0.0, 0.0, 0.0, 4.0, 0.0));
        handle.update_state(VehicleState::new(3.0, 0.5, 0.0, 0.0, 5.0, 0.0));
        let snapshot = buffer.refresh();
        assert_eq!(snapshot.state.s, 3.0);
        assert_eq!(snapshot.state.d, 0.5);
    }

    #[test]
    fn test_pending_updates_do_not_pile_up() {
        let (handle, mut buffer) = input_channels(MIN_VX);
        assert!(!handle.update_state(VehicleState::new(1.0, 0.0, 0.0, 0.0, 3.0, 0.0)));
        for i in 2..100 {
            assert!(handle.update_state(VehicleState::new(i as f64, 0.0, 0.0, 0.0, 3.0, 0.0)));
        }
        assert_eq!(handle.state.tx.len(), 1);
        assert_eq!(buffer.refresh().state.s, 99.0);
        assert!(handle.state.tx.is_empty());
        assert!(!handle.update_state(VehicleState::new(100.0, 0.0, 0.0, 0.0, 3.0, 0.0)));
    }

    #[test]
    fn test_snapshot_kept_without_updates() {
        let (handle, mut buffer) = input_channels(MIN_VX);
        handle.update_path(road());
        buffer.refresh();
        let path = buffer.refresh().path.clone();
        assert_eq!(path.len(), 3);
    }

    #[test]
    fn test_updates_are_invisible_until_refresh() {
        let (handle, mut buffer) = input_channels(MIN_VX);
        handle.update_state(VehicleState::new(1.0, 0.0, 0.0, 0.0, 3.0, 0.0));
        buffer.refresh();
        handle.update_state(VehicleState::new(9.0, 0.0, 0.0, 0.0, 3.0, 0.0));
        assert_eq!(buffer.snapshot().state.s, 1.0);
        assert_eq!(buffer.refresh().state.s, 9.0);
    }

    #[test]
    fn test_zero_speed_is_clamped_on_arrival() {
        let (handle, mut buffer) = input_channels(MIN_VX);
        handle.update_state(VehicleState::new(1.0, 0.0, 0.0, 0.0, 0.0, 0.0));
        assert_eq!(buffer.refresh().state.vx, 0.1);
    }

    #[test]
    fn test_updates_from_another_thread() {
        let (handle, mut buffer) = input_channels(MIN_VX);
        let producer = handle.clone();
        std::thread::spawn(move || {
            producer.update_obstacles(ObstacleSet::from_obstacles(vec![
                crate::common::types::Obstacle::new(5.0, 0.0, 0.5, 1.0),
            ]));
        })
        .join()
        .unwrap();
        assert_eq!(buffer.refresh().obstacles.len(), 1);
    }

    #[test]
    fn test_readiness_requires_state_and_path() {
        let (handle, mut buffer) = input_channels(MIN_VX);
        assert!(!buffer.refresh().is_ready());
        handle.update_path(road());
        assert!(!buffer.refresh().is_ready());
        handle.update_state(VehicleState::new(0.0, 0.0, 0.0, 0.0, 1.0, 0.0));
        assert!(!buffer.refresh().is_ready());
        handle.update_state(VehicleState::new(0.5, 0.0, 0.0, 0.0, 1.0, 0.0));
        assert!(buffer.refresh().is_ready());
    }

    #[test]
    fn test_gate_polls_until_ready() {
        let (handle, mut buffer) = input_channels(MIN_VX);
        let mut clock = FakeClock::new();
        let feeder = handle.clone();
        clock.on_sleep = Some(Box::new(move |count| {
            if count == 2 {
                feeder.update_path(road());
            }
            if count == 3 {
                feeder.update_state(VehicleState::new(1.0, 0.0, 0.0, 0.0, 2.0, 0.0));
            }
        }));

        let gate = ReadinessGate::new(Duration::from_millis(100));
        let polls = gate.wait(&mut buffer, &mut clock);
        assert_eq!(polls, 3);
        assert_eq!(clock.now, Duration::from_millis(300));
        assert!(buffer.snapshot().is_ready());
    }

    #[test]
    fn test_gate_passes_immediately_when_ready() {
        let (handle, mut buffer) = input_channels(MIN_VX);
        handle.update_path(road());
        handle.update_state(VehicleState::new(1.0, 0.0, 0.0, 0.0, 2.0, 0.0));
        let mut clock = FakeClock::new();
        let polls = ReadinessGate::new(Duration::from_millis(100)).wait(&mut buffer, &mut clock);
        assert_eq!(polls, 0);
        assert!(clock.sleeps.is_empty());
    }
}
