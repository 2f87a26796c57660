//! Driver thread that advances an arena independently of any front end.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::arena::{Arena, ArenaError};
use crate::config::{Config, DriverConfig};

use super::commands::{DriverEvent, SimCommand, SimState, StopReason};

/// A running driver loop
struct Runner {
    stop: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

/// Handle for controlling the driver thread of one arena
pub struct SimulationHandle {
    arena: Arc<Arena>,
    /// Advances between sleeps
    batch_size: usize,
    sleep_interval: Duration,
    runner: Option<Runner>,
    /// Channel the driver reports on when its loop exits
    event_tx: Sender<DriverEvent>,
    event_rx: Receiver<DriverEvent>,
    /// Current state
    pub state: SimState,
}

impl SimulationHandle {
    /// Wrap an existing arena
    pub fn new(arena: Arc<Arena>, driver: &DriverConfig) -> Self {
        let (event_tx, event_rx) = mpsc::channel();
        let batch_size = driver.batch_size(arena.arena_size());

        Self {
            arena,
            batch_size,
            sleep_interval: Duration::from_millis(driver.sleep_interval_ms),
            runner: None,
            event_tx,
            event_rx,
            state: SimState::Paused,
        }
    }

    /// Build and initialize an arena from configuration
    pub fn from_config(config: &Config) -> Result<Self, ArenaError> {
        let arena = Arena::new(config.arena.clone())?;
        arena.init();
        log::info!(
            "Arena ready: {}x{}, {} breeds, seed={}",
            arena.arena_size(),
            arena.arena_size(),
            arena.num_breeds(),
            arena.seed()
        );
        Ok(Self::new(Arc::new(arena), &config.driver))
    }

    /// Shared arena, for observers
    pub fn arena(&self) -> &Arc<Arena> {
        &self.arena
    }

    /// Send a command to the driver
    pub fn send(&mut self, command: SimCommand) -> Result<(), ArenaError> {
        match command {
            SimCommand::Start => self.start(),
            SimCommand::Stop => {
                self.stop();
                Ok(())
            }
            SimCommand::Reset => {
                self.reset();
                Ok(())
            }
            SimCommand::Shutdown => {
                self.shutdown();
                Ok(())
            }
        }
    }

    /// Spawn the driver loop. Does nothing if it is already running.
    pub fn start(&mut self) -> Result<(), ArenaError> {
        if self.state == SimState::Stopped {
            return Ok(());
        }
        if let Some(runner) = &self.runner {
            if !runner.thread.is_finished() {
                return Ok(());
            }
        }
        self.join_runner();
        // Reports from an earlier run must not answer for this one
        while self.event_rx.try_recv().is_ok() {}

        if !self.arena.is_initialized() {
            return Err(ArenaError::NotInitialized);
        }

        let stop = Arc::new(AtomicBool::new(false));
        let arena = Arc::clone(&self.arena);
        let events = self.event_tx.clone();
        let batch_size = self.batch_size;
        let sleep_interval = self.sleep_interval;
        let stop_flag = Arc::clone(&stop);

        let thread = thread::spawn(move || {
            run_driver(&arena, batch_size, sleep_interval, &stop_flag, &events);
        });

        self.runner = Some(Runner { stop, thread });
        self.state = SimState::Running;
        Ok(())
    }

    /// Ask the driver loop to exit after its current step, then wait for it.
    pub fn stop(&mut self) {
        if let Some(runner) = &self.runner {
            runner.stop.store(true, Ordering::Relaxed);
        }
        self.join_runner();
        if self.state == SimState::Running {
            self.state = SimState::Paused;
        }
    }

    /// Reseed the terrain. Safe while the driver is running; the next step
    /// starts on the fresh terrain.
    pub fn reset(&mut self) {
        if self.state == SimState::Stopped {
            return;
        }
        self.arena.init();
        log::info!("Arena reset");
    }

    /// Check if the driver is running
    pub fn is_running(&self) -> bool {
        self.state == SimState::Running
    }

    /// Take the latest driver event, if any (non-blocking)
    pub fn try_recv_event(&mut self) -> Option<DriverEvent> {
        let mut latest = None;
        loop {
            match self.event_rx.try_recv() {
                Ok(event) => latest = Some(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => break,
            }
        }
        if latest.is_some() {
            self.on_finished();
        }
        latest
    }

    /// Block until the driver loop reports that it exited, or the timeout
    /// passes.
    pub fn wait_finished(&mut self, timeout: Duration) -> Option<DriverEvent> {
        match self.event_rx.recv_timeout(timeout) {
            Ok(event) => {
                self.on_finished();
                Some(event)
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Stop the driver thread for good
    pub fn shutdown(&mut self) {
        self.stop();
        self.state = SimState::Stopped;
    }

    fn on_finished(&mut self) {
        let finished = self
            .runner
            .as_ref()
            .map_or(true, |runner| runner.thread.is_finished());
        if finished {
            self.join_runner();
            if self.state == SimState::Running {
                self.state = SimState::Paused;
            }
        }
    }

    fn join_runner(&mut self) {
        if let Some(runner) = self.runner.take() {
            if runner.thread.join().is_err() {
                log::error!("Driver thread panicked");
            }
        }
    }
}

impl Drop for SimulationHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Driver loop: advance in batches until stopped or absorbed
fn run_driver(
    arena: &Arena,
    batch_size: usize,
    sleep_interval: Duration,
    stop: &AtomicBool,
    events: &Sender<DriverEvent>,
) {
    log::info!("Driver started at generation {}", arena.generation());

    let reason = 'run: loop {
        for _ in 0..batch_size {
            if stop.load(Ordering::Relaxed) {
                break 'run StopReason::Requested;
            }
            if let Err(e) = arena.advance() {
                break 'run StopReason::Failed(e);
            }
        }

        match arena.is_absorbed() {
            Ok(true) => break 'run StopReason::Absorbed,
            Ok(false) => {}
            Err(e) => break 'run StopReason::Failed(e),
        }

        if !sleep_interval.is_zero() {
            thread::sleep(sleep_interval);
        }
    };

    let generation = arena.generation();
    match &reason {
        StopReason::Requested => log::info!("Driver stopped at generation {}", generation),
        StopReason::Absorbed => log::info!("Arena absorbed at generation {}", generation),
        StopReason::Failed(e) => log::error!("Driver failed at generation {}: {}", generation, e),
    }

    let _ = events.send(DriverEvent::Finished { generation, reason });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::ArenaConfig;
    use crate::terrain::Terrain;

    fn config(num_breeds: u8, arena_size: usize) -> Config {
        let mut config = Config::default();
        config.arena = ArenaConfig {
            num_breeds,
            arena_size,
            seed: Some(2024),
        };
        config.driver.sleep_interval_ms = 0;
        config
    }

    #[test]
    fn test_start_requires_init() {
        let cfg = config(3, 10);
        let arena = Arc::new(Arena::new(cfg.arena.clone()).unwrap());
        let mut handle = SimulationHandle::new(arena, &cfg.driver);

        assert_eq!(handle.start(), Err(ArenaError::NotInitialized));
        assert!(!handle.is_running());
    }

    #[test]
    fn test_stop_is_prompt_and_reported() {
        let mut cfg = config(5, 200);
        cfg.driver.sleep_interval_ms = 1;
        let mut handle = SimulationHandle::from_config(&cfg).unwrap();

        handle.send(SimCommand::Start).unwrap();
        assert!(handle.is_running());
        thread::sleep(Duration::from_millis(20));
        handle.send(SimCommand::Stop).unwrap();
        assert_eq!(handle.state, SimState::Paused);

        let event = handle.try_recv_event().expect("driver reports on exit");
        assert!(matches!(
            event,
            DriverEvent::Finished {
                reason: StopReason::Requested,
                ..
            }
        ));

        // Nothing advances once stopped
        let generation = handle.arena().generation();
        assert_eq!(event.generation(), generation);
        thread::sleep(Duration::from_millis(10));
        assert_eq!(handle.arena().generation(), generation);
    }

    #[test]
    fn test_driver_stops_on_absorption() {
        let cfg = config(3, 2);
        let mut handle = SimulationHandle::from_config(&cfg).unwrap();
        let mut terrain = Terrain::filled(3, 2, 0).unwrap();
        terrain.set(0, 0, 1);
        handle.arena().replace_terrain(terrain).unwrap();

        handle.start().unwrap();
        let event = handle
            .wait_finished(Duration::from_secs(10))
            .expect("two breeds on four cells collapse");

        assert!(event.is_absorbed());
        assert!(handle.arena().is_absorbed().unwrap());
        assert_eq!(handle.arena().census().unwrap(), vec![4, 0, 0]);
        assert_eq!(handle.state, SimState::Paused);
    }

    #[test]
    fn test_restart_discards_unread_events() {
        let cfg = config(3, 2);
        let arena = Arc::new(Arena::new(cfg.arena.clone()).unwrap());
        let driver = DriverConfig {
            iterations_per_sleep: 1,
            sleep_interval_ms: 1_000,
        };
        let mut handle = SimulationHandle::new(Arc::clone(&arena), &driver);

        // First run absorbs after one batch and nobody reads its event
        arena.replace_terrain(Terrain::filled(3, 2, 0).unwrap()).unwrap();
        handle.start().unwrap();
        while !handle.runner.as_ref().map_or(true, |r| r.thread.is_finished()) {
            thread::sleep(Duration::from_millis(1));
        }

        // A checkerboard cannot absorb in a single step
        let checkerboard = Terrain::from_rows(3, vec![vec![0, 1], vec![1, 0]]).unwrap();
        arena.replace_terrain(checkerboard).unwrap();
        handle.start().unwrap();

        assert!(handle.wait_finished(Duration::from_millis(100)).is_none());
        assert!(handle.try_recv_event().is_none());
        assert!(handle.is_running());

        handle.stop();
        let event = handle.try_recv_event().expect("second run reports on exit");
        assert!(!event.is_absorbed());
    }

    #[test]
    fn test_reset_while_running() {
        let cfg = config(4, 60);
        let mut handle = SimulationHandle::from_config(&cfg).unwrap();
        handle.start().unwrap();

        for _ in 0..5 {
            thread::sleep(Duration::from_millis(2));
            handle.send(SimCommand::Reset).unwrap();
        }
        handle.stop();

        let census = handle.arena().census().unwrap();
        assert_eq!(census.iter().sum::<usize>(), 3600);
    }

    #[test]
    fn test_shutdown_is_final() {
        let cfg = config(3, 20);
        let mut handle = SimulationHandle::from_config(&cfg).unwrap();
        handle.send(SimCommand::Shutdown).unwrap();

        assert_eq!(handle.state, SimState::Stopped);
        handle.send(SimCommand::Start).unwrap();
        assert!(!handle.is_running());
    }
}
