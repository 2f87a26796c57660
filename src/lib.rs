//! # RPS Ecosystem
//!
//! Spatial rock-paper-scissors simulator generalized to N breeds.
//!
//! Every cell of a square toroidal grid holds one breed. Breeds beat each
//! other in a circle, so none is strongest overall. Each step picks a random
//! cell and a random neighbour; if they differ, the dominant breed converts
//! the other. The run ends when one breed holds the whole grid (absorption).
//!
//! ## Features
//!
//! - **Concurrent**: a driver thread advances the arena while observers copy
//!   the terrain on their own cadence
//! - **Reproducible**: seeded random number generation
//! - **Configurable**: YAML configuration files
//! - **Parallel sweeps**: many seeded runs across all cores via Rayon
//!
//! ## Quick Start
//!
//! ```rust
//! use rps_ecosystem::{Arena, ArenaConfig};
//!
//! let arena = Arena::new(ArenaConfig {
//!     num_breeds: 3,
//!     arena_size: 20,
//!     seed: Some(7),
//! })?;
//! arena.init();
//!
//! for _ in 0..10_000 {
//!     arena.advance()?;
//! }
//! assert_eq!(arena.generation(), 10_000);
//! # Ok::<(), rps_ecosystem::ArenaError>(())
//! ```
//!
//! ## Driving from a background thread
//!
//! ```rust,no_run
//! use rps_ecosystem::shared::{Observer, SimCommand, SimulationHandle};
//! use rps_ecosystem::Config;
//! use std::sync::Arc;
//!
//! let config = Config::default();
//! let mut handle = SimulationHandle::from_config(&config).unwrap();
//! let mut observer = Observer::new(Arc::clone(handle.arena()), config.observer.clone());
//!
//! handle.send(SimCommand::Start).unwrap();
//! while handle.try_recv_event().is_none() {
//!     observer.refresh().unwrap();
//!     println!("{}", observer.generation_text());
//!     std::thread::sleep(std::time::Duration::from_millis(16));
//! }
//! ```

pub mod arena;
pub mod config;
pub mod dominance;
pub mod palette;
pub mod shared;
pub mod stats;
pub mod sweep;
pub mod terrain;

// Re-export main types
pub use arena::{Arena, ArenaConfig, ArenaError, Encounter};
pub use config::Config;
pub use dominance::{dominates, Breed};
pub use terrain::Terrain;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Time `steps` advances on a freshly seeded arena
pub fn benchmark(steps: u64, arena_size: usize, num_breeds: u8) -> Result<BenchmarkResult, ArenaError> {
    use std::time::Instant;

    let arena = Arena::new(ArenaConfig {
        num_breeds,
        arena_size,
        seed: None,
    })?;
    arena.init();

    let start = Instant::now();
    for _ in 0..steps {
        arena.advance()?;
    }
    let elapsed = start.elapsed();

    Ok(BenchmarkResult {
        steps,
        arena_size,
        num_breeds,
        surviving_breeds: stats::Census::take(&arena)?.surviving(),
        elapsed_secs: elapsed.as_secs_f64(),
        steps_per_second: steps as f64 / elapsed.as_secs_f64(),
    })
}

/// Benchmark result
#[derive(Debug, Clone)]
pub struct BenchmarkResult {
    pub steps: u64,
    pub arena_size: usize,
    pub num_breeds: u8,
    pub surviving_breeds: usize,
    pub elapsed_secs: f64,
    pub steps_per_second: f64,
}

impl std::fmt::Display for BenchmarkResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Benchmark Results ===")?;
        writeln!(f, "Steps: {}", self.steps)?;
        writeln!(f, "Arena: {}x{}", self.arena_size, self.arena_size)?;
        writeln!(f, "Breeds: {} -> {}", self.num_breeds, self.surviving_breeds)?;
        writeln!(f, "Time: {:.3}s", self.elapsed_secs)?;
        writeln!(f, "Speed: {:.0} steps/s", self.steps_per_second)?;
        Ok(())
    }
}
