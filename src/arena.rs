//! Simulation engine: owns the terrain, applies interactions, counts
//! generations.
//!
//! An [`Arena`] is shared between a driver thread calling
//! [`Arena::advance`], an observer taking copies with
//! [`Arena::copy_terrain`], and whoever resets it with [`Arena::init`].
//! Every terrain access goes through one mutex, so a reset is never seen half
//! done. The generation counter is an atomic that is only written while the
//! mutex is held, which lets observers read it without locking.

use crate::dominance::{dominates, Breed};
use crate::terrain::Terrain;
use parking_lot::Mutex;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

/// Errors raised by the engine and its terrain.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ArenaError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
    #[error("arena used before init()")]
    NotInitialized,
    #[error("buffer shape mismatch: expected {expected}x{expected}, got {rows} rows of {cols}")]
    ShapeMismatch {
        expected: usize,
        rows: usize,
        cols: usize,
    },
    #[error("breed {breed} out of range for {num_breeds} breeds")]
    InvalidBreed { breed: Breed, num_breeds: u8 },
}

/// Fixed parameters of an arena.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArenaConfig {
    /// Number of competing breeds (at least 2)
    pub num_breeds: u8,
    /// Side length of the square terrain (at least 1)
    pub arena_size: usize,
    /// RNG seed; drawn at random when absent
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            num_breeds: 5,
            arena_size: 100,
            seed: None,
        }
    }
}

impl ArenaConfig {
    pub fn validate(&self) -> Result<(), ArenaError> {
        if self.num_breeds < 2 {
            return Err(ArenaError::InvalidConfig("num_breeds must be at least 2"));
        }
        if self.arena_size < 1 {
            return Err(ArenaError::InvalidConfig("arena_size must be at least 1"));
        }
        Ok(())
    }
}

/// Mutable state guarded by the arena mutex
struct ArenaState {
    terrain: Option<Terrain>,
    rng: ChaCha8Rng,
}

/// Outcome of a single interaction step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encounter {
    /// Both cells held the same breed; nothing changed
    Tie,
    /// The cell at `cell` was taken over by `winner`
    Conversion {
        cell: (usize, usize),
        winner: Breed,
        loser: Breed,
    },
}

/// Cyclic-dominance simulation on a toroidal grid.
pub struct Arena {
    num_breeds: u8,
    arena_size: usize,
    seed: u64,
    state: Mutex<ArenaState>,
    generation: AtomicU64,
}

impl Arena {
    /// Build an arena with an uninitialized terrain. [`Arena::init`] must be
    /// called before the terrain can be advanced or observed.
    pub fn new(config: ArenaConfig) -> Result<Self, ArenaError> {
        config.validate()?;
        let seed = config.seed.unwrap_or_else(|| rand::thread_rng().gen());

        Ok(Self {
            num_breeds: config.num_breeds,
            arena_size: config.arena_size,
            seed,
            state: Mutex::new(ArenaState {
                terrain: None,
                rng: ChaCha8Rng::seed_from_u64(seed),
            }),
            generation: AtomicU64::new(0),
        })
    }

    /// Reseed the terrain with uniformly random breeds and reset the
    /// generation counter.
    pub fn init(&self) {
        let mut state = self.state.lock();
        let terrain = Terrain::random(self.num_breeds, self.arena_size, &mut state.rng);
        state.terrain = Some(terrain);
        self.generation.store(0, Ordering::Release);
        log::debug!(
            "Arena initialized: {}x{} with {} breeds",
            self.arena_size,
            self.arena_size,
            self.num_breeds
        );
    }

    /// Install a prepared terrain in place of the current one and reset the
    /// generation counter.
    pub fn replace_terrain(&self, terrain: Terrain) -> Result<(), ArenaError> {
        if terrain.size() != self.arena_size {
            return Err(ArenaError::ShapeMismatch {
                expected: self.arena_size,
                rows: terrain.size(),
                cols: terrain.size(),
            });
        }
        if terrain.num_breeds() != self.num_breeds {
            return Err(ArenaError::InvalidConfig(
                "terrain breed count differs from arena",
            ));
        }
        if terrain.recount() != terrain.populations() {
            return Err(ArenaError::InvalidConfig(
                "terrain populations do not match its cells",
            ));
        }

        let mut state = self.state.lock();
        state.terrain = Some(terrain);
        self.generation.store(0, Ordering::Release);
        Ok(())
    }

    /// Perform one stochastic interaction and count it as a generation.
    ///
    /// A cell is picked uniformly from the whole grid, then one of its four
    /// neighbours uniformly. If their breeds differ the loser takes the
    /// winner's breed.
    pub fn advance(&self) -> Result<Encounter, ArenaError> {
        let mut guard = self.state.lock();
        let ArenaState { terrain, rng } = &mut *guard;
        let terrain = terrain.as_mut().ok_or(ArenaError::NotInitialized)?;

        let index = rng.gen_range(0..self.arena_size * self.arena_size);
        let (row, col) = (index / self.arena_size, index % self.arena_size);
        let neighbors = terrain.neighbors_of(row, col);
        let (n_row, n_col) = neighbors[rng.gen_range(0..neighbors.len())];

        let here = terrain.get(row, col);
        let there = terrain.get(n_row, n_col);

        let encounter = if here == there {
            Encounter::Tie
        } else if dominates(here, there, self.num_breeds) {
            terrain.set(n_row, n_col, here);
            Encounter::Conversion {
                cell: (n_row, n_col),
                winner: here,
                loser: there,
            }
        } else {
            terrain.set(row, col, there);
            Encounter::Conversion {
                cell: (row, col),
                winner: there,
                loser: here,
            }
        };

        self.generation.fetch_add(1, Ordering::AcqRel);
        Ok(encounter)
    }

    /// True when every cell holds the same breed.
    pub fn is_absorbed(&self) -> Result<bool, ArenaError> {
        let state = self.state.lock();
        state
            .terrain
            .as_ref()
            .map(Terrain::is_uniform)
            .ok_or(ArenaError::NotInitialized)
    }

    /// Copy the whole terrain into `dest`, an `arena_size × arena_size`
    /// buffer, returning the generation the copy reflects.
    ///
    /// The copy happens under the arena lock, so it never straddles an
    /// [`Arena::init`].
    pub fn copy_terrain(&self, dest: &mut [Vec<Breed>]) -> Result<u64, ArenaError> {
        let state = self.state.lock();
        let terrain = state.terrain.as_ref().ok_or(ArenaError::NotInitialized)?;
        terrain.copy_into(dest)?;
        Ok(self.generation.load(Ordering::Acquire))
    }

    /// Population of every breed, indexed by breed.
    pub fn census(&self) -> Result<Vec<usize>, ArenaError> {
        let state = self.state.lock();
        state
            .terrain
            .as_ref()
            .map(|terrain| terrain.populations().to_vec())
            .ok_or(ArenaError::NotInitialized)
    }

    /// Completed interaction steps since the last reset
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    #[inline]
    pub fn num_breeds(&self) -> u8 {
        self.num_breeds
    }

    #[inline]
    pub fn arena_size(&self) -> usize {
        self.arena_size
    }

    /// Seed of the arena's random number generator
    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Whether [`Arena::init`] (or [`Arena::replace_terrain`]) has run.
    pub fn is_initialized(&self) -> bool {
        self.state.lock().terrain.is_some()
    }
}
