//! Driver and observer plumbing around a shared arena.
//!
//! The driver advances the arena on a background thread; observers copy the
//! terrain on their own schedule. Both only hold an `Arc<Arena>`.

pub mod commands;
pub mod sim_thread;
pub mod snapshot;

pub use commands::{DriverEvent, SimCommand, SimState, StopReason};
pub use sim_thread::SimulationHandle;
pub use snapshot::{ArenaSnapshot, Observer};
