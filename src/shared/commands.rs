//! Commands and events exchanged between a front end and the driver.

use crate::arena::ArenaError;
use serde::{Deserialize, Serialize};

/// Commands sent from a front end to the simulation handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimCommand {
    /// Start advancing the arena on the driver thread
    Start,
    /// Stop the driver, keeping the terrain as it is
    Stop,
    /// Reseed the terrain and reset the generation counter
    Reset,
    /// Stop the driver for good
    Shutdown,
}

/// Current simulation state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SimState {
    /// Driver thread is advancing the arena
    Running,
    /// No driver thread; the arena can be observed or reset
    #[default]
    Paused,
    /// Handle has been shut down
    Stopped,
}

/// Why a driver loop ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// Stop was requested through the handle
    Requested,
    /// A single breed took over the terrain
    Absorbed,
    /// The arena rejected a step
    Failed(ArenaError),
}

/// Notifications sent from the driver thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverEvent {
    /// The driver loop exited; controls can be re-enabled
    Finished { generation: u64, reason: StopReason },
}

impl DriverEvent {
    pub fn generation(&self) -> u64 {
        match self {
            Self::Finished { generation, .. } => *generation,
        }
    }

    pub fn is_absorbed(&self) -> bool {
        matches!(
            self,
            Self::Finished {
                reason: StopReason::Absorbed,
                ..
            }
        )
    }
}
