//! Heartbeat configuration for the monitor loop
//!
//! The heartbeat decides how often idle time is re-evaluated and milestones
//! are polled, even when no input arrives.

use deskpet_core::EngineConfig;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HeartbeatConfig {
    /// How often to tick (default: 1s). Milestone windows must be wider than this.
    pub interval: Duration,
    /// Delay before the first tick (default: 3s)
    pub startup_delay: Duration,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            startup_delay: Duration::from_secs(3),
        }
    }
}

impl HeartbeatConfig {
    pub fn from_engine(engine: &EngineConfig) -> Self {
        Self {
            interval: engine.tick_interval(),
            startup_delay: engine.startup_delay(),
        }
    }

    /// Very fast heartbeat for testing
    pub fn testing() -> Self {
        Self {
            interval: Duration::from_millis(10),
            startup_delay: Duration::ZERO,
        }
    }
}
