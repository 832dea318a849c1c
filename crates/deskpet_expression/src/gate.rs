//! Cooldown Gate: one shared rate limit over every outbound speech request.
//!
//! All reaction categories compete for the same budget, so a welcome-back and
//! a milestone reward a few seconds apart yield a single line. Rejected
//! requests are dropped, never queued.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug)]
pub struct CooldownGate {
    min_interval: Duration,
    last_fired: Mutex<Option<Instant>>,
}

impl CooldownGate {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_fired: Mutex::new(None),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Accept the trigger at `now` if at least `min_interval` has passed since
    /// the last accepted one. The very first trigger is always accepted.
    pub fn try_fire(&self, now: Instant) -> bool {
        let mut last = self
            .last_fired
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(prev) = *last {
            if now.saturating_duration_since(prev) < self.min_interval || now < prev {
                return false;
            }
        }
        *last = Some(now);
        true
    }
}
