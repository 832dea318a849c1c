//! # Deskpet Limbic
//!
//! The fast, non-verbal half of the pet: what mood it is in right now and how
//! long the user has been focused.
//!
//! - [`BehaviorStore`] is the single source of truth for the current
//!   [`BehavioralState`](deskpet_core::BehavioralState). It is safe to read and
//!   write from any thread and owns the reversion timers of transient states.
//! - [`FocusTracker`] times a continuous focused run and fires each milestone
//!   at most once per run.
//! - [`HeartbeatConfig`] sets the monitor loop's cadence.

mod focus;
mod heartbeat;
mod store;

pub use focus::{FocusSession, FocusTracker, MilestoneWindow};
pub use heartbeat::HeartbeatConfig;
pub use store::{BehaviorStore, TransientConfig};
