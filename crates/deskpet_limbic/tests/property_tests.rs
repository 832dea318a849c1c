//! Property-based tests for focus-session milestones.
//!
//! Whatever the polling cadence (as long as it is narrower than the window),
//! a milestone fires exactly once per session while elapsed time sweeps
//! monotonically through its window.

use deskpet_limbic::{FocusTracker, MilestoneWindow};
use proptest::prelude::*;
use std::time::Duration;
use tokio::time::Instant;

proptest! {
    #[test]
    fn milestone_fires_exactly_once_per_sweep(
        start_ms in 0u64..120_000,
        width_ms in 2_000u64..10_000,
        poll_ms in 100u64..2_000,
        offset_ms in 0u64..2_000,
    ) {
        let window = MilestoneWindow::from_millis(start_ms, start_ms + width_ms);
        let mut tracker = FocusTracker::new();
        let t0 = Instant::now();
        tracker.on_focus_enter(t0);

        let mut fired = 0;
        let mut elapsed = offset_ms;
        while elapsed < start_ms + width_ms + 5_000 {
            if tracker.try_fire_milestone("m", t0 + Duration::from_millis(elapsed), window) {
                fired += 1;
                prop_assert!(window.contains(Duration::from_millis(elapsed)));
            }
            elapsed += poll_ms;
        }
        prop_assert_eq!(fired, 1);
    }

    #[test]
    fn new_session_restores_eligibility(
        sessions in 1usize..6,
        fire_at_ms in 25_000u64..27_000,
    ) {
        let window = MilestoneWindow::from_millis(25_000, 27_000);
        let mut tracker = FocusTracker::new();
        let mut t = Instant::now();

        for _ in 0..sessions {
            tracker.on_focus_enter(t);
            let at = t + Duration::from_millis(fire_at_ms);
            prop_assert!(tracker.try_fire_milestone("25s", at, window));
            prop_assert!(!tracker.try_fire_milestone("25s", at, window));
            tracker.on_focus_exit();
            t = at + Duration::from_secs(30);
        }
    }
}
