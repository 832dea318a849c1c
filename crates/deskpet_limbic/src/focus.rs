//! Focus Session Tracker
//!
//! A session is one continuous run of the `Focused` state. It owns the set of
//! milestones already fired, so leaving focus and coming back makes every
//! milestone eligible again.
//!
//! Milestones are checked on the monitor's polling cadence, so each one is a
//! window rather than a threshold: it fires on the first poll whose elapsed time
//! falls inside `[start, end)`. Windows must be wider than the poll interval.

use std::collections::HashSet;
use std::time::Duration;
use tokio::time::Instant;

/// Half-open elapsed-time window `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MilestoneWindow {
    pub start: Duration,
    pub end: Duration,
}

impl MilestoneWindow {
    pub fn new(start: Duration, end: Duration) -> Self {
        Self { start, end }
    }

    pub fn from_millis(start_ms: u64, end_ms: u64) -> Self {
        Self::new(Duration::from_millis(start_ms), Duration::from_millis(end_ms))
    }

    pub fn contains(&self, elapsed: Duration) -> bool {
        elapsed >= self.start && elapsed < self.end
    }
}

#[derive(Debug, Clone)]
pub struct FocusSession {
    pub started_at: Instant,
    milestones_fired: HashSet<String>,
}

impl FocusSession {
    fn new(started_at: Instant) -> Self {
        Self {
            started_at,
            milestones_fired: HashSet::new(),
        }
    }

    pub fn has_fired(&self, id: &str) -> bool {
        self.milestones_fired.contains(id)
    }
}

#[derive(Debug, Default)]
pub struct FocusTracker {
    session: Option<FocusSession>,
}

impl FocusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session at `now` unless one is already running.
    /// Returns true if a new session was started.
    pub fn on_focus_enter(&mut self, now: Instant) -> bool {
        if self.session.is_some() {
            return false;
        }
        self.session = Some(FocusSession::new(now));
        true
    }

    /// Replace any running session with a fresh one starting at `now`.
    pub fn restart(&mut self, now: Instant) {
        self.session = Some(FocusSession::new(now));
    }

    pub fn on_focus_exit(&mut self) {
        self.session = None;
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&FocusSession> {
        self.session.as_ref()
    }

    /// Time since the session started, `None` without a session.
    pub fn elapsed(&self, now: Instant) -> Option<Duration> {
        self.session
            .as_ref()
            .map(|s| now.saturating_duration_since(s.started_at))
    }

    /// Fire `id` if it has not fired in this session and the elapsed time is
    /// inside `window`. Returns true exactly when the milestone fires.
    pub fn try_fire_milestone(&mut self, id: &str, now: Instant, window: MilestoneWindow) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if session.milestones_fired.contains(id) {
            return false;
        }
        let elapsed = now.saturating_duration_since(session.started_at);
        if !window.contains(elapsed) {
            return false;
        }
        session.milestones_fired.insert(id.to_string());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn test_window_is_half_open() {
        let w = MilestoneWindow::new(secs(25), secs(27));
        assert!(!w.contains(Duration::from_millis(24_999)));
        assert!(w.contains(secs(25)));
        assert!(w.contains(Duration::from_millis(26_999)));
        assert!(!w.contains(secs(27)));
    }

    #[test]
    fn test_no_session_means_no_elapsed_and_no_fire() {
        let mut tracker = FocusTracker::new();
        let now = Instant::now();
        assert_eq!(tracker.elapsed(now), None);
        assert!(!tracker.try_fire_milestone("25s", now, MilestoneWindow::new(secs(0), secs(5))));
    }

    #[test]
    fn test_enter_does_not_restart_running_session() {
        let mut tracker = FocusTracker::new();
        let t0 = Instant::now();
        assert!(tracker.on_focus_enter(t0));
        assert!(!tracker.on_focus_enter(t0 + secs(10)));
        assert_eq!(tracker.elapsed(t0 + secs(12)), Some(secs(12)));

        tracker.restart(t0 + secs(10));
        assert_eq!(tracker.elapsed(t0 + secs(12)), Some(secs(2)));
    }

    #[test]
    fn test_milestone_fires_once_while_sweeping_window() {
        let mut tracker = FocusTracker::new();
        let t0 = Instant::now();
        tracker.on_focus_enter(t0);
        let window = MilestoneWindow::new(secs(25), secs(27));

        let fired: Vec<bool> = (20..30)
            .map(|s| tracker.try_fire_milestone("25s", t0 + secs(s), window))
            .collect();
        assert_eq!(fired.iter().filter(|f| **f).count(), 1);
        assert!(fired[5], "should fire on the first poll inside the window");
        assert!(tracker.session().unwrap().has_fired("25s"));
    }

    #[test]
    fn test_exit_then_enter_resets_milestones() {
        let mut tracker = FocusTracker::new();
        let window = MilestoneWindow::new(secs(25), secs(27));
        let t0 = Instant::now();

        tracker.on_focus_enter(t0);
        assert!(tracker.try_fire_milestone("25s", t0 + secs(25), window));

        tracker.on_focus_exit();
        assert!(!tracker.is_active());

        let t1 = t0 + secs(100);
        tracker.on_focus_enter(t1);
        assert!(tracker.try_fire_milestone("25s", t1 + secs(26), window));
    }

    #[test]
    fn test_milestones_are_independent() {
        let mut tracker = FocusTracker::new();
        let t0 = Instant::now();
        tracker.on_focus_enter(t0);
        let wide = MilestoneWindow::new(secs(0), secs(100));
        assert!(tracker.try_fire_milestone("a", t0 + secs(1), wide));
        assert!(tracker.try_fire_milestone("b", t0 + secs(1), wide));
        assert!(!tracker.try_fire_milestone("a", t0 + secs(2), wide));
    }
}
