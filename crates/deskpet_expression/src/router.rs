//! Signal Router
//!
//! Turns key presses, camera expressions, pats and monitor ticks into state
//! transitions, focus-session bookkeeping, ledger rewards and speech requests.
//!
//! All handlers serialize on one router mutex that guards the activity
//! bookkeeping and the focus tracker. The behavior store has its own lock and
//! is always taken after the router's. Ledger writes happen inline; text
//! generation never does.

use crate::gate::CooldownGate;
use crate::speech::SpeechDispatcher;
use deskpet_core::{BehavioralState, EngineConfig, Expression, MilestoneConfig, Signal, Theme};
use deskpet_limbic::{BehaviorStore, FocusTracker, HeartbeatConfig, MilestoneWindow};
use deskpet_memory::{LedgerError, RewardLedger};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

pub const PAT_LINE: &str = "Pat pat 😺💗";

/// A focus milestone as the router evaluates it
#[derive(Debug, Clone, PartialEq)]
pub struct Milestone {
    pub id: String,
    pub window: MilestoneWindow,
    pub xp: u64,
    pub streak: u64,
    pub quest: Option<String>,
    pub celebrate: bool,
    pub theme: Theme,
}

impl From<&MilestoneConfig> for Milestone {
    fn from(config: &MilestoneConfig) -> Self {
        Self {
            id: config.id.clone(),
            window: MilestoneWindow::from_millis(config.start_ms, config.end_ms),
            xp: config.xp,
            streak: config.streak,
            quest: config.quest.clone(),
            celebrate: config.celebrate,
            theme: config.theme,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RouterConfig {
    pub idle_after: Duration,
    pub sleep_after: Duration,
    /// XP for a genuine return from idleness
    pub welcome_back_xp: u64,
    /// Key presses this soon after entering `Happy` are swallowed
    pub celebration_guard: Duration,
    /// Evaluated in ascending window order
    pub milestones: Vec<Milestone>,
}

impl RouterConfig {
    pub fn new(engine: &EngineConfig, milestones: &[MilestoneConfig]) -> Self {
        let mut milestones: Vec<Milestone> = milestones.iter().map(Milestone::from).collect();
        milestones.sort_by_key(|m| m.window.start);
        Self {
            idle_after: engine.idle_after(),
            sleep_after: engine.sleep_after(),
            welcome_back_xp: engine.welcome_back_xp,
            celebration_guard: engine.celebration_guard(),
            milestones,
        }
    }
}

/// What a key press did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Arrived right after a celebration; nothing changed
    Swallowed,
    AlreadyFocused,
    Focused { welcome_back: bool },
}

/// What a monitor tick did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Newly applied monitor target, if the target changed on this tick
    pub transition: Option<BehavioralState>,
    /// Milestones fired on this tick, in evaluation order
    pub milestones: Vec<String>,
}

#[derive(Debug)]
struct Activity {
    last_key: Instant,
    /// Whether any key has been pressed since startup
    typed: bool,
    /// Last target the monitor applied; transitions are edge-triggered on it
    applied: BehavioralState,
}

#[derive(Debug)]
struct RouterState {
    activity: Activity,
    focus: FocusTracker,
}

pub struct SignalRouter {
    config: RouterConfig,
    store: BehaviorStore,
    ledger: Arc<RewardLedger>,
    gate: Arc<CooldownGate>,
    speech: SpeechDispatcher,
    state: Mutex<RouterState>,
}

impl SignalRouter {
    pub fn new(
        config: RouterConfig,
        store: BehaviorStore,
        ledger: Arc<RewardLedger>,
        gate: Arc<CooldownGate>,
        speech: SpeechDispatcher,
    ) -> Self {
        let applied = store.get_state();
        Self {
            config,
            store,
            ledger,
            gate,
            speech,
            state: Mutex::new(RouterState {
                activity: Activity {
                    last_key: Instant::now(),
                    typed: false,
                    applied,
                },
                focus: FocusTracker::new(),
            }),
        }
    }

    pub fn store(&self) -> &BehaviorStore {
        &self.store
    }

    pub fn ledger(&self) -> &Arc<RewardLedger> {
        &self.ledger
    }

    pub fn gate(&self) -> &Arc<CooldownGate> {
        &self.gate
    }

    pub fn speech(&self) -> &SpeechDispatcher {
        &self.speech
    }

    /// Elapsed time of the running focus session
    pub fn focus_elapsed(&self, now: Instant) -> Option<Duration> {
        self.lock_state().focus.elapsed(now)
    }

    pub fn handle(&self, signal: Signal) {
        match signal {
            Signal::KeyPressed(at) => {
                self.on_key_pressed(at);
            }
            Signal::Tick(at) => {
                self.on_tick(at);
            }
            Signal::ExpressionObserved(expression) => self.on_expression(expression, Instant::now()),
            Signal::Pat => self.on_pat(),
        }
    }

    pub fn on_key_pressed(&self, now: Instant) -> KeyOutcome {
        let mut state = self.lock_state();
        state.activity.last_key = now;
        state.activity.typed = true;

        let prior = self.store.get_state();
        if prior == BehavioralState::Happy
            && now.saturating_duration_since(self.store.last_changed())
                < self.config.celebration_guard
        {
            tracing::debug!("key press swallowed right after celebration");
            return KeyOutcome::Swallowed;
        }
        if prior == BehavioralState::Focused {
            return KeyOutcome::AlreadyFocused;
        }

        state.focus.restart(now);
        self.store.set_state(BehavioralState::Focused);
        state.activity.applied = BehavioralState::Focused;
        self.start_focus_day();

        let welcome_back = prior != BehavioralState::Happy;
        if welcome_back {
            tracing::info!(from = %prior, "welcome back");
            if self.config.welcome_back_xp > 0 {
                log_ledger("welcome-back xp", self.ledger.add_xp(self.config.welcome_back_xp));
            }
            self.speak(Theme::WelcomeBack, now);
        }
        KeyOutcome::Focused { welcome_back }
    }

    pub fn on_tick(&self, now: Instant) -> TickReport {
        let mut state = self.lock_state();
        let mut report = TickReport::default();

        let idle = now.saturating_duration_since(state.activity.last_key);
        let target = if idle > self.config.sleep_after {
            BehavioralState::Sleeping
        } else if idle > self.config.idle_after {
            BehavioralState::Idle
        } else if state.activity.typed {
            BehavioralState::Focused
        } else {
            state.activity.applied
        };

        if target != state.activity.applied {
            match self.store.set_unless_transient(target) {
                None => {
                    // The edge is re-evaluated once the transient state reverts
                    tracing::trace!(target = %target, "monitor edge deferred");
                }
                Some(prior) => {
                    state.activity.applied = target;
                    report.transition = Some(target);
                    tracing::info!(from = %prior, to = %target, ?idle, "monitor transition");

                    match target {
                        BehavioralState::Sleeping => {
                            state.focus.on_focus_exit();
                            self.speak(Theme::Sleepy, now);
                        }
                        BehavioralState::Idle => {
                            state.focus.on_focus_exit();
                            self.speak(Theme::Break, now);
                        }
                        BehavioralState::Focused => {
                            state.focus.restart(now);
                            self.start_focus_day();
                            self.speak(Theme::Motivating, now);
                        }
                        BehavioralState::Happy | BehavioralState::Pat => {}
                    }
                }
            }
        }

        if state.activity.typed && self.store.get_state() == BehavioralState::Focused {
            state.focus.on_focus_enter(now);
            for milestone in &self.config.milestones {
                if state
                    .focus
                    .try_fire_milestone(&milestone.id, now, milestone.window)
                {
                    self.reward(milestone, now);
                    report.milestones.push(milestone.id.clone());
                }
            }
        }

        tracing::trace!(?idle, applied = %state.activity.applied, "tick");
        report
    }

    pub fn on_expression(&self, expression: Expression, now: Instant) {
        match expression {
            Expression::Smile => {
                tracing::info!("smile noticed");
                self.store.set_state(BehavioralState::Happy);
                self.speak(Theme::Smile, now);
            }
        }
    }

    /// The user clicked the pet. Not subject to the cooldown.
    pub fn on_pat(&self) {
        self.store.trigger_pat();
        self.speech.announce(PAT_LINE);
    }

    /// Request a themed line through the shared cooldown.
    /// Returns true if the request was queued.
    pub fn speak(&self, theme: Theme, now: Instant) -> bool {
        if !self.gate.try_fire(now) {
            tracing::debug!(theme = ?theme, "speech suppressed by cooldown");
            return false;
        }
        self.speech.dispatch(theme)
    }

    /// Start the monitor loop: one tick per heartbeat interval plus every
    /// signal sent through the returned handle, all handled on one task.
    pub fn spawn(self: &Arc<Self>, heartbeat: HeartbeatConfig) -> RouterHandle {
        let (tx, mut rx) = mpsc::channel::<Signal>(64);
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let router = Arc::clone(self);

        let task = tokio::spawn(async move {
            let first = Instant::now() + heartbeat.startup_delay;
            let mut ticker = tokio::time::interval_at(first, heartbeat.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            tracing::info!(interval = ?heartbeat.interval, "monitor loop started");

            loop {
                tokio::select! {
                    at = ticker.tick() => {
                        router.on_tick(at);
                    }
                    Some(signal) = rx.recv() => {
                        router.handle(signal);
                    }
                    _ = shutdown_rx.changed() => break,
                }
            }
            tracing::info!("monitor loop stopped");
        });

        RouterHandle {
            tx,
            shutdown: shutdown_tx,
            task,
        }
    }

    /// Pay out a milestone. A celebrating milestone enters `Happy` but leaves the
    /// monitor's applied target at `Focused`, so the running session carries on
    /// once `Happy` reverts and its milestones stay spent. Re-entering `Focused`
    /// after the celebration would restart the session and pay them out again.
    fn reward(&self, milestone: &Milestone, now: Instant) {
        tracing::info!(milestone = %milestone.id, xp = milestone.xp, "focus milestone reached");
        if milestone.xp > 0 {
            log_ledger("milestone xp", self.ledger.add_xp(milestone.xp));
        }
        if milestone.streak > 0 {
            log_ledger("milestone streak", self.ledger.add_streak(milestone.streak));
        }
        if let Some(quest) = &milestone.quest {
            log_ledger("quest completion", self.ledger.complete_quest(quest));
        }
        if milestone.celebrate {
            self.store.set_state(BehavioralState::Happy);
        }
        self.speak(milestone.theme, now);
    }

    fn start_focus_day(&self) {
        let today = chrono::Local::now().date_naive();
        log_ledger("daily rollover", self.ledger.roll_day(today));
    }

    fn lock_state(&self) -> MutexGuard<'_, RouterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn log_ledger<T>(what: &str, result: Result<T, LedgerError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(error = %e, "{} failed", what);
            None
        }
    }
}

/// Feeds signals into a running router task
pub struct RouterHandle {
    tx: mpsc::Sender<Signal>,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl RouterHandle {
    pub fn sender(&self) -> mpsc::Sender<Signal> {
        self.tx.clone()
    }

    /// Returns false once the router task has stopped
    pub async fn send(&self, signal: Signal) -> bool {
        self.tx.send(signal).await.is_ok()
    }

    pub fn key_pressed(&self) -> bool {
        self.tx.try_send(Signal::KeyPressed(Instant::now())).is_ok()
    }

    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "monitor loop ended abnormally");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deskpet_core::{PetConfig, SpeechConfig, SpeechDisplay};
    use deskpet_limbic::TransientConfig;
    use deskpet_reasoning::MockGenerator;
    use tempfile::TempDir;

    struct NullDisplay;

    impl SpeechDisplay for NullDisplay {
        fn show(&self, _text: &str, _duration_ms: u64) {}
    }

    fn router(dir: &TempDir) -> SignalRouter {
        let config = PetConfig::default();
        let speech = SpeechDispatcher::spawn(
            Arc::new(MockGenerator::new("meow")),
            Arc::new(NullDisplay),
            &SpeechConfig::default(),
        );
        SignalRouter::new(
            RouterConfig::new(&config.engine, &config.milestones),
            BehaviorStore::new(TransientConfig::from_engine(&config.engine)),
            Arc::new(RewardLedger::open(dir.path()).unwrap()),
            Arc::new(CooldownGate::new(config.speech.cooldown())),
            speech,
        )
    }

    #[test]
    fn test_milestones_sorted_by_window() {
        let config = PetConfig::default();
        let mut reversed = config.milestones.clone();
        reversed.reverse();
        let router_config = RouterConfig::new(&config.engine, &reversed);
        let ids: Vec<_> = router_config.milestones.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["25s", "60s"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_typing_means_no_transition() {
        let dir = TempDir::new().unwrap();
        let router = router(&dir);
        let report = router.on_tick(Instant::now() + Duration::from_secs(5));
        assert_eq!(report, TickReport::default());
        assert_eq!(router.store().get_state(), BehavioralState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_key_press_is_welcome_back() {
        let dir = TempDir::new().unwrap();
        let router = router(&dir);
        let outcome = router.on_key_pressed(Instant::now());
        assert_eq!(outcome, KeyOutcome::Focused { welcome_back: true });
        assert_eq!(router.store().get_state(), BehavioralState::Focused);
        assert_eq!(router.ledger().stats().unwrap().xp, 2);

        assert_eq!(
            router.on_key_pressed(Instant::now()),
            KeyOutcome::AlreadyFocused
        );
        assert_eq!(router.ledger().stats().unwrap().xp, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pat_is_transient_and_ungated() {
        let dir = TempDir::new().unwrap();
        let router = router(&dir);
        let now = Instant::now();
        assert!(router.speak(Theme::Break, now));

        router.on_pat();
        assert_eq!(router.store().get_state(), BehavioralState::Pat);
        tokio::time::sleep(Duration::from_millis(1300)).await;
        assert_eq!(router.store().get_state(), BehavioralState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_monitor_does_not_clobber_transient() {
        let dir = TempDir::new().unwrap();
        let router = router(&dir);
        let t0 = Instant::now();
        router.on_key_pressed(t0);
        router.on_expression(Expression::Smile, t0);

        let report = router.on_tick(t0 + Duration::from_secs(21));
        assert_eq!(report.transition, None);
        assert_eq!(router.store().get_state(), BehavioralState::Happy);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deferred_edge_applies_after_pat_reverts() {
        let dir = TempDir::new().unwrap();
        let router = router(&dir);
        let t0 = Instant::now();
        router.on_key_pressed(t0);
        router.on_pat();

        assert_eq!(router.on_tick(t0 + Duration::from_secs(21)).transition, None);
        assert_eq!(router.store().get_state(), BehavioralState::Pat);

        tokio::time::sleep(Duration::from_millis(1300)).await;
        assert_eq!(router.store().get_state(), BehavioralState::Focused);
        let report = router.on_tick(t0 + Duration::from_secs(22));
        assert_eq!(report.transition, Some(BehavioralState::Idle));
        assert_eq!(router.store().get_state(), BehavioralState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_handle_dispatches_signals() {
        let dir = TempDir::new().unwrap();
        let router = router(&dir);
        router.handle(Signal::KeyPressed(Instant::now()));
        assert_eq!(router.store().get_state(), BehavioralState::Focused);
        router.handle(Signal::ExpressionObserved(Expression::Smile));
        assert_eq!(router.store().get_state(), BehavioralState::Happy);
        router.handle(Signal::Pat);
        assert_eq!(router.store().get_state(), BehavioralState::Pat);
    }
}
