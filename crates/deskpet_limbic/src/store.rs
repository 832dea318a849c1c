//! Behavioral State Store
//!
//! Holds the pet's current [`BehavioralState`] behind a mutex so any thread
//! (monitor loop, input hook, camera observer, reversion timers) can read and
//! transition it. Transient states schedule their own reversion on the Tokio
//! runtime captured at construction.
//!
//! Reversion timers are never cancelled. Under [`ReversionPolicy::Always`] the
//! last timer to fire wins, even if a newer transition happened in between.
//! [`ReversionPolicy::Guarded`] compares a generation counter, bumped on every
//! transition, and drops stale reversions.
//!
//! A `Happy` reversion that fires while `Pat` is current never overwrites the
//! pat; it becomes the pat's resume target instead.

use deskpet_core::{BehavioralState, EngineConfig, ReversionPolicy};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::time::Instant;

/// Durations and policy for transient states
#[derive(Debug, Clone)]
pub struct TransientConfig {
    pub happy_duration: Duration,
    pub pat_duration: Duration,
    pub policy: ReversionPolicy,
}

impl Default for TransientConfig {
    fn default() -> Self {
        Self {
            happy_duration: Duration::from_secs(4),
            pat_duration: Duration::from_millis(1200),
            policy: ReversionPolicy::Always,
        }
    }
}

impl TransientConfig {
    pub fn from_engine(engine: &EngineConfig) -> Self {
        Self {
            happy_duration: engine.happy_duration(),
            pat_duration: engine.pat_duration(),
            policy: engine.reversion,
        }
    }
}

#[derive(Debug)]
struct Cell {
    current: BehavioralState,
    /// Where the current transient state goes back to. `None` outside transients.
    resume: Option<BehavioralState>,
    generation: u64,
    changed_at: Instant,
}

impl Cell {
    fn enter(&mut self, target: BehavioralState) -> u64 {
        self.current = target;
        self.generation += 1;
        self.changed_at = Instant::now();
        self.generation
    }

    /// Resume target for a transient entered now. Never itself transient.
    fn resume_target(&self) -> BehavioralState {
        if self.current.is_transient() {
            self.resume.unwrap_or_default()
        } else {
            self.current
        }
    }
}

fn lock(cell: &Mutex<Cell>) -> MutexGuard<'_, Cell> {
    cell.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct BehaviorStore {
    cell: Arc<Mutex<Cell>>,

    /// Every transition is published here (animation collaborators subscribe)
    watch_tx: Arc<watch::Sender<BehavioralState>>,

    config: TransientConfig,

    /// Runtime the reversion timers are spawned on, so callers need not be async
    runtime: Handle,
}

impl BehaviorStore {
    /// Create a store in `Idle`. Must be called from within a Tokio runtime.
    pub fn new(config: TransientConfig) -> Self {
        Self::with_runtime(config, Handle::current())
    }

    pub fn with_runtime(config: TransientConfig, runtime: Handle) -> Self {
        let initial = BehavioralState::default();
        let (watch_tx, _) = watch::channel(initial);
        Self {
            cell: Arc::new(Mutex::new(Cell {
                current: initial,
                resume: None,
                generation: 0,
                changed_at: Instant::now(),
            })),
            watch_tx: Arc::new(watch_tx),
            config,
            runtime,
        }
    }

    /// Snapshot of the current state
    pub fn get_state(&self) -> BehavioralState {
        lock(&self.cell).current
    }

    /// When the last transition (including reversions) happened
    pub fn last_changed(&self) -> Instant {
        lock(&self.cell).changed_at
    }

    pub fn generation(&self) -> u64 {
        lock(&self.cell).generation
    }

    pub fn policy(&self) -> ReversionPolicy {
        self.config.policy
    }

    /// Subscribe to state transitions
    pub fn subscribe(&self) -> watch::Receiver<BehavioralState> {
        self.watch_tx.subscribe()
    }

    /// Set the current state. `Happy` records the prior state and reverts to
    /// it after the happy duration; `Pat` behaves like [`Self::trigger_pat`].
    pub fn set_state(&self, target: BehavioralState) {
        match target {
            BehavioralState::Happy => self.enter_transient(target, self.config.happy_duration),
            BehavioralState::Pat => self.enter_transient(target, self.config.pat_duration),
            _ => {
                let prior = {
                    let mut cell = lock(&self.cell);
                    self.enter_steady(&mut cell, target)
                };
                tracing::trace!(from = %prior, to = %target, "state set");
            }
        }
    }

    /// Set a steady `target` unless `Happy` or `Pat` is current; the check and
    /// the transition happen under one lock. Returns the prior state when the
    /// transition was applied, `None` when it was held back.
    pub fn set_unless_transient(&self, target: BehavioralState) -> Option<BehavioralState> {
        if target.is_transient() {
            let prior = self.get_state();
            self.set_state(target);
            return Some(prior);
        }
        let prior = {
            let mut cell = lock(&self.cell);
            if cell.current.is_transient() {
                return None;
            }
            self.enter_steady(&mut cell, target)
        };
        tracing::trace!(from = %prior, to = %target, "state set");
        Some(prior)
    }

    fn enter_steady(&self, cell: &mut Cell, target: BehavioralState) -> BehavioralState {
        let prior = cell.current;
        cell.resume = None;
        cell.enter(target);
        self.watch_tx.send_replace(target);
        prior
    }

    /// Switch to `Pat` and go back to the captured state after the pat duration.
    /// Concurrent pats each start their own timer.
    pub fn trigger_pat(&self) {
        self.enter_transient(BehavioralState::Pat, self.config.pat_duration);
    }

    fn enter_transient(&self, target: BehavioralState, delay: Duration) {
        let (resume, generation) = {
            let mut cell = lock(&self.cell);
            let resume = cell.resume_target();
            cell.resume = Some(resume);
            let generation = cell.enter(target);
            self.watch_tx.send_replace(target);
            (resume, generation)
        };
        tracing::debug!(state = %target, resume = %resume, "entered transient state");

        let cell = Arc::clone(&self.cell);
        let watch_tx = Arc::clone(&self.watch_tx);
        let policy = self.config.policy;
        self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            revert(&cell, &watch_tx, target, resume, generation, policy);
        });
    }
}

fn revert(
    cell: &Mutex<Cell>,
    watch_tx: &watch::Sender<BehavioralState>,
    transient: BehavioralState,
    resume: BehavioralState,
    generation: u64,
    policy: ReversionPolicy,
) {
    let mut cell = lock(cell);
    if policy == ReversionPolicy::Guarded && cell.generation != generation {
        tracing::debug!(state = %transient, "stale reversion skipped");
        return;
    }
    if transient == BehavioralState::Happy && cell.current == BehavioralState::Pat {
        cell.resume = Some(resume);
        tracing::debug!(resume = %resume, "happy reversion deferred to pat");
        return;
    }
    cell.resume = None;
    cell.enter(resume);
    watch_tx.send_replace(resume);
    tracing::debug!(from = %transient, to = %resume, "transient state reverted");
}
