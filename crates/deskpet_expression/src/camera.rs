//! Camera collaborator logic
//!
//! Frame classification happens elsewhere; this module only sees a per-frame
//! `{face_present, smiling}` observation and debounces it into two events:
//! a smile after a streak of smiling frames, and a single "still there?" nudge
//! per stretch of absence.

use crate::gate::CooldownGate;
use crate::router::SignalRouter;
use crate::speech::SpeechDispatcher;
use deskpet_core::{CameraConfig, Expression};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

pub const STILL_THERE_LINE: &str = "Hey, still there? 👀 Focus time!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameObservation {
    pub face_present: bool,
    pub smiling: bool,
}

impl FrameObservation {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn face() -> Self {
        Self {
            face_present: true,
            smiling: false,
        }
    }

    pub fn smile() -> Self {
        Self {
            face_present: true,
            smiling: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraSignal {
    Smile,
    StillThere,
}

#[derive(Debug)]
pub struct CameraWatch {
    smile_streak: u32,
    refractory: Duration,
    absence: Duration,
    streak: u32,
    refractory_until: Option<Instant>,
    last_face: Instant,
    absence_reported: bool,
}

impl CameraWatch {
    /// Start watching at `now`; the absence clock starts as if a face had just
    /// been seen.
    pub fn new(config: &CameraConfig, now: Instant) -> Self {
        Self {
            smile_streak: config.smile_streak.max(1),
            refractory: Duration::from_millis(config.refractory_ms),
            absence: Duration::from_secs(config.absence_secs),
            streak: 0,
            refractory_until: None,
            last_face: now,
            absence_reported: false,
        }
    }

    pub fn observe(&mut self, frame: FrameObservation, now: Instant) -> Option<CameraSignal> {
        if frame.face_present {
            self.last_face = now;
            self.absence_reported = false;
        } else {
            self.streak = 0;
            if !self.absence_reported
                && now.saturating_duration_since(self.last_face) > self.absence
            {
                self.absence_reported = true;
                return Some(CameraSignal::StillThere);
            }
            return None;
        }

        if let Some(until) = self.refractory_until {
            if now < until {
                return None;
            }
            self.refractory_until = None;
        }

        if !frame.smiling {
            self.streak = 0;
            return None;
        }

        self.streak += 1;
        if self.streak < self.smile_streak {
            return None;
        }
        self.streak = 0;
        self.refractory_until = Some(now + self.refractory);
        Some(CameraSignal::Smile)
    }
}

/// Drive a [`CameraWatch`] from a frame stream until the sender is dropped.
/// Smiles go to the router; absence nudges go straight to the display,
/// subject to the shared cooldown.
pub async fn run_camera(
    mut frames: mpsc::Receiver<FrameObservation>,
    mut watch: CameraWatch,
    router: Arc<SignalRouter>,
    gate: Arc<CooldownGate>,
    speech: SpeechDispatcher,
) {
    while let Some(frame) = frames.recv().await {
        let now = Instant::now();
        match watch.observe(frame, now) {
            Some(CameraSignal::Smile) => {
                router.on_expression(Expression::Smile, now);
            }
            Some(CameraSignal::StillThere) => {
                if gate.try_fire(now) {
                    speech.announce(STILL_THERE_LINE);
                } else {
                    tracing::debug!("still-there nudge suppressed by cooldown");
                }
            }
            None => {}
        }
    }
    tracing::info!("camera stream closed");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn watch(now: Instant) -> CameraWatch {
        CameraWatch::new(&CameraConfig::default(), now)
    }

    #[test]
    fn test_three_smiles_report_once() {
        let t0 = Instant::now();
        let mut cam = watch(t0);
        assert_eq!(cam.observe(FrameObservation::smile(), t0), None);
        assert_eq!(cam.observe(FrameObservation::smile(), t0), None);
        assert_eq!(
            cam.observe(FrameObservation::smile(), t0),
            Some(CameraSignal::Smile)
        );
    }

    #[test]
    fn test_broken_streak_starts_over() {
        let t0 = Instant::now();
        let mut cam = watch(t0);
        cam.observe(FrameObservation::smile(), t0);
        cam.observe(FrameObservation::smile(), t0);
        cam.observe(FrameObservation::face(), t0);
        assert_eq!(cam.observe(FrameObservation::smile(), t0), None);
        assert_eq!(cam.observe(FrameObservation::smile(), t0), None);
        assert_eq!(
            cam.observe(FrameObservation::smile(), t0),
            Some(CameraSignal::Smile)
        );
    }

    #[test]
    fn test_refractory_ignores_frames() {
        let t0 = Instant::now();
        let mut cam = watch(t0);
        for _ in 0..3 {
            cam.observe(FrameObservation::smile(), t0);
        }
        let during = t0 + Duration::from_secs(1);
        for _ in 0..5 {
            assert_eq!(cam.observe(FrameObservation::smile(), during), None);
        }

        let after = t0 + Duration::from_secs(3);
        assert_eq!(cam.observe(FrameObservation::smile(), after), None);
        assert_eq!(cam.observe(FrameObservation::smile(), after), None);
        assert_eq!(
            cam.observe(FrameObservation::smile(), after),
            Some(CameraSignal::Smile)
        );
    }

    #[test]
    fn test_absence_reported_once_per_stretch() {
        let t0 = Instant::now();
        let mut cam = watch(t0);
        assert_eq!(
            cam.observe(FrameObservation::none(), t0 + Duration::from_secs(10)),
            None
        );
        assert_eq!(
            cam.observe(FrameObservation::none(), t0 + Duration::from_secs(11)),
            Some(CameraSignal::StillThere)
        );
        assert_eq!(
            cam.observe(FrameObservation::none(), t0 + Duration::from_secs(30)),
            None
        );

        // A face re-arms the nudge
        let back = t0 + Duration::from_secs(31);
        cam.observe(FrameObservation::face(), back);
        assert_eq!(
            cam.observe(FrameObservation::none(), back + Duration::from_secs(11)),
            Some(CameraSignal::StillThere)
        );
    }
}
