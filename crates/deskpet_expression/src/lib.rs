//! # Deskpet Expression
//!
//! Everything between a raw signal and what the user sees:
//!
//! - [`SignalRouter`] applies the state machine and pays out rewards.
//! - [`CooldownGate`] rate-limits all speech as one budget.
//! - [`SpeechDispatcher`] generates lines on worker tasks and shows them.
//! - [`CameraWatch`] debounces camera frames into smiles and absence nudges.

pub mod camera;
pub mod gate;
pub mod router;
pub mod speech;

pub use camera::{run_camera, CameraSignal, CameraWatch, FrameObservation, STILL_THERE_LINE};
pub use gate::CooldownGate;
pub use router::{
    KeyOutcome, Milestone, RouterConfig, RouterHandle, SignalRouter, TickReport, PAT_LINE,
};
pub use speech::SpeechDispatcher;
