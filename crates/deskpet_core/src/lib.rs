pub mod config;
pub mod reaction;
pub mod signal;
pub mod state;

pub use config::{
    CameraConfig, EngineConfig, LlmConfig, MilestoneConfig, PetConfig, ReversionPolicy,
    RewardsConfig, SpeechConfig,
};
pub use reaction::Theme;
pub use signal::{Expression, Signal};
pub use state::BehavioralState;

use async_trait::async_trait;

/// Text-generation collaborator. May block for a long time and may fail;
/// callers must never invoke it on the thread that owns state transitions.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String>;
}

/// Speech bubble collaborator. Fire-and-forget: the text auto-hides after
/// `duration_ms` and no acknowledgement is expected.
pub trait SpeechDisplay: Send + Sync {
    fn show(&self, text: &str, duration_ms: u64);
}
