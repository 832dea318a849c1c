use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::reaction::Theme;

// ============================================================================
// Top-level config
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PetConfig {
    pub llm: LlmConfig,
    pub engine: EngineConfig,
    pub speech: SpeechConfig,
    pub rewards: RewardsConfig,
    pub camera: CameraConfig,
    pub milestones: Vec<MilestoneConfig>,
}

impl Default for PetConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig::default(),
            engine: EngineConfig::default(),
            speech: SpeechConfig::default(),
            rewards: RewardsConfig::default(),
            camera: CameraConfig::default(),
            milestones: default_milestones(),
        }
    }
}

impl PetConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    /// After loading, env var overrides are applied.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let mut config: PetConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML config")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Try to load from path; if the file is missing or invalid, return defaults with env overrides.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::info!("Config file not found or invalid ({:#}), using defaults", e);
                let mut cfg = Self::default();
                cfg.apply_env_overrides();
                cfg
            }
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("DESKPET_LLM_PROVIDER") {
            self.llm.provider = v;
        }
        if let Ok(v) = std::env::var("DESKPET_LLM_MODEL") {
            self.llm.model = v;
        }
        if let Ok(v) = std::env::var("OLLAMA_BASE_URL") {
            self.llm.base_url = Some(v);
        }
        if let Ok(v) = std::env::var("DESKPET_DATA_DIR") {
            self.rewards.data_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("DESKPET_SPEECH_COOLDOWN_SECS") {
            if let Ok(n) = v.parse() {
                self.speech.cooldown_secs = n;
            }
        }
    }
}

// ============================================================================
// Sub-configs
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// `ollama` (HTTP), `ollama_cli` (subprocess) or `mock`
    pub provider: String,
    pub model: String,
    pub base_url: Option<String>,
    /// Executable used by the `ollama_cli` provider
    pub binary: String,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            model: "llama3.2:1b".to_string(),
            base_url: None,
            binary: "ollama".to_string(),
            timeout_secs: 30,
        }
    }
}

impl LlmConfig {
    /// Upper bound on one chat reply
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// What a transient state's reversion timer does when it fires after a newer
/// transition has already happened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReversionPolicy {
    /// Revert unconditionally; the last timer to fire wins.
    #[default]
    Always,
    /// Skip the reversion if any transition happened since the transient was entered.
    Guarded,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub tick_interval_ms: u64,
    /// Delay before the monitor loop's first tick
    pub startup_delay_ms: u64,
    pub idle_after_secs: u64,
    pub sleep_after_secs: u64,
    pub welcome_back_xp: u64,
    /// Key presses within this window after entering `Happy` are swallowed
    pub celebration_guard_secs: u64,
    pub happy_duration_ms: u64,
    pub pat_duration_ms: u64,
    pub reversion: ReversionPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            startup_delay_ms: 3000,
            idle_after_secs: 20,
            sleep_after_secs: 120,
            welcome_back_xp: 2,
            celebration_guard_secs: 10,
            happy_duration_ms: 4000,
            pat_duration_ms: 1200,
            reversion: ReversionPolicy::Always,
        }
    }
}

impl EngineConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn startup_delay(&self) -> Duration {
        Duration::from_millis(self.startup_delay_ms)
    }

    pub fn idle_after(&self) -> Duration {
        Duration::from_secs(self.idle_after_secs)
    }

    pub fn sleep_after(&self) -> Duration {
        Duration::from_secs(self.sleep_after_secs)
    }

    pub fn celebration_guard(&self) -> Duration {
        Duration::from_secs(self.celebration_guard_secs)
    }

    pub fn happy_duration(&self) -> Duration {
        Duration::from_millis(self.happy_duration_ms)
    }

    pub fn pat_duration(&self) -> Duration {
        Duration::from_millis(self.pat_duration_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Minimum interval between two accepted speech requests, all themes combined
    pub cooldown_secs: u64,
    pub bubble_ms: u64,
    pub workers: usize,
    pub queue_capacity: usize,
    pub generation_timeout_secs: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: 10,
            bubble_ms: 3000,
            workers: 2,
            queue_capacity: 16,
            generation_timeout_secs: 30,
        }
    }
}

impl SpeechConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RewardsConfig {
    pub data_dir: PathBuf,
}

impl Default for RewardsConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub enabled: bool,
    /// Consecutive smiling frames needed before a smile is reported
    pub smile_streak: u32,
    pub refractory_ms: u64,
    /// Seconds without a face before asking "still there?"
    pub absence_secs: u64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            smile_streak: 3,
            refractory_ms: 3000,
            absence_secs: 10,
        }
    }
}

/// One focus-session milestone. The window is half-open: `[start_ms, end_ms)`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MilestoneConfig {
    pub id: String,
    pub start_ms: u64,
    pub end_ms: u64,
    #[serde(default)]
    pub xp: u64,
    #[serde(default)]
    pub streak: u64,
    #[serde(default)]
    pub quest: Option<String>,
    /// Switch to `Happy` when the milestone fires
    #[serde(default)]
    pub celebrate: bool,
    pub theme: Theme,
}

fn default_milestones() -> Vec<MilestoneConfig> {
    vec![
        MilestoneConfig {
            id: "25s".to_string(),
            start_ms: 25_000,
            end_ms: 27_000,
            xp: 5,
            streak: 0,
            quest: Some("25sec_focus".to_string()),
            celebrate: false,
            theme: Theme::Encourage,
        },
        MilestoneConfig {
            id: "60s".to_string(),
            start_ms: 60_000,
            end_ms: 62_000,
            xp: 10,
            streak: 1,
            quest: Some("1min_focus".to_string()),
            celebrate: true,
            theme: Theme::Celebrate,
        },
    ]
}

// ============================================================================
// Tests
// ============================================================================
