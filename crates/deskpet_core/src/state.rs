//! Behavioral state of the pet
//!
//! Exactly one state is current at any instant. `Happy` and `Pat` are
//! transient: they revert on their own to a resume state captured on entry.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BehavioralState {
    #[default]
    Idle,
    Focused,
    Sleeping,
    /// Celebration, reverts after the configured happy duration
    Happy,
    /// Reaction to being clicked, reverts after the pat duration
    Pat,
}

impl BehavioralState {
    pub fn is_transient(self) -> bool {
        matches!(self, BehavioralState::Happy | BehavioralState::Pat)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BehavioralState::Idle => "idle",
            BehavioralState::Focused => "focused",
            BehavioralState::Sleeping => "sleeping",
            BehavioralState::Happy => "happy",
            BehavioralState::Pat => "pat",
        }
    }
}

impl fmt::Display for BehavioralState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_states() {
        assert!(BehavioralState::Happy.is_transient());
        assert!(BehavioralState::Pat.is_transient());
        assert!(!BehavioralState::Idle.is_transient());
        assert!(!BehavioralState::Focused.is_transient());
        assert!(!BehavioralState::Sleeping.is_transient());
    }

    #[test]
    fn test_default_is_idle() {
        assert_eq!(BehavioralState::default(), BehavioralState::Idle);
        assert_eq!(BehavioralState::Sleeping.to_string(), "sleeping");
    }
}
