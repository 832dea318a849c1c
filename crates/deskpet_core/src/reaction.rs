//! Reaction themes
//!
//! Every speech line the pet produces belongs to a theme. A theme knows the
//! prompt handed to the text generator and the canned lines used when
//! generation fails.

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    /// Entering `Sleeping`
    Sleepy,
    /// Entering `Idle`
    Break,
    /// Entering `Focused` from the monitor loop
    Motivating,
    /// First key press after being away
    WelcomeBack,
    Encourage,
    Celebrate,
    /// The camera noticed a smile
    Smile,
}

const FOCUS_REWARD_LINES: &[&str] = &[
    "Nice work! 🎉",
    "Yesss keep going! 😺✨",
    "Proud of you rn 😼💗",
    "You're doing amazing 🌟",
    "Look at you being productive 😻",
];

const WELCOME_BACK_LINES: &[&str] = &[
    "Hey hey you're back! 😺",
    "Missed you! 🐾",
    "Ready for round 2? 💪",
];

const SLEEP_LINES: &[&str] = &["Zzzz... 💤", "*soft snoring noises*", "rest time.."];

const BREAK_LINES: &[&str] = &["Taking a tiny break ☕", "Stretch time 🐾"];

const MOTIVATING_LINES: &[&str] = &["Back to work! 💪", "Let's gooo 🚀"];

const SMILE_LINES: &[&str] = &["I love that smile 😸", "You look happy! 💗"];

impl Theme {
    pub fn prompt(self) -> &'static str {
        match self {
            Theme::Sleepy => {
                "Say a sleepy message like a cat dozing off. Be cute and soft. Use emojis."
            }
            Theme::Break => "Say something calm like 'taking a small break'. Use emojis.",
            Theme::Motivating => {
                "Say something motivating like 'back to work!'. Keep it under 5 words with emojis."
            }
            Theme::WelcomeBack => {
                "Say a cute, short 'welcome back' message under 6 words. Use emojis."
            }
            Theme::Encourage => "Say an encouraging short message under 5 words. Use emojis.",
            Theme::Celebrate => {
                "Say something excited and celebratory in under 5 words. Use emojis."
            }
            Theme::Smile => {
                "Say something sweet noticing my smile. Keep it short and cute with emojis."
            }
        }
    }

    pub fn fallback_lines(self) -> &'static [&'static str] {
        match self {
            Theme::Sleepy => SLEEP_LINES,
            Theme::Break => BREAK_LINES,
            Theme::Motivating => MOTIVATING_LINES,
            Theme::WelcomeBack => WELCOME_BACK_LINES,
            Theme::Encourage | Theme::Celebrate => FOCUS_REWARD_LINES,
            Theme::Smile => SMILE_LINES,
        }
    }

    /// Random canned line for this theme.
    pub fn fallback(self) -> &'static str {
        self.fallback_lines()
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or("🐾")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Theme; 7] = [
        Theme::Sleepy,
        Theme::Break,
        Theme::Motivating,
        Theme::WelcomeBack,
        Theme::Encourage,
        Theme::Celebrate,
        Theme::Smile,
    ];

    #[test]
    fn test_every_theme_has_prompt_and_fallbacks() {
        for theme in ALL {
            assert!(!theme.prompt().is_empty());
            assert!(!theme.fallback_lines().is_empty());
            assert!(theme.fallback_lines().contains(&theme.fallback()));
        }
    }

    #[test]
    fn test_theme_parses_snake_case() {
        #[derive(Deserialize)]
        struct Wrapper {
            theme: Theme,
        }
        let w: Wrapper = toml::from_str("theme = \"welcome_back\"").unwrap();
        assert_eq!(w.theme, Theme::WelcomeBack);
    }
}
