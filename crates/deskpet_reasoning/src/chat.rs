//! Free-form chat with the pet
//!
//! The user's message is wrapped in the pet's persona prompt. A failed or
//! blank generation turns into a tired-cat line instead of an error.

use deskpet_core::TextGenerator;
use std::sync::Arc;
use std::time::Duration;

pub const CHAT_FALLBACK: &str = "😿 ...I'm a bit tired right now.";

pub const CHAT_GREETING: &str = "Hi there! I'm your desk buddy 😺. What's up?";

const DEFAULT_CHAT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct ChatResponder {
    generator: Arc<dyn TextGenerator>,
    pet_name: String,
    timeout: Duration,
}

impl ChatResponder {
    pub fn new(generator: Arc<dyn TextGenerator>, pet_name: &str) -> Self {
        Self {
            generator,
            pet_name: pet_name.to_string(),
            timeout: DEFAULT_CHAT_TIMEOUT,
        }
    }

    /// Give up on the generator after `timeout` and answer with the fallback
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn prompt_for(&self, input: &str) -> String {
        format!(
            "You are a cute pixel cat pet named {} who lives on the user's desktop. \
             Keep your replies short, warm, and positive. Use emojis sometimes. \
             Reply to: {}",
            self.pet_name,
            input.trim()
        )
    }

    pub async fn reply(&self, input: &str) -> String {
        let prompt = self.prompt_for(input);
        match tokio::time::timeout(self.timeout, self.generator.generate(&prompt)).await {
            Ok(Ok(text)) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(Ok(_)) => {
                tracing::warn!("chat generation returned nothing");
                CHAT_FALLBACK.to_string()
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "chat generation failed");
                CHAT_FALLBACK.to_string()
            }
            Err(_) => {
                tracing::warn!(timeout = ?self.timeout, "chat generation timed out");
                CHAT_FALLBACK.to_string()
            }
        }
    }
}
