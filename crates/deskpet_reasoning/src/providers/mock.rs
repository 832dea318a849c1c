//! Mock provider: deterministic replies for tests and offline runs.

use anyhow::Result;
use async_trait::async_trait;
use deskpet_core::TextGenerator;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

#[derive(Debug, Clone)]
enum Mode {
    Reply(String),
    Fail,
}

#[derive(Debug)]
pub struct MockGenerator {
    mode: Mode,
    delay: Duration,
    prompts: Mutex<Vec<String>>,
}

impl MockGenerator {
    pub fn new(reply: &str) -> Self {
        Self {
            mode: Mode::Reply(reply.to_string()),
            delay: Duration::ZERO,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Every call fails, as if the backend were unreachable
    pub fn failing() -> Self {
        Self {
            mode: Mode::Fail,
            ..Self::new("")
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Prompts received so far, in call order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(prompt.to_string());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match &self.mode {
            Mode::Reply(text) => Ok(text.clone()),
            Mode::Fail => anyhow::bail!("mock generator offline"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_reply_and_prompt_log() {
        let mock = MockGenerator::new("meow");
        assert_eq!(mock.generate("a").await.unwrap(), "meow");
        assert_eq!(mock.generate("b").await.unwrap(), "meow");
        assert_eq!(mock.prompts(), vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn test_mock_failing() {
        let mock = MockGenerator::failing();
        assert!(mock.generate("a").await.is_err());
        assert_eq!(mock.prompts().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mock_delay() {
        let mock = MockGenerator::new("slow").with_delay(Duration::from_secs(5));
        let start = tokio::time::Instant::now();
        mock.generate("a").await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(5));
    }
}
