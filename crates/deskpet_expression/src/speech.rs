//! Speech dispatch
//!
//! Accepted reactions are handed to a small pool of worker tasks that call the
//! text generator off the signal path and push the result to the speech
//! display. A failed, slow or empty generation falls back to a canned line of
//! the same theme, so every accepted request ends up on screen.

use deskpet_core::{SpeechConfig, SpeechDisplay, TextGenerator, Theme};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::Mutex as AsyncMutex;

#[derive(Clone)]
pub struct SpeechDispatcher {
    tx: mpsc::Sender<Theme>,
    display: Arc<dyn SpeechDisplay>,
    bubble_ms: u64,
}

impl SpeechDispatcher {
    /// Start `config.workers` workers sharing one bounded queue.
    /// Must be called from inside a Tokio runtime.
    pub fn spawn(
        generator: Arc<dyn TextGenerator>,
        display: Arc<dyn SpeechDisplay>,
        config: &SpeechConfig,
    ) -> Self {
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        let rx = Arc::new(AsyncMutex::new(rx));
        let timeout = config.generation_timeout();

        for worker in 0..config.workers.max(1) {
            let rx = Arc::clone(&rx);
            let generator = Arc::clone(&generator);
            let display = Arc::clone(&display);
            let bubble_ms = config.bubble_ms;

            tokio::spawn(async move {
                loop {
                    let next = rx.lock().await.recv().await;
                    let Some(theme) = next else { break };
                    let text = compose(generator.as_ref(), theme, timeout).await;
                    tracing::debug!(worker, theme = ?theme, %text, "speaking");
                    display.show(&text, bubble_ms);
                }
                tracing::debug!(worker, "speech worker stopped");
            });
        }

        Self {
            tx,
            display,
            bubble_ms: config.bubble_ms,
        }
    }

    /// Queue a reaction. Returns false if the queue is full or closed; the
    /// request is dropped in that case.
    pub fn dispatch(&self, theme: Theme) -> bool {
        match self.tx.try_send(theme) {
            Ok(()) => true,
            Err(TrySendError::Full(theme)) => {
                tracing::warn!(theme = ?theme, "speech queue full, dropping reaction");
                false
            }
            Err(TrySendError::Closed(theme)) => {
                tracing::warn!(theme = ?theme, "speech workers gone, dropping reaction");
                false
            }
        }
    }

    /// Show `text` right away, skipping generation.
    pub fn announce(&self, text: &str) {
        self.display.show(text, self.bubble_ms);
    }
}

async fn compose(generator: &dyn TextGenerator, theme: Theme, timeout: Duration) -> String {
    match tokio::time::timeout(timeout, generator.generate(theme.prompt())).await {
        Ok(Ok(text)) if !text.trim().is_empty() => text.trim().to_string(),
        Ok(Ok(_)) => {
            tracing::warn!(theme = ?theme, "generator returned nothing, using fallback line");
            theme.fallback().to_string()
        }
        Ok(Err(e)) => {
            tracing::warn!(theme = ?theme, error = %e, "generation failed, using fallback line");
            theme.fallback().to_string()
        }
        Err(_) => {
            tracing::warn!(theme = ?theme, ?timeout, "generation timed out, using fallback line");
            theme.fallback().to_string()
        }
    }
}
