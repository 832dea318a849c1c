//! Ollama HTTP provider
//!
//! Ollama exposes an OpenAI-compatible API at localhost:11434/v1; one short,
//! non-streaming chat completion per speech line.

use anyhow::{Context, Result};
use async_trait::async_trait;
use deskpet_core::TextGenerator;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434/v1";

#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(model: &str, base_url: Option<&str>, timeout: Duration) -> Result<Self> {
        let base_url = base_url
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .context("Failed to build HTTP client")?,
            base_url,
            model: model.to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

fn build_payload(model: &str, prompt: &str) -> Value {
    json!({
        "model": model,
        "messages": [{ "role": "user", "content": prompt }],
        "stream": false,
    })
}

/// Extract the reply text from an OpenAI-compatible completion.
fn parse_reply(resp_json: &Value) -> Result<String> {
    let content = resp_json["choices"][0]["message"]["content"]
        .as_str()
        .context("Ollama response has no message content")?;
    Ok(content.trim().to_string())
}

#[async_trait]
impl TextGenerator for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&build_payload(&self.model, prompt))
            .send()
            .await
            .context("Failed to send request to Ollama")?;

        if !response.status().is_success() {
            let status = response.status();
            let err_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Ollama error {}: {}", status, err_text);
        }

        let resp_json: Value = response.json().await?;
        parse_reply(&resp_json)
    }
}
