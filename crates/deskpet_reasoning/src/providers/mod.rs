pub mod mock;
pub mod ollama;
pub mod ollama_cli;

use anyhow::Result;
use deskpet_core::{LlmConfig, TextGenerator};
use std::sync::Arc;
use std::time::Duration;

pub use mock::MockGenerator;
pub use ollama::OllamaClient;
pub use ollama_cli::OllamaCli;

/// Build the text generator named by `config.provider`.
pub fn create_generator(config: &LlmConfig) -> Result<Arc<dyn TextGenerator>> {
    let generator: Arc<dyn TextGenerator> = match config.provider.as_str() {
        "ollama" => Arc::new(OllamaClient::new(
            &config.model,
            config.base_url.as_deref(),
            Duration::from_secs(config.timeout_secs),
        )?),
        "ollama_cli" => Arc::new(OllamaCli::new(&config.binary, &config.model)),
        "mock" => Arc::new(MockGenerator::new(&format!("(mock {}) meow 🐾", config.model))),
        other => anyhow::bail!(
            "Unknown LLM provider '{}' (expected ollama, ollama_cli or mock)",
            other
        ),
    };
    tracing::info!(provider = %config.provider, model = %config.model, "text generator ready");
    Ok(generator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_providers() {
        for provider in ["ollama", "ollama_cli", "mock"] {
            let config = LlmConfig {
                provider: provider.to_string(),
                ..LlmConfig::default()
            };
            assert!(create_generator(&config).is_ok(), "{provider} should build");
        }
    }

    #[test]
    fn test_unknown_provider() {
        let config = LlmConfig {
            provider: "carrier-pigeon".to_string(),
            ..LlmConfig::default()
        };
        let err = create_generator(&config).err().unwrap();
        assert!(err.to_string().contains("carrier-pigeon"));
    }
}
