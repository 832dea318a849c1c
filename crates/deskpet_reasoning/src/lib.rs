pub mod chat;
pub mod providers;

pub use chat::{ChatResponder, CHAT_FALLBACK, CHAT_GREETING};
pub use providers::{create_generator, MockGenerator, OllamaCli, OllamaClient};
