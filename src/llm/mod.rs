//! LLM backend implementations.
//!
//! Both the cloud backend (Gemini) and the local backend (Ollama) answer a
//! single user prompt with text through the [`Respond`] capability.

pub mod gemini;
pub mod ollama;

use crate::config::{self, BackendConfig};
use crate::error::{BackendError, Error};
use async_trait::async_trait;
use std::time::Duration;

/// Time allowed to establish a connection. Requests themselves are not bounded.
pub(crate) const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Turns a prompt into the first textual completion of a model.
#[async_trait]
pub trait Respond: Send + Sync {
    /// Submit `prompt` as a single user turn and return the raw reply text.
    async fn respond(&self, prompt: &str) -> Result<String, BackendError>;

    /// Backend name used in messages.
    fn name(&self) -> &'static str;

    /// Model identifier used for generation.
    fn model(&self) -> &str;
}

/// Enum-based backend for LLM providers.
pub enum Backend {
    Gemini(gemini::GeminiBackend),
    Ollama(ollama::OllamaBackend),
}

impl Backend {
    /// Check if the backend is available/reachable.
    pub async fn health_check(&self) -> Result<(), BackendError> {
        match self {
            Backend::Gemini(b) => b.health_check().await,
            Backend::Ollama(b) => b.health_check().await,
        }
    }
}

#[async_trait]
impl Respond for Backend {
    async fn respond(&self, prompt: &str) -> Result<String, BackendError> {
        match self {
            Backend::Gemini(b) => b.respond(prompt).await,
            Backend::Ollama(b) => b.respond(prompt).await,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Backend::Gemini(b) => b.name(),
            Backend::Ollama(b) => b.name(),
        }
    }

    fn model(&self) -> &str {
        match self {
            Backend::Gemini(b) => b.model(),
            Backend::Ollama(b) => b.model(),
        }
    }
}

/// Create a backend from configuration.
///
/// Fails with [`Error::Configuration`] when the Gemini API key is missing.
pub fn create_backend(config: &BackendConfig) -> Result<Backend, Error> {
    match config {
        BackendConfig::Ollama { model, host } => Ok(Backend::Ollama(ollama::OllamaBackend::new(
            model.clone(),
            host.clone(),
        )?)),
        BackendConfig::Gemini {
            model,
            api_key,
            api_url,
        } => {
            let api_key = config::resolve_api_key(
                api_key.as_deref(),
                std::env::var(config::GEMINI_API_KEY_ENV).ok(),
            )?;
            Ok(Backend::Gemini(gemini::GeminiBackend::new(
                model.clone(),
                api_key,
                api_url.clone(),
            )?))
        }
    }
}

/// Build the shared HTTP client.
pub(crate) fn http_client() -> Result<reqwest::Client, Error> {
    reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .map_err(|e| Error::Configuration(format!("Failed to create HTTP client: {}", e)))
}
