//! Ollama backend implementation.
//!
//! Ollama is a local LLM server that provides inference without API costs.

use super::Respond;
use crate::error::{BackendError, Error};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

const BACKEND: &str = "ollama";

/// Ollama backend for local LLM inference.
#[derive(Debug)]
pub struct OllamaBackend {
    pub model: String,
    host: String,
    client: Client,
}

impl OllamaBackend {
    /// Create a new Ollama backend.
    pub fn new(model: String, host: String) -> Result<Self, Error> {
        Ok(Self {
            model,
            host: host.trim_end_matches('/').to_string(),
            client: super::http_client()?,
        })
    }

    /// Check if the daemon is reachable.
    pub async fn health_check(&self) -> Result<(), BackendError> {
        self.list_models().await.map(|_| ())
    }

    /// List locally available models.
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, BackendError> {
        let url = format!("{}/api/tags", self.host);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| BackendError::Unavailable {
                backend: BACKEND,
                source,
            })?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let tags: TagsResponse =
            response
                .json()
                .await
                .map_err(|source| BackendError::MalformedResponse {
                    backend: BACKEND,
                    source,
                })?;
        Ok(tags.models)
    }
}

#[async_trait]
impl Respond for OllamaBackend {
    async fn respond(&self, prompt: &str) -> Result<String, BackendError> {
        let url = format!("{}/api/chat", self.host);

        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            stream: false,
        };

        debug!("POST {} (model {})", url, self.model);
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|source| BackendError::Unavailable {
                backend: BACKEND,
                source,
            })?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let chat: ChatResponse =
            response
                .json()
                .await
                .map_err(|source| BackendError::MalformedResponse {
                    backend: BACKEND,
                    source,
                })?;

        match chat.message {
            Some(message) if !message.content.is_empty() => Ok(message.content),
            _ => Err(BackendError::EmptyResponse {
                backend: BACKEND,
                reason: chat.done_reason.map(|r| format!("done reason: {}", r)),
            }),
        }
    }

    fn name(&self) -> &'static str {
        BACKEND
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Turn a non-success response into an API error. Ollama reports `{"error": "..."}`.
async fn api_error(response: reqwest::Response) -> BackendError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<OllamaError>(&body) {
        Ok(e) => e.error,
        Err(_) if body.trim().is_empty() => "Unknown error".to_string(),
        Err(_) => body,
    };
    BackendError::Api {
        backend: BACKEND,
        status: status.as_u16(),
        message,
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<ChatReply>,
    done_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct OllamaError {
    error: String,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

/// A model installed on the Ollama daemon.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub modified_at: Option<String>,
}
