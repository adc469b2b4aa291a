//! Google Gemini backend implementation.
//!
//! Uses the Generative Language `generateContent` REST endpoint. Failures are
//! signalled by the HTTP status with an `{"error": {...}}` body; a successful
//! response may still carry no candidates when the prompt was blocked.

use super::Respond;
use crate::error::{BackendError, Error};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

const BACKEND: &str = "gemini";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini backend for the Google AI Studio API.
pub struct GeminiBackend {
    pub model: String,
    api_key: String,
    api_url: String,
    client: Client,
}

impl std::fmt::Debug for GeminiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiBackend")
            .field("model", &self.model)
            .field("api_url", &self.api_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl GeminiBackend {
    /// Create a new Gemini backend.
    pub fn new(model: String, api_key: String, api_url: String) -> Result<Self, Error> {
        Ok(Self {
            model,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            client: super::http_client()?,
        })
    }

    fn model_url(&self) -> String {
        format!("{}/models/{}", self.api_url, self.model)
    }

    /// Check that the API key is accepted and the model exists.
    pub async fn health_check(&self) -> Result<(), BackendError> {
        let response = self
            .client
            .get(self.model_url())
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(|source| BackendError::Unavailable {
                backend: BACKEND,
                source,
            })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(api_error(response).await)
        }
    }
}

#[async_trait]
impl Respond for GeminiBackend {
    async fn respond(&self, prompt: &str) -> Result<String, BackendError> {
        let url = format!("{}:generateContent", self.model_url());
        let request = GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        debug!("POST {}", url);
        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
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

        let body: GenerateContentResponse =
            response
                .json()
                .await
                .map_err(|source| BackendError::MalformedResponse {
                    backend: BACKEND,
                    source,
                })?;

        extract_text(body)
    }

    fn name(&self) -> &'static str {
        BACKEND
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Turn a non-success response into an API error, keeping the service's message.
async fn api_error(response: reqwest::Response) -> BackendError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<GeminiError>(&body) {
        Ok(e) => e.error.message,
        Err(_) if body.trim().is_empty() => "Unknown error".to_string(),
        Err(_) => body,
    };
    BackendError::Api {
        backend: BACKEND,
        status: status.as_u16(),
        message,
    }
}

/// Concatenate the text parts of the first candidate.
fn extract_text(response: GenerateContentResponse) -> Result<String, BackendError> {
    let block_reason = response
        .prompt_feedback
        .and_then(|f| f.block_reason)
        .map(|r| format!("prompt blocked: {}", r));

    let Some(candidate) = response.candidates.into_iter().next() else {
        return Err(BackendError::EmptyResponse {
            backend: BACKEND,
            reason: block_reason,
        });
    };

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        return Err(BackendError::EmptyResponse {
            backend: BACKEND,
            reason: candidate
                .finish_reason
                .map(|r| format!("finish reason: {}", r))
                .or(block_reason),
        });
    }

    Ok(text)
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    const GENERATE_PATH: &str = "/models/gemini-2.0-flash:generateContent";

    fn backend(url: &str) -> GeminiBackend {
        GeminiBackend::new(
            "gemini-2.0-flash".to_string(),
            "test-key".to_string(),
            url.to_string(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_respond_returns_first_candidate_text() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", GENERATE_PATH)
            .match_header("x-goog-api-key", "test-key")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "contents": [{"role": "user", "parts": [{"text": "make a Dockerfile"}]}]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"candidates": [
                    {"content": {"role": "model", "parts": [{"text": "FROM golang:1.22\n"}, {"text": "WORKDIR /app\n"}]}, "finishReason": "STOP"},
                    {"content": {"role": "model", "parts": [{"text": "ignored"}]}}
                ]}"#,
            )
            .create_async()
            .await;

        let text = backend(&server.url())
            .respond("make a Dockerfile")
            .await
            .unwrap();
        assert_eq!(text, "FROM golang:1.22\nWORKDIR /app\n");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_respond_without_candidates_is_empty_response() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", GENERATE_PATH)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#)
            .create_async()
            .await;

        let err = backend(&server.url()).respond("prompt").await.unwrap_err();
        match err {
            BackendError::EmptyResponse { backend, reason } => {
                assert_eq!(backend, "gemini");
                assert_eq!(reason.as_deref(), Some("prompt blocked: SAFETY"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_api_error_keeps_service_message() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", GENERATE_PATH)
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"error": {"code": 400, "message": "API key not valid. Please pass a valid API key.", "status": "INVALID_ARGUMENT"}}"#,
            )
            .create_async()
            .await;

        let err = backend(&server.url()).respond("prompt").await.unwrap_err();
        match err {
            BackendError::Api {
                status, message, ..
            } => {
                assert_eq!(status, 400);
                assert_eq!(message, "API key not valid. Please pass a valid API key.");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_health_check() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/models/gemini-2.0-flash")
            .match_header("x-goog-api-key", "test-key")
            .with_status(200)
            .with_body(r#"{"name": "models/gemini-2.0-flash"}"#)
            .create_async()
            .await;

        assert!(backend(&server.url()).health_check().await.is_ok());
    }

    #[test]
    fn test_extract_text_candidate_without_parts() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates": [{"content": {"role": "model"}, "finishReason": "MAX_TOKENS"}]}"#,
        )
        .unwrap();
        match extract_text(response) {
            Err(BackendError::EmptyResponse { reason, .. }) => {
                assert_eq!(reason.as_deref(), Some("finish reason: MAX_TOKENS"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let backend = backend("http://localhost");
        let debug = format!("{:?}", backend);
        assert!(!debug.contains("test-key"));
        assert!(debug.contains("[REDACTED]"));
    }
}
