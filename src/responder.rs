//! Turns a language name into Dockerfile text.

use crate::config::GenerationConfig;
use crate::error::{BackendError, Error};
use crate::llm::Respond;
use crate::prompt;
use tracing::{debug, error};

/// Formats the prompt for a language and asks a backend for the Dockerfile.
pub struct PromptResponder<B> {
    backend: B,
    template: String,
}

impl<B: Respond> PromptResponder<B> {
    pub fn new(backend: B, config: &GenerationConfig) -> Self {
        Self {
            backend,
            template: config.template.clone(),
        }
    }

    /// Generate a Dockerfile for `language`.
    ///
    /// Blank input is rejected before the backend is contacted. The reply is
    /// trimmed; a reply that is empty after trimming is an
    /// [`BackendError::EmptyResponse`].
    pub async fn generate(&self, language: &str) -> Result<String, Error> {
        let language = language.trim();
        if language.is_empty() {
            return Err(Error::EmptyLanguage);
        }

        let prompt = prompt::build_prompt(&self.template, language);
        debug!(
            "Requesting Dockerfile for {} from {} ({})",
            language,
            self.backend.name(),
            self.backend.model()
        );

        let reply = self.backend.respond(&prompt).await.map_err(|e| {
            error!("An error occurred during Dockerfile generation: {}", e);
            Error::from(e)
        })?;

        let content = reply.trim();
        if content.is_empty() {
            let e = BackendError::EmptyResponse {
                backend: self.backend.name(),
                reason: Some("reply contained only whitespace".to_string()),
            };
            error!("An error occurred during Dockerfile generation: {}", e);
            return Err(e.into());
        }

        Ok(content.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::BEST_PRACTICES;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Backend stub returning a canned reply and recording prompts.
    struct StubBackend {
        reply: fn() -> Result<String, BackendError>,
        prompts: Mutex<Vec<String>>,
    }

    impl StubBackend {
        fn new(reply: fn() -> Result<String, BackendError>) -> Self {
            Self {
                reply,
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Respond for StubBackend {
        async fn respond(&self, prompt: &str) -> Result<String, BackendError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            (self.reply)()
        }

        fn name(&self) -> &'static str {
            "stub"
        }

        fn model(&self) -> &str {
            "stub-model"
        }
    }

    fn responder(reply: fn() -> Result<String, BackendError>) -> PromptResponder<StubBackend> {
        PromptResponder::new(StubBackend::new(reply), &GenerationConfig::default())
    }

    #[tokio::test]
    async fn test_generate_trims_reply() {
        let responder = responder(|| Ok("FROM alpine\n".to_string()));
        assert_eq!(responder.generate("Go").await.unwrap(), "FROM alpine");
    }

    #[tokio::test]
    async fn test_generate_sends_single_formatted_prompt() {
        let responder = responder(|| Ok("FROM node:20-alpine".to_string()));
        responder.generate("  TypeScript ").await.unwrap();

        let calls = responder.backend.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].contains("Dockerfile for TypeScript with best practices"));
        for practice in BEST_PRACTICES {
            assert!(calls[0].contains(practice));
        }
    }

    #[tokio::test]
    async fn test_blank_language_rejected_before_backend_call() {
        let responder = responder(|| Ok("FROM alpine".to_string()));
        for language in ["", "   ", "\n\t"] {
            assert!(matches!(
                responder.generate(language).await,
                Err(Error::EmptyLanguage)
            ));
        }
        assert!(responder.backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_empty_candidates_is_backend_error() {
        let responder = responder(|| {
            Err(BackendError::EmptyResponse {
                backend: "stub",
                reason: None,
            })
        });
        assert!(matches!(
            responder.generate("Go").await,
            Err(Error::Backend(BackendError::EmptyResponse { .. }))
        ));
    }

    #[tokio::test]
    async fn test_whitespace_reply_is_backend_error() {
        let responder = responder(|| Ok(" \n\n ".to_string()));
        assert!(matches!(
            responder.generate("Go").await,
            Err(Error::Backend(BackendError::EmptyResponse { .. }))
        ));
    }

    #[tokio::test]
    async fn test_api_error_propagates_unchanged() {
        let responder = responder(|| {
            Err(BackendError::Api {
                backend: "stub",
                status: 429,
                message: "Resource has been exhausted".to_string(),
            })
        });
        match responder.generate("Go").await {
            Err(Error::Backend(BackendError::Api {
                status, message, ..
            })) => {
                assert_eq!(status, 429);
                assert_eq!(message, "Resource has been exhausted");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_custom_template_is_used() {
        let config = GenerationConfig {
            template: "Dockerfile please, for {language}".to_string(),
            ..Default::default()
        };
        let responder = PromptResponder::new(StubBackend::new(|| Ok("FROM scratch".into())), &config);
        responder.generate("Zig").await.unwrap();
        assert_eq!(responder.backend.calls(), vec!["Dockerfile please, for Zig"]);
    }
}
