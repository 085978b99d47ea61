// src/services/chat.rs
// Owns the shared model and runs encode -> generate -> decode per request

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{RwLock, Semaphore};
use tracing::{debug, info, warn};

use super::adapter::AdapterArtifact;
use super::lifecycle::ModelState;
use crate::config::Settings;
use crate::llm::{GenerationParams, GeneratorError, TextGenerator};
use crate::prompt::{self, ANSWER_LABEL, DecodeFailure};

#[derive(Debug, Error)]
pub enum ChatError {
    /// The model is not ready; nothing was sent to the generator
    #[error("model is not loaded (state: {state})")]
    Unavailable { state: &'static str },

    #[error("generation failed: {0}")]
    Generation(#[from] GeneratorError),
}

/// How a reply was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyOutcome {
    Answered,
    Fallback(DecodeFailure),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub text: String,
    pub outcome: ReplyOutcome,
}

impl ChatReply {
    fn from_decoded(decoded: Result<String, DecodeFailure>) -> Self {
        match decoded {
            Ok(text) => Self {
                text,
                outcome: ReplyOutcome::Answered,
            },
            Err(failure) => Self {
                text: failure.fallback_message().to_string(),
                outcome: ReplyOutcome::Fallback(failure),
            },
        }
    }

    /// `success` for a decoded answer, otherwise the failure kind
    pub fn status(&self) -> &'static str {
        match self.outcome {
            ReplyOutcome::Answered => "success",
            ReplyOutcome::Fallback(failure) => failure.status(),
        }
    }
}

pub struct ChatService {
    state: RwLock<ModelState>,
    model_name: String,
    adapter: Option<AdapterArtifact>,
    eos_token_id: u32,
    /// Bounds concurrent generations on the shared model
    generation_permits: Semaphore,
}

impl ChatService {
    pub fn new(
        model_name: impl Into<String>,
        adapter: Option<AdapterArtifact>,
        eos_token_id: u32,
        max_concurrent_generations: usize,
    ) -> Self {
        Self {
            state: RwLock::new(ModelState::Uninitialized),
            model_name: model_name.into(),
            adapter,
            eos_token_id,
            generation_permits: Semaphore::new(max_concurrent_generations.max(1)),
        }
    }

    pub fn from_settings(settings: &Settings, adapter: Option<AdapterArtifact>) -> Self {
        Self::new(
            settings.model_name.clone(),
            adapter,
            settings.eos_token_id,
            settings.max_concurrent_generations,
        )
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Adapter id, or `none` when serving the base model
    pub fn adapter_name(&self) -> &str {
        self.adapter.as_ref().map(|a| a.id.as_str()).unwrap_or("none")
    }

    pub async fn state(&self) -> ModelState {
        self.state.read().await.clone()
    }

    pub async fn begin_loading(&self) {
        *self.state.write().await = ModelState::Loading;
    }

    pub async fn mark_ready(&self, generator: Arc<dyn TextGenerator>) {
        info!(
            model = %self.model_name,
            adapter = %self.adapter_name(),
            backend = generator.name(),
            "Model ready"
        );
        *self.state.write().await = ModelState::Ready(generator);
    }

    pub async fn mark_failed(&self, reason: impl Into<String>) {
        *self.state.write().await = ModelState::Failed(reason.into());
    }

    /// Answer one instruction.
    ///
    /// Decode failures are not errors: they come back as a reply carrying the
    /// fallback message. Only an unready model or a generator failure is.
    pub async fn respond(
        &self,
        instruction: &str,
        context: Option<&str>,
        params: &GenerationParams,
    ) -> Result<ChatReply, ChatError> {
        let state = self.state().await;
        let generator = state.generator().ok_or(ChatError::Unavailable {
            state: state.label(),
        })?;

        let _permit = self
            .generation_permits
            .acquire()
            .await
            .map_err(|_| ChatError::Unavailable { state: "closed" })?;

        let encoded = prompt::encode(instruction, context);
        debug!(prompt = %encoded, ?params, "Encoded prompt");

        let completion = generator.generate(&encoded, params).await?;
        let reply = ChatReply::from_decoded(prompt::decode(
            &completion.tokens,
            self.eos_token_id,
            ANSWER_LABEL,
        ));

        if let ReplyOutcome::Fallback(failure) = reply.outcome {
            warn!(
                failure = %failure,
                finish_reason = ?completion.finish_reason,
                tokens = completion.tokens.len(),
                "Completion could not be decoded, returning fallback"
            );
        }

        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{ModelDescriptor, RawCompletion, Token};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const EOS: u32 = 3;

    /// Echoes the prompt back followed by a fixed continuation
    struct EchoGenerator {
        continuation: &'static str,
        terminate: bool,
        calls: AtomicUsize,
    }

    impl EchoGenerator {
        fn new(continuation: &'static str, terminate: bool) -> Self {
            Self { continuation, terminate, calls: AtomicUsize::new(0) }
        }
    }

    #[async_trait]
    impl TextGenerator for EchoGenerator {
        fn name(&self) -> &'static str {
            "echo"
        }

        async fn health(&self) -> Result<ModelDescriptor, GeneratorError> {
            Ok(ModelDescriptor { model_id: "echo".into() })
        }

        async fn generate(
            &self,
            prompt: &str,
            _params: &GenerationParams,
        ) -> Result<RawCompletion, GeneratorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut tokens = vec![
                Token { id: 10, text: prompt.to_string() },
                Token { id: 11, text: self.continuation.to_string() },
            ];
            if self.terminate {
                tokens.push(Token { id: EOS, text: "</s>".into() });
            }
            Ok(RawCompletion { tokens, finish_reason: None })
        }
    }

    struct BrokenGenerator;

    #[async_trait]
    impl TextGenerator for BrokenGenerator {
        fn name(&self) -> &'static str {
            "broken"
        }

        async fn health(&self) -> Result<ModelDescriptor, GeneratorError> {
            Err(GeneratorError::InvalidResponse("down".into()))
        }

        async fn generate(
            &self,
            _prompt: &str,
            _params: &GenerationParams,
        ) -> Result<RawCompletion, GeneratorError> {
            Err(GeneratorError::Api { status: 500, body: "CUDA out of memory".into() })
        }
    }

    fn service() -> ChatService {
        ChatService::new("rinna/japanese-gpt-neox-3.6b", None, EOS, 1)
    }

    #[tokio::test]
    async fn test_unavailable_before_ready() {
        let service = service();
        let result = service.respond("こんにちは", None, &GenerationParams::default()).await;
        assert!(matches!(result, Err(ChatError::Unavailable { state: "uninitialized" })));

        service.begin_loading().await;
        let result = service.respond("こんにちは", None, &GenerationParams::default()).await;
        assert!(matches!(result, Err(ChatError::Unavailable { state: "loading" })));

        service.mark_failed("no server").await;
        let result = service.respond("こんにちは", None, &GenerationParams::default()).await;
        assert!(matches!(result, Err(ChatError::Unavailable { state: "failed" })));
    }

    #[tokio::test]
    async fn test_greeting_answered() {
        let service = service();
        let generator = Arc::new(EchoGenerator::new("こんにちは<NL>", true));
        service.mark_ready(generator.clone()).await;

        let reply = service
            .respond("日本語で挨拶してください", None, &GenerationParams::default())
            .await
            .unwrap();

        assert_eq!(reply.text, "こんにちは");
        assert_eq!(reply.outcome, ReplyOutcome::Answered);
        assert_eq!(reply.status(), "success");
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_incomplete_generation_falls_back() {
        let service = service();
        service.mark_ready(Arc::new(EchoGenerator::new("終わらない", false))).await;

        let reply = service
            .respond("長い話をして", None, &GenerationParams::default())
            .await
            .unwrap();

        assert_eq!(reply.outcome, ReplyOutcome::Fallback(DecodeFailure::Incomplete));
        assert_eq!(reply.text, DecodeFailure::Incomplete.fallback_message());
        assert_eq!(reply.status(), "incomplete");
    }

    #[tokio::test]
    async fn test_generator_error_is_surfaced() {
        let service = service();
        service.mark_ready(Arc::new(BrokenGenerator)).await;

        let result = service.respond("質問", None, &GenerationParams::default()).await;
        let err = result.unwrap_err();
        assert!(matches!(err, ChatError::Generation(_)));
        assert!(err.to_string().contains("CUDA out of memory"));
    }

    #[tokio::test]
    async fn test_adapter_name() {
        assert_eq!(service().adapter_name(), "none");

        let adapter = AdapterArtifact {
            path: "lora-rinna-3.6b-optimized".into(),
            id: "lora-rinna-3.6b-optimized".into(),
        };
        let service = ChatService::new("m", Some(adapter), EOS, 1);
        assert_eq!(service.adapter_name(), "lora-rinna-3.6b-optimized");
    }
}
