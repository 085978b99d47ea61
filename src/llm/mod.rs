// src/llm/mod.rs
// Completion collaborator interface and the token-level types it returns

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod tgi;

pub use tgi::TgiClient;

/// A single token as reported by the generation server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub id: u32,
    pub text: String,
}

/// Full token sequence of one generation: the echoed prompt followed by the
/// generated continuation, in order.
#[derive(Debug, Clone, Default)]
pub struct RawCompletion {
    pub tokens: Vec<Token>,
    pub finish_reason: Option<String>,
}

/// Concatenate token texts back into a string
pub fn render_tokens(tokens: &[Token]) -> String {
    tokens.iter().map(|t| t.text.as_str()).collect()
}

/// Sampling parameters for a single generation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub max_new_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_new_tokens: 256,
            temperature: 0.7,
            top_p: 0.75,
            top_k: 40,
        }
    }
}

/// What the generation server reports about the model it is serving
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDescriptor {
    pub model_id: String,
}

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("generation server returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("invalid generation response: {0}")]
    InvalidResponse(String),
}

/// The external text-generation service that owns the model weights,
/// the tokenizer and the adapter.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Backend name for logging
    fn name(&self) -> &'static str;

    /// Readiness probe; succeeds once the model is loaded and serving
    async fn health(&self) -> Result<ModelDescriptor, GeneratorError>;

    /// Complete `prompt`, returning prompt and generated tokens together
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<RawCompletion, GeneratorError>;
}
