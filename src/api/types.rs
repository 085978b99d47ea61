// src/api/types.rs
// Request and response bodies for the chat API

use serde::{Deserialize, Serialize};

use super::error::{ApiResult, validation_error};
use crate::llm::GenerationParams;

fn default_max_tokens() -> u32 {
    256
}

fn default_temperature() -> f32 {
    0.7
}

fn default_top_p() -> f32 {
    0.75
}

fn default_top_k() -> u32 {
    40
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatRequest {
    pub message: String,
    /// Optional auxiliary input for the `### 入力:` section
    #[serde(default)]
    pub input: Option<String>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default = "default_top_k")]
    pub top_k: u32,
}

impl ChatRequest {
    /// Reject sampling values the generation server would refuse anyway
    pub fn validate(&self) -> ApiResult<()> {
        if self.max_tokens == 0 {
            return Err(validation_error("max_tokens", "must be at least 1"));
        }
        if !(self.temperature > 0.0) {
            return Err(validation_error("temperature", "must be greater than 0"));
        }
        if !(self.top_p > 0.0 && self.top_p <= 1.0) {
            return Err(validation_error("top_p", "must be in (0, 1]"));
        }
        if self.top_k == 0 {
            return Err(validation_error("top_k", "must be at least 1"));
        }
        Ok(())
    }

    pub fn generation_params(&self) -> GenerationParams {
        GenerationParams {
            max_new_tokens: self.max_tokens,
            temperature: self.temperature,
            top_p: self.top_p,
            top_k: self.top_k,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParametersUsed {
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReplyModelInfo {
    pub model: String,
    pub lora: String,
    pub parameters_used: ParametersUsed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    /// `success`, or `incomplete` / `template_mismatch` for fallback replies
    pub status: String,
    pub model_info: ReplyModelInfo,
}

/// Health payload for `GET /`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub message: String,
    pub status: String,
    pub model: String,
    pub lora: String,
}
