// src/api/handlers.rs
// HTTP handlers for status, model metadata and chat

use axum::{Json, extract::State};
use tracing::{error, info, instrument};

use super::AppState;
use super::error::{ApiError, ApiResult};
use super::types::{ChatRequest, ChatResponse, ParametersUsed, ReplyModelInfo, StatusResponse};
use crate::config::ModelInfo;
use crate::services::ChatError;

/// Title reported by the health endpoint
pub const SERVICE_TITLE: &str = "Rinna-3.6B Chat API";

/// Health check; `status` mirrors the model lifecycle
pub async fn status_handler(State(state): State<AppState>) -> Json<StatusResponse> {
    let model_state = state.chat.state().await;
    Json(StatusResponse {
        message: SERVICE_TITLE.to_string(),
        status: model_state.label().to_string(),
        model: state.chat.model_name().to_string(),
        lora: state.chat.adapter_name().to_string(),
    })
}

/// Static model metadata
pub async fn model_info_handler(State(state): State<AppState>) -> Json<ModelInfo> {
    Json(state.model_info.as_ref().clone())
}

#[instrument(skip(state, request), fields(request_id = %uuid::Uuid::new_v4()))]
pub async fn chat_handler(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> ApiResult<Json<ChatResponse>> {
    request.validate()?;

    info!(
        message_len = request.message.len(),
        max_tokens = request.max_tokens,
        "Chat request"
    );

    let reply = state
        .chat
        .respond(
            &request.message,
            request.input.as_deref(),
            &request.generation_params(),
        )
        .await
        .inspect_err(|e| match e {
            ChatError::Unavailable { state } => {
                info!(state, "Rejecting chat request, model not ready");
            }
            ChatError::Generation(cause) => {
                error!(error = %cause, "Chat generation failed");
            }
        })
        .map_err(ApiError::from)?;

    Ok(Json(ChatResponse {
        status: reply.status().to_string(),
        response: reply.text,
        model_info: ReplyModelInfo {
            model: state.chat.model_name().to_string(),
            lora: state.chat.adapter_name().to_string(),
            parameters_used: ParametersUsed {
                max_tokens: request.max_tokens,
                temperature: request.temperature,
                top_p: request.top_p,
                top_k: request.top_k,
            },
        },
    }))
}
