// src/api/error.rs
// HTTP error taxonomy for the chat API and its JSON body

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::services::ChatError;

/// Every failure the API reports. The rendered message goes out as `detail`,
/// which is what the web frontend shows.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request parsed but carried values the generator cannot use
    #[error("{0}")]
    BadRequest(String),

    /// The model has not finished loading (or failed to)
    #[error("モデルが読み込まれていません")]
    ModelNotLoaded,

    /// The generation server failed mid-request
    #[error("応答生成エラー: {0}")]
    Generation(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::ModelNotLoaded => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Generation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::ModelNotLoaded => "MODEL_NOT_LOADED",
            ApiError::Generation(_) => "GENERATION_FAILED",
        }
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::Unavailable { .. } => ApiError::ModelNotLoaded,
            ChatError::Generation(cause) => ApiError::Generation(cause.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = json!({
            "error": true,
            "detail": self.to_string(),
            "error_code": self.error_code(),
            "status": status.as_u16(),
        });

        (status, Json(body)).into_response()
    }
}

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Rejection for a request field outside its accepted range
pub fn validation_error(field: &str, reason: &str) -> ApiError {
    ApiError::BadRequest(format!("{field}: {reason}"))
}
