// src/api/mod.rs
// HTTP surface: router, shared state and server loop
//
// Endpoints:
// - GET  /            - Health check with model lifecycle state
// - GET  /model-info  - Static model metadata
// - POST /chat        - Instruction in, decoded answer out

pub mod error;
pub mod handlers;
pub mod types;

use anyhow::Result;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::ModelInfo;
use crate::services::ChatService;

pub use error::{ApiError, ApiResult};
pub use types::*;

/// API version reported on every response
pub const API_VERSION: &str = "1.0.0";

/// Max request body size for /chat (instructions are short)
const CHAT_MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<ChatService>,
    pub model_info: Arc<ModelInfo>,
}

impl AppState {
    pub fn new(chat: Arc<ChatService>, model_info: ModelInfo) -> Self {
        Self {
            chat,
            model_info: Arc::new(model_info),
        }
    }
}

/// Create the router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    let version_header = SetResponseHeaderLayer::if_not_present(
        header::HeaderName::from_static("x-api-version"),
        HeaderValue::from_static(API_VERSION),
    );

    Router::new()
        .route("/", get(handlers::status_handler))
        .route("/model-info", get(handlers::model_info_handler))
        .route(
            "/chat",
            post(handlers::chat_handler).layer(DefaultBodyLimit::max(CHAT_MAX_BODY_BYTES)),
        )
        .layer(version_header)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until Ctrl+C or SIGTERM
pub async fn serve(bind_address: &str, state: AppState) -> Result<()> {
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(bind_address).await?;

    info!("Chat API listening on http://{}", bind_address);
    info!("Endpoints: GET /, GET /model-info, POST /chat");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

/// Graceful shutdown signal handler for SIGTERM and Ctrl+C
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, draining connections...");
}
