// src/cli/serve.rs
// Serve command: wire settings, generator and chat service into the HTTP API

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use crate::api::{self, AppState};
use crate::config::Settings;
use crate::llm::TgiClient;
use crate::services::{AdapterArtifact, ChatService, LoadPolicy, spawn_model_loader};

/// Build the generator client and chat service shared by `serve` and `chat`
pub fn build_service(settings: &Settings) -> Result<(Arc<ChatService>, Arc<TgiClient>)> {
    let adapter = AdapterArtifact::resolve(&settings.adapter_path);
    let client = TgiClient::new(&settings.generator_url, settings.request_timeout)?
        .with_adapter(adapter.as_ref().map(|a| a.id.clone()));

    info!(
        generator = client.base_url(),
        adapter_id = client.adapter_id().unwrap_or("none"),
        "Generation client configured"
    );

    let service = ChatService::from_settings(settings, adapter);
    Ok((Arc::new(service), Arc::new(client)))
}

pub async fn run_serve(settings: Settings) -> Result<()> {
    info!(
        model = %settings.model_name,
        max_concurrent = settings.max_concurrent_generations,
        "Starting rinna-chat server"
    );

    let (service, client) = build_service(&settings)?;

    // Requests get 503 until the loader flips the service to ready
    spawn_model_loader(service.clone(), client, LoadPolicy::from_settings(&settings));

    let state = AppState::new(service, settings.model_info.clone());
    api::serve(&settings.bind_address(), state).await
}
