// src/services/mod.rs
// Chat service, model lifecycle and adapter resolution

pub mod adapter;
pub mod chat;
pub mod lifecycle;
pub mod loader;

pub use adapter::AdapterArtifact;
pub use chat::{ChatError, ChatReply, ChatService, ReplyOutcome};
pub use lifecycle::ModelState;
pub use loader::{LoadPolicy, load_model, spawn_model_loader};
