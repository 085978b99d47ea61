// src/services/lifecycle.rs
// Model lifecycle: Uninitialized -> Loading -> Ready | Failed

use std::fmt;
use std::sync::Arc;

use crate::llm::TextGenerator;

/// Where the shared model currently is in its lifecycle
#[derive(Clone)]
pub enum ModelState {
    Uninitialized,
    Loading,
    Ready(Arc<dyn TextGenerator>),
    Failed(String),
}

impl ModelState {
    /// Status string reported by the health endpoint
    pub fn label(&self) -> &'static str {
        match self {
            ModelState::Uninitialized => "uninitialized",
            ModelState::Loading => "loading",
            ModelState::Ready(_) => "running",
            ModelState::Failed(_) => "failed",
        }
    }

    /// The generator, if the model is ready to serve
    pub fn generator(&self) -> Option<Arc<dyn TextGenerator>> {
        match self {
            ModelState::Ready(generator) => Some(generator.clone()),
            _ => None,
        }
    }
}

impl fmt::Debug for ModelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelState::Ready(generator) => write!(f, "Ready({})", generator.name()),
            ModelState::Failed(reason) => write!(f, "Failed({})", reason),
            other => f.write_str(other.label()),
        }
    }
}

impl fmt::Display for ModelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
