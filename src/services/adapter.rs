// src/services/adapter.rs
// Locates the externally trained LoRA adapter, falling back to the base model

use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::adapter_label;

/// A LoRA adapter directory produced by the training run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterArtifact {
    pub path: PathBuf,
    /// Name the generation server knows the adapter by
    pub id: String,
}

impl AdapterArtifact {
    /// `None` (with a warning) unless `path` is a directory; the base model
    /// is then served unadapted.
    pub fn resolve(path: &Path) -> Option<Self> {
        if !path.is_dir() {
            warn!(
                "LoRA adapter {} not found, serving the base model",
                path.display()
            );
            return None;
        }

        let artifact = Self {
            path: path.to_path_buf(),
            id: adapter_label(path),
        };
        info!(adapter = %artifact.id, path = %path.display(), "LoRA adapter found");
        Some(artifact)
    }
}
