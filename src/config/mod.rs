// src/config/mod.rs
// Resolved runtime settings: CLI flags > env vars (via clap) > config file > defaults

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub mod file;

pub use file::FileConfig;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_GENERATOR_URL: &str = "http://localhost:8080";
pub const DEFAULT_MODEL_NAME: &str = "rinna/japanese-gpt-neox-3.6b";
pub const DEFAULT_ADAPTER_PATH: &str = "lora-rinna-3.6b-optimized";

/// `</s>` in rinna's sentencepiece vocabulary
pub const DEFAULT_EOS_TOKEN_ID: u32 = 3;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;
const DEFAULT_MAX_CONCURRENT_GENERATIONS: usize = 1;
const DEFAULT_LOAD_ATTEMPTS: u32 = 30;
const DEFAULT_LOAD_BACKOFF_MS: u64 = 2000;

/// Hyperparameters the adapter was trained with, reported by `/model-info`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoraHyperparameters {
    pub r: u32,
    pub alpha: u32,
    pub dropout: f32,
    pub target_modules: Vec<String>,
}

impl Default for LoraHyperparameters {
    fn default() -> Self {
        Self {
            r: 8,
            alpha: 32,
            dropout: 0.1,
            target_modules: vec!["query_key_value".to_string()],
        }
    }
}

/// Static model metadata served at `/model-info`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelInfo {
    pub base_model: String,
    pub lora_model: String,
    pub parameters: String,
    pub lora_size: String,
    pub training_data: String,
    pub training_time: String,
    pub gpu_required: String,
    pub lora: LoraHyperparameters,
}

impl Default for ModelInfo {
    fn default() -> Self {
        Self {
            base_model: DEFAULT_MODEL_NAME.to_string(),
            lora_model: DEFAULT_ADAPTER_PATH.to_string(),
            parameters: "3.6B".to_string(),
            lora_size: "12.9MB".to_string(),
            training_data: "databricks-dolly-15k-ja".to_string(),
            training_time: "9分44秒".to_string(),
            gpu_required: "14GB+ VRAM".to_string(),
            lora: LoraHyperparameters::default(),
        }
    }
}

/// Values supplied on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub generator_url: Option<String>,
    pub model_name: Option<String>,
    pub adapter_path: Option<PathBuf>,
    pub eos_token_id: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub generator_url: String,
    pub model_name: String,
    pub adapter_path: PathBuf,
    pub eos_token_id: u32,
    pub request_timeout: Duration,
    pub max_concurrent_generations: usize,
    pub load_attempts: u32,
    pub load_backoff: Duration,
    pub model_info: ModelInfo,
}

impl Settings {
    /// Resolve settings against ~/.rinna-chat/config.toml
    pub fn load(overrides: Overrides) -> Self {
        Self::resolve(overrides, FileConfig::load())
    }

    pub fn resolve(overrides: Overrides, file: FileConfig) -> Self {
        let model_name = overrides
            .model_name
            .or(file.model.name)
            .unwrap_or_else(|| DEFAULT_MODEL_NAME.to_string());

        let adapter_path = overrides
            .adapter_path
            .or(file.model.adapter_path)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ADAPTER_PATH));

        // The identities always follow what is actually configured
        let mut model_info = file.model_info.unwrap_or_default();
        model_info.base_model = model_name.clone();
        model_info.lora_model = adapter_label(&adapter_path);

        Self {
            host: overrides
                .host
                .or(file.server.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: overrides.port.or(file.server.port).unwrap_or(DEFAULT_PORT),
            generator_url: overrides
                .generator_url
                .or(file.model.generator_url)
                .unwrap_or_else(|| DEFAULT_GENERATOR_URL.to_string()),
            model_name,
            adapter_path,
            eos_token_id: overrides
                .eos_token_id
                .or(file.model.eos_token_id)
                .unwrap_or(DEFAULT_EOS_TOKEN_ID),
            request_timeout: Duration::from_secs(
                file.model
                    .request_timeout_secs
                    .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            ),
            max_concurrent_generations: file
                .server
                .max_concurrent_generations
                .unwrap_or(DEFAULT_MAX_CONCURRENT_GENERATIONS)
                .max(1),
            load_attempts: file
                .model
                .load_attempts
                .unwrap_or(DEFAULT_LOAD_ATTEMPTS)
                .max(1),
            load_backoff: Duration::from_millis(
                file.model.load_backoff_ms.unwrap_or(DEFAULT_LOAD_BACKOFF_MS),
            ),
            model_info,
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Name an adapter directory the way it is reported and registered
pub fn adapter_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
