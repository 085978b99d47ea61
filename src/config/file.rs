// src/config/file.rs
// File-based configuration from ~/.rinna-chat/config.toml

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::ModelInfo;

/// Top-level config structure. Every value is optional; anything missing
/// falls back to the built-in defaults in [`super::Settings`].
#[derive(Debug, Deserialize, Default)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub model: ModelSection,
    pub model_info: Option<ModelInfo>,
}

/// `[server]` section
#[derive(Debug, Deserialize, Default)]
pub struct ServerSection {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub max_concurrent_generations: Option<usize>,
}

/// `[model]` section
#[derive(Debug, Deserialize, Default)]
pub struct ModelSection {
    pub name: Option<String>,
    pub generator_url: Option<String>,
    pub adapter_path: Option<PathBuf>,
    pub eos_token_id: Option<u32>,
    pub request_timeout_secs: Option<u64>,
    pub load_attempts: Option<u32>,
    pub load_backoff_ms: Option<u64>,
}

impl FileConfig {
    /// Load config from ~/.rinna-chat/config.toml
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load config from an explicit path
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    debug!(path = %path.display(), "Loaded config from file");
                    config
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to parse config file");
                    Self::default()
                }
            },
            Err(_) => {
                debug!(path = %path.display(), "Config file not found, using defaults");
                Self::default()
            }
        }
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".rinna-chat")
            .join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_config() {
        let toml = r#"
[server]
port = 9000

[model]
generator_url = "http://gpu-box:8080"
adapter_path = "adapters/lora-rinna"
eos_token_id = 2

[model_info]
training_time = "12分"
"#;
        let config: FileConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, Some(9000));
        assert_eq!(config.server.host, None);
        assert_eq!(config.model.generator_url.as_deref(), Some("http://gpu-box:8080"));
        assert_eq!(config.model.adapter_path, Some(PathBuf::from("adapters/lora-rinna")));
        assert_eq!(config.model.eos_token_id, Some(2));

        let info = config.model_info.unwrap();
        assert_eq!(info.training_time, "12分");
        // Unspecified fields keep their defaults
        assert_eq!(info.parameters, "3.6B");
    }

    #[test]
    fn test_parse_empty_config() {
        let config: FileConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.port, None);
        assert!(config.model_info.is_none());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = FileConfig::load_from(&dir.path().join("absent.toml"));
        assert_eq!(config.model.name, None);
    }

    #[test]
    fn test_malformed_file_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server\nport = ").unwrap();
        let config = FileConfig::load_from(file.path());
        assert_eq!(config.server.port, None);
    }
}
