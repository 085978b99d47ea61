// src/services/loader.rs
// Background model loading: waits for the generation server, then flips the service to Ready

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::chat::ChatService;
use crate::config::Settings;
use crate::llm::{GeneratorError, ModelDescriptor, TextGenerator};

/// How long to keep probing a generation server that is still warming up
#[derive(Debug, Clone, Copy)]
pub struct LoadPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl LoadPolicy {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            max_attempts: settings.load_attempts.max(1),
            backoff: settings.load_backoff,
        }
    }
}

/// Probe the generator until it answers or the attempts run out.
///
/// The service is `Loading` for the duration and ends up `Ready` or `Failed`.
pub async fn load_model(
    service: &ChatService,
    generator: Arc<dyn TextGenerator>,
    policy: LoadPolicy,
) -> Result<ModelDescriptor, GeneratorError> {
    service.begin_loading().await;
    info!(
        model = %service.model_name(),
        adapter = %service.adapter_name(),
        backend = generator.name(),
        "Loading model"
    );

    let mut attempts = 0;
    loop {
        attempts += 1;
        match generator.health().await {
            Ok(descriptor) => {
                if descriptor.model_id != service.model_name() {
                    warn!(
                        expected = %service.model_name(),
                        served = %descriptor.model_id,
                        "Generation server is serving a different model"
                    );
                }
                service.mark_ready(generator).await;
                return Ok(descriptor);
            }
            Err(e) if attempts < policy.max_attempts => {
                warn!(
                    attempt = attempts,
                    max_attempts = policy.max_attempts,
                    error = %e,
                    "Generation server not ready, retrying in {:?}...",
                    policy.backoff
                );
                tokio::time::sleep(policy.backoff).await;
            }
            Err(e) => {
                error!(attempts, error = %e, "Model failed to load");
                service.mark_failed(e.to_string()).await;
                return Err(e);
            }
        }
    }
}

/// Run [`load_model`] as a background task so the server can accept
/// requests (and answer 503) while the model comes up.
pub fn spawn_model_loader(
    service: Arc<ChatService>,
    generator: Arc<dyn TextGenerator>,
    policy: LoadPolicy,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        // Failure is recorded in the service state and logged by load_model
        let _ = load_model(&service, generator, policy).await;
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{GenerationParams, RawCompletion};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Becomes healthy after a number of failed probes
    struct WarmingGenerator {
        failures_left: AtomicU32,
        model_id: &'static str,
    }

    #[async_trait]
    impl TextGenerator for WarmingGenerator {
        fn name(&self) -> &'static str {
            "warming"
        }

        async fn health(&self) -> Result<ModelDescriptor, GeneratorError> {
            let left = self.failures_left.load(Ordering::SeqCst);
            if left > 0 {
                self.failures_left.store(left - 1, Ordering::SeqCst);
                return Err(GeneratorError::Api { status: 503, body: "loading".into() });
            }
            Ok(ModelDescriptor { model_id: self.model_id.into() })
        }

        async fn generate(
            &self,
            _prompt: &str,
            _params: &GenerationParams,
        ) -> Result<RawCompletion, GeneratorError> {
            Ok(RawCompletion::default())
        }
    }

    fn policy(max_attempts: u32) -> LoadPolicy {
        LoadPolicy { max_attempts, backoff: Duration::from_millis(1) }
    }

    fn warming(failures: u32) -> Arc<WarmingGenerator> {
        Arc::new(WarmingGenerator {
            failures_left: AtomicU32::new(failures),
            model_id: "rinna/japanese-gpt-neox-3.6b",
        })
    }

    #[tokio::test]
    async fn test_ready_after_retries() {
        let service = ChatService::new("rinna/japanese-gpt-neox-3.6b", None, 3, 1);
        let descriptor = load_model(&service, warming(2), policy(5)).await.unwrap();

        assert_eq!(descriptor.model_id, "rinna/japanese-gpt-neox-3.6b");
        assert!(service.state().await.generator().is_some());
    }

    #[tokio::test]
    async fn test_failed_when_attempts_exhausted() {
        let service = ChatService::new("rinna/japanese-gpt-neox-3.6b", None, 3, 1);
        let result = load_model(&service, warming(10), policy(3)).await;

        assert!(result.is_err());
        assert_eq!(service.state().await.label(), "failed");
    }

    #[tokio::test]
    async fn test_spawned_loader_reaches_ready() {
        let service = Arc::new(ChatService::new("rinna/japanese-gpt-neox-3.6b", None, 3, 1));
        let handle = spawn_model_loader(service.clone(), warming(0), policy(1));
        handle.await.unwrap();

        assert_eq!(service.state().await.label(), "running");
    }
}
