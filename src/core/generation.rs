//! Text-generation manager with provider failover.
//!
//! Tries every eligible generation provider in registry order. Each call is
//! bounded by a timeout; a timeout counts as a provider failure like any
//! other error. The first success wins and re-arms that provider's breaker.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument, warn};

use crate::core::registry::{ProviderRegistry, GROUP_GENERATION};
use crate::error::{OrchestratorError, Result};
use crate::providers::{GenerationBackend, GenerationRequest};

/// Failover front for generation backends
pub struct GenerationManager {
    backends: HashMap<String, Arc<dyn GenerationBackend>>,
    registry: Arc<ProviderRegistry>,
    call_timeout: Duration,
}

impl GenerationManager {
    pub fn new(registry: Arc<ProviderRegistry>, call_timeout: Duration) -> Self {
        Self {
            backends: HashMap::new(),
            registry,
            call_timeout,
        }
    }

    /// Add a backend and register it with the breaker registry
    pub fn add_backend(
        &mut self,
        backend: Arc<dyn GenerationBackend>,
        priority: u32,
        max_failures: u32,
    ) {
        let name = backend.name().to_string();
        self.registry
            .register(&name, GROUP_GENERATION, priority, max_failures);
        self.backends.insert(name, backend);
    }

    pub fn backend_names(&self) -> Vec<String> {
        self.backends.keys().cloned().collect()
    }

    /// Generate text, failing over across eligible providers.
    ///
    /// Returns the generated text together with the provider that produced
    /// it. Errors only when every eligible provider fails.
    #[instrument(skip(self, request), fields(prompt_len = request.prompt.len()))]
    pub async fn generate(&self, request: &GenerationRequest) -> Result<(String, String)> {
        let candidates = self.registry.candidates(GROUP_GENERATION);
        if candidates.is_empty() {
            return Err(OrchestratorError::ProviderUnavailable {
                group: GROUP_GENERATION.to_string(),
            });
        }

        let mut last_error = None;
        for name in candidates {
            let Some(backend) = self.backends.get(&name) else {
                continue;
            };

            debug!(provider = %name, "trying generation provider");
            match tokio::time::timeout(self.call_timeout, backend.generate(request)).await {
                Ok(Ok(text)) => {
                    self.registry.record_success(&name);
                    return Ok((text, name));
                }
                Ok(Err(err)) => {
                    warn!(provider = %name, error = %err, "generation provider failed");
                    self.registry.record_failure(&name);
                    last_error = Some(OrchestratorError::ProviderCallFailed {
                        provider: name.clone(),
                        message: err.to_string(),
                    });
                }
                Err(_) => {
                    warn!(
                        provider = %name,
                        timeout_secs = self.call_timeout.as_secs(),
                        "generation provider timed out"
                    );
                    self.registry.record_failure(&name);
                    last_error = Some(OrchestratorError::ProviderCallFailed {
                        provider: name.clone(),
                        message: format!("timed out after {:?}", self.call_timeout),
                    });
                }
            }
        }

        Err(last_error.unwrap_or(OrchestratorError::ProviderUnavailable {
            group: GROUP_GENERATION.to_string(),
        }))
    }
}
