//! Factory for creating server state from configuration.

use std::sync::Arc;

use async_trait::async_trait;
use decknotes_core::error::{NotesError, NotesResult};
use decknotes_core::traits::{BackendMessage, GenerativeBackend};
use decknotes_core::{Assistant, NotesConfig};
use decknotes_llm::BackendFactory;
use tracing::{error, info};

use crate::state::{AppState, ServerSettings};

/// Stand-in backend used when no API key is configured.
///
/// Upload and preview keep working; every backend call fails with a
/// configuration error.
#[derive(Debug, Clone)]
pub struct UnconfiguredBackend {
    reason: String,
}

impl UnconfiguredBackend {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl GenerativeBackend for UnconfiguredBackend {
    async fn complete(&self, _messages: &[BackendMessage]) -> NotesResult<String> {
        Err(NotesError::Configuration(self.reason.clone()))
    }

    fn model_name(&self) -> &str {
        "unconfigured"
    }
}

/// Create server state, falling back to an unconfigured backend.
///
/// A missing API key is logged and reported through `/health`; the server
/// still starts.
pub fn create_state(config: NotesConfig, settings: ServerSettings) -> AppState {
    let backend = config
        .validate()
        .and_then(|_| BackendFactory::create(config.backend.clone()));

    match backend {
        Ok(backend) => {
            info!(model = backend.model_name(), "Generative backend configured");
            let assistant = Assistant::from_config(&config, backend);
            AppState::new(assistant, config, settings)
        }
        Err(err) => {
            let reason = match err {
                NotesError::Configuration(message) => message,
                other => other.to_string(),
            };
            error!(reason = %reason, "Generative backend not configured");
            let assistant =
                Assistant::from_config(&config, Arc::new(UnconfiguredBackend::new(reason.clone())));
            AppState::unconfigured(assistant, config, settings, reason)
        }
    }
}
