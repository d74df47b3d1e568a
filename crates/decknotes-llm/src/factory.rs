//! Factory for creating generative backends.

use std::sync::Arc;

use decknotes_core::error::NotesResult;
use decknotes_core::traits::{BackendConfig, BackendProvider, GenerativeBackend};
use tracing::info;

use crate::gemini::GeminiBackend;

/// Factory for creating generative backends.
pub struct BackendFactory;

impl BackendFactory {
    /// Create a backend from the given configuration.
    pub fn create(config: BackendConfig) -> NotesResult<Arc<dyn GenerativeBackend>> {
        match config.provider {
            BackendProvider::Gemini => {
                let backend = GeminiBackend::new(config)?;
                info!(model = backend.model_name(), "Gemini backend ready");
                Ok(Arc::new(backend))
            }
        }
    }

    /// Create a Gemini backend with the default model.
    pub fn gemini(api_key: impl Into<String>) -> NotesResult<Arc<dyn GenerativeBackend>> {
        Self::create(BackendConfig {
            api_key: Some(api_key.into()),
            ..Default::default()
        })
    }

    /// Create a Gemini backend with a specific model.
    pub fn gemini_with_model(
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> NotesResult<Arc<dyn GenerativeBackend>> {
        Self::create(BackendConfig {
            api_key: Some(api_key.into()),
            model: model.into(),
            ..Default::default()
        })
    }
}
