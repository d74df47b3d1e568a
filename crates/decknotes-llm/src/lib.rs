//! decknotes-llm - Generative backend implementations for decknotes.
//!
//! # Supported Providers
//!
//! - **Gemini** - Google Generative Language API (`gemini-2.0-flash` by default)
//!
//! # Example
//!
//! ```ignore
//! use decknotes_llm::BackendFactory;
//!
//! let backend = BackendFactory::gemini(std::env::var("API_KEY")?)?;
//!
//! // Or with a specific model
//! let backend = BackendFactory::gemini_with_model(api_key, "gemini-1.5-pro")?;
//! ```

mod factory;
mod gemini;

pub use factory::BackendFactory;
pub use gemini::GeminiBackend;

// Re-export core types for convenience
pub use decknotes_core::traits::{
    BackendConfig, BackendMessage, BackendProvider, GenerativeBackend, Part,
};
