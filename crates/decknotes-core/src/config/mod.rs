//! Configuration system for decknotes.
//!
//! Layering: built-in defaults, then a config file (TOML, JSON or YAML), then
//! environment variables.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use decknotes_extractors::RasterConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{NotesError, NotesResult};
use crate::retry::RetryConfig;
use crate::traits::{BackendConfig, BackendProvider};

/// Extraction settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Page rendering settings for the primary PDF path.
    pub raster: RasterConfig,
}

/// Notes generation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Most page images forwarded in one request.
    pub max_images: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self { max_images: 5 }
    }
}

/// Chat settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Forward only the seed plus this many recent turns; full history when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_max_turns: Option<usize>,
}

/// Session retention settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Seconds a session may sit untouched before it is evicted; 0 keeps
    /// sessions until they are deleted.
    pub idle_timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: 3600,
        }
    }
}

impl SessionConfig {
    /// Idle timeout, `None` when eviction is disabled.
    pub fn idle_timeout(&self) -> Option<Duration> {
        (self.idle_timeout_secs > 0).then(|| Duration::from_secs(self.idle_timeout_secs))
    }
}

/// Main decknotes configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NotesConfig {
    /// Generative backend.
    pub backend: BackendConfig,
    /// Document extraction.
    pub extraction: ExtractionConfig,
    /// Notes generation.
    pub generation: GenerationConfig,
    /// Follow-up chat.
    pub chat: ChatConfig,
    /// Backend call retries.
    pub retry: RetryConfig,
    /// Session retention.
    pub session: SessionConfig,
}

impl NotesConfig {
    /// Default config file location (`~/.decknotes/config.toml`).
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".decknotes"))
            .unwrap_or_else(|| PathBuf::from(".decknotes"))
            .join("config.toml")
    }

    /// Load configuration from a file (TOML, JSON, or YAML).
    pub fn from_file(path: impl AsRef<Path>) -> NotesResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let ext = path.as_ref().extension().and_then(|e| e.to_str());

        match ext {
            Some("toml") => {
                toml::from_str(&content).map_err(|e| NotesError::Configuration(e.to_string()))
            }
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| NotesError::Configuration(e.to_string())),
            Some("yaml" | "yml") => serde_yaml::from_str(&content)
                .map_err(|e| NotesError::Configuration(e.to_string())),
            _ => Err(NotesError::Configuration(
                "Unsupported config file format. Use .toml, .json, or .yaml".to_string(),
            )),
        }
    }

    /// Load configuration from environment variables over the defaults.
    pub fn from_env() -> NotesResult<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Full load: `DECKNOTES_CONFIG` or the default file if present, then
    /// the environment.
    pub fn load() -> NotesResult<Self> {
        let path = std::env::var("DECKNOTES_CONFIG")
            .ok()
            .map(PathBuf::from)
            .or_else(|| Some(Self::default_path()).filter(|p| p.exists()));

        let mut config = match path {
            Some(path) => {
                debug!(path = %path.display(), "Loading config file");
                Self::from_file(&path)?
            }
            None => Self::default(),
        };
        config.apply_env()?;
        Ok(config)
    }

    /// Overlay settings from process environment variables.
    pub fn apply_env(&mut self) -> NotesResult<()> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Overlay settings from an arbitrary variable lookup.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> NotesResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        // Backend
        if let Some(key) = get("API_KEY").or_else(|| get("GOOGLE_API_KEY")) {
            self.backend.api_key = Some(key);
        }
        if let Some(model) = get("MODEL_NAME").or_else(|| get("MODEL")) {
            self.backend.model = model;
        }
        if let Some(provider) = get("DECKNOTES_BACKEND") {
            self.backend.provider = match provider.to_lowercase().as_str() {
                "gemini" | "google" => BackendProvider::Gemini,
                other => {
                    return Err(NotesError::Configuration(format!(
                        "Unknown backend provider '{}'",
                        other
                    )))
                }
            };
        }
        if let Some(url) = get("DECKNOTES_BACKEND_URL") {
            self.backend.base_url = Some(url);
        }
        if let Some(secs) = get("DECKNOTES_BACKEND_TIMEOUT_SECS") {
            self.backend.timeout_secs = Some(parse_var("DECKNOTES_BACKEND_TIMEOUT_SECS", &secs)?);
        }

        // Extraction
        if let Some(binary) = get("DECKNOTES_PDFTOPPM") {
            self.extraction.raster.binary = PathBuf::from(binary);
        }
        if let Some(dpi) = get("DECKNOTES_RASTER_DPI") {
            self.extraction.raster.dpi = parse_var("DECKNOTES_RASTER_DPI", &dpi)?;
        }

        // Generation
        if let Some(max) = get("DECKNOTES_MAX_IMAGES") {
            self.generation.max_images = parse_var("DECKNOTES_MAX_IMAGES", &max)?;
        }

        // Chat
        if let Some(turns) = get("DECKNOTES_HISTORY_MAX_TURNS") {
            self.chat.history_max_turns = Some(parse_var("DECKNOTES_HISTORY_MAX_TURNS", &turns)?);
        }

        // Retry
        if let Some(retries) = get("DECKNOTES_MAX_RETRIES") {
            self.retry.max_retries = parse_var("DECKNOTES_MAX_RETRIES", &retries)?;
        }

        // Sessions
        if let Some(secs) = get("DECKNOTES_SESSION_IDLE_SECS") {
            self.session.idle_timeout_secs = parse_var("DECKNOTES_SESSION_IDLE_SECS", &secs)?;
        }

        Ok(())
    }

    /// Check that the configuration can serve backend requests.
    pub fn validate(&self) -> NotesResult<()> {
        if !self.backend.has_api_key() {
            return Err(NotesError::Configuration(
                "Google API Key not found. Please set the API_KEY (or GOOGLE_API_KEY) environment variable."
                    .to_string(),
            ));
        }
        if self.backend.model.trim().is_empty() {
            return Err(NotesError::Configuration(
                "Model name must not be empty".to_string(),
            ));
        }
        if self.generation.max_images == 0 {
            return Err(NotesError::Configuration(
                "generation.max_images must be at least 1".to_string(),
            ));
        }
        if self.extraction.raster.dpi == 0 {
            return Err(NotesError::Configuration(
                "extraction.raster.dpi must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Build configuration using builder pattern.
    pub fn builder() -> NotesConfigBuilder {
        NotesConfigBuilder::default()
    }
}

fn parse_var<T: FromStr>(key: &str, value: &str) -> NotesResult<T> {
    value.trim().parse().map_err(|_| {
        NotesError::Configuration(format!("Invalid value for {}: '{}'", key, value))
    })
}

/// Builder for NotesConfig.
#[derive(Default)]
pub struct NotesConfigBuilder {
    config: NotesConfig,
}

impl NotesConfigBuilder {
    /// Set backend configuration.
    pub fn backend(mut self, config: BackendConfig) -> Self {
        self.config.backend = config;
        self
    }

    /// Set the API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.backend.api_key = Some(key.into());
        self
    }

    /// Set the model name.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.backend.model = model.into();
        self
    }

    /// Set page rendering settings.
    pub fn raster(mut self, config: RasterConfig) -> Self {
        self.config.extraction.raster = config;
        self
    }

    /// Set the image cap.
    pub fn max_images(mut self, max_images: usize) -> Self {
        self.config.generation.max_images = max_images;
        self
    }

    /// Limit forwarded chat history.
    pub fn history_max_turns(mut self, max_turns: usize) -> Self {
        self.config.chat.history_max_turns = Some(max_turns);
        self
    }

    /// Set retry configuration.
    pub fn retry(mut self, config: RetryConfig) -> Self {
        self.config.retry = config;
        self
    }

    /// Set the session idle timeout in seconds (0 disables eviction).
    pub fn session_idle_timeout_secs(mut self, secs: u64) -> Self {
        self.config.session.idle_timeout_secs = secs;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> NotesConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = NotesConfig::default();
        assert_eq!(config.backend.model, "gemini-2.0-flash");
        assert_eq!(config.generation.max_images, 5);
        assert_eq!(config.extraction.raster.dpi, 200);
        assert_eq!(config.retry.max_retries, 0);
        assert!(config.chat.history_max_turns.is_none());
        assert_eq!(config.session.idle_timeout(), Some(Duration::from_secs(3600)));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overlay() {
        let mut config = NotesConfig::default();
        config
            .apply_env_with(env(&[
                ("GOOGLE_API_KEY", "g-key"),
                ("MODEL", "gemini-1.5-pro"),
                ("DECKNOTES_MAX_IMAGES", "3"),
                ("DECKNOTES_HISTORY_MAX_TURNS", "6"),
                ("DECKNOTES_PDFTOPPM", "/opt/poppler/bin/pdftoppm"),
                ("DECKNOTES_MAX_RETRIES", "2"),
                ("DECKNOTES_SESSION_IDLE_SECS", "0"),
            ]))
            .unwrap();

        assert_eq!(config.backend.api_key.as_deref(), Some("g-key"));
        assert_eq!(config.backend.model, "gemini-1.5-pro");
        assert_eq!(config.generation.max_images, 3);
        assert_eq!(config.chat.history_max_turns, Some(6));
        assert_eq!(
            config.extraction.raster.binary,
            PathBuf::from("/opt/poppler/bin/pdftoppm")
        );
        assert_eq!(config.retry.max_retries, 2);
        assert!(config.session.idle_timeout().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_primary_names_win_over_aliases() {
        let mut config = NotesConfig::default();
        config
            .apply_env_with(env(&[
                ("API_KEY", "primary"),
                ("GOOGLE_API_KEY", "alias"),
                ("MODEL_NAME", "model-a"),
                ("MODEL", "model-b"),
            ]))
            .unwrap();
        assert_eq!(config.backend.api_key.as_deref(), Some("primary"));
        assert_eq!(config.backend.model, "model-a");
    }

    #[test]
    fn test_invalid_number_is_configuration_error() {
        let mut config = NotesConfig::default();
        let result = config.apply_env_with(env(&[("DECKNOTES_RASTER_DPI", "high")]));
        assert!(matches!(result, Err(NotesError::Configuration(_))));
    }

    #[test]
    fn test_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[backend]
model = "gemini-1.5-flash"
api_key = "file-key"

[extraction.raster]
dpi = 150

[chat]
history_max_turns = 4
"#,
        )
        .unwrap();

        let config = NotesConfig::from_file(&path).unwrap();
        assert_eq!(config.backend.model, "gemini-1.5-flash");
        assert_eq!(config.extraction.raster.dpi, 150);
        assert_eq!(config.extraction.raster.binary, PathBuf::from("pdftoppm"));
        assert_eq!(config.chat.history_max_turns, Some(4));
        assert_eq!(config.generation.max_images, 5);
    }

    #[test]
    fn test_from_yaml_and_json_files() {
        let dir = tempfile::tempdir().unwrap();

        let yaml = dir.path().join("config.yaml");
        std::fs::write(&yaml, "generation:\n  max_images: 2\n").unwrap();
        assert_eq!(NotesConfig::from_file(&yaml).unwrap().generation.max_images, 2);

        let json = dir.path().join("config.json");
        std::fs::write(&json, r#"{"retry": {"max_retries": 4}}"#).unwrap();
        assert_eq!(NotesConfig::from_file(&json).unwrap().retry.max_retries, 4);
    }

    #[test]
    fn test_unsupported_file_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ini");
        std::fs::write(&path, "x=1").unwrap();
        assert!(matches!(
            NotesConfig::from_file(&path),
            Err(NotesError::Configuration(_))
        ));
    }

    #[test]
    fn test_builder() {
        let config = NotesConfig::builder()
            .api_key("k")
            .model("m")
            .max_images(7)
            .history_max_turns(10)
            .build();
        assert_eq!(config.backend.model, "m");
        assert_eq!(config.generation.max_images, 7);
        assert_eq!(config.chat.history_max_turns, Some(10));
        assert!(config.validate().is_ok());
    }
}
