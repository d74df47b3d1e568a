//! Server state management.

use std::str::FromStr;
use std::sync::Arc;

use decknotes_core::{Assistant, NotesConfig, SessionStore, SharedSession};
use thiserror::Error;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

/// Default upload limit (50 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Invalid server environment.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("DECKNOTES_REQUIRE_AUTH is enabled but DECKNOTES_AUTH_TOKEN is not set")]
    MissingAuthToken,
}

/// Hosting settings read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub require_auth: bool,
    pub auth_token: Option<String>,
    pub max_upload_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            require_auth: false,
            auth_token: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl ServerSettings {
    /// Read settings from process environment variables.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut settings = Self::default();

        if let Some(host) = get("DECKNOTES_HOST") {
            settings.host = host;
        }
        if let Some(port) = get("DECKNOTES_PORT") {
            settings.port = parse("DECKNOTES_PORT", port)?;
        }
        if let Some(flag) = get("DECKNOTES_REQUIRE_AUTH") {
            settings.require_auth = !matches!(flag.to_lowercase().as_str(), "0" | "false" | "no");
        }
        settings.auth_token = get("DECKNOTES_AUTH_TOKEN");
        if let Some(limit) = get("DECKNOTES_MAX_UPLOAD_BYTES") {
            settings.max_upload_bytes = parse("DECKNOTES_MAX_UPLOAD_BYTES", limit)?;
        }
        if settings.require_auth && settings.auth_token.is_none() {
            return Err(SettingsError::MissingAuthToken);
        }
        Ok(settings)
    }

    /// `host:port` bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse<T: FromStr>(key: &'static str, value: String) -> Result<T, SettingsError> {
    value
        .trim()
        .parse()
        .map_err(|_| SettingsError::InvalidValue { key, value })
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub inner: Arc<AppStateInner>,
}

pub struct AppStateInner {
    pub assistant: Assistant,
    pub sessions: SessionStore,
    pub config: NotesConfig,
    pub settings: ServerSettings,
    /// Why the backend is unavailable; `None` when configured.
    pub unconfigured_reason: Option<String>,
}

impl AppState {
    /// Create state around a ready assistant.
    pub fn new(assistant: Assistant, config: NotesConfig, settings: ServerSettings) -> Self {
        Self::build(assistant, config, settings, None)
    }

    /// Create state whose backend-dependent routes answer `503 NOT_CONFIGURED`.
    pub fn unconfigured(
        assistant: Assistant,
        config: NotesConfig,
        settings: ServerSettings,
        reason: impl Into<String>,
    ) -> Self {
        Self::build(assistant, config, settings, Some(reason.into()))
    }

    fn build(
        assistant: Assistant,
        config: NotesConfig,
        settings: ServerSettings,
        unconfigured_reason: Option<String>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                assistant,
                sessions: SessionStore::from_config(&config.session),
                config,
                settings,
                unconfigured_reason,
            }),
        }
    }

    /// Check if a generative backend is configured.
    pub fn is_configured(&self) -> bool {
        self.inner.unconfigured_reason.is_none()
    }

    /// Assistant for any operation.
    pub fn assistant(&self) -> &Assistant {
        &self.inner.assistant
    }

    /// Assistant for operations that call the backend.
    pub fn backend_assistant(&self) -> ApiResult<&Assistant> {
        match &self.inner.unconfigured_reason {
            None => Ok(&self.inner.assistant),
            Some(reason) => Err(ApiError::not_configured(reason.clone())),
        }
    }

    /// Session registry.
    pub fn sessions(&self) -> &SessionStore {
        &self.inner.sessions
    }

    /// Look up a session by id.
    pub async fn session(&self, id: Uuid) -> ApiResult<SharedSession> {
        Ok(self.inner.sessions.get(id).await?)
    }

    /// Loaded notes configuration.
    pub fn config(&self) -> &NotesConfig {
        &self.inner.config
    }

    /// Hosting settings.
    pub fn settings(&self) -> &ServerSettings {
        &self.inner.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: std::collections::HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_settings_defaults() {
        let settings = ServerSettings::from_lookup(env(&[])).unwrap();
        assert_eq!(settings, ServerSettings::default());
        assert_eq!(settings.bind_address(), "0.0.0.0:8080");
    }

    #[test]
    fn test_settings_from_env() {
        let settings = ServerSettings::from_lookup(env(&[
            ("DECKNOTES_PORT", "9000"),
            ("DECKNOTES_REQUIRE_AUTH", "true"),
            ("DECKNOTES_AUTH_TOKEN", "s3cret"),
            ("DECKNOTES_MAX_UPLOAD_BYTES", "1024"),
        ]))
        .unwrap();
        assert_eq!(settings.port, 9000);
        assert!(settings.require_auth);
        assert_eq!(settings.auth_token.as_deref(), Some("s3cret"));
        assert_eq!(settings.max_upload_bytes, 1024);
    }

    #[test]
    fn test_settings_invalid_port() {
        let err = ServerSettings::from_lookup(env(&[("DECKNOTES_PORT", "http")])).unwrap_err();
        assert!(matches!(
            err,
            SettingsError::InvalidValue {
                key: "DECKNOTES_PORT",
                ..
            }
        ));
    }

    #[test]
    fn test_require_auth_without_token_is_rejected() {
        let err =
            ServerSettings::from_lookup(env(&[("DECKNOTES_REQUIRE_AUTH", "true")])).unwrap_err();
        assert!(matches!(err, SettingsError::MissingAuthToken));

        let settings = ServerSettings::from_lookup(env(&[("DECKNOTES_REQUIRE_AUTH", "false")]))
            .unwrap();
        assert!(!settings.require_auth);
    }
}
