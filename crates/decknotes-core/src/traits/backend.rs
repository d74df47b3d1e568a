//! Generative backend trait and related types.

use std::fmt;

use async_trait::async_trait;
use decknotes_extractors::PageImage;
use serde::{Deserialize, Serialize};

use crate::error::{NotesError, NotesResult};
use crate::types::{ChatRole, ChatTurn};

/// One part of a multi-part message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    /// Plain text.
    Text(String),
    /// Inline image bytes.
    Image { mime_type: String, data: Vec<u8> },
}

impl Part {
    /// Create a text part.
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text(text.into())
    }

    /// Create an image part.
    pub fn image(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Part::Image {
            mime_type: mime_type.into(),
            data,
        }
    }

    /// Text content, if this is a text part.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text(text) => Some(text),
            Part::Image { .. } => None,
        }
    }

    /// Whether this is an image part.
    pub fn is_image(&self) -> bool {
        matches!(self, Part::Image { .. })
    }
}

impl From<&PageImage> for Part {
    fn from(page: &PageImage) -> Self {
        Part::image(page.mime_type.clone(), page.data.clone())
    }
}

/// A message as sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendMessage {
    pub role: ChatRole,
    pub parts: Vec<Part>,
}

impl BackendMessage {
    /// Create a user message.
    pub fn user(parts: Vec<Part>) -> Self {
        Self {
            role: ChatRole::User,
            parts,
        }
    }

    /// Create a model message with a single text part.
    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Model,
            parts: vec![Part::text(text)],
        }
    }
}

impl From<&ChatTurn> for BackendMessage {
    fn from(turn: &ChatTurn) -> Self {
        Self {
            role: turn.role,
            parts: vec![Part::text(turn.content.clone())],
        }
    }
}

/// Conversation state held by the caller between sends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationHandle {
    messages: Vec<BackendMessage>,
}

impl ConversationHandle {
    /// Start from prior turns.
    pub fn from_turns(history: &[ChatTurn]) -> Self {
        Self {
            messages: history.iter().map(BackendMessage::from).collect(),
        }
    }

    /// Messages exchanged so far.
    pub fn messages(&self) -> &[BackendMessage] {
        &self.messages
    }

    /// Number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check if no messages have been exchanged.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Messages for a request that sends `parts` next.
    pub fn request_with(&self, parts: Vec<Part>) -> Vec<BackendMessage> {
        let mut messages = self.messages.clone();
        messages.push(BackendMessage::user(parts));
        messages
    }

    fn commit(&mut self, parts: Vec<Part>, reply: &str) {
        self.messages.push(BackendMessage::user(parts));
        self.messages.push(BackendMessage::model(reply));
    }
}

/// Core generative backend trait - all providers implement this.
///
/// Providers only implement [`complete`](Self::complete): a stateless call
/// over the full message list. Conversation bookkeeping lives in the
/// provided methods.
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    /// Produce the model's reply to `messages`, whose last entry is the user
    /// message being answered.
    async fn complete(&self, messages: &[BackendMessage]) -> NotesResult<String>;

    /// Get the model name.
    fn model_name(&self) -> &str;

    /// Check if this backend accepts image parts.
    fn supports_vision(&self) -> bool {
        true
    }

    /// Start a conversation from prior turns.
    fn start_conversation(&self, history: &[ChatTurn]) -> ConversationHandle {
        ConversationHandle::from_turns(history)
    }

    /// Send one message and return the reply text.
    ///
    /// The message and reply are appended to the conversation only when the
    /// call succeeds; a failed send leaves the handle unchanged.
    async fn send(
        &self,
        conversation: &mut ConversationHandle,
        parts: Vec<Part>,
    ) -> NotesResult<String> {
        if parts.is_empty() {
            return Err(NotesError::validation("Cannot send an empty message"));
        }
        let messages = conversation.request_with(parts.clone());
        let reply = self.complete(&messages).await?;
        conversation.commit(parts, &reply);
        Ok(reply)
    }

    /// One-shot request outside any conversation.
    async fn generate(&self, parts: Vec<Part>) -> NotesResult<String> {
        let mut conversation = ConversationHandle::default();
        self.send(&mut conversation, parts).await
    }
}

/// Generative backend provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendProvider {
    /// Google Generative Language API.
    #[default]
    Gemini,
}

/// Default model when none is configured.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Backend configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Provider type.
    pub provider: BackendProvider,
    /// Model name/identifier.
    pub model: String,
    /// API key (if not using environment variable).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Base URL for API.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Client timeout in seconds; none means no timeout.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Maximum tokens to generate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            provider: BackendProvider::Gemini,
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            base_url: None,
            timeout_secs: None,
            temperature: None,
            max_output_tokens: None,
        }
    }
}

impl BackendConfig {
    /// Whether an API key is present.
    pub fn has_api_key(&self) -> bool {
        self.api_key
            .as_deref()
            .map(|key| !key.trim().is_empty())
            .unwrap_or(false)
    }
}

impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoBackend;

    #[async_trait]
    impl GenerativeBackend for EchoBackend {
        async fn complete(&self, messages: &[BackendMessage]) -> NotesResult<String> {
            let last = messages
                .last()
                .and_then(|m| m.parts.first())
                .and_then(Part::as_text)
                .unwrap_or_default();
            if last == "fail" {
                return Err(NotesError::invalid_response("no"));
            }
            Ok(format!("echo {} ({} messages)", last, messages.len()))
        }

        fn model_name(&self) -> &str {
            "echo"
        }
    }

    #[tokio::test]
    async fn test_send_appends_on_success() {
        let backend = EchoBackend;
        let mut conversation =
            backend.start_conversation(&[ChatTurn::user("seed"), ChatTurn::model("ok")]);
        assert_eq!(conversation.len(), 2);

        let reply = backend
            .send(&mut conversation, vec![Part::text("hello")])
            .await
            .unwrap();
        assert_eq!(reply, "echo hello (3 messages)");
        assert_eq!(conversation.len(), 4);
        assert_eq!(conversation.messages()[3], BackendMessage::model(reply));
    }

    #[tokio::test]
    async fn test_failed_send_leaves_conversation() {
        let backend = EchoBackend;
        let mut conversation = backend.start_conversation(&[]);
        let result = backend.send(&mut conversation, vec![Part::text("fail")]).await;
        assert!(result.is_err());
        assert!(conversation.is_empty());
    }

    #[tokio::test]
    async fn test_empty_message_rejected() {
        let backend = EchoBackend;
        let result = backend.generate(Vec::new()).await;
        assert!(matches!(result, Err(NotesError::Validation { .. })));
    }

    #[test]
    fn test_config_debug_redacts_key() {
        let config = BackendConfig {
            api_key: Some("secret-key".to_string()),
            ..Default::default()
        };
        let debug = format!("{:?}", config);
        assert!(!debug.contains("secret-key"));
        assert!(config.has_api_key());
        assert_eq!(config.model, "gemini-2.0-flash");
    }
}
