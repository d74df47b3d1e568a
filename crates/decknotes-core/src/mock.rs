//! Scripted generative backend for deterministic testing.
//!
//! ## Usage
//!
//! ```rust
//! use decknotes_core::mock::ScriptedBackend;
//! use decknotes_core::{GenerativeBackend, Part};
//!
//! # tokio_test::block_on(async {
//! let backend = ScriptedBackend::new().with_reply("# Notes");
//! let reply = backend.generate(vec![Part::text("summarize")]).await.unwrap();
//! assert_eq!(reply, "# Notes");
//! assert_eq!(backend.request_count(), 1);
//! # });
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::error::{GenerationErrorKind, NotesError, NotesResult};
use crate::traits::{BackendMessage, GenerativeBackend};

const DEFAULT_REPLY: &str = "Mock response";

/// One scripted outcome.
#[derive(Debug, Clone)]
enum Scripted {
    Reply(String),
    Error(GenerationErrorKind, String),
}

#[derive(Debug, Default)]
struct ScriptState {
    queue: VecDeque<Scripted>,
    requests: Vec<Vec<BackendMessage>>,
}

/// Backend that replays scripted replies and records every request.
///
/// Clones share the same script and request log, so a test can keep one
/// handle while the code under test owns another.
#[derive(Debug, Clone)]
pub struct ScriptedBackend {
    model: String,
    vision: bool,
    state: Arc<Mutex<ScriptState>>,
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedBackend {
    /// Create a vision-capable backend that answers unscripted requests
    /// with "Mock response".
    pub fn new() -> Self {
        Self {
            model: "scripted-model".to_string(),
            vision: true,
            state: Arc::new(Mutex::new(ScriptState::default())),
        }
    }

    /// Queue a successful reply.
    pub fn with_reply(self, reply: impl Into<String>) -> Self {
        self.state().queue.push_back(Scripted::Reply(reply.into()));
        self
    }

    /// Queue a failure.
    pub fn with_error(self, kind: GenerationErrorKind, message: impl Into<String>) -> Self {
        self.state()
            .queue
            .push_back(Scripted::Error(kind, message.into()));
        self
    }

    /// Report that image parts are not accepted.
    pub fn without_vision(mut self) -> Self {
        self.vision = false;
        self
    }

    /// Most recent request.
    pub fn last_request(&self) -> Option<Vec<BackendMessage>> {
        self.state().requests.last().cloned()
    }

    /// Number of requests received.
    pub fn request_count(&self) -> usize {
        self.state().requests.len()
    }

    fn state(&self) -> MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl GenerativeBackend for ScriptedBackend {
    async fn complete(&self, messages: &[BackendMessage]) -> NotesResult<String> {
        let next = {
            let mut state = self.state();
            state.requests.push(messages.to_vec());
            state.queue.pop_front()
        };

        match next {
            Some(Scripted::Reply(reply)) => Ok(reply),
            Some(Scripted::Error(kind, message)) => Err(NotesError::generation(kind, message)),
            None => Ok(DEFAULT_REPLY.to_string()),
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn supports_vision(&self) -> bool {
        self.vision
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::Part;

    #[tokio::test]
    async fn test_replays_in_order_then_default() {
        let backend = ScriptedBackend::new()
            .with_reply("first")
            .with_error(GenerationErrorKind::RateLimited, "slow down");

        assert_eq!(backend.generate(vec![Part::text("a")]).await.unwrap(), "first");
        let err = backend.generate(vec![Part::text("b")]).await.unwrap_err();
        assert_eq!(err.generation_kind(), Some(GenerationErrorKind::RateLimited));
        assert_eq!(backend.generate(vec![Part::text("c")]).await.unwrap(), "Mock response");
        assert_eq!(backend.request_count(), 3);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let backend = ScriptedBackend::new();
        let handle = backend.clone().with_reply("shared");

        assert_eq!(backend.generate(vec![Part::text("x")]).await.unwrap(), "shared");
        assert_eq!(handle.request_count(), 1);
        let request = handle.last_request().unwrap();
        assert_eq!(request[0].parts, vec![Part::text("x")]);
    }
}
