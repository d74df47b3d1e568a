//! Follow-up chat over generated notes.
//!
//! Histories are values: [`ChatSessionManager::ask`] never touches the
//! history it is given and returns a new one on success, so a failed call
//! leaves the caller's state exactly as it was.

mod policy;

pub use policy::{FullHistory, HistoryPolicy, RecentTurns};

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::ChatConfig;
use crate::error::{NotesError, NotesResult};
use crate::retry::RetryPolicy;
use crate::traits::{GenerativeBackend, Part};
use crate::types::{ChatHistory, NotesDocument};

/// Runs question/answer turns against the backend.
pub struct ChatSessionManager {
    backend: Arc<dyn GenerativeBackend>,
    policy: Arc<dyn HistoryPolicy>,
    retry: RetryPolicy,
}

impl ChatSessionManager {
    /// Create a manager that forwards the full history.
    pub fn new(backend: Arc<dyn GenerativeBackend>) -> Self {
        Self {
            backend,
            policy: Arc::new(FullHistory),
            retry: RetryPolicy::none(),
        }
    }

    /// Create a manager from chat configuration.
    pub fn from_config(backend: Arc<dyn GenerativeBackend>, config: &ChatConfig) -> Self {
        let manager = Self::new(backend);
        match config.history_max_turns {
            Some(max_turns) => manager.with_policy(Arc::new(RecentTurns::new(max_turns))),
            None => manager,
        }
    }

    /// Set the history policy.
    pub fn with_policy(mut self, policy: Arc<dyn HistoryPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Set the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Active history policy.
    pub fn policy(&self) -> &dyn HistoryPolicy {
        self.policy.as_ref()
    }

    /// Fresh two-turn history for new notes.
    pub fn start_session(&self, notes: &NotesDocument) -> ChatHistory {
        ChatHistory::seeded(&notes.content)
    }

    /// Ask a question about the notes.
    ///
    /// Returns the extended history and the answer. `history` itself is
    /// never modified.
    pub async fn ask(
        &self,
        history: &ChatHistory,
        question: &str,
    ) -> NotesResult<(ChatHistory, String)> {
        if question.trim().is_empty() {
            return Err(NotesError::empty_question());
        }

        let context = self.policy.select(history);
        debug!(
            policy = self.policy.name(),
            forwarded = context.len(),
            stored = history.len(),
            "Asking question"
        );

        let backend = self.backend.as_ref();
        let answer = self
            .retry
            .run(|| {
                let mut conversation = backend.start_conversation(&context);
                let parts = vec![Part::text(question)];
                async move { backend.send(&mut conversation, parts).await }
            })
            .await?;

        if answer.trim().is_empty() {
            return Err(NotesError::invalid_response(
                "The model returned an empty answer",
            ));
        }

        let updated = history.with_exchange(question, answer.clone());
        info!(exchanges = updated.exchange_count(), "Chat turn completed");
        Ok((updated, answer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenerationErrorKind;
    use crate::mock::ScriptedBackend;
    use crate::types::{ChatRole, ChatState, NoteStyle};
    use decknotes_extractors::{ExtractionMethod, ExtractionOutcome};

    fn notes() -> NotesDocument {
        NotesDocument::new(
            "# Overview\n**Mitochondria** make energy",
            NoteStyle::English,
            ExtractionMethod::SlideTextExtractor,
            ExtractionOutcome::Complete,
        )
    }

    #[test]
    fn test_start_session_seeds_two_turns() {
        let manager = ChatSessionManager::new(Arc::new(ScriptedBackend::new()));
        let history = manager.start_session(&notes());
        assert_eq!(history.len(), 2);
        assert_eq!(history.state(), ChatState::Seeded);
        assert!(history.turns()[0].content.contains("**Mitochondria** make energy"));
    }

    #[tokio::test]
    async fn test_k_asks_grow_history_by_pairs() {
        let backend = ScriptedBackend::new()
            .with_reply("a1")
            .with_reply("a2")
            .with_reply("a3");
        let manager = ChatSessionManager::new(Arc::new(backend.clone()));

        let mut history = manager.start_session(&notes());
        for (i, q) in ["q1", "q2", "q3"].iter().enumerate() {
            let (next, answer) = manager.ask(&history, q).await.unwrap();
            assert_eq!(answer, format!("a{}", i + 1));
            history = next;
        }

        assert_eq!(history.len(), 2 + 2 * 3);
        for (i, turn) in history.turns().iter().enumerate() {
            let expected = if i % 2 == 0 { ChatRole::User } else { ChatRole::Model };
            assert_eq!(turn.role, expected);
        }
        assert_eq!(history.visible_turns()[4].content, "q3");
    }

    #[tokio::test]
    async fn test_ask_forwards_history_and_question() {
        let backend = ScriptedBackend::new().with_reply("a1").with_reply("a2");
        let manager = ChatSessionManager::new(Arc::new(backend.clone()));

        let seeded = manager.start_session(&notes());
        let (history, _) = manager.ask(&seeded, "first?").await.unwrap();
        manager.ask(&history, "second?").await.unwrap();

        let request = backend.last_request().unwrap();
        assert_eq!(request.len(), 5);
        assert_eq!(request[2].parts, vec![Part::text("first?")]);
        assert_eq!(request[4].parts, vec![Part::text("second?")]);
    }

    #[tokio::test]
    async fn test_failed_ask_leaves_history_identical() {
        let backend = ScriptedBackend::new()
            .with_reply("a1")
            .with_error(GenerationErrorKind::Unavailable, "backend down");
        let manager = ChatSessionManager::new(Arc::new(backend));

        let seeded = manager.start_session(&notes());
        let (history, _) = manager.ask(&seeded, "q1").await.unwrap();
        let before = serde_json::to_string(&history).unwrap();

        let result = manager.ask(&history, "q2").await;
        assert!(matches!(result, Err(NotesError::GenerationFailed { .. })));
        assert_eq!(serde_json::to_string(&history).unwrap(), before);
        assert_eq!(history.len(), 4);
    }

    #[tokio::test]
    async fn test_blank_question_rejected_without_backend_call() {
        let backend = ScriptedBackend::new();
        let manager = ChatSessionManager::new(Arc::new(backend.clone()));
        let history = manager.start_session(&notes());

        let result = manager.ask(&history, "   ").await;
        assert!(matches!(result, Err(NotesError::Validation { .. })));
        assert_eq!(backend.request_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_answer_is_invalid_response() {
        let backend = ScriptedBackend::new().with_reply("  ");
        let manager = ChatSessionManager::new(Arc::new(backend));
        let history = manager.start_session(&notes());

        let err = manager.ask(&history, "q").await.unwrap_err();
        assert_eq!(err.generation_kind(), Some(GenerationErrorKind::InvalidResponse));
    }

    #[tokio::test]
    async fn test_recent_turns_policy_limits_forwarded_context() {
        let backend = ScriptedBackend::new();
        let manager = ChatSessionManager::from_config(
            Arc::new(backend.clone()),
            &ChatConfig {
                history_max_turns: Some(2),
            },
        );
        assert_eq!(manager.policy().name(), "recent");

        let mut history = manager.start_session(&notes());
        for q in ["q1", "q2", "q3"] {
            history = manager.ask(&history, q).await.unwrap().0;
        }

        // Stored history keeps everything; the request carries seed + 2 + question.
        assert_eq!(history.len(), 8);
        let request = backend.last_request().unwrap();
        assert_eq!(request.len(), 5);
        assert_eq!(request[2].parts, vec![Part::text("q2")]);
    }

    #[tokio::test]
    async fn test_retry_recovers_transient_failure() {
        let backend = ScriptedBackend::new()
            .with_error(GenerationErrorKind::Network, "reset")
            .with_reply("answer");
        let manager = ChatSessionManager::new(Arc::new(backend.clone())).with_retry(
            RetryPolicy::new(crate::retry::RetryConfig {
                max_retries: 2,
                min_delay_ms: 1,
                max_delay_ms: 2,
            }),
        );
        let history = manager.start_session(&notes());

        let (history, answer) = manager.ask(&history, "q").await.unwrap();
        assert_eq!(answer, "answer");
        assert_eq!(history.len(), 4);
        assert_eq!(backend.request_count(), 2);
    }
}
