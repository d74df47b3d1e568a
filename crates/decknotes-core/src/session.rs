//! Per-user session state.
//!
//! A [`Session`] is a plain value; the [`SessionStore`] wraps each one in its
//! own async mutex. Holding that mutex for the length of an operation keeps
//! at most one generation or chat call in flight per session. Idle sessions
//! are evicted so abandoned documents do not pile up.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use decknotes_extractors::UploadedDocument;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::error::{NotesError, NotesResult};
use crate::types::{ChatHistory, ChatState, NotesDocument};

/// State owned by one user session.
#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    created_at: DateTime<Utc>,
    pub(crate) document: Option<UploadedDocument>,
    pub(crate) notes: Option<NotesDocument>,
    pub(crate) history: Option<ChatHistory>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Create an empty session with a fresh id.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            document: None,
            notes: None,
            history: None,
        }
    }

    /// Session id.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Creation time.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Uploaded document, if any.
    pub fn document(&self) -> Option<&UploadedDocument> {
        self.document.as_ref()
    }

    /// Current notes, if any.
    pub fn notes(&self) -> Option<&NotesDocument> {
        self.notes.as_ref()
    }

    /// Chat history for the current notes, if any.
    pub fn history(&self) -> Option<&ChatHistory> {
        self.history.as_ref()
    }

    /// Chat state derived from the stored history.
    pub fn chat_state(&self) -> ChatState {
        ChatState::of(self.history.as_ref())
    }
}

/// Shared handle to one session.
pub type SharedSession = Arc<Mutex<Session>>;

#[derive(Debug)]
struct StoreEntry {
    session: SharedSession,
    last_touched: Instant,
}

impl StoreEntry {
    /// Idle past `timeout` and not held by any in-flight operation.
    fn is_expired(&self, now: Instant, timeout: Duration) -> bool {
        now.duration_since(self.last_touched) >= timeout && Arc::strong_count(&self.session) == 1
    }
}

/// Concurrent map of live sessions.
///
/// Sessions untouched for longer than the idle timeout are evicted the next
/// time a session is created or looked up. A session whose handle is still
/// held elsewhere is never evicted.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, StoreEntry>>,
    idle_timeout: Option<Duration>,
}

impl SessionStore {
    /// Create an empty store that keeps sessions until they are removed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store from session configuration.
    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new().with_idle_timeout(config.idle_timeout())
    }

    /// Evict sessions idle for longer than `timeout`; `None` disables eviction.
    pub fn with_idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Create and register a new session.
    pub async fn create(&self) -> (Uuid, SharedSession) {
        let session = Session::new();
        let id = session.id();
        let shared = Arc::new(Mutex::new(session));

        let mut sessions = self.sessions.write().await;
        self.sweep(&mut sessions);
        sessions.insert(
            id,
            StoreEntry {
                session: Arc::clone(&shared),
                last_touched: Instant::now(),
            },
        );
        debug!(session_id = %id, live = sessions.len(), "Session created");
        (id, shared)
    }

    /// Look up a session and mark it as used.
    pub async fn get(&self, id: Uuid) -> NotesResult<SharedSession> {
        let mut sessions = self.sessions.write().await;
        self.sweep(&mut sessions);
        let entry = sessions
            .get_mut(&id)
            .ok_or_else(|| NotesError::session_not_found(id.to_string()))?;
        entry.last_touched = Instant::now();
        Ok(Arc::clone(&entry.session))
    }

    /// Discard a session.
    pub async fn remove(&self, id: Uuid) -> NotesResult<()> {
        match self.sessions.write().await.remove(&id) {
            Some(_) => {
                debug!(session_id = %id, "Session discarded");
                Ok(())
            }
            None => Err(NotesError::session_not_found(id.to_string())),
        }
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether no sessions are live.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    fn sweep(&self, sessions: &mut HashMap<Uuid, StoreEntry>) {
        let Some(timeout) = self.idle_timeout else {
            return;
        };
        let now = Instant::now();
        let before = sessions.len();
        sessions.retain(|_, entry| !entry.is_expired(now, timeout));
        let evicted = before - sessions.len();
        if evicted > 0 {
            info!(evicted, live = sessions.len(), "Evicted idle sessions");
        }
    }
}
