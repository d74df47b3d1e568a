//! decknotes-core - Core library for decknotes.
//!
//! This crate provides the note styles and prompts, the notes generator, the
//! follow-up chat manager, session orchestration and the generative backend
//! trait used by every provider.
//!
//! # Example
//!
//! ```ignore
//! use decknotes_core::{Assistant, NoteStyle, NotesConfig, Session};
//! use decknotes_extractors::UploadedDocument;
//!
//! let config = NotesConfig::load()?;
//! let assistant = Assistant::from_config(&config, backend);
//! let mut session = Session::new();
//!
//! assistant.upload(&mut session, UploadedDocument::new("lecture.pdf", bytes))?;
//! let notes = assistant.generate(&mut session, NoteStyle::Official).await?;
//! let answer = assistant.ask(&mut session, "What is the main argument?").await?;
//! ```

pub mod assistant;
pub mod chat;
pub mod config;
pub mod error;
pub mod export;
pub mod generator;
pub mod mock;
pub mod prompts;
pub mod retry;
pub mod session;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use assistant::Assistant;
pub use chat::{ChatSessionManager, FullHistory, HistoryPolicy, RecentTurns};
pub use config::{ChatConfig, ExtractionConfig, GenerationConfig, NotesConfig, SessionConfig};
pub use error::{ErrorCode, GenerationErrorKind, NotesError, NotesResult};
pub use export::NotesArtifact;
pub use generator::NotesGenerator;
pub use retry::{RetryConfig, RetryPolicy};
pub use session::{Session, SessionStore, SharedSession};
pub use traits::{
    BackendConfig, BackendMessage, BackendProvider, ConversationHandle, GenerativeBackend, Part,
};
pub use types::{ChatHistory, ChatRole, ChatState, ChatTurn, NoteStyle, NotesDocument};
