//! Generated notes.

use chrono::{DateTime, Utc};
use decknotes_extractors::{ExtractionMethod, ExtractionOutcome};
use serde::{Deserialize, Serialize};

use super::NoteStyle;

/// One generated note document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotesDocument {
    /// Markdown note text as returned by the backend.
    pub content: String,
    /// Style the notes were generated in.
    pub style: NoteStyle,
    /// Extraction strategy the notes were built from.
    pub method: ExtractionMethod,
    /// Quality of the extraction the notes were built from.
    pub outcome: ExtractionOutcome,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl NotesDocument {
    /// Create a note document stamped with the current time.
    pub fn new(
        content: impl Into<String>,
        style: NoteStyle,
        method: ExtractionMethod,
        outcome: ExtractionOutcome,
    ) -> Self {
        Self {
            content: content.into(),
            style,
            method,
            outcome,
            created_at: Utc::now(),
        }
    }

    /// Approximate word count of the note text.
    pub fn word_count(&self) -> usize {
        self.content.split_whitespace().count()
    }

    /// Whether the notes were built from a fallback or failed extraction.
    pub fn is_degraded(&self) -> bool {
        self.outcome != ExtractionOutcome::Complete
    }
}
