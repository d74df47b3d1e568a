//! Downloadable markdown artifacts for generated notes.
//!
//! # Example
//!
//! ```ignore
//! use decknotes_core::export::NotesArtifact;
//!
//! let artifact = NotesArtifact::from_notes(&notes);
//! assert_eq!(artifact.file_name, "official_notes.md");
//! let link = artifact.data_url();
//! ```

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;

use crate::types::{NoteStyle, NotesDocument};

/// MIME type of exported notes.
pub const MARKDOWN_MIME: &str = "text/markdown";

/// A notes file ready for download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotesArtifact {
    /// Suggested file name, e.g. `official_notes.md`.
    pub file_name: String,
    /// Always `text/markdown`.
    pub mime_type: &'static str,
    /// UTF-8 note text.
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl NotesArtifact {
    /// Package notes as a markdown file.
    pub fn from_notes(notes: &NotesDocument) -> Self {
        Self {
            file_name: file_name_for(notes.style),
            mime_type: MARKDOWN_MIME,
            bytes: notes.content.as_bytes().to_vec(),
        }
    }

    /// Base64 encoding of the file contents.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    /// `data:` URL for inline download links.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }

    /// `Content-Disposition` header value.
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.file_name)
    }
}

/// `<style label lowercased, spaces replaced by underscores>.md`
pub fn file_name_for(style: NoteStyle) -> String {
    format!("{}.md", style.label().to_lowercase().replace(' ', "_"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use decknotes_extractors::{ExtractionMethod, ExtractionOutcome};

    fn notes(style: NoteStyle) -> NotesDocument {
        NotesDocument::new(
            "# Notes\n**Key term**: définition",
            style,
            ExtractionMethod::PrimaryRasterizer,
            ExtractionOutcome::Complete,
        )
    }

    #[test]
    fn test_file_names() {
        assert_eq!(file_name_for(NoteStyle::Official), "official_notes.md");
        assert_eq!(file_name_for(NoteStyle::English), "english_notes.md");
        assert_eq!(file_name_for(NoteStyle::Hinglish), "hinglish_notes.md");
    }

    #[test]
    fn test_artifact_contents() {
        let artifact = NotesArtifact::from_notes(&notes(NoteStyle::English));
        assert_eq!(artifact.mime_type, "text/markdown");
        assert_eq!(artifact.bytes, "# Notes\n**Key term**: définition".as_bytes());
        assert_eq!(
            artifact.content_disposition(),
            "attachment; filename=\"english_notes.md\""
        );

        let decoded = STANDARD.decode(artifact.to_base64()).unwrap();
        assert_eq!(decoded, artifact.bytes);
        assert!(artifact.data_url().starts_with("data:text/markdown;base64,"));
    }
}
