//! Note styles.
//!
//! Three fixed output formats. Each style serializes as its stable id
//! (`official`, `english`, `hinglish`) and parses from either the id or the
//! display label, case-insensitively.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

use crate::error::{NotesError, NotesResult};

/// Output format for generated notes.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum NoteStyle {
    /// Formal, professional notes with technical terminology.
    #[strum(
        to_string = "official",
        serialize = "official notes",
        serialize = "official_notes"
    )]
    Official,
    /// Simplified notes in plain English.
    #[strum(
        to_string = "english",
        serialize = "english notes",
        serialize = "english_notes"
    )]
    English,
    /// Notes in mixed Hindi-English, Roman script.
    #[strum(
        to_string = "hinglish",
        serialize = "hinglish notes",
        serialize = "hinglish_notes"
    )]
    Hinglish,
}

impl NoteStyle {
    /// Stable identifier.
    pub fn id(&self) -> &'static str {
        self.into()
    }

    /// Display label.
    pub fn label(&self) -> &'static str {
        match self {
            NoteStyle::Official => "Official Notes",
            NoteStyle::English => "English Notes",
            NoteStyle::Hinglish => "Hinglish Notes",
        }
    }

    /// One-line description shown next to the label.
    pub fn description(&self) -> &'static str {
        match self {
            NoteStyle::Official => "Formal, professional notes with technical terminology",
            NoteStyle::English => "Simplified notes in plain English",
            NoteStyle::Hinglish => "Notes in mixed Hindi-English for accessibility",
        }
    }

    /// Target word-count band, inclusive.
    pub fn word_band(&self) -> (u32, u32) {
        match self {
            NoteStyle::Official => (300, 500),
            NoteStyle::English | NoteStyle::Hinglish => (250, 400),
        }
    }

    /// Parse an id or label, failing with a validation error.
    pub fn parse(value: &str) -> NotesResult<Self> {
        value
            .trim()
            .parse()
            .map_err(|_| NotesError::invalid_style(value.trim()))
    }

    /// All styles in display order.
    pub fn all() -> Vec<NoteStyle> {
        Self::iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_and_labels() {
        assert_eq!(NoteStyle::Official.id(), "official");
        assert_eq!(NoteStyle::Hinglish.to_string(), "hinglish");
        assert_eq!(NoteStyle::English.label(), "English Notes");
        assert_eq!(NoteStyle::all().len(), 3);
    }

    #[test]
    fn test_parse_accepts_ids_and_labels() {
        assert_eq!(NoteStyle::parse("official").unwrap(), NoteStyle::Official);
        assert_eq!(NoteStyle::parse("ENGLISH").unwrap(), NoteStyle::English);
        assert_eq!(NoteStyle::parse("Hinglish Notes").unwrap(), NoteStyle::Hinglish);
        assert_eq!(NoteStyle::parse(" official notes ").unwrap(), NoteStyle::Official);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        let err = NoteStyle::parse("poetry").unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::ValInvalidStyle);
    }

    #[test]
    fn test_word_bands() {
        assert_eq!(NoteStyle::Official.word_band(), (300, 500));
        assert_eq!(NoteStyle::English.word_band(), (250, 400));
        assert_eq!(NoteStyle::Hinglish.word_band(), (250, 400));
    }

    #[test]
    fn test_serde_uses_ids() {
        let json = serde_json::to_string(&NoteStyle::English).unwrap();
        assert_eq!(json, "\"english\"");
        let style: NoteStyle = serde_json::from_str("\"hinglish\"").unwrap();
        assert_eq!(style, NoteStyle::Hinglish);
    }
}
