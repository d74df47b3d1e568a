//! Note style catalogue.

use axum::Json;
use decknotes_core::NoteStyle;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct StyleInfo {
    pub id: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub min_words: u32,
    pub max_words: u32,
}

impl From<NoteStyle> for StyleInfo {
    fn from(style: NoteStyle) -> Self {
        let (min_words, max_words) = style.word_band();
        Self {
            id: style.id(),
            label: style.label(),
            description: style.description(),
            min_words,
            max_words,
        }
    }
}

/// List the available note styles.
/// GET /styles
pub async fn list_styles() -> Json<Vec<StyleInfo>> {
    Json(NoteStyle::all().into_iter().map(StyleInfo::from).collect())
}
