//! Notes generation and download endpoints.

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use decknotes_core::{NoteStyle, NotesArtifact, NotesDocument, NotesError};
use decknotes_extractors::{ExtractionMethod, ExtractionOutcome};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct GenerateNotesRequest {
    pub style: String,
}

#[derive(Debug, Serialize)]
pub struct NotesResponse {
    pub content: String,
    pub style: NoteStyle,
    pub style_label: &'static str,
    pub method: ExtractionMethod,
    pub outcome: ExtractionOutcome,
    pub word_count: usize,
    pub created_at: DateTime<Utc>,
    pub download: DownloadLink,
}

/// Inline markdown download for clients that cannot follow a second request.
#[derive(Debug, Serialize)]
pub struct DownloadLink {
    pub file_name: String,
    pub mime_type: &'static str,
    pub data_url: String,
}

impl From<&NotesArtifact> for DownloadLink {
    fn from(artifact: &NotesArtifact) -> Self {
        Self {
            file_name: artifact.file_name.clone(),
            mime_type: artifact.mime_type,
            data_url: artifact.data_url(),
        }
    }
}

impl From<NotesDocument> for NotesResponse {
    fn from(notes: NotesDocument) -> Self {
        let download = DownloadLink::from(&NotesArtifact::from_notes(&notes));
        Self {
            word_count: notes.word_count(),
            style_label: notes.style.label(),
            content: notes.content,
            style: notes.style,
            method: notes.method,
            outcome: notes.outcome,
            created_at: notes.created_at,
            download,
        }
    }
}

/// Generate notes for the uploaded document.
/// POST /sessions/:id/notes
pub async fn generate_notes(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<GenerateNotesRequest>,
) -> ApiResult<Json<NotesResponse>> {
    let style = NoteStyle::parse(&request.style)?;
    let assistant = state.backend_assistant()?;

    let shared = state.session(id).await?;
    let mut session = shared.lock().await;
    let notes = assistant.generate(&mut session, style).await?;

    Ok(Json(notes.into()))
}

/// Current notes.
/// GET /sessions/:id/notes
pub async fn get_notes(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<NotesResponse>> {
    let shared = state.session(id).await?;
    let session = shared.lock().await;
    let notes = session.notes().cloned().ok_or(NotesError::NoActiveNotes)?;
    Ok(Json(notes.into()))
}

/// Current notes as a markdown attachment.
/// GET /sessions/:id/notes/download
pub async fn download_notes(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let shared = state.session(id).await?;
    let session = shared.lock().await;
    let notes = session.notes().ok_or(NotesError::NoActiveNotes)?;
    let artifact = NotesArtifact::from_notes(notes);

    Ok((
        [
            (
                header::CONTENT_TYPE,
                format!("{}; charset=utf-8", artifact.mime_type),
            ),
            (header::CONTENT_DISPOSITION, artifact.content_disposition()),
        ],
        artifact.bytes,
    ))
}
