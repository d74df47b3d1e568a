//! Session lifecycle endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use decknotes_core::{ChatState, NoteStyle, Session};
use decknotes_extractors::{ExtractionMethod, ExtractionOutcome};
use serde::Serialize;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub session_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct DocumentSummary {
    pub filename: String,
    pub format: Option<String>,
    pub bytes: usize,
}

#[derive(Debug, Serialize)]
pub struct NotesSummary {
    pub style: NoteStyle,
    pub method: ExtractionMethod,
    pub outcome: ExtractionOutcome,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct SessionStatus {
    pub session_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub chat_state: ChatState,
    pub document: Option<DocumentSummary>,
    pub notes: Option<NotesSummary>,
    pub exchanges: usize,
}

impl From<&Session> for SessionStatus {
    fn from(session: &Session) -> Self {
        Self {
            session_id: session.id(),
            created_at: session.created_at(),
            chat_state: session.chat_state(),
            document: session.document().map(|d| DocumentSummary {
                filename: d.filename().to_string(),
                format: d.format().ok().map(|f| f.to_string()),
                bytes: d.len(),
            }),
            notes: session.notes().map(|n| NotesSummary {
                style: n.style,
                method: n.method,
                outcome: n.outcome,
                created_at: n.created_at,
            }),
            exchanges: session.history().map(|h| h.exchange_count()).unwrap_or(0),
        }
    }
}

/// Create a session.
/// POST /sessions
pub async fn create_session(
    State(state): State<AppState>,
) -> ApiResult<(StatusCode, Json<CreateSessionResponse>)> {
    let (_, shared) = state.sessions().create().await;
    let session = shared.lock().await;

    Ok((
        StatusCode::CREATED,
        Json(CreateSessionResponse {
            session_id: session.id(),
            created_at: session.created_at(),
        }),
    ))
}

/// Session status.
/// GET /sessions/:id
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SessionStatus>> {
    let shared = state.session(id).await?;
    let session = shared.lock().await;
    Ok(Json(SessionStatus::from(&*session)))
}

/// Discard a session.
/// DELETE /sessions/:id
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.sessions().remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
