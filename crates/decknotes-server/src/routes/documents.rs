//! Document upload and preview endpoints.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use decknotes_core::NotesError;
use decknotes_extractors::UploadedDocument;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    pub filename: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub filename: String,
    pub format: String,
    pub bytes: usize,
}

/// Upload raw document bytes.
/// PUT /sessions/:id/document?filename=
pub async fn upload_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<UploadQuery>,
    body: Bytes,
) -> ApiResult<Json<UploadResponse>> {
    let filename = query
        .filename
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| {
            NotesError::validation_with_suggestion(
                "Missing filename",
                "Pass the original file name as ?filename=lecture.pdf",
            )
        })?;

    let shared = state.session(id).await?;
    let mut session = shared.lock().await;

    let document = UploadedDocument::new(filename, body.to_vec());
    let bytes = document.len();
    let filename = document.filename().to_string();
    let format = state.assistant().upload(&mut session, document)?;

    Ok(Json(UploadResponse {
        filename,
        format: format.to_string(),
        bytes,
    }))
}

/// First page of the uploaded PDF as PNG.
/// GET /sessions/:id/document/preview
pub async fn preview_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let shared = state.session(id).await?;
    let session = shared.lock().await;

    let page = state.assistant().preview(&session).await?;
    debug!(session_id = %id, width = page.width, height = page.height, "Preview rendered");

    Ok(([(header::CONTENT_TYPE, page.mime_type)], page.data))
}
