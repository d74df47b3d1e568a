//! Follow-up chat endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use decknotes_core::{ChatState, ChatTurn};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub answer: String,
    pub exchanges: usize,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub state: ChatState,
    pub turns: Vec<ChatTurn>,
}

/// Ask a question about the current notes.
/// POST /sessions/:id/chat
pub async fn ask(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AskRequest>,
) -> ApiResult<Json<AskResponse>> {
    let assistant = state.backend_assistant()?;

    let shared = state.session(id).await?;
    let mut session = shared.lock().await;
    let answer = assistant.ask(&mut session, &request.question).await?;
    let exchanges = session.history().map(|h| h.exchange_count()).unwrap_or(0);

    Ok(Json(AskResponse { answer, exchanges }))
}

/// Visible chat turns, seed excluded.
/// GET /sessions/:id/chat
pub async fn get_chat(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ChatResponse>> {
    let shared = state.session(id).await?;
    let session = shared.lock().await;

    Ok(Json(ChatResponse {
        state: session.chat_state(),
        turns: session
            .history()
            .map(|h| h.visible_turns().to_vec())
            .unwrap_or_default(),
    }))
}
