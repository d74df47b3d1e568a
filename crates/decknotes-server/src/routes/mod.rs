//! Route definitions for the REST API.

mod chat;
mod documents;
mod health;
mod notes;
mod sessions;
mod styles;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};

use crate::state::AppState;

/// Create the main application router.
pub fn create_router(state: AppState) -> Router {
    let max_upload_bytes = state.settings().max_upload_bytes;

    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/styles", get(styles::list_styles))
        // Sessions
        .route("/sessions", post(sessions::create_session))
        .route(
            "/sessions/:id",
            get(sessions::get_session).delete(sessions::delete_session),
        )
        // Documents
        .route(
            "/sessions/:id/document",
            put(documents::upload_document).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route(
            "/sessions/:id/document/preview",
            get(documents::preview_document),
        )
        // Notes
        .route(
            "/sessions/:id/notes",
            post(notes::generate_notes).get(notes::get_notes),
        )
        .route("/sessions/:id/notes/download", get(notes::download_notes))
        // Chat
        .route("/sessions/:id/chat", post(chat::ask).get(chat::get_chat))
        // Attach state
        .with_state(state)
}

pub use chat::*;
pub use documents::*;
pub use health::*;
pub use notes::*;
pub use sessions::*;
pub use styles::*;
