//! decknotes-server - REST API server for decknotes.
//!
//! Hosts per-user sessions: upload a PDF or PPTX, generate notes in one of
//! three styles, download them, and chat about them.
//!
//! # Example
//!
//! ```ignore
//! use decknotes_core::NotesConfig;
//! use decknotes_server::{create_server, create_state, ServerSettings};
//!
//! #[tokio::main]
//! async fn main() {
//!     let state = create_state(NotesConfig::load().unwrap(), ServerSettings::default());
//!     let app = create_server(state);
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await.unwrap();
//!     axum::serve(listener, app).await.unwrap();
//! }
//! ```

pub mod error;
pub mod factory;
pub mod middleware;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use factory::{create_state, UnconfiguredBackend};
pub use state::{AppState, ServerSettings};

use axum::{middleware as axum_middleware, Router};
use tower_http::trace::TraceLayer;

/// Create the server with all routes and middleware.
///
/// Bearer auth is enforced when the settings require it.
pub fn create_server(state: AppState) -> Router {
    routes::create_router(state.clone())
        .layer(TraceLayer::new_for_http())
        .layer(middleware::cors_layer())
        .layer(axum_middleware::from_fn_with_state(
            state,
            middleware::auth_middleware,
        ))
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
}
