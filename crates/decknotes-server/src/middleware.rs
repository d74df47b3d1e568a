//! Middleware for the REST API server.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::error::ApiError;
use crate::state::AppState;

/// Create CORS middleware.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Request logging middleware.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = std::time::Instant::now();

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status();

    info!(
        method = %method,
        uri = %uri,
        status = %status.as_u16(),
        duration_ms = %duration.as_millis(),
        "Request completed"
    );

    response
}

/// Bearer token authentication middleware.
///
/// Active when auth is required; `/health` stays public. Requiring auth
/// without a configured token rejects every other request.
pub async fn auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let settings = state.settings();
    if !settings.require_auth || request.uri().path() == "/health" {
        return next.run(request).await;
    }
    let Some(expected) = settings.auth_token.as_deref() else {
        warn!(uri = %request.uri(), "Auth required but no token configured");
        return ApiError::unauthorized("Server authentication is not configured").into_response();
    };

    let token = request
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|header| {
            header
                .strip_prefix("Bearer ")
                .or_else(|| header.strip_prefix("Token "))
        });

    let rejection = match token {
        Some(token) if token == expected => None,
        Some(_) => Some("Invalid API token"),
        None => Some("Missing bearer token"),
    };

    match rejection {
        None => next.run(request).await,
        Some(message) => {
            warn!(uri = %request.uri(), "Rejected unauthenticated request");
            ApiError::unauthorized(message).into_response()
        }
    }
}
