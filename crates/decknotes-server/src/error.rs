//! Error handling for the REST API server.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use decknotes_core::{GenerationErrorKind, NotesError};
use serde::Serialize;
use std::fmt;

/// API error type.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    // Common error constructors
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
    }

    pub fn not_configured(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, "NOT_CONFIGURED", message)
            .with_suggestion("Set API_KEY (or GOOGLE_API_KEY) and restart the server")
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.status, self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.code,
                message: self.message,
                suggestion: self.suggestion,
            },
        };

        (self.status, Json(body)).into_response()
    }
}

fn status_for(err: &NotesError) -> StatusCode {
    match err {
        NotesError::UnsupportedFormat { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        NotesError::GenerationFailed { kind, .. } => match kind {
            GenerationErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            GenerationErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            GenerationErrorKind::Network => StatusCode::GATEWAY_TIMEOUT,
            GenerationErrorKind::Authentication
            | GenerationErrorKind::InvalidRequest
            | GenerationErrorKind::InvalidResponse => StatusCode::BAD_GATEWAY,
        },
        NotesError::NoActiveNotes | NotesError::NoDocument => StatusCode::CONFLICT,
        NotesError::PreviewUnavailable { .. } | NotesError::Extraction(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        NotesError::SessionNotFound { .. } => StatusCode::NOT_FOUND,
        NotesError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        NotesError::Configuration(_) => StatusCode::SERVICE_UNAVAILABLE,
        NotesError::Io(_) | NotesError::Serialization(_) | NotesError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

// Convert from decknotes-core errors
impl From<NotesError> for ApiError {
    fn from(err: NotesError) -> Self {
        let status = status_for(&err);
        if status.is_server_error() && !matches!(err, NotesError::GenerationFailed { .. }) {
            tracing::error!(error = %err, "Request failed");
        }

        let code = match err {
            NotesError::Configuration(_) => "NOT_CONFIGURED",
            _ => err.code().as_str(),
        };
        Self {
            status,
            code: code.to_string(),
            message: err.to_string(),
            suggestion: err.suggestion().map(str::to_string),
        }
    }
}

/// Result type alias for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notes_error_mapping() {
        let err = ApiError::from(NotesError::unsupported_format("txt"));
        assert_eq!(err.status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(err.code, "FMT_001");
        assert!(err.message.contains("txt"));

        let err = ApiError::from(NotesError::NoActiveNotes);
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert!(err.suggestion.is_some());

        let err = ApiError::from(NotesError::generation(
            GenerationErrorKind::RateLimited,
            "quota",
        ));
        assert_eq!(err.status, StatusCode::TOO_MANY_REQUESTS);

        let err = ApiError::from(NotesError::Configuration("no key".to_string()));
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.code, "NOT_CONFIGURED");
    }
}
