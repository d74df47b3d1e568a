//! Error types for decknotes operations.
//!
//! Every error carries a stable [`ErrorCode`] for programmatic handling and,
//! where one exists, a suggestion the UI can show next to the message.

use std::fmt;

use decknotes_extractors::ExtractError;
use thiserror::Error;

/// Result type alias for decknotes operations.
pub type NotesResult<T> = Result<T, NotesError>;

/// Category of a generative backend failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenerationErrorKind {
    /// Missing, invalid or revoked credentials.
    Authentication,
    /// Quota or rate limit hit.
    RateLimited,
    /// The backend rejected the request as malformed.
    InvalidRequest,
    /// Backend reachable but failing (5xx).
    Unavailable,
    /// Transport failure: timeout, connection refused, DNS.
    Network,
    /// The backend replied with nothing usable.
    InvalidResponse,
}

impl GenerationErrorKind {
    /// Whether a retry can reasonably succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited | Self::Unavailable | Self::Network)
    }

    /// Error code for this kind.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Authentication => ErrorCode::GenAuthentication,
            Self::RateLimited => ErrorCode::GenRateLimited,
            Self::InvalidRequest => ErrorCode::GenInvalidRequest,
            Self::Unavailable => ErrorCode::GenUnavailable,
            Self::Network => ErrorCode::GenNetwork,
            Self::InvalidResponse => ErrorCode::GenInvalidResponse,
        }
    }
}

impl fmt::Display for GenerationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Authentication => "authentication",
            Self::RateLimited => "rate limited",
            Self::InvalidRequest => "invalid request",
            Self::Unavailable => "unavailable",
            Self::Network => "network",
            Self::InvalidResponse => "invalid response",
        };
        f.write_str(s)
    }
}

/// Main error type for all decknotes operations.
#[derive(Error, Debug)]
pub enum NotesError {
    /// Uploaded file has an extension other than pdf or pptx.
    #[error("Unsupported file format: {format}. Please upload a PDF or PPTX file.")]
    UnsupportedFormat { format: String },

    /// The generative backend failed.
    #[error("Error generating notes ({kind}): {message}")]
    GenerationFailed {
        kind: GenerationErrorKind,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Chat requested before any notes exist.
    #[error("No notes available. Generate notes before asking questions.")]
    NoActiveNotes,

    /// Generation requested before any document was uploaded.
    #[error("No document uploaded. Upload a PDF or PPTX file first.")]
    NoDocument,

    /// No preview can be shown for the stored document.
    #[error("Preview not available: {message}")]
    PreviewUnavailable { message: String },

    /// Unknown session id.
    #[error("Session not found: {session_id}")]
    SessionNotFound { session_id: String },

    /// Input validation failed.
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        code: ErrorCode,
        suggestion: Option<String>,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Extraction failed in a way the pipeline could not absorb.
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Format (FMT_xxx)
    FmtUnsupported,

    // Generation (GEN_xxx)
    GenAuthentication,
    GenRateLimited,
    GenInvalidRequest,
    GenUnavailable,
    GenNetwork,
    GenInvalidResponse,

    // Session (SESS_xxx)
    SessNoActiveNotes,
    SessNoDocument,
    SessNotFound,

    // Preview (PREV_xxx)
    PrevUnavailable,

    // Validation (VAL_xxx)
    ValInvalidInput,
    ValInvalidStyle,
    ValEmptyQuestion,

    // Configuration (CFG_xxx)
    CfgInvalid,

    // Extraction (EXT_xxx)
    ExtFailed,

    // IO / parse
    Io,
    ParseInvalidJson,

    // Internal
    Internal,
}

impl ErrorCode {
    /// Get the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::FmtUnsupported => "FMT_001",
            ErrorCode::GenAuthentication => "GEN_001",
            ErrorCode::GenRateLimited => "GEN_002",
            ErrorCode::GenInvalidRequest => "GEN_003",
            ErrorCode::GenUnavailable => "GEN_004",
            ErrorCode::GenNetwork => "GEN_005",
            ErrorCode::GenInvalidResponse => "GEN_006",
            ErrorCode::SessNoActiveNotes => "SESS_001",
            ErrorCode::SessNoDocument => "SESS_002",
            ErrorCode::SessNotFound => "SESS_003",
            ErrorCode::PrevUnavailable => "PREV_001",
            ErrorCode::ValInvalidInput => "VAL_001",
            ErrorCode::ValInvalidStyle => "VAL_002",
            ErrorCode::ValEmptyQuestion => "VAL_003",
            ErrorCode::CfgInvalid => "CFG_001",
            ErrorCode::ExtFailed => "EXT_001",
            ErrorCode::Io => "IO_001",
            ErrorCode::ParseInvalidJson => "PARSE_001",
            ErrorCode::Internal => "INT_001",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl NotesError {
    /// Create an unsupported format error.
    pub fn unsupported_format(format: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
        }
    }

    /// Create a generation error of the given kind.
    pub fn generation(kind: GenerationErrorKind, message: impl Into<String>) -> Self {
        Self::GenerationFailed {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a generation error that keeps its underlying cause.
    pub fn generation_with_source(
        kind: GenerationErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::GenerationFailed {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an invalid-response generation error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::generation(GenerationErrorKind::InvalidResponse, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            code: ErrorCode::ValInvalidInput,
            suggestion: None,
        }
    }

    /// Create a validation error with suggestion.
    pub fn validation_with_suggestion(
        message: impl Into<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self::Validation {
            message: message.into(),
            code: ErrorCode::ValInvalidInput,
            suggestion: Some(suggestion.into()),
        }
    }

    /// Create an unknown note style error.
    pub fn invalid_style(style: impl Into<String>) -> Self {
        Self::Validation {
            message: format!("Unknown note style '{}'", style.into()),
            code: ErrorCode::ValInvalidStyle,
            suggestion: Some("Use one of: official, english, hinglish".to_string()),
        }
    }

    /// Create an empty question error.
    pub fn empty_question() -> Self {
        Self::Validation {
            message: "Question must not be empty".to_string(),
            code: ErrorCode::ValEmptyQuestion,
            suggestion: Some("Type a question about the notes".to_string()),
        }
    }

    /// Create a preview unavailable error.
    pub fn preview_unavailable(message: impl Into<String>) -> Self {
        Self::PreviewUnavailable {
            message: message.into(),
        }
    }

    /// Create a session not found error.
    pub fn session_not_found(session_id: impl Into<String>) -> Self {
        Self::SessionNotFound {
            session_id: session_id.into(),
        }
    }

    /// Map an HTTP status from the backend to a generation error.
    pub fn from_http_status(status: u16, body: &str) -> Self {
        let kind = match status {
            400 | 404 | 413 | 422 => GenerationErrorKind::InvalidRequest,
            401 | 403 => GenerationErrorKind::Authentication,
            429 => GenerationErrorKind::RateLimited,
            500..=599 => GenerationErrorKind::Unavailable,
            _ => GenerationErrorKind::InvalidResponse,
        };
        Self::generation(kind, format!("HTTP {}: {}", status, body))
    }

    /// Generation error kind, if this is a backend failure.
    pub fn generation_kind(&self) -> Option<GenerationErrorKind> {
        match self {
            Self::GenerationFailed { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Whether retrying the same call can reasonably succeed.
    pub fn is_retryable(&self) -> bool {
        self.generation_kind()
            .map(|kind| kind.is_retryable())
            .unwrap_or(false)
    }

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::UnsupportedFormat { .. } => ErrorCode::FmtUnsupported,
            Self::GenerationFailed { kind, .. } => kind.code(),
            Self::NoActiveNotes => ErrorCode::SessNoActiveNotes,
            Self::NoDocument => ErrorCode::SessNoDocument,
            Self::PreviewUnavailable { .. } => ErrorCode::PrevUnavailable,
            Self::SessionNotFound { .. } => ErrorCode::SessNotFound,
            Self::Validation { code, .. } => *code,
            Self::Configuration(_) => ErrorCode::CfgInvalid,
            Self::Extraction(_) => ErrorCode::ExtFailed,
            Self::Io(_) => ErrorCode::Io,
            Self::Serialization(_) => ErrorCode::ParseInvalidJson,
            Self::Internal(_) => ErrorCode::Internal,
        }
    }

    /// Get a user-friendly suggestion for resolving this error.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::UnsupportedFormat { .. } => {
                Some("Convert the document to PDF or PPTX and upload it again")
            }
            Self::GenerationFailed { kind, .. } => match kind {
                GenerationErrorKind::Authentication => {
                    Some("Please check your API key (set API_KEY or GOOGLE_API_KEY)")
                }
                GenerationErrorKind::RateLimited => Some("Please wait before making more requests"),
                GenerationErrorKind::Unavailable | GenerationErrorKind::Network => {
                    Some("The model service is unreachable; try again shortly")
                }
                GenerationErrorKind::InvalidRequest => {
                    Some("Please check the model name and the document size")
                }
                GenerationErrorKind::InvalidResponse => None,
            },
            Self::NoActiveNotes => Some("Generate notes first, then ask questions about them"),
            Self::NoDocument => Some("Upload a PDF or PPTX file first"),
            Self::PreviewUnavailable { .. } => Some("Previews are only available for PDF files"),
            Self::SessionNotFound { .. } => {
                Some("Create a new session and upload the document again")
            }
            Self::Validation { suggestion, .. } => suggestion.as_deref(),
            Self::Configuration(_) => Some("Please check your configuration file and environment"),
            _ => None,
        }
    }
}

impl From<ExtractError> for NotesError {
    fn from(err: ExtractError) -> Self {
        match err {
            ExtractError::UnsupportedFormat(format) => Self::unsupported_format(format),
            ExtractError::Io(e) => Self::Io(e),
            other => Self::Extraction(other.to_string()),
        }
    }
}
