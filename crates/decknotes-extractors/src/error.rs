//! Extraction error types.

use thiserror::Error;

/// Errors that can occur during content extraction.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// Declared extension is not one the pipeline understands.
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// Extraction process failed.
    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    /// Extracted content is empty.
    #[error("Empty content extracted")]
    EmptyContent,

    /// IO error during extraction.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// PDF text-layer error.
    #[error("PDF extraction error: {0}")]
    Pdf(String),

    /// Page rendering error (missing binary, non-zero exit, timeout).
    #[error("PDF rasterization error: {0}")]
    Rasterizer(String),

    /// Rendered page could not be decoded or re-encoded.
    #[error("Image error: {0}")]
    Image(String),

    /// PPTX package or slide XML error.
    #[error("PPTX extraction error: {0}")]
    Pptx(String),

    /// Task join error from spawn_blocking.
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

/// Result type for extraction operations.
pub type ExtractResult<T> = Result<T, ExtractError>;
