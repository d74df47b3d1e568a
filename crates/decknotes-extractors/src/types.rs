//! Core types for content extraction.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ExtractError, ExtractResult};

/// Document formats the pipeline can route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    /// Portable Document Format.
    Pdf,
    /// Office Open XML presentation.
    Pptx,
}

impl DocumentFormat {
    /// Resolve a format from a bare extension (`"pdf"`, `".PPTX"`, ...).
    pub fn from_extension(extension: &str) -> ExtractResult<Self> {
        let ext = extension.trim().trim_start_matches('.').to_lowercase();
        match ext.as_str() {
            "pdf" => Ok(DocumentFormat::Pdf),
            "pptx" => Ok(DocumentFormat::Pptx),
            _ => Err(ExtractError::UnsupportedFormat(if ext.is_empty() {
                "(no extension)".to_string()
            } else {
                ext
            })),
        }
    }

    /// Canonical lowercase extension.
    pub fn extension(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Pptx => "pptx",
        }
    }

    /// MIME type of the format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "application/pdf",
            DocumentFormat::Pptx => {
                "application/vnd.openxmlformats-officedocument.presentationml.presentation"
            }
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// A file as received from the user. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    filename: String,
    extension: String,
    bytes: Vec<u8>,
}

impl UploadedDocument {
    /// Create a document, taking the declared extension from the file name.
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        let filename = filename.into();
        let extension = Path::new(&filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();
        Self {
            filename,
            extension,
            bytes,
        }
    }

    /// Create a document with an explicitly declared extension.
    pub fn with_extension(
        filename: impl Into<String>,
        extension: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            filename: filename.into(),
            extension: extension.into().trim_start_matches('.').to_lowercase(),
            bytes,
        }
    }

    /// Original file name.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Declared extension, lowercased, without the dot.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Raw bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the upload carried no bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Resolve the declared format, failing with `UnsupportedFormat`.
    pub fn format(&self) -> ExtractResult<DocumentFormat> {
        DocumentFormat::from_extension(&self.extension)
    }
}

/// One rendered page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageImage {
    /// 1-based page number.
    pub page_number: usize,
    /// MIME type of `data`.
    pub mime_type: String,
    /// Encoded image bytes.
    pub data: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Which strategy produced an extraction result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractionMethod {
    /// Every PDF page rendered to an image.
    PrimaryRasterizer,
    /// PDF text layer read page by page.
    FallbackTextExtractor,
    /// Text of every shape on every slide.
    SlideTextExtractor,
}

impl ExtractionMethod {
    /// Stable identifier, also used in generation context.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionMethod::PrimaryRasterizer => "primary-rasterizer",
            ExtractionMethod::FallbackTextExtractor => "fallback-text-extractor",
            ExtractionMethod::SlideTextExtractor => "slide-text-extractor",
        }
    }
}

impl fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extracted content: page images or flat text, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractedPayload {
    /// Ordered page images.
    Images(Vec<PageImage>),
    /// Flat text blob.
    Text(String),
}

/// Non-fatal quality of an extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionOutcome {
    /// The first applicable strategy succeeded.
    Complete,
    /// A lower-fidelity fallback produced the content.
    Degraded,
    /// Every strategy failed; the payload is a diagnostic.
    Failed,
}

/// Result of running the pipeline over one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionResult {
    /// Extracted content.
    pub payload: ExtractedPayload,
    /// Strategy that produced `payload`.
    pub method: ExtractionMethod,
    /// Set when every strategy failed.
    pub failed: bool,
    /// Set when a fallback strategy produced `payload`.
    pub degraded: bool,
    /// Page or slide count when known.
    pub page_count: Option<usize>,
}

impl ExtractionResult {
    /// Result carrying page images.
    pub fn images(pages: Vec<PageImage>, method: ExtractionMethod) -> Self {
        let page_count = Some(pages.len());
        Self {
            payload: ExtractedPayload::Images(pages),
            method,
            failed: false,
            degraded: false,
            page_count,
        }
    }

    /// Result carrying text.
    pub fn text(content: impl Into<String>, method: ExtractionMethod) -> Self {
        Self {
            payload: ExtractedPayload::Text(content.into()),
            method,
            failed: false,
            degraded: false,
            page_count: None,
        }
    }

    /// Diagnostic result for an exhausted fallback chain.
    pub fn failed(diagnostic: impl Into<String>, method: ExtractionMethod) -> Self {
        Self {
            payload: ExtractedPayload::Text(diagnostic.into()),
            method,
            failed: true,
            degraded: true,
            page_count: None,
        }
    }

    /// Record the page or slide count.
    pub fn with_page_count(mut self, count: usize) -> Self {
        self.page_count = Some(count);
        self
    }

    /// Mark the result as produced by a fallback.
    pub fn into_degraded(mut self) -> Self {
        self.degraded = true;
        self
    }

    /// Outcome classification.
    pub fn outcome(&self) -> ExtractionOutcome {
        if self.failed {
            ExtractionOutcome::Failed
        } else if self.degraded {
            ExtractionOutcome::Degraded
        } else {
            ExtractionOutcome::Complete
        }
    }

    /// Page images, if this is an image result.
    pub fn pages(&self) -> Option<&[PageImage]> {
        match &self.payload {
            ExtractedPayload::Images(pages) => Some(pages),
            ExtractedPayload::Text(_) => None,
        }
    }

    /// Text content, if this is a text result.
    pub fn content(&self) -> Option<&str> {
        match &self.payload {
            ExtractedPayload::Text(text) => Some(text),
            ExtractedPayload::Images(_) => None,
        }
    }

    /// Check if extraction produced nothing usable.
    pub fn is_empty(&self) -> bool {
        match &self.payload {
            ExtractedPayload::Images(pages) => pages.is_empty(),
            ExtractedPayload::Text(text) => text.trim().is_empty(),
        }
    }
}
