//! PDF text-layer extraction using pdf-extract.

use async_trait::async_trait;
use tracing::debug;

use crate::error::{ExtractError, ExtractResult};
use crate::types::{DocumentFormat, ExtractionMethod, ExtractionResult, UploadedDocument};
use crate::{page_marker, ExtractionStrategy};

/// Placeholder body for a page whose text layer is empty.
pub fn page_placeholder(page_number: usize) -> String {
    format!("[PDF Page {} - No text extracted]", page_number)
}

/// Reads the PDF's internal text layer page by page.
///
/// pdf-extract is synchronous and can panic on malformed input, so parsing
/// runs inside spawn_blocking; a panic surfaces as `TaskJoin`.
#[derive(Debug, Clone, Default)]
pub struct PdfTextExtractor;

impl PdfTextExtractor {
    /// Create a new text-layer extractor.
    pub fn new() -> Self {
        Self
    }

    fn extract_sync(content: Vec<u8>) -> ExtractResult<Vec<String>> {
        pdf_extract::extract_text_from_mem_by_pages(&content)
            .map_err(|e| ExtractError::Pdf(e.to_string()))
    }
}

/// Join per-page text with page markers, substituting placeholders.
pub(crate) fn assemble_pages(pages: &[String]) -> String {
    let mut text = String::new();
    for (index, page) in pages.iter().enumerate() {
        let page_number = index + 1;
        text.push_str(&page_marker(page_number));
        if page.trim().is_empty() {
            text.push_str(&page_placeholder(page_number));
        } else {
            text.push_str(page);
        }
    }
    text
}

#[async_trait]
impl ExtractionStrategy for PdfTextExtractor {
    async fn extract(&self, document: &UploadedDocument) -> ExtractResult<ExtractionResult> {
        if document.is_empty() {
            return Err(ExtractError::Pdf("Document stream is empty".to_string()));
        }

        let content = document.bytes().to_vec();
        let pages = tokio::task::spawn_blocking(move || Self::extract_sync(content)).await??;

        if pages.is_empty() {
            return Err(ExtractError::EmptyContent);
        }

        let empty_pages = pages.iter().filter(|p| p.trim().is_empty()).count();
        debug!(
            pages = pages.len(),
            empty_pages, "Extracted PDF text layer"
        );

        Ok(ExtractionResult::text(assemble_pages(&pages), self.method())
            .with_page_count(pages.len()))
    }

    fn supported_formats(&self) -> &[DocumentFormat] {
        &[DocumentFormat::Pdf]
    }

    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::FallbackTextExtractor
    }

    fn name(&self) -> &str {
        "pdf-extract"
    }
}
