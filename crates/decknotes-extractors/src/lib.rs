//! decknotes-extractors - Content extraction for uploaded study documents.
//!
//! Turns an uploaded PDF or PPTX into either ordered page images or a flat
//! text blob, through an ordered list of strategies tried until one
//! succeeds.
//!
//! # Strategies
//!
//! - [`PdfRasterizer`] - renders PDF pages with poppler's `pdftoppm`
//! - [`PdfTextExtractor`] - reads the PDF text layer via pdf-extract
//! - [`SlideTextExtractor`] - reads shape text from PPTX slides
//!
//! # Example
//!
//! ```ignore
//! use decknotes_extractors::{ExtractionPipeline, UploadedDocument};
//!
//! let pipeline = ExtractionPipeline::with_defaults();
//! let document = UploadedDocument::new("lecture.pdf", pdf_bytes);
//! let result = pipeline.extract(&document).await?;
//! println!("extracted with {}", result.method);
//! ```

mod error;
mod factory;
mod pdf_raster;
mod pdf_text;
mod pipeline;
mod pptx;
mod types;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::{ExtractError, ExtractResult};
pub use factory::ExtractorFactory;
pub use pdf_raster::{PdfRasterizer, RasterConfig};
pub use pdf_text::{page_placeholder, PdfTextExtractor};
pub use pipeline::ExtractionPipeline;
pub use pptx::SlideTextExtractor;
pub use types::{
    DocumentFormat, ExtractedPayload, ExtractionMethod, ExtractionOutcome, ExtractionResult,
    PageImage, UploadedDocument,
};

use async_trait::async_trait;

/// One way of extracting content from a document.
///
/// Strategies report expected degradation as `Err`; the pipeline decides
/// whether another strategy gets a turn.
#[async_trait]
pub trait ExtractionStrategy: Send + Sync {
    /// Extract content from the document.
    async fn extract(&self, document: &UploadedDocument) -> ExtractResult<ExtractionResult>;

    /// Formats this strategy can handle.
    fn supported_formats(&self) -> &[DocumentFormat];

    /// Check if this strategy handles the given format.
    fn supports(&self, format: DocumentFormat) -> bool {
        self.supported_formats().contains(&format)
    }

    /// Method recorded on results from this strategy.
    fn method(&self) -> ExtractionMethod;

    /// Human-readable name for logs.
    fn name(&self) -> &str;
}

/// Marker emitted before each page's text.
pub fn page_marker(page_number: usize) -> String {
    format!("\n\n--- Page {} ---\n\n", page_number)
}

/// Marker emitted before each slide's text.
pub fn slide_marker(slide_number: usize) -> String {
    format!("\n\n--- Slide {} ---\n\n", slide_number)
}
