//! Factory for creating extraction strategies.

use std::sync::Arc;

use crate::pdf_raster::{PdfRasterizer, RasterConfig};
use crate::pdf_text::PdfTextExtractor;
use crate::pptx::SlideTextExtractor;
use crate::ExtractionStrategy;

/// Factory for creating extraction strategies.
pub struct ExtractorFactory;

impl ExtractorFactory {
    /// Create the primary PDF rasterizer.
    pub fn rasterizer() -> Arc<dyn ExtractionStrategy> {
        Arc::new(PdfRasterizer::new())
    }

    /// Create a PDF rasterizer with custom configuration.
    pub fn rasterizer_with_config(config: RasterConfig) -> Arc<dyn ExtractionStrategy> {
        Arc::new(PdfRasterizer::with_config(config))
    }

    /// Create the PDF text-layer fallback.
    pub fn pdf_text() -> Arc<dyn ExtractionStrategy> {
        Arc::new(PdfTextExtractor::new())
    }

    /// Create the PPTX slide text extractor.
    pub fn slides() -> Arc<dyn ExtractionStrategy> {
        Arc::new(SlideTextExtractor::new())
    }

    /// All strategies in default order.
    pub fn all() -> Vec<Arc<dyn ExtractionStrategy>> {
        Self::all_with_raster_config(RasterConfig::default())
    }

    /// All strategies in default order, with a custom rasterizer.
    pub fn all_with_raster_config(config: RasterConfig) -> Vec<Arc<dyn ExtractionStrategy>> {
        vec![
            Self::rasterizer_with_config(config),
            Self::pdf_text(),
            Self::slides(),
        ]
    }
}
