//! Extraction pipeline with ordered strategy fallback.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{ExtractError, ExtractResult};
use crate::types::{DocumentFormat, ExtractionResult, UploadedDocument};
use crate::ExtractionStrategy;

/// Pipeline that tries registered strategies in order.
///
/// For a document, only strategies supporting its format are candidates. The
/// first candidate that succeeds wins; a win by any later candidate is marked
/// degraded. When every candidate fails the result is a failed diagnostic,
/// never an error.
pub struct ExtractionPipeline {
    strategies: Vec<Arc<dyn ExtractionStrategy>>,
}

impl ExtractionPipeline {
    /// Create new empty pipeline.
    pub fn new() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    /// Create pipeline with the default strategy order.
    pub fn with_defaults() -> Self {
        Self {
            strategies: crate::ExtractorFactory::all(),
        }
    }

    /// Create pipeline from an explicit strategy list.
    pub fn with_strategies(strategies: Vec<Arc<dyn ExtractionStrategy>>) -> Self {
        Self { strategies }
    }

    /// Append a strategy; it runs after every strategy already registered.
    pub fn add_strategy(mut self, strategy: Arc<dyn ExtractionStrategy>) -> Self {
        self.strategies.push(strategy);
        self
    }

    /// Extract content from the document.
    ///
    /// Returns `Err` only for `UnsupportedFormat`.
    pub async fn extract(&self, document: &UploadedDocument) -> ExtractResult<ExtractionResult> {
        let format = document.format()?;
        let candidates: Vec<&Arc<dyn ExtractionStrategy>> = self
            .strategies
            .iter()
            .filter(|s| s.supports(format))
            .collect();

        let Some(last) = candidates.last() else {
            return Err(ExtractError::UnsupportedFormat(format.to_string()));
        };
        let last_method = last.method();

        let mut last_error = None;
        for (index, strategy) in candidates.iter().enumerate() {
            debug!(
                strategy = strategy.name(),
                filename = document.filename(),
                "Trying extraction strategy"
            );
            match strategy.extract(document).await {
                Ok(result) if index == 0 => return Ok(result),
                Ok(result) => {
                    warn!(
                        strategy = strategy.name(),
                        method = %result.method,
                        "Extraction degraded to fallback strategy"
                    );
                    return Ok(result.into_degraded());
                }
                Err(e) => {
                    warn!(strategy = strategy.name(), error = %e, "Extraction strategy failed");
                    last_error = Some(e);
                }
            }
        }

        let reason = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no strategy produced content".to_string());
        warn!(filename = document.filename(), %reason, "All extraction strategies failed");
        Ok(ExtractionResult::failed(
            format!("Extraction failed: {}", reason),
            last_method,
        ))
    }

    /// Check if the pipeline can handle a format.
    pub fn supports(&self, format: DocumentFormat) -> bool {
        self.strategies.iter().any(|s| s.supports(format))
    }

    /// Names of registered strategies, in order.
    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Get the number of registered strategies.
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    /// Check if the pipeline has no registered strategies.
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

impl Default for ExtractionPipeline {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{minimal_pdf, minimal_pptx};
    use crate::types::{ExtractionMethod, ExtractionOutcome};
    use crate::{PdfRasterizer, PdfTextExtractor, RasterConfig, SlideTextExtractor};
    use async_trait::async_trait;
    use std::path::PathBuf;

    struct FailingStrategy;

    #[async_trait]
    impl ExtractionStrategy for FailingStrategy {
        async fn extract(&self, _document: &UploadedDocument) -> ExtractResult<ExtractionResult> {
            Err(ExtractError::Rasterizer("renderer exploded".to_string()))
        }

        fn supported_formats(&self) -> &[DocumentFormat] {
            &[DocumentFormat::Pdf]
        }

        fn method(&self) -> ExtractionMethod {
            ExtractionMethod::PrimaryRasterizer
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    fn missing_rasterizer() -> Arc<dyn ExtractionStrategy> {
        Arc::new(PdfRasterizer::with_config(RasterConfig {
            binary: PathBuf::from("/nonexistent/decknotes-pdftoppm"),
            ..Default::default()
        }))
    }

    #[test]
    fn test_pipeline_with_defaults() {
        let pipeline = ExtractionPipeline::with_defaults();
        assert_eq!(pipeline.len(), 3);
        assert_eq!(
            pipeline.strategy_names(),
            vec!["pdftoppm", "pdf-extract", "pptx-slides"]
        );
        assert!(pipeline.supports(DocumentFormat::Pdf));
        assert!(pipeline.supports(DocumentFormat::Pptx));
    }

    #[test]
    fn test_pipeline_empty() {
        let pipeline = ExtractionPipeline::new();
        assert!(pipeline.is_empty());
        assert!(!pipeline.supports(DocumentFormat::Pdf));
    }

    #[tokio::test]
    async fn test_unsupported_extension_is_the_only_error() {
        let pipeline = ExtractionPipeline::with_defaults();
        let document = UploadedDocument::new("notes.txt", b"plain text".to_vec());
        let result = pipeline.extract(&document).await;
        assert!(matches!(result, Err(ExtractError::UnsupportedFormat(ext)) if ext == "txt"));
    }

    #[tokio::test]
    async fn test_no_candidate_strategy_is_unsupported() {
        let pipeline = ExtractionPipeline::new().add_strategy(Arc::new(SlideTextExtractor::new()));
        let document = UploadedDocument::new("deck.pdf", minimal_pdf(&["x"]));
        let result = pipeline.extract(&document).await;
        assert!(matches!(result, Err(ExtractError::UnsupportedFormat(_))));
    }

    #[tokio::test]
    async fn test_pdf_falls_back_to_text_layer() {
        let pipeline = ExtractionPipeline::new()
            .add_strategy(missing_rasterizer())
            .add_strategy(Arc::new(PdfTextExtractor::new()));
        let document =
            UploadedDocument::new("lecture.pdf", minimal_pdf(&["One", "Two", "Three"]));

        let result = pipeline.extract(&document).await.unwrap();
        assert_eq!(result.method, ExtractionMethod::FallbackTextExtractor);
        assert_eq!(result.outcome(), ExtractionOutcome::Degraded);

        let text = result.content().unwrap();
        assert_eq!(text.matches("--- Page ").count(), 3);
        let p1 = text.find("--- Page 1 ---").unwrap();
        let p2 = text.find("--- Page 2 ---").unwrap();
        let p3 = text.find("--- Page 3 ---").unwrap();
        assert!(p1 < p2 && p2 < p3);
    }

    #[tokio::test]
    async fn test_all_strategies_fail_yields_diagnostic() {
        let pipeline = ExtractionPipeline::new()
            .add_strategy(missing_rasterizer())
            .add_strategy(Arc::new(PdfTextExtractor::new()));
        let document = UploadedDocument::new("broken.pdf", b"garbage bytes".to_vec());

        let result = pipeline.extract(&document).await.unwrap();
        assert!(result.failed);
        assert!(result.degraded);
        assert_eq!(result.outcome(), ExtractionOutcome::Failed);
        assert_eq!(result.method, ExtractionMethod::FallbackTextExtractor);
        assert!(result.content().unwrap().starts_with("Extraction failed: "));
    }

    #[tokio::test]
    async fn test_single_failing_strategy_reports_its_error() {
        let pipeline = ExtractionPipeline::new().add_strategy(Arc::new(FailingStrategy));
        let document = UploadedDocument::new("deck.pdf", minimal_pdf(&["x"]));

        let result = pipeline.extract(&document).await.unwrap();
        assert_eq!(
            result.content(),
            Some("Extraction failed: PDF rasterization error: renderer exploded")
        );
        assert_eq!(result.method, ExtractionMethod::PrimaryRasterizer);
    }

    #[tokio::test]
    async fn test_pptx_routes_to_slide_extractor() {
        let pipeline = ExtractionPipeline::new()
            .add_strategy(missing_rasterizer())
            .add_strategy(Arc::new(SlideTextExtractor::new()));
        let document =
            UploadedDocument::new("Results.PPTX", minimal_pptx(&[&["Revenue grew 20%"], &[]]));

        let result = pipeline.extract(&document).await.unwrap();
        assert_eq!(result.method, ExtractionMethod::SlideTextExtractor);
        assert_eq!(result.outcome(), ExtractionOutcome::Complete);
        assert_eq!(result.content().unwrap().matches("--- Slide ").count(), 2);
    }
}
