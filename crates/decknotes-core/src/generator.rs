//! Notes generation over a generative backend.

use std::sync::Arc;

use decknotes_extractors::{ExtractedPayload, ExtractionResult};
use tracing::{debug, info, warn};

use crate::config::GenerationConfig;
use crate::error::{NotesError, NotesResult};
use crate::prompts::{compose_prompt, context_message, text_request};
use crate::retry::RetryPolicy;
use crate::traits::{GenerativeBackend, Part};
use crate::types::{NoteStyle, NotesDocument};

/// Turns an extraction result into a note document.
///
/// The generator never touches session state; callers decide what to do with
/// the returned notes.
pub struct NotesGenerator {
    backend: Arc<dyn GenerativeBackend>,
    max_images: usize,
    retry: RetryPolicy,
}

impl NotesGenerator {
    /// Create a generator with the default image cap.
    pub fn new(backend: Arc<dyn GenerativeBackend>) -> Self {
        Self::from_config(backend, &GenerationConfig::default())
    }

    /// Create a generator from generation configuration.
    pub fn from_config(backend: Arc<dyn GenerativeBackend>, config: &GenerationConfig) -> Self {
        Self {
            backend,
            max_images: config.max_images.max(1),
            retry: RetryPolicy::none(),
        }
    }

    /// Set the image cap (at least one).
    pub fn with_max_images(mut self, max_images: usize) -> Self {
        self.max_images = max_images.max(1);
        self
    }

    /// Set the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Most page images forwarded per request.
    pub fn max_images(&self) -> usize {
        self.max_images
    }

    /// Model used for generation.
    pub fn model_name(&self) -> &str {
        self.backend.model_name()
    }

    /// Parts of the single message sent for this extraction.
    ///
    /// Image payloads become `[prompt, context, image_1..image_k]` with
    /// `k <= max_images`; text payloads become one composed text part. A
    /// backend without vision gets a text-only request carrying the
    /// extraction-failed notice in place of the page images.
    pub fn build_request(&self, extraction: &ExtractionResult, style: NoteStyle) -> Vec<Part> {
        match &extraction.payload {
            ExtractedPayload::Images(pages)
                if !pages.is_empty() && !self.backend.supports_vision() =>
            {
                warn!(
                    pages = pages.len(),
                    model = self.backend.model_name(),
                    "Backend does not accept images; sending a text-only request"
                );
                vec![Part::text(text_request(style, extraction, ""))]
            }
            ExtractedPayload::Images(pages) if !pages.is_empty() => {
                let attached = pages.len().min(self.max_images);
                if attached < pages.len() {
                    debug!(
                        pages = pages.len(),
                        attached, "Capping page images forwarded to the backend"
                    );
                }
                let mut parts = Vec::with_capacity(2 + attached);
                parts.push(Part::text(compose_prompt(style)));
                parts.push(Part::text(context_message(extraction, attached)));
                parts.extend(pages.iter().take(attached).map(Part::from));
                parts
            }
            ExtractedPayload::Images(_) => vec![Part::text(text_request(style, extraction, ""))],
            ExtractedPayload::Text(text) => {
                vec![Part::text(text_request(style, extraction, text))]
            }
        }
    }

    /// Generate notes in `style` from an extraction result.
    pub async fn generate(
        &self,
        extraction: &ExtractionResult,
        style: NoteStyle,
    ) -> NotesResult<NotesDocument> {
        if extraction.failed {
            warn!(
                method = %extraction.method,
                "Generating notes from a failed extraction"
            );
        }

        let parts = self.build_request(extraction, style);
        let images = parts.iter().filter(|p| p.is_image()).count();
        debug!(
            style = %style,
            method = %extraction.method,
            images,
            model = self.backend.model_name(),
            "Requesting notes"
        );

        let backend = self.backend.as_ref();
        let content = self
            .retry
            .run(|| {
                let mut conversation = backend.start_conversation(&[]);
                let parts = parts.clone();
                async move { backend.send(&mut conversation, parts).await }
            })
            .await?;

        if content.trim().is_empty() {
            return Err(NotesError::invalid_response(
                "The model returned empty notes",
            ));
        }

        let notes = NotesDocument::new(content, style, extraction.method, extraction.outcome());
        info!(
            style = %style,
            method = %extraction.method,
            words = notes.word_count(),
            "Notes generated"
        );
        Ok(notes)
    }
}
