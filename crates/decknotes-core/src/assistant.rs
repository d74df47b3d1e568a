//! Session orchestration: upload, generate, ask, preview.

use std::sync::Arc;

use decknotes_extractors::{
    DocumentFormat, ExtractionPipeline, ExtractorFactory, PageImage, PdfRasterizer,
    UploadedDocument,
};
use tracing::{info, instrument, warn};

use crate::chat::ChatSessionManager;
use crate::config::NotesConfig;
use crate::error::{NotesError, NotesResult};
use crate::generator::NotesGenerator;
use crate::retry::RetryPolicy;
use crate::session::Session;
use crate::traits::GenerativeBackend;
use crate::types::{NoteStyle, NotesDocument};

/// Drives one user's document through extraction, notes and chat.
///
/// Every mutating operation either commits all of its changes to the
/// session or none of them.
pub struct Assistant {
    pipeline: ExtractionPipeline,
    generator: NotesGenerator,
    chat: ChatSessionManager,
    rasterizer: PdfRasterizer,
}

impl Assistant {
    /// Assemble an assistant from its parts.
    pub fn new(
        pipeline: ExtractionPipeline,
        generator: NotesGenerator,
        chat: ChatSessionManager,
        rasterizer: PdfRasterizer,
    ) -> Self {
        Self {
            pipeline,
            generator,
            chat,
            rasterizer,
        }
    }

    /// Build an assistant from configuration and a backend.
    pub fn from_config(config: &NotesConfig, backend: Arc<dyn GenerativeBackend>) -> Self {
        let raster = config.extraction.raster.clone();
        let retry = RetryPolicy::new(config.retry.clone());

        let pipeline = ExtractionPipeline::with_strategies(ExtractorFactory::all_with_raster_config(
            raster.clone(),
        ));
        let generator = NotesGenerator::from_config(Arc::clone(&backend), &config.generation)
            .with_retry(retry.clone());
        let chat = ChatSessionManager::from_config(backend, &config.chat).with_retry(retry);

        Self::new(pipeline, generator, chat, PdfRasterizer::with_config(raster))
    }

    /// Extraction pipeline in use.
    pub fn pipeline(&self) -> &ExtractionPipeline {
        &self.pipeline
    }

    /// Store an uploaded document on the session.
    ///
    /// Existing notes and chat stay until a new generation succeeds.
    pub fn upload(
        &self,
        session: &mut Session,
        document: UploadedDocument,
    ) -> NotesResult<DocumentFormat> {
        let format = document.format()?;
        if !self.pipeline.supports(format) {
            return Err(NotesError::unsupported_format(document.extension()));
        }
        if document.is_empty() {
            return Err(NotesError::validation_with_suggestion(
                "Uploaded file is empty",
                "Choose a non-empty PDF or PPTX file",
            ));
        }

        info!(
            session_id = %session.id(),
            filename = document.filename(),
            format = %format,
            bytes = document.len(),
            "Document uploaded"
        );
        session.document = Some(document);
        Ok(format)
    }

    /// Generate notes for the stored document.
    ///
    /// On success the notes and a fresh two-turn chat are committed together;
    /// on failure the session is unchanged.
    #[instrument(skip(self, session), fields(session_id = %session.id()))]
    pub async fn generate(
        &self,
        session: &mut Session,
        style: NoteStyle,
    ) -> NotesResult<NotesDocument> {
        let document = session.document.as_ref().ok_or(NotesError::NoDocument)?;
        let notes = self.generate_notes(document, style).await?;

        let history = self.chat.start_session(&notes);
        session.notes = Some(notes.clone());
        session.history = Some(history);
        Ok(notes)
    }

    /// Answer a question about the session's current notes.
    #[instrument(skip(self, session, question), fields(session_id = %session.id()))]
    pub async fn ask(&self, session: &mut Session, question: &str) -> NotesResult<String> {
        let history = match (&session.notes, &session.history) {
            (Some(_), Some(history)) => history,
            _ => return Err(NotesError::NoActiveNotes),
        };

        let (updated, answer) = self.chat.ask(history, question).await?;
        session.history = Some(updated);
        Ok(answer)
    }

    /// First page of the stored PDF, rendered as PNG.
    pub async fn preview(&self, session: &Session) -> NotesResult<PageImage> {
        let document = session.document.as_ref().ok_or(NotesError::NoDocument)?;
        match document.format()? {
            DocumentFormat::Pdf => self
                .rasterizer
                .render_first_page(document.bytes())
                .await
                .map_err(|e| {
                    warn!(error = %e, "Preview rendering failed");
                    NotesError::preview_unavailable(format!("Could not render preview: {}", e))
                }),
            DocumentFormat::Pptx => Err(NotesError::preview_unavailable(
                "Preview not available for PowerPoint files",
            )),
        }
    }

    /// Extract and generate without touching any session.
    pub async fn generate_notes(
        &self,
        document: &UploadedDocument,
        style: NoteStyle,
    ) -> NotesResult<NotesDocument> {
        let extraction = self.pipeline.extract(document).await?;
        if extraction.failed {
            warn!(
                filename = document.filename(),
                method = %extraction.method,
                "All extraction strategies failed"
            );
        }
        self.generator.generate(&extraction, style).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenerationErrorKind;
    use crate::mock::ScriptedBackend;
    use crate::types::ChatState;
    use decknotes_extractors::testing::minimal_pptx;
    use decknotes_extractors::{ExtractionMethod, RasterConfig};

    fn assistant(backend: &ScriptedBackend) -> Assistant {
        let raster = RasterConfig {
            binary: "/nonexistent/decknotes/pdftoppm".into(),
            ..RasterConfig::default()
        };
        let config = NotesConfig::builder().raster(raster).build();
        Assistant::from_config(&config, Arc::new(backend.clone()))
    }

    fn deck() -> UploadedDocument {
        UploadedDocument::new(
            "lecture.pptx",
            minimal_pptx(&[&["Quarterly Review", "Revenue grew 20%"], &["Next steps"]]),
        )
    }

    #[tokio::test]
    async fn test_ask_without_notes_is_no_active_notes() {
        let backend = ScriptedBackend::new();
        let assistant = assistant(&backend);
        let mut session = Session::new();

        let result = assistant.ask(&mut session, "What is this about?").await;
        assert!(matches!(result, Err(NotesError::NoActiveNotes)));
        assert!(session.history().is_none());
        assert_eq!(backend.request_count(), 0);
    }

    #[tokio::test]
    async fn test_unsupported_upload_rejected_before_backend() {
        let backend = ScriptedBackend::new();
        let assistant = assistant(&backend);
        let mut session = Session::new();

        let result = assistant.upload(
            &mut session,
            UploadedDocument::new("notes.txt", b"plain text".to_vec()),
        );
        assert!(matches!(result, Err(NotesError::UnsupportedFormat { .. })));
        assert!(session.document().is_none());
        assert_eq!(backend.request_count(), 0);
    }

    #[tokio::test]
    async fn test_generate_without_document() {
        let backend = ScriptedBackend::new();
        let assistant = assistant(&backend);
        let mut session = Session::new();

        let result = assistant.generate(&mut session, NoteStyle::Official).await;
        assert!(matches!(result, Err(NotesError::NoDocument)));
    }

    #[tokio::test]
    async fn test_generate_commits_notes_and_seed() {
        let backend = ScriptedBackend::new().with_reply("# Summary");
        let assistant = assistant(&backend);
        let mut session = Session::new();

        assistant.upload(&mut session, deck()).unwrap();
        let notes = assistant
            .generate(&mut session, NoteStyle::English)
            .await
            .unwrap();

        assert_eq!(notes.method, ExtractionMethod::SlideTextExtractor);
        assert_eq!(session.notes().unwrap().content, "# Summary");
        assert_eq!(session.chat_state(), ChatState::Seeded);

        let request = backend.last_request().unwrap();
        let text = request[0].parts[0].as_text().unwrap();
        assert!(text.contains("Revenue grew 20%"));
    }

    #[tokio::test]
    async fn test_new_notes_reset_chat_to_seed() {
        let backend = ScriptedBackend::new()
            .with_reply("first notes")
            .with_reply("answer")
            .with_reply("second notes");
        let assistant = assistant(&backend);
        let mut session = Session::new();

        assistant.upload(&mut session, deck()).unwrap();
        assistant.generate(&mut session, NoteStyle::Official).await.unwrap();
        assistant.ask(&mut session, "Why?").await.unwrap();
        assert_eq!(session.history().unwrap().len(), 4);
        assert_eq!(session.chat_state(), ChatState::Active);

        assistant.generate(&mut session, NoteStyle::Hinglish).await.unwrap();
        let history = session.history().unwrap();
        assert_eq!(history.len(), 2);
        assert!(history.turns()[0].content.contains("second notes"));
        assert_eq!(session.notes().unwrap().style, NoteStyle::Hinglish);
    }

    #[tokio::test]
    async fn test_failed_generation_leaves_session_unchanged() {
        let backend = ScriptedBackend::new()
            .with_reply("first notes")
            .with_error(GenerationErrorKind::RateLimited, "quota");
        let assistant = assistant(&backend);
        let mut session = Session::new();

        assistant.upload(&mut session, deck()).unwrap();
        assistant.generate(&mut session, NoteStyle::Official).await.unwrap();

        let result = assistant.generate(&mut session, NoteStyle::English).await;
        assert!(matches!(result, Err(NotesError::GenerationFailed { .. })));
        assert_eq!(session.notes().unwrap().content, "first notes");
        assert_eq!(session.notes().unwrap().style, NoteStyle::Official);
        assert_eq!(session.chat_state(), ChatState::Seeded);
    }

    #[tokio::test]
    async fn test_failed_ask_keeps_history() {
        let backend = ScriptedBackend::new()
            .with_reply("notes")
            .with_error(GenerationErrorKind::Unavailable, "down");
        let assistant = assistant(&backend);
        let mut session = Session::new();

        assistant.upload(&mut session, deck()).unwrap();
        assistant.generate(&mut session, NoteStyle::Official).await.unwrap();
        let before = session.history().cloned();

        assert!(assistant.ask(&mut session, "q").await.is_err());
        assert_eq!(session.history().cloned(), before);
    }

    #[tokio::test]
    async fn test_preview_unavailable_for_pptx() {
        let backend = ScriptedBackend::new();
        let assistant = assistant(&backend);
        let mut session = Session::new();

        assert!(matches!(
            assistant.preview(&session).await,
            Err(NotesError::NoDocument)
        ));

        assistant.upload(&mut session, deck()).unwrap();
        assert!(matches!(
            assistant.preview(&session).await,
            Err(NotesError::PreviewUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_preview_unavailable_when_render_fails() {
        let backend = ScriptedBackend::new();
        let assistant = assistant(&backend);
        let mut session = Session::new();

        assistant
            .upload(
                &mut session,
                UploadedDocument::new("paper.pdf", b"%PDF-1.4 broken".to_vec()),
            )
            .unwrap();
        assert!(matches!(
            assistant.preview(&session).await,
            Err(NotesError::PreviewUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_upload_replaces_document_but_keeps_notes() {
        let backend = ScriptedBackend::new().with_reply("notes");
        let assistant = assistant(&backend);
        let mut session = Session::new();

        assistant.upload(&mut session, deck()).unwrap();
        assistant.generate(&mut session, NoteStyle::Official).await.unwrap();

        let format = assistant
            .upload(
                &mut session,
                UploadedDocument::new("paper.pdf", b"%PDF-1.4".to_vec()),
            )
            .unwrap();
        assert_eq!(format, DocumentFormat::Pdf);
        assert_eq!(session.document().unwrap().filename(), "paper.pdf");
        assert!(session.notes().is_some());
        assert_eq!(session.chat_state(), ChatState::Seeded);
    }
}
