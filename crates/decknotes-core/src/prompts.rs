//! Prompt templates for notes generation and chat.
//!
//! The three style templates are passed to the backend verbatim and double as
//! the acceptance criteria for generated notes.

use decknotes_extractors::{ExtractionMethod, ExtractionResult};

use crate::types::NoteStyle;

const OFFICIAL_NOTES_PROMPT: &str = r#"You are a professional document-analysis assistant specializing in key information extraction. Analyze the provided PDF and generate concise, structured official notes that highlight ALL the most important keywords, terms, and sentences. Your notes must:

1. **Tone & Style**
   • Formal, precise, and professional
   • Academic/business style with specialized terminology preserved exactly as written
   • Use complete sentences with proper grammar

2. **Structure**
   • Begin with a one-paragraph "Executive Summary" capturing the document's main purpose and key findings
   • Organize content under clear hierarchical headings that match the document's structure
   • Use numbered lists for processes/sequences, bullet points for discrete facts
   • Include page references in [brackets] for important information

3. **Content Requirements**
   • Extract and highlight ALL key terms, definitions, and technical vocabulary (in **bold**)
   • Include critical sentences verbatim where they contain essential information
   • Preserve important numerical data, statistics, and measurements exactly as presented
   • Identify and highlight main arguments, evidence, and conclusions
   • Note any actionable items, recommendations, or future directions

4. **Emphasis**
   • **Bold** all key terms, crucial phrases, and technical vocabulary
   • Underline or quote particularly important complete sentences
   • Maintain the hierarchical relationship between concepts

5. **Length & Completeness**
   • 300-500 words total (comprehensive but concise)
   • Ensure ALL major concepts and terms are included, even if brief
   • Prioritize breadth of coverage over depth of explanation

Produce the output as markdown text with appropriate formatting for headings, lists, and emphasis. Focus on creating a professional reference document that captures ALL essential information."#;

const ENGLISH_NOTES_PROMPT: &str = r#"You are an expert document summarizer specializing in extracting key information in plain language. Analyze the provided PDF and generate clear, accessible English notes that capture ALL important concepts, terms, and sentences. Your notes must:

1. **Tone & Style**
   • Conversational and easy to understand for general audiences
   • Explain technical concepts in simple terms but preserve important terminology
   • Use short, direct sentences with clear meaning

2. **Structure**
   • Begin with a brief "Overview" (2-3 sentences) capturing the main purpose and takeaways
   • Organize under simple, descriptive headings that guide the reader
   • Use bullet points extensively to break down complex ideas
   • Number any steps, processes, or sequences

3. **Content Requirements**
   • Identify and **bold** ALL key terms, technical vocabulary, and specialized concepts
   • Extract important complete sentences that contain critical information (in "quotes")
   • Simplify complex ideas without losing essential meaning
   • Include any important numbers, measurements, or data points
   • Highlight practical applications or real-world implications

4. **Emphasis**
   • **Bold** important terms and phrases throughout
   • Place particularly important sentences in "quotes"
   • Use simple formatting to visually separate different types of information

5. **Length & Comprehensiveness**
   • 250-400 words (concise but thorough)
   • Cover ALL major points from the document
   • Prioritize breadth to ensure nothing important is missed

Produce the output as markdown text with appropriate formatting for headings, bullets, and emphasis. Focus on making the information accessible while ensuring ALL key words and important sentences are preserved."#;

const HINGLISH_NOTES_PROMPT: &str = r#"You are a friendly document summarizer specializing in creating accessible notes in mixed Hindi-English (Hinglish). Analyze the provided PDF and create notes that capture ALL important keywords, concepts and sentences in simple Hinglish using Roman script only. Your notes must:

1. **Tone & Style**
   • Conversational, simple, and friendly - jaise dost se baat kar rahe ho
   • Use a natural mix of Hindi and English - kuch technical terms English mein rakho
   • Short sentences and simple structure for easy understanding

2. **Structure**
   • "Overview" section mein 2-3 lines mein document ka main point batao
   • Simple headings jo content ko categorize karein
   • Har important point ko bullet points mein break karo
   • Steps ya process ko number karo

3. **Content Requirements**
   • Har **important keyword aur technical term ko bold** karo
   • Critical sentences ko "quotes" mein rakho, unki importance highlight karne ke liye
   • Difficult concepts ko everyday examples se explain karo
   • Important numbers, dates ya statistics ko exactly preserve karo
   • Document ke har major section se key points extract karo

4. **Emphasis**
   • Important terms ko **bold** karo
   • Bahut important sentences ko "quotes" mein rakho
   • Different types of information ko visually separate karo

5. **Length & Completeness**
   • 250-400 words (concise par thorough)
   • Document ke SABHI major points cover karo
   • Har important keyword aur concept include karo

Notes ko markdown text format mein banao with proper formatting for headings, bullets, and emphasis. Focus on making information accessible while ensuring ALL key terms and important sentences are preserved."#;

/// Appended to text requests when extraction produced nothing usable.
pub const EXTRACTION_FAILED_NOTICE: &str = "\n\nNOTE: The document extraction failed. Please acknowledge this in your notes and explain what information is missing.";

/// Model half of the chat seed.
pub const SEED_MODEL_REPLY: &str = "Understood, I can answer questions about these notes.";

const FAILURE_WARNING: &str =
    "WARNING: The extraction process had issues. Create notes based on what information is available.";

const DEGRADED_NOTE: &str = "NOTE: The primary extraction method was unavailable, so this content comes from a fallback method and may be incomplete.";

const ANALYSIS_INSTRUCTIONS: &str = "Please analyze the content thoroughly and extract ALL important information,
focusing on key terms, important sentences, and main concepts.
Ensure your notes are comprehensive but concise, and highlight the most critical information.";

/// Instruction template for a note style.
pub fn compose_prompt(style: NoteStyle) -> &'static str {
    match style {
        NoteStyle::Official => OFFICIAL_NOTES_PROMPT,
        NoteStyle::English => ENGLISH_NOTES_PROMPT,
        NoteStyle::Hinglish => HINGLISH_NOTES_PROMPT,
    }
}

/// User half of the chat seed.
pub fn seed_user_turn(notes: &str) -> String {
    format!("Here are the notes from the document: {}", notes)
}

/// Human-readable name of an extraction method.
pub fn method_description(method: ExtractionMethod) -> &'static str {
    match method {
        ExtractionMethod::PrimaryRasterizer => "page rendering (pdftoppm)",
        ExtractionMethod::FallbackTextExtractor => "PDF text-layer extraction",
        ExtractionMethod::SlideTextExtractor => "PPTX slide text extraction",
    }
}

/// Context message describing how the content was obtained.
///
/// `images_attached` is the number of page images sent with the request; when
/// non-zero the message states how many of the document's pages are attached.
pub fn context_message(extraction: &ExtractionResult, images_attached: usize) -> String {
    let mut lines = vec![format!(
        "This is a document that has been processed using {} [{}].",
        method_description(extraction.method),
        extraction.method
    )];

    if extraction.failed {
        lines.push(FAILURE_WARNING.to_string());
    } else if extraction.degraded {
        lines.push(DEGRADED_NOTE.to_string());
    }

    if images_attached > 0 {
        let total = extraction
            .page_count
            .or_else(|| extraction.pages().map(|p| p.len()))
            .unwrap_or(images_attached);
        if images_attached < total {
            lines.push(format!(
                "The document contains {} pages; the first {} are attached as images.",
                total, images_attached
            ));
        } else {
            lines.push(format!(
                "The document contains {} pages, all attached as images.",
                total
            ));
        }
    }

    lines.push(ANALYSIS_INSTRUCTIONS.to_string());
    lines.join("\n")
}

/// Single text request for a text extraction.
pub fn text_request(style: NoteStyle, extraction: &ExtractionResult, text: &str) -> String {
    let mut request = format!(
        "{}\n\n{}\n\nDocument content:\n{}",
        compose_prompt(style),
        context_message(extraction, 0),
        text
    );
    if extraction.failed || text.trim().is_empty() {
        request.push_str(EXTRACTION_FAILED_NOTICE);
    }
    request
}
