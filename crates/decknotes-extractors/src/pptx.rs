//! PPTX slide text extraction using zip + quick-xml.
//!
//! Slides are ordered by the presentation's `sldIdLst`, resolved through
//! `ppt/_rels/presentation.xml.rels`. Packages without a usable slide list
//! fall back to numeric `slideN.xml` order.

use std::collections::HashMap;
use std::io::{Cursor, Read};

use async_trait::async_trait;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;
use zip::ZipArchive;

use crate::error::{ExtractError, ExtractResult};
use crate::types::{DocumentFormat, ExtractionMethod, ExtractionResult, UploadedDocument};
use crate::{slide_marker, ExtractionStrategy};

const PRESENTATION_PART: &str = "ppt/presentation.xml";
const PRESENTATION_RELS_PART: &str = "ppt/_rels/presentation.xml.rels";
const SLIDE_REL_TYPE_SUFFIX: &str = "/slide";

type Archive = ZipArchive<Cursor<Vec<u8>>>;

/// Concatenates the text of every text-bearing shape, slide by slide.
#[derive(Debug, Clone, Default)]
pub struct SlideTextExtractor;

impl SlideTextExtractor {
    /// Create a new slide text extractor.
    pub fn new() -> Self {
        Self
    }

    /// Extract synchronously (called within spawn_blocking).
    fn extract_sync(content: Vec<u8>) -> ExtractResult<(String, usize)> {
        let mut archive = ZipArchive::new(Cursor::new(content))
            .map_err(|e| ExtractError::Pptx(format!("Failed to open package: {}", e)))?;

        let slides = slide_order(&mut archive)?;
        let mut text = String::new();
        for (index, part) in slides.iter().enumerate() {
            let xml = read_part(&mut archive, part)?;
            text.push_str(&slide_marker(index + 1));
            for shape in shape_texts(&xml)? {
                text.push_str(&shape);
                text.push('\n');
            }
        }
        Ok((text, slides.len()))
    }
}

#[async_trait]
impl ExtractionStrategy for SlideTextExtractor {
    async fn extract(&self, document: &UploadedDocument) -> ExtractResult<ExtractionResult> {
        let content = document.bytes().to_vec();
        let (text, slides) =
            tokio::task::spawn_blocking(move || Self::extract_sync(content)).await??;

        debug!(slides, chars = text.len(), "Extracted slide text");
        Ok(ExtractionResult::text(text, self.method()).with_page_count(slides))
    }

    fn supported_formats(&self) -> &[DocumentFormat] {
        &[DocumentFormat::Pptx]
    }

    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::SlideTextExtractor
    }

    fn name(&self) -> &str {
        "pptx-slides"
    }
}

fn has_part(archive: &Archive, name: &str) -> bool {
    archive.file_names().any(|n| n == name)
}

fn read_part(archive: &mut Archive, name: &str) -> ExtractResult<String> {
    let mut file = archive
        .by_name(name)
        .map_err(|e| ExtractError::Pptx(format!("Missing part {}: {}", name, e)))?;
    let mut xml = String::new();
    file.read_to_string(&mut xml)?;
    Ok(xml)
}

/// Slide part names in presentation order.
fn slide_order(archive: &mut Archive) -> ExtractResult<Vec<String>> {
    let declared = if has_part(archive, PRESENTATION_PART)
        && has_part(archive, PRESENTATION_RELS_PART)
    {
        let presentation = read_part(archive, PRESENTATION_PART)?;
        let rels = read_part(archive, PRESENTATION_RELS_PART)?;
        let targets = slide_relationships(&rels)?;
        slide_ids(&presentation)?
            .into_iter()
            .filter_map(|rid| targets.get(&rid).cloned())
            .filter(|part| has_part(archive, part))
            .collect::<Vec<_>>()
    } else {
        Vec::new()
    };

    if !declared.is_empty() {
        return Ok(declared);
    }

    let mut numbered: Vec<(usize, String)> = archive
        .file_names()
        .filter_map(|name| slide_number(name).map(|n| (n, name.to_string())))
        .collect();
    numbered.sort_by_key(|(n, _)| *n);
    Ok(numbered.into_iter().map(|(_, name)| name).collect())
}

/// `ppt/slides/slide12.xml` → 12.
fn slide_number(part: &str) -> Option<usize> {
    part.strip_prefix("ppt/slides/slide")?
        .strip_suffix(".xml")?
        .parse()
        .ok()
}

/// Relationship id → absolute part name, for slide relationships only.
fn slide_relationships(rels_xml: &str) -> ExtractResult<HashMap<String, String>> {
    let mut reader = Reader::from_str(rels_xml);
    let mut targets = HashMap::new();
    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                let id = attribute(&e, b"Id", false);
                let target = attribute(&e, b"Target", false);
                let kind = attribute(&e, b"Type", false).unwrap_or_default();
                if let (Some(id), Some(target)) = (id, target) {
                    if kind.ends_with(SLIDE_REL_TYPE_SUFFIX) {
                        targets.insert(id, resolve_target(&target));
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(targets)
}

/// Relationship ids from `p:sldIdLst`, in order.
fn slide_ids(presentation_xml: &str) -> ExtractResult<Vec<String>> {
    let mut reader = Reader::from_str(presentation_xml);
    let mut ids = Vec::new();
    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sldId" => {
                if let Some(rid) = attribute(&e, b"id", true) {
                    ids.push(rid);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(ids)
}

/// Targets are relative to `ppt/` unless absolute.
fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("ppt/{}", target.trim_start_matches("./")),
    }
}

fn attribute(element: &BytesStart<'_>, local_name: &[u8], prefixed: bool) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|attr| {
            attr.key.local_name().as_ref() == local_name && attr.key.prefix().is_some() == prefixed
        })
        .map(|attr| String::from_utf8_lossy(&attr.value).into_owned())
}

fn xml_error(err: quick_xml::Error) -> ExtractError {
    ExtractError::Pptx(format!("Malformed XML: {}", err))
}

#[derive(Default)]
struct ShapeText {
    paragraphs: Vec<String>,
    current: Option<String>,
}

/// Soft line break (`a:br`) inside a paragraph, kept distinct from the
/// paragraph separator.
const LINE_BREAK: char = '\u{000B}';

/// Text of each top-level `p:sp` in a slide, paragraphs joined by `\n`.
///
/// Every top-level shape yields one entry, empty when it has no text body.
/// Shapes nested in groups, pictures, tables and connectors expose no text
/// of their own and are skipped.
pub(crate) fn shape_texts(slide_xml: &str) -> ExtractResult<Vec<String>> {
    let mut reader = Reader::from_str(slide_xml);
    let mut depth = 0usize;
    let mut tree_depth: Option<usize> = None;
    let mut shape: Option<(usize, ShapeText)> = None;
    let mut in_text_run = false;
    let mut shapes = Vec::new();

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) => {
                depth += 1;
                match e.local_name().as_ref() {
                    b"spTree" if tree_depth.is_none() => tree_depth = Some(depth),
                    b"sp" if shape.is_none() && tree_depth.map(|d| d + 1) == Some(depth) => {
                        shape = Some((depth, ShapeText::default()));
                    }
                    b"p" => {
                        if let Some((_, s)) = shape.as_mut() {
                            s.current = Some(String::new());
                        }
                    }
                    b"t" => in_text_run = shape.is_some(),
                    _ => {}
                }
            }
            Event::Empty(e) => match (e.local_name().as_ref(), shape.as_mut()) {
                (b"sp", None) if tree_depth == Some(depth) => {
                    shapes.push(String::new());
                }
                (b"br", Some((_, s))) => {
                    if let Some(p) = s.current.as_mut() {
                        p.push(LINE_BREAK);
                    }
                }
                (b"p", Some((_, s))) => s.paragraphs.push(String::new()),
                _ => {}
            },
            Event::Text(t) if in_text_run => {
                let text = t.unescape().map_err(xml_error)?;
                if let Some((_, s)) = shape.as_mut() {
                    if let Some(p) = s.current.as_mut() {
                        p.push_str(&text);
                    }
                }
            }
            Event::CData(t) if in_text_run => {
                if let Some((_, s)) = shape.as_mut() {
                    if let Some(p) = s.current.as_mut() {
                        p.push_str(&String::from_utf8_lossy(&t));
                    }
                }
            }
            Event::End(e) => {
                match e.local_name().as_ref() {
                    b"t" => in_text_run = false,
                    b"p" => {
                        if let Some((_, s)) = shape.as_mut() {
                            if let Some(p) = s.current.take() {
                                s.paragraphs.push(p);
                            }
                        }
                    }
                    b"sp" if shape.as_ref().map(|(d, _)| *d) == Some(depth) => {
                        if let Some((_, s)) = shape.take() {
                            shapes.push(s.paragraphs.join("\n"));
                        }
                    }
                    b"spTree" if tree_depth == Some(depth) => break,
                    _ => {}
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(shapes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::minimal_pptx;

    const NS: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;

    fn slide(body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><p:sld {}><p:cSld><p:spTree><p:nvGrpSpPr/><p:grpSpPr/>{}</p:spTree></p:cSld></p:sld>"#,
            NS, body
        )
    }

    #[test]
    fn test_shape_texts_paragraphs_and_runs() {
        let xml = slide(
            r#"<p:sp><p:txBody><a:bodyPr/><a:p><a:r><a:t>Revenue </a:t></a:r><a:r><a:t>grew 20%</a:t></a:r></a:p><a:p><a:r><a:t>Costs fell</a:t></a:r></a:p></p:txBody></p:sp>"#,
        );
        let shapes = shape_texts(&xml).unwrap();
        assert_eq!(shapes, vec!["Revenue grew 20%\nCosts fell".to_string()]);
    }

    #[test]
    fn test_shape_texts_skips_pictures_and_groups() {
        let xml = slide(
            r#"<p:sp><p:txBody><a:p><a:r><a:t>Title</a:t></a:r></a:p></p:txBody></p:sp><p:pic><p:nvPicPr/></p:pic><p:grpSp><p:sp><p:txBody><a:p><a:r><a:t>Nested</a:t></a:r></a:p></p:txBody></p:sp></p:grpSp><p:sp><p:spPr/></p:sp>"#,
        );
        let shapes = shape_texts(&xml).unwrap();
        assert_eq!(shapes, vec!["Title".to_string(), String::new()]);
    }

    #[test]
    fn test_shape_texts_unescapes_entities() {
        let xml = slide(
            r#"<p:sp><p:txBody><a:p><a:r><a:t>R&amp;D &lt; 5%</a:t></a:r><a:br/><a:r><a:t>next</a:t></a:r></a:p></p:txBody></p:sp>"#,
        );
        let shapes = shape_texts(&xml).unwrap();
        assert_eq!(shapes, vec!["R&D < 5%\u{000B}next".to_string()]);
    }

    #[test]
    fn test_shape_texts_keeps_empty_shapes_in_order() {
        let xml = slide(
            r#"<p:sp/><p:sp><p:txBody><a:p><a:r><a:t>Body</a:t></a:r></a:p></p:txBody></p:sp><p:grpSp><p:sp/></p:grpSp>"#,
        );
        let shapes = shape_texts(&xml).unwrap();
        assert_eq!(shapes, vec![String::new(), "Body".to_string()]);
    }

    #[test]
    fn test_slide_number() {
        assert_eq!(slide_number("ppt/slides/slide12.xml"), Some(12));
        assert_eq!(slide_number("ppt/slides/_rels/slide1.xml.rels"), None);
        assert_eq!(slide_number("ppt/slideLayouts/slideLayout1.xml"), None);
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(resolve_target("slides/slide1.xml"), "ppt/slides/slide1.xml");
        assert_eq!(resolve_target("/ppt/slides/slide2.xml"), "ppt/slides/slide2.xml");
    }

    #[tokio::test]
    async fn test_extract_two_slide_deck() {
        let deck = minimal_pptx(&[&["Revenue grew 20%"], &[]]);
        let document = UploadedDocument::new("results.pptx", deck);

        let result = SlideTextExtractor::new().extract(&document).await.unwrap();
        assert_eq!(result.method, ExtractionMethod::SlideTextExtractor);
        assert_eq!(result.page_count, Some(2));

        let text = result.content().unwrap();
        let slide1 = text.find("--- Slide 1 ---").unwrap();
        let revenue = text.find("Revenue grew 20%").unwrap();
        let slide2 = text.find("--- Slide 2 ---").unwrap();
        assert!(slide1 < revenue && revenue < slide2);
        assert_eq!(text.matches("--- Slide ").count(), 2);
    }

    #[tokio::test]
    async fn test_slide_order_follows_presentation_list() {
        // Slide list declares slide 3 first, then slide 1, then slide 2.
        let deck = crate::testing::pptx_with_order(
            &[("First", 1), ("Second", 2), ("Third", 3)],
            &[3, 1, 2],
        );
        let document = UploadedDocument::new("ordered.pptx", deck);

        let result = SlideTextExtractor::new().extract(&document).await.unwrap();
        let text = result.content().unwrap();
        let third = text.find("Third").unwrap();
        let first = text.find("First").unwrap();
        let second = text.find("Second").unwrap();
        assert!(third < first && first < second);
    }

    #[tokio::test]
    async fn test_shapes_keep_document_order() {
        let deck = minimal_pptx(&[&["Heading", "Body one", "Body two"]]);
        let document = UploadedDocument::new("order.pptx", deck);

        let result = SlideTextExtractor::new().extract(&document).await.unwrap();
        let text = result.content().unwrap();
        assert!(text.contains("Heading\nBody one\nBody two\n"));
    }

    #[tokio::test]
    async fn test_not_a_zip_is_an_error() {
        let document = UploadedDocument::new("broken.pptx", b"not a zip".to_vec());
        let result = SlideTextExtractor::new().extract(&document).await;
        assert!(matches!(result, Err(ExtractError::Pptx(_))));
    }
}
