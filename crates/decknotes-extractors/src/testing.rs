//! Document fixtures for tests.
//!
//! Builds small but well-formed PDF and PPTX files in memory so tests do not
//! depend on binary files checked into the repository.

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// One page of a generated PDF.
#[derive(Debug, Clone, Copy)]
pub struct FixturePage<'a> {
    /// Text drawn near the top left; empty for no text layer.
    pub text: &'a str,
    /// MediaBox width and height in points.
    pub media_box: (u32, u32),
    /// Optional CropBox width and height in points, anchored at the origin.
    pub crop_box: Option<(u32, u32)>,
}

impl<'a> FixturePage<'a> {
    /// US Letter page showing `text`.
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            media_box: (612, 792),
            crop_box: None,
        }
    }

    /// Set the MediaBox size.
    pub fn media_box(mut self, width: u32, height: u32) -> Self {
        self.media_box = (width, height);
        self
    }

    /// Set the CropBox size.
    pub fn crop_box(mut self, width: u32, height: u32) -> Self {
        self.crop_box = Some((width, height));
        self
    }
}

/// A PDF with one Letter page per entry, each showing its text in Helvetica.
/// Empty entries produce pages without a text layer.
pub fn minimal_pdf(pages: &[&str]) -> Vec<u8> {
    let pages: Vec<FixturePage<'_>> = pages.iter().map(|text| FixturePage::new(text)).collect();
    pdf_with_pages(&pages)
}

/// A PDF built from explicit page descriptions.
pub fn pdf_with_pages(pages: &[FixturePage<'_>]) -> Vec<u8> {
    let page_count = pages.len();
    // 1: catalog, 2: pages, 3: font, then (page, contents) pairs.
    let mut objects: Vec<String> = Vec::with_capacity(3 + page_count * 2);
    objects.push("<< /Type /Catalog /Pages 2 0 R >>".to_string());

    let kids = (0..page_count)
        .map(|i| format!("{} 0 R", 4 + i * 2))
        .collect::<Vec<_>>()
        .join(" ");
    objects.push(format!(
        "<< /Type /Pages /Kids [{}] /Count {} >>",
        kids, page_count
    ));
    objects.push(
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_string(),
    );

    for (i, page) in pages.iter().enumerate() {
        let contents_id = 5 + i * 2;
        let (width, height) = page.media_box;
        let crop = page
            .crop_box
            .map(|(w, h)| format!(" /CropBox [0 0 {} {}]", w, h))
            .unwrap_or_default();
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}]{} \
             /Resources << /Font << /F1 3 0 R >> >> /Contents {} 0 R >>",
            width, height, crop, contents_id
        ));
        let stream = if page.text.is_empty() {
            "q Q".to_string()
        } else {
            format!(
                "BT /F1 24 Tf 36 {} Td ({}) Tj ET",
                height.saturating_sub(60),
                escape_pdf_string(page.text)
            )
        };
        objects.push(format!(
            "<< /Length {} >>\nstream\n{}\nendstream",
            stream.len(),
            stream
        ));
    }

    let mut out = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
    }

    let xref_offset = out.len();
    let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for offset in offsets {
        xref.push_str(&format!("{:010} 00000 n \n", offset));
    }
    xref.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref_offset
    ));
    out.extend_from_slice(xref.as_bytes());
    out
}

fn escape_pdf_string(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('(', "\\(")
        .replace(')', "\\)")
}

/// A PPTX whose slides appear in list order, one text shape per entry.
pub fn minimal_pptx(slides: &[&[&str]]) -> Vec<u8> {
    let numbered: Vec<(Vec<&str>, usize)> = slides
        .iter()
        .enumerate()
        .map(|(i, shapes)| (shapes.to_vec(), i + 1))
        .collect();
    let order: Vec<usize> = (1..=slides.len()).collect();
    build_pptx(&numbered, &order)
}

/// A PPTX with single-shape slides stored as `slideN.xml` but listed in the
/// presentation in `order` (slide numbers).
pub fn pptx_with_order(slides: &[(&str, usize)], order: &[usize]) -> Vec<u8> {
    let numbered: Vec<(Vec<&str>, usize)> = slides
        .iter()
        .map(|(text, number)| (vec![*text], *number))
        .collect();
    build_pptx(&numbered, order)
}

const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_P: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const REL_SLIDE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";

fn build_pptx(slides: &[(Vec<&str>, usize)], order: &[usize]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    let mut content_types = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/>"#,
    );
    for (_, number) in slides {
        content_types.push_str(&format!(
            r#"<Override PartName="/ppt/slides/slide{}.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>"#,
            number
        ));
    }
    content_types.push_str("</Types>");
    write_part(&mut zip, options, "[Content_Types].xml", &content_types);

    let mut ids = String::new();
    for (i, number) in order.iter().enumerate() {
        ids.push_str(&format!(
            r#"<p:sldId id="{}" r:id="rId{}"/>"#,
            256 + i,
            number
        ));
    }
    let presentation = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:presentation xmlns:a="{}" xmlns:r="{}" xmlns:p="{}"><p:sldIdLst>{}</p:sldIdLst></p:presentation>"#,
        NS_A, NS_R, NS_P, ids
    );
    write_part(&mut zip, options, "ppt/presentation.xml", &presentation);

    let mut rels = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for (_, number) in slides {
        rels.push_str(&format!(
            r#"<Relationship Id="rId{0}" Type="{1}" Target="slides/slide{0}.xml"/>"#,
            number, REL_SLIDE
        ));
    }
    rels.push_str("</Relationships>");
    write_part(&mut zip, options, "ppt/_rels/presentation.xml.rels", &rels);

    for (shapes, number) in slides {
        let mut body = String::new();
        for (i, text) in shapes.iter().enumerate() {
            body.push_str(&format!(
                r#"<p:sp><p:nvSpPr><p:cNvPr id="{}" name="TextBox {}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:r><a:rPr lang="en-US"/><a:t>{}</a:t></a:r></a:p></p:txBody></p:sp>"#,
                i + 2,
                i + 1,
                escape_xml(text)
            ));
        }
        let slide = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:sld xmlns:a="{}" xmlns:r="{}" xmlns:p="{}"><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>{}</p:spTree></p:cSld></p:sld>"#,
            NS_A, NS_R, NS_P, body
        );
        write_part(
            &mut zip,
            options,
            &format!("ppt/slides/slide{}.xml", number),
            &slide,
        );
    }

    match zip.finish() {
        Ok(cursor) => cursor.into_inner(),
        Err(e) => panic!("failed to finish pptx fixture: {}", e),
    }
}

fn write_part(
    zip: &mut ZipWriter<Cursor<Vec<u8>>>,
    options: SimpleFileOptions,
    name: &str,
    content: &str,
) {
    if let Err(e) = zip
        .start_file(name, options)
        .map_err(|e| e.to_string())
        .and_then(|_| zip.write_all(content.as_bytes()).map_err(|e| e.to_string()))
    {
        panic!("failed to write fixture part {}: {}", name, e);
    }
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
