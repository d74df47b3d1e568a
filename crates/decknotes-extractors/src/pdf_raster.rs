//! PDF page rendering through poppler's `pdftoppm`.
//!
//! Pipeline: stage the upload in a temp dir → `pdftoppm -png -r <dpi> -cropbox`
//! → collect `page-N.png` files in page order → decode and flatten alpha.
//! The staging directory is removed when the call returns, on every path.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};
use tempfile::TempDir;
use tokio::process::Command;
use tracing::debug;

use crate::error::{ExtractError, ExtractResult};
use crate::types::{DocumentFormat, ExtractionMethod, ExtractionResult, PageImage, UploadedDocument};
use crate::ExtractionStrategy;

const PAGE_PREFIX: &str = "page";

/// Configuration for page rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterConfig {
    /// `pdftoppm` executable (name on PATH or absolute path).
    pub binary: PathBuf,
    /// Render resolution in dots per inch.
    pub dpi: u32,
    /// Upper bound on one `pdftoppm` run.
    pub timeout_secs: u64,
    /// Parent directory for staging files; system temp dir when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staging_dir: Option<PathBuf>,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("pdftoppm"),
            dpi: 200,
            timeout_secs: 120,
            staging_dir: None,
        }
    }
}

/// Renders every PDF page to a PNG image.
#[derive(Debug, Clone, Default)]
pub struct PdfRasterizer {
    config: RasterConfig,
}

impl PdfRasterizer {
    /// Create a rasterizer with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a rasterizer with custom settings.
    pub fn with_config(config: RasterConfig) -> Self {
        Self { config }
    }

    /// Current configuration.
    pub fn config(&self) -> &RasterConfig {
        &self.config
    }

    /// Render only the first page (document preview).
    pub async fn render_first_page(&self, pdf: &[u8]) -> ExtractResult<PageImage> {
        let mut pages = self.render(pdf, Some((1, 1))).await?;
        if pages.is_empty() {
            return Err(ExtractError::Rasterizer(
                "No preview page rendered".to_string(),
            ));
        }
        Ok(pages.swap_remove(0))
    }

    /// Render all pages, or the inclusive 1-based `range`.
    pub async fn render(
        &self,
        pdf: &[u8],
        range: Option<(usize, usize)>,
    ) -> ExtractResult<Vec<PageImage>> {
        if pdf.is_empty() {
            return Err(ExtractError::Rasterizer(
                "Document stream is empty".to_string(),
            ));
        }

        let staging = self.staging_dir()?;
        let input = staging.path().join("input.pdf");
        tokio::fs::write(&input, pdf).await?;
        let prefix = staging.path().join(PAGE_PREFIX);

        let mut cmd = Command::new(&self.config.binary);
        cmd.arg("-png")
            .arg("-r")
            .arg(self.config.dpi.to_string())
            .arg("-cropbox");
        if let Some((first, last)) = range {
            cmd.arg("-f")
                .arg(first.to_string())
                .arg("-l")
                .arg(last.to_string());
        }
        cmd.arg(&input).arg(&prefix).kill_on_drop(true);

        debug!(
            binary = %self.config.binary.display(),
            dpi = self.config.dpi,
            bytes = pdf.len(),
            "Rendering PDF pages"
        );

        let output = tokio::time::timeout(Duration::from_secs(self.config.timeout_secs), cmd.output())
            .await
            .map_err(|_| {
                ExtractError::Rasterizer(format!(
                    "pdftoppm timed out after {}s",
                    self.config.timeout_secs
                ))
            })?
            .map_err(|e| {
                ExtractError::Rasterizer(format!(
                    "Failed to run {}: {}",
                    self.config.binary.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractError::Rasterizer(format!(
                "pdftoppm failed ({}): {}",
                output.status,
                stderr.trim()
            )));
        }

        let rendered = collect_rendered_pages(staging.path())?;
        if rendered.is_empty() {
            return Err(ExtractError::Rasterizer(
                "No images extracted from PDF. The document may be empty or corrupted."
                    .to_string(),
            ));
        }

        let mut files = Vec::with_capacity(rendered.len());
        for (page_number, path) in rendered {
            files.push((page_number, tokio::fs::read(&path).await?));
        }

        let pages = tokio::task::spawn_blocking(move || {
            files
                .into_iter()
                .map(|(page_number, bytes)| normalize_page(page_number, bytes))
                .collect::<ExtractResult<Vec<_>>>()
        })
        .await??;

        debug!(pages = pages.len(), "Rendered PDF pages");
        Ok(pages)
    }

    fn staging_dir(&self) -> ExtractResult<TempDir> {
        let builder = {
            let mut b = tempfile::Builder::new();
            b.prefix("decknotes-raster-");
            b
        };
        let dir = match &self.config.staging_dir {
            Some(parent) => builder.tempdir_in(parent)?,
            None => builder.tempdir()?,
        };
        Ok(dir)
    }
}

#[async_trait]
impl ExtractionStrategy for PdfRasterizer {
    async fn extract(&self, document: &UploadedDocument) -> ExtractResult<ExtractionResult> {
        let pages = self.render(document.bytes(), None).await?;
        Ok(ExtractionResult::images(pages, self.method()))
    }

    fn supported_formats(&self) -> &[DocumentFormat] {
        &[DocumentFormat::Pdf]
    }

    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::PrimaryRasterizer
    }

    fn name(&self) -> &str {
        "pdftoppm"
    }
}

/// Find `page-N.png` outputs and order them by page number.
fn collect_rendered_pages(dir: &Path) -> ExtractResult<Vec<(usize, PathBuf)>> {
    let mut pages = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("png") {
            continue;
        }
        if let Some(number) = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(page_number_from_stem)
        {
            pages.push((number, path));
        }
    }
    pages.sort_by_key(|(number, _)| *number);
    Ok(pages)
}

/// `page-07` → 7. pdftoppm zero-pads to the width of the page count.
fn page_number_from_stem(stem: &str) -> Option<usize> {
    let (prefix, number) = stem.rsplit_once('-')?;
    if prefix != PAGE_PREFIX {
        return None;
    }
    number.parse().ok()
}

/// Decode a rendered page and drop any alpha channel.
fn normalize_page(page_number: usize, bytes: Vec<u8>) -> ExtractResult<PageImage> {
    let img = image::load_from_memory_with_format(&bytes, ImageFormat::Png)
        .map_err(|e| ExtractError::Image(format!("page {}: {}", page_number, e)))?;
    let (width, height) = (img.width(), img.height());

    let data = if img.color().has_alpha() {
        let opaque = DynamicImage::ImageRgb8(img.to_rgb8());
        let mut buf = Vec::new();
        opaque
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .map_err(|e| ExtractError::Image(format!("page {}: {}", page_number, e)))?;
        buf
    } else {
        bytes
    };

    Ok(PageImage {
        page_number,
        mime_type: "image/png".to_string(),
        data,
        width,
        height,
    })
}
