//! PDF access through the Poppler command-line tools.
//!
//! `pdfinfo` for page counts, `pdftotext` for the text layer, `pdftoppm` to
//! rasterize pages for OCR and `pdfimages` to pull the cover illustration.
//! Page numbers are 1-based throughout.

use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;

/// Resolution pages are rendered at for OCR.
pub const RENDER_DPI: u32 = 300;

/// Errors from running the PDF tools.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("External tool not found: {0}")]
    ToolNotFound(String),

    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Stdout of a finished command, or the matching error.
fn handle_cmd_output(
    result: std::io::Result<std::process::Output>,
    tool_name: &str,
    error_prefix: &str,
) -> Result<String, ExtractionError> {
    match result {
        Ok(output) if output.status.success() => {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        }
        Ok(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(ExtractionError::ExtractionFailed(format!(
                "{}: {}",
                error_prefix,
                stderr.trim()
            )))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ExtractionError::ToolNotFound(
            format!("{} (install poppler-utils)", tool_name),
        )),
        Err(e) => Err(ExtractionError::Io(e)),
    }
}

/// Number of pages, from the `Pages:` line of `pdfinfo`.
pub fn page_count(pdf: &Path) -> Result<u32, ExtractionError> {
    let output = Command::new("pdfinfo").arg(pdf).output();
    let stdout = handle_cmd_output(output, "pdfinfo", "pdfinfo failed")?;

    stdout
        .lines()
        .find(|line| line.starts_with("Pages:"))
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|n| n.parse().ok())
        .ok_or_else(|| ExtractionError::ExtractionFailed("pdfinfo reported no page count".into()))
}

/// Text layer of a single page.
pub fn page_text(pdf: &Path, page: u32) -> Result<String, ExtractionError> {
    let page_str = page.to_string();
    let output = Command::new("pdftotext")
        .args(["-enc", "UTF-8", "-f", &page_str, "-l", &page_str])
        .arg(pdf)
        .arg("-")
        .output();

    handle_cmd_output(
        output,
        "pdftotext",
        &format!("pdftotext failed on page {}", page),
    )
}

/// Rasterize one page to PNG inside `out_dir` and return the image path.
pub fn render_page(pdf: &Path, page: u32, out_dir: &Path) -> Result<PathBuf, ExtractionError> {
    let page_str = page.to_string();
    let dpi = RENDER_DPI.to_string();
    let output = Command::new("pdftoppm")
        .args(["-png", "-r", &dpi, "-f", &page_str, "-l", &page_str])
        .arg(pdf)
        .arg(out_dir.join("page"))
        .output();
    handle_cmd_output(output, "pdftoppm", "pdftoppm failed")?;

    find_page_image(out_dir, page).ok_or_else(|| {
        ExtractionError::ExtractionFailed(format!("pdftoppm produced no image for page {}", page))
    })
}

/// pdftoppm pads page numbers to the width of the page count.
fn find_page_image(dir: &Path, page: u32) -> Option<PathBuf> {
    [1, 2, 3, 4]
        .iter()
        .map(|width| dir.join(format!("page-{:0width$}.png", page, width = width)))
        .find(|p| p.exists())
}

/// One entry of `pdfimages -list`.
#[derive(Debug, Clone, PartialEq)]
pub struct PageImage {
    pub num: u32,
    pub width: u32,
    pub height: u32,
    pub x_ppi: f64,
    pub y_ppi: f64,
}

impl PageImage {
    pub fn pixel_area(&self) -> f64 {
        self.width as f64 * self.height as f64
    }

    pub fn has_ppi(&self) -> bool {
        self.x_ppi > 0.0 && self.y_ppi > 0.0
    }

    /// Size as drawn on the page, in square inches. Needs ppi.
    pub fn display_area(&self) -> f64 {
        self.pixel_area() / (self.x_ppi * self.y_ppi)
    }
}

/// Parse `pdfimages -list` output, keeping drawn images (not masks).
pub fn parse_image_list(listing: &str) -> Vec<PageImage> {
    listing
        .lines()
        .filter_map(|line| {
            let cols: Vec<&str> = line.split_whitespace().collect();
            if cols.len() < 14 || cols[2] != "image" {
                return None;
            }
            Some(PageImage {
                num: cols[1].parse().ok()?,
                width: cols[3].parse().ok()?,
                height: cols[4].parse().ok()?,
                x_ppi: cols[12].parse().unwrap_or(0.0),
                y_ppi: cols[13].parse().unwrap_or(0.0),
            })
        })
        .collect()
}

/// Largest image by drawn size.
///
/// When any image lacks ppi, every image is compared by pixel area.
pub fn largest_image(images: &[PageImage]) -> Option<&PageImage> {
    let area: fn(&PageImage) -> f64 = if images.iter().all(PageImage::has_ppi) {
        PageImage::display_area
    } else {
        PageImage::pixel_area
    };
    images
        .iter()
        .filter(|img| area(img) > 0.0)
        .max_by(|a, b| area(a).total_cmp(&area(b)))
}

/// Extract the cover illustration (largest image on page 1) as PNG.
///
/// Returns `Ok(false)` when page 1 has no images.
pub fn extract_cover_image(pdf: &Path, dest: &Path) -> Result<bool, ExtractionError> {
    let output = Command::new("pdfimages")
        .args(["-list", "-f", "1", "-l", "1"])
        .arg(pdf)
        .output();
    let listing = handle_cmd_output(output, "pdfimages", "pdfimages -list failed")?;

    let images = parse_image_list(&listing);
    let Some(best) = largest_image(&images) else {
        tracing::info!("No images found on page 1");
        return Ok(false);
    };

    let work = tempfile::TempDir::new()?;
    let prefix = work.path().join("img");
    let output = Command::new("pdfimages")
        .args(["-png", "-f", "1", "-l", "1"])
        .arg(pdf)
        .arg(&prefix)
        .output();
    handle_cmd_output(output, "pdfimages", "pdfimages failed")?;

    let extracted = work.path().join(format!("img-{:03}.png", best.num));
    if !extracted.exists() {
        return Err(ExtractionError::ExtractionFailed(format!(
            "pdfimages did not write image {}",
            best.num
        )));
    }

    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::copy(&extracted, dest)?;
    tracing::debug!(
        "Cover image {}x{} saved to {}",
        best.width,
        best.height,
        dest.display()
    );
    Ok(true)
}

/// Whether an executable is on PATH.
pub fn check_binary(name: &str) -> bool {
    which::which(name).is_ok()
}

/// Availability of every external tool the pipeline can use.
pub fn check_tools() -> Vec<(String, bool)> {
    ["pdftotext", "pdftoppm", "pdfinfo", "pdfimages", "tesseract"]
        .iter()
        .map(|tool| (tool.to_string(), check_binary(tool)))
        .collect()
}
