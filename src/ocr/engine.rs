//! Page OCR: render a PDF page and hand it to the selected backend.

use std::path::Path;
use std::time::Duration;

use tempfile::TempDir;

use super::backend::{OcrBackend, OcrBackendType, OcrError, PageHint};
use super::gemini::GeminiBackend;
use super::tesseract::TesseractBackend;
use crate::config::Settings;
use crate::http_client::HttpClient;
use crate::pdf;

/// Runs OCR on PDF pages with one backend.
pub struct OcrEngine {
    backend: Box<dyn OcrBackend>,
}

impl OcrEngine {
    pub fn new(backend: Box<dyn OcrBackend>) -> Self {
        Self { backend }
    }

    /// Build the engine for `backend_type` from settings.
    pub fn from_settings(
        backend_type: OcrBackendType,
        settings: &Settings,
    ) -> Result<Self, OcrError> {
        let backend: Box<dyn OcrBackend> = match backend_type {
            OcrBackendType::Tesseract => {
                Box::new(TesseractBackend::new(settings.tesseract_lang.clone()))
            }
            OcrBackendType::Gemini => {
                let client = HttpClient::builder(
                    "gemini-ocr",
                    Duration::from_secs(120),
                    Duration::ZERO,
                )
                .user_agent(&settings.user_agent)
                .build()
                .map_err(|e| OcrError::OcrFailed(format!("Failed to create HTTP client: {}", e)))?;

                Box::new(
                    GeminiBackend::new(client, settings.gemini_api_key.clone())
                        .with_model(settings.gemini_model.clone())
                        .with_delay(Duration::from_millis(settings.gemini_delay_ms)),
                )
            }
        };
        Ok(Self::new(backend))
    }

    pub fn backend(&self) -> &dyn OcrBackend {
        self.backend.as_ref()
    }

    /// Fail early when the backend cannot run.
    pub fn ensure_ready(&self) -> Result<(), OcrError> {
        if self.backend.is_available() {
            Ok(())
        } else {
            Err(OcrError::BackendNotAvailable(self.backend.availability_hint()))
        }
    }

    /// OCR one page (1-based).
    pub async fn ocr_pdf_page(
        &self,
        pdf_path: &Path,
        page: u32,
        hint: PageHint,
    ) -> Result<String, OcrError> {
        let work = TempDir::new()?;
        let image = pdf::render_page(pdf_path, page, work.path())?;
        let result = self.backend.ocr_image(&image, hint).await?;
        tracing::debug!(
            "{} OCR of page {} took {}ms ({} chars, model {})",
            result.backend,
            page,
            result.processing_time_ms,
            result.text.chars().count(),
            result.model.as_deref().unwrap_or("none")
        );
        Ok(result.text)
    }

    /// OCR one page, turning failures into `None` with a warning.
    pub async fn try_ocr_page(&self, pdf_path: &Path, page: u32, hint: PageHint) -> Option<String> {
        match self.ocr_pdf_page(pdf_path, page, hint).await {
            Ok(text) if !text.trim().is_empty() => Some(text),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("{} OCR failed on page {}: {}", self.backend.backend_type(), page, e);
                None
            }
        }
    }
}
