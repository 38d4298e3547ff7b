//! Tesseract OCR backend.
//!
//! Runs the `tesseract` CLI with a Tamil language pack by default.

use std::path::Path;
use std::time::Instant;

use async_trait::async_trait;
use tokio::process::Command;

use super::backend::{OcrBackend, OcrBackendType, OcrError, OcrResult, PageHint};
use crate::pdf::check_binary;

/// Tesseract OCR backend.
pub struct TesseractBackend {
    language: String,
}

impl TesseractBackend {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    async fn run_tesseract(&self, image_path: &Path) -> Result<String, OcrError> {
        let output = Command::new("tesseract")
            .arg(image_path)
            .arg("stdout")
            .args(["-l", &self.language])
            .output()
            .await;

        match output {
            Ok(output) if output.status.success() => {
                Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
            }
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(OcrError::OcrFailed(format!("tesseract failed: {}", stderr.trim())))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(
                OcrError::BackendNotAvailable("tesseract not found (install tesseract-ocr)".into()),
            ),
            Err(e) => Err(OcrError::Io(e)),
        }
    }
}

impl Default for TesseractBackend {
    fn default() -> Self {
        Self::new("tam")
    }
}

#[async_trait]
impl OcrBackend for TesseractBackend {
    fn backend_type(&self) -> OcrBackendType {
        OcrBackendType::Tesseract
    }

    fn is_available(&self) -> bool {
        check_binary("tesseract")
    }

    fn availability_hint(&self) -> String {
        if check_binary("tesseract") {
            format!("Tesseract is available (language: {})", self.language)
        } else {
            format!(
                "Tesseract not installed. Install tesseract-ocr and the '{}' language pack \
                 (e.g. apt install tesseract-ocr tesseract-ocr-tam)",
                self.language
            )
        }
    }

    async fn ocr_image(&self, image_path: &Path, _hint: PageHint) -> Result<OcrResult, OcrError> {
        let start = Instant::now();
        let text = self.run_tesseract(image_path).await?;

        Ok(OcrResult {
            text,
            backend: OcrBackendType::Tesseract,
            model: None,
            processing_time_ms: start.elapsed().as_millis() as u64,
        })
    }
}
