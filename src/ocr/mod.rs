//! OCR fallback for pages whose text layer is garbled.
//!
//! - **Gemini**: vision model via the Gemini API, best on Tamil (default)
//! - **Tesseract**: local CLI with the `tam` language pack

mod backend;
mod engine;
mod gemini;
mod tesseract;

pub use backend::{OcrBackend, OcrBackendType, OcrError, OcrResult, PageHint};
pub use engine::OcrEngine;
pub use gemini::{prompt_for, GeminiBackend};
pub use tesseract::TesseractBackend;
