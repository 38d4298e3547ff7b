//! EETHAL stories - bilingual story bundles for the EETHAL Foundation website.
//!
//! Reads the story spreadsheet, fetches PDFs and covers from Google Drive,
//! extracts metadata from the PDFs (with OCR for garbled Tamil text layers),
//! and writes one Hugo page bundle per story.

pub mod assets;
pub mod bundle;
pub mod classify;
pub mod cli;
pub mod config;
pub mod drive;
pub mod http_client;
pub mod ocr;
pub mod pdf;
pub mod rate_limit;
pub mod services;
pub mod sheet;
pub mod translate;
