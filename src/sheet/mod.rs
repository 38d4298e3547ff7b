//! Story spreadsheet: the system of record for stories.
//!
//! Rows come from the shared Google Sheet (CSV export) or a local CSV file.

mod fetch;
mod range;
mod row;

pub use fetch::{export_urls, extract_sheet_id, fetch_sheet_csv};
pub use range::{last_row, select_extractable, select_pending, RowRange};
pub use row::{parse_rows, Column, StoryRow};

use std::path::PathBuf;

use thiserror::Error;

use crate::http_client::HttpClient;

/// Errors from reading the spreadsheet.
#[derive(Debug, Error)]
pub enum SheetError {
    #[error("Could not extract spreadsheet ID from URL: {0}")]
    InvalidUrl(String),

    #[error(
        "Failed to download Google Sheet: {0}\n\n\
         Please ensure the spreadsheet is:\n\
         1. Shared with 'Anyone with the link can view', OR\n\
         2. Published to the web (File > Share > Publish to web > CSV)\n\n\
         Alternatively, download the CSV manually and pass it with --csv."
    )]
    Download(String),

    #[error("Failed to read CSV file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid --rows format '{0}'. Use e.g. '5-10' or '7'.")]
    InvalidRange(String),

    #[error("row 1 is the header. Data rows start at 2.")]
    HeaderRow,

    #[error("invalid --rows range {start}-{end}.")]
    ReversedRange { start: u32, end: u32 },

    #[error("start row {start} exceeds last data row ({max_row}).")]
    StartBeyondEnd { start: u32, max_row: u32 },
}

/// Where spreadsheet rows are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetSource {
    /// Local CSV file.
    Csv(PathBuf),
    /// Google Sheets URL.
    Sheet(String),
}

impl SheetSource {
    /// Pick the source from CLI options, falling back to the configured sheet.
    pub fn from_options(csv: Option<PathBuf>, sheet: Option<String>, default_url: &str) -> Self {
        match (csv, sheet) {
            (Some(path), _) => SheetSource::Csv(path),
            (None, Some(url)) => SheetSource::Sheet(url),
            (None, None) => SheetSource::Sheet(default_url.to_string()),
        }
    }

    /// Read the raw CSV text.
    pub async fn read_csv(&self, client: &HttpClient) -> Result<String, SheetError> {
        match self {
            SheetSource::Csv(path) => {
                tracing::info!("Reading stories from {}", path.display());
                tokio::fs::read_to_string(path)
                    .await
                    .map_err(|source| SheetError::Read {
                        path: path.clone(),
                        source,
                    })
            }
            SheetSource::Sheet(url) => {
                tracing::info!("Fetching spreadsheet data from Google Sheets");
                fetch_sheet_csv(client, url).await
            }
        }
    }

    /// Read and parse all data rows.
    pub async fn load(&self, client: &HttpClient) -> Result<Vec<StoryRow>, SheetError> {
        let text = self.read_csv(client).await?;
        parse_rows(&text)
    }
}

impl std::fmt::Display for SheetSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SheetSource::Csv(path) => write!(f, "{}", path.display()),
            SheetSource::Sheet(url) => f.write_str(url),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_from_options() {
        assert_eq!(
            SheetSource::from_options(Some("a.csv".into()), Some("u".into()), "d"),
            SheetSource::Csv("a.csv".into())
        );
        assert_eq!(
            SheetSource::from_options(None, Some("u".into()), "d"),
            SheetSource::Sheet("u".into())
        );
        assert_eq!(
            SheetSource::from_options(None, None, "d"),
            SheetSource::Sheet("d".into())
        );
    }

    #[tokio::test]
    async fn test_load_local_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stories.csv");
        tokio::fs::write(&path, "English Title,Tamil Title\nMoon,நிலா\n")
            .await
            .unwrap();

        let client = HttpClient::builder(
            "test",
            std::time::Duration::from_secs(1),
            std::time::Duration::ZERO,
        )
        .build()
        .unwrap();
        let rows = SheetSource::Csv(path).load(&client).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].english_title, "Moon");
    }

    #[tokio::test]
    async fn test_load_missing_csv() {
        let client = HttpClient::builder(
            "test",
            std::time::Duration::from_secs(1),
            std::time::Duration::ZERO,
        )
        .build()
        .unwrap();
        let err = SheetSource::Csv("/nonexistent/stories.csv".into())
            .load(&client)
            .await
            .unwrap_err();
        assert!(matches!(err, SheetError::Read { .. }));
    }
}
