//! Google Sheets CSV export download.

use std::sync::LazyLock;

use regex::Regex;

use super::SheetError;
use crate::http_client::HttpClient;

static SHEET_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"spreadsheets/d/([a-zA-Z0-9_-]+)").unwrap());

/// Extract the spreadsheet ID from a Google Sheets URL.
pub fn extract_sheet_id(url: &str) -> Option<String> {
    SHEET_ID.captures(url).map(|caps| caps[1].to_string())
}

/// CSV export URLs for a spreadsheet, in the order they are tried.
pub fn export_urls(sheet_id: &str) -> [String; 3] {
    [
        format!(
            "https://docs.google.com/spreadsheets/d/{}/export?format=csv&gid=0",
            sheet_id
        ),
        format!(
            "https://docs.google.com/spreadsheets/d/{}/export?format=csv",
            sheet_id
        ),
        format!(
            "https://docs.google.com/spreadsheets/d/e/{}/pub?output=csv",
            sheet_id
        ),
    ]
}

/// Download a spreadsheet as CSV text.
///
/// Each export URL is tried in turn and the first success wins. A sheet that
/// is not shared answers with an HTML sign-in page, which counts as a failure.
pub async fn fetch_sheet_csv(client: &HttpClient, sheet_url: &str) -> Result<String, SheetError> {
    let sheet_id =
        extract_sheet_id(sheet_url).ok_or_else(|| SheetError::InvalidUrl(sheet_url.to_string()))?;

    let mut last_error = String::from("no export URL tried");
    for url in export_urls(&sheet_id) {
        tracing::debug!("Trying spreadsheet export {}", url);
        let response = match client.get(&url).await {
            Ok(response) => response,
            Err(e) => {
                last_error = e.to_string();
                continue;
            }
        };

        if !response.is_success() {
            last_error = format!("HTTP {}", response.status);
            continue;
        }
        if response
            .content_type()
            .is_some_and(|ct| ct.contains("text/html"))
        {
            last_error = "received an HTML page instead of CSV".to_string();
            continue;
        }

        match response.text().await {
            Ok(text) => {
                tracing::info!("Spreadsheet fetched ({} bytes)", text.len());
                return Ok(text);
            }
            Err(e) => last_error = e.to_string(),
        }
    }

    Err(SheetError::Download(last_error))
}
