//! Shared helper functions for CLI commands.

use std::io::{self, Write};
use std::time::Duration;

use anyhow::Context;

use crate::config::Settings;
use crate::http_client::HttpClient;
use crate::sheet::{last_row, RowRange, SheetSource, StoryRow};

/// HTTP client configured from settings.
pub fn http_client(settings: &Settings, name: &str) -> anyhow::Result<HttpClient> {
    HttpClient::builder(name, settings.timeout(), Duration::ZERO)
        .user_agent(&settings.user_agent)
        .build()
        .context("Failed to create HTTP client")
}

/// Load spreadsheet rows and validate the requested range against them.
pub async fn load_rows(
    client: &HttpClient,
    source: &SheetSource,
    range: Option<RowRange>,
) -> anyhow::Result<Vec<StoryRow>> {
    let rows = source.load(client).await?;
    tracing::info!("Loaded {} rows from {}", rows.len(), source);

    if let Some(range) = range {
        range.check_within(last_row(&rows))?;
    }
    Ok(rows)
}

/// Ask a yes/no question on stdin. Only `yes` or `y` confirm.
pub fn confirm(prompt: &str) -> io::Result<bool> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(is_yes(&input))
}

fn is_yes(input: &str) -> bool {
    matches!(input.trim().to_lowercase().as_str(), "yes" | "y")
}
