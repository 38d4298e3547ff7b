//! `stories` - builds the EETHAL website's story bundles from the story spreadsheet.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use eethal_stories::cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    let default_filter = if cli::is_verbose() {
        "eethal_stories=info"
    } else {
        "eethal_stories=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    cli::run().await
}
