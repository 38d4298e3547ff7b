//! Story creation from spreadsheet rows.

use console::style;
use tokio::sync::mpsc;

use crate::assets::AssetFetcher;
use crate::bundle::BundleWriter;
use crate::cli::helpers::{http_client, load_rows};
use crate::cli::progress::BatchProgress;
use crate::config::Settings;
use crate::services::{process_tags_only, RowOutcome, StorySync, SyncEvent, TagUpdate};
use crate::sheet::{select_pending, RowRange, SheetSource};

/// Create bundles for pending rows.
pub async fn cmd_add(
    settings: &Settings,
    source: &SheetSource,
    range: Option<RowRange>,
    force: bool,
    show_progress: bool,
) -> anyhow::Result<()> {
    let client = http_client(settings, "stories")?;

    println!("{} Reading stories from {}", style("→").cyan(), source);
    let rows = load_rows(&client, source, range).await?;
    let pending = select_pending(&rows, range, force);

    if pending.is_empty() {
        println!("{} No pending stories to process", style("!").yellow());
        if !force {
            println!(
                "  {} Rows marked done are skipped; use --force to include them",
                style("→").dim()
            );
        }
        return Ok(());
    }

    match range {
        Some(range) => println!(
            "{} Processing {} stories from spreadsheet rows {}",
            style("→").cyan(),
            pending.len(),
            range
        ),
        None => println!(
            "{} Processing {} stories",
            style("→").cyan(),
            pending.len()
        ),
    }

    let fetcher = AssetFetcher::new(client, settings);
    let writer = BundleWriter::new(&settings.stories_dir);
    let sync = StorySync::new(fetcher, writer, force);

    let (event_tx, mut event_rx) = mpsc::channel::<SyncEvent>(100);
    let progress = BatchProgress::new(pending.len(), "Creating stories", show_progress);

    let event_handler = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match event {
                SyncEvent::Started {
                    index,
                    total,
                    row_num,
                    title,
                } => {
                    progress.println(format!(
                        "[{}/{}] Row {}: Creating: {}",
                        index, total, row_num, title
                    ));
                    progress.set_message(title);
                }
                SyncEvent::Finished(result) => {
                    match result.outcome {
                        RowOutcome::Created => {
                            progress.println(format!("  {} SUCCESS", style("✓").green()))
                        }
                        RowOutcome::Skipped => progress.println(format!(
                            "  {} Already complete, skipped",
                            style("!").yellow()
                        )),
                        RowOutcome::Failed(reason) => progress.println(format!(
                            "  {} FAILED: {}",
                            style("✗").red(),
                            reason
                        )),
                    }
                    progress.inc();
                }
            }
        }
        progress.finish();
    });

    let summary = sync.process_rows(&pending, Some(event_tx)).await;
    let _ = event_handler.await;

    println!();
    println!("{}", "=".repeat(50));
    println!("Processing Complete");
    println!("{}", "=".repeat(50));
    println!("Total rows:     {}", summary.total());
    println!("Successful:     {}", summary.created());
    if summary.skipped() > 0 {
        println!("Skipped:        {}", summary.skipped());
    }
    println!("Failed:         {}", summary.failed());

    if summary.has_failures() {
        println!("\nFailed stories:");
        for (row, reason) in summary.failures() {
            println!("  - Row {}: \"{}\" - {}", row.row_num, row.title, reason);
        }
    }

    if summary.created() > 0 {
        println!("\nNext steps:");
        println!("1. Preview: hugo server -D");
        println!("2. Commit: git add content/stories/ && git commit -m 'Add stories from Google Sheet'");
    }

    if summary.has_failures() {
        anyhow::bail!("{} of {} stories failed", summary.failed(), summary.total());
    }
    Ok(())
}

/// Rewrite tags of existing stories from the spreadsheet.
pub async fn cmd_tags_only(
    settings: &Settings,
    source: &SheetSource,
    range: Option<RowRange>,
) -> anyhow::Result<()> {
    let client = http_client(settings, "stories")?;

    println!("{} Reading stories from {}", style("→").cyan(), source);
    let rows = load_rows(&client, source, range).await?;
    let summary = process_tags_only(&rows, range, &settings.stories_dir);

    for (row_num, title, update) in &summary.details {
        match update {
            TagUpdate::Updated(tags) => println!(
                "  {} Row {}: {} [{}]",
                style("✓").green(),
                row_num,
                title,
                tags.join(", ")
            ),
            TagUpdate::MissingStory(slug) => println!(
                "  {} Row {}: story '{}' not found, skipping",
                style("!").yellow(),
                row_num,
                slug
            ),
            TagUpdate::Failed(reason) => println!(
                "  {} Row {}: {} - {}",
                style("✗").red(),
                row_num,
                title,
                reason
            ),
            TagUpdate::NoTags | TagUpdate::NoTitle => {
                tracing::debug!("Row {}: nothing to update", row_num)
            }
        }
    }

    println!(
        "\nTags update complete: {} updated, {} skipped, {} had no tags.",
        summary.updated, summary.skipped, summary.no_tags
    );
    Ok(())
}
