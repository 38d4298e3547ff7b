//! Story bundle creation from spreadsheet rows.
//!
//! Separated from UI concerns - emits events for progress tracking.

use std::path::Path;

use tokio::sync::mpsc;

use crate::assets::{AssetFetcher, CoverSource};
use crate::bundle::{self, BundleError, BundleOutcome, BundleWriter, Story};
use crate::sheet::{RowRange, StoryRow};

/// Outcome of one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Created,
    /// Bundle already complete.
    Skipped,
    Failed(String),
}

/// Per-row record kept for the batch summary.
#[derive(Debug, Clone)]
pub struct RowResult {
    pub row_num: u32,
    pub title: String,
    pub outcome: RowOutcome,
}

/// Events emitted while processing a batch.
#[derive(Debug, Clone)]
pub enum SyncEvent {
    Started {
        index: usize,
        total: usize,
        row_num: u32,
        title: String,
    },
    Finished(RowResult),
}

/// Counts and failures of a batch.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub results: Vec<RowResult>,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.results.len()
    }

    fn count(&self, pred: impl Fn(&RowOutcome) -> bool) -> usize {
        self.results.iter().filter(|r| pred(&r.outcome)).count()
    }

    pub fn created(&self) -> usize {
        self.count(|o| *o == RowOutcome::Created)
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| *o == RowOutcome::Skipped)
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, RowOutcome::Failed(_)))
    }

    /// Failed rows with their reasons.
    pub fn failures(&self) -> impl Iterator<Item = (&RowResult, &str)> {
        self.results.iter().filter_map(|r| match &r.outcome {
            RowOutcome::Failed(reason) => Some((r, reason.as_str())),
            _ => None,
        })
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }
}

/// Creates bundles for spreadsheet rows.
pub struct StorySync {
    fetcher: AssetFetcher,
    writer: BundleWriter,
    force: bool,
}

impl StorySync {
    /// With `force`, complete bundles are rewritten and covers re-downloaded.
    pub fn new(fetcher: AssetFetcher, writer: BundleWriter, force: bool) -> Self {
        Self {
            fetcher,
            writer,
            force,
        }
    }

    /// Create (or skip) the bundle for one row.
    pub async fn process_row(&self, row: &StoryRow) -> RowOutcome {
        if let Some(column) = row.missing_field() {
            return RowOutcome::Failed(format!("Missing required field: {}", column));
        }

        let story = Story::from(row);
        let slug = story.slug();
        if slug.is_empty() {
            return RowOutcome::Failed(BundleError::EmptySlug(story.english_title).to_string());
        }
        if !self.force && self.writer.is_complete(&slug) {
            tracing::info!("Row {}: bundle {} already complete", row.row_num, slug);
            return RowOutcome::Skipped;
        }

        let story_dir = self.writer.story_dir(&slug);
        let cover = match self
            .fetcher
            .fetch_cover(&row.image, &slug, &story_dir, self.force)
            .await
        {
            Ok(cover) => cover,
            Err(e) => return RowOutcome::Failed(format!("Image download failed: {}", e)),
        };

        let result = self.writer.write(&story, cover.path(), self.force);

        if let CoverSource::Downloaded(ref path) = cover {
            let _ = tokio::fs::remove_file(path).await;
        }

        match result {
            Ok(outcome @ BundleOutcome::Written { .. }) => {
                tracing::info!("Row {}: wrote {}", row.row_num, outcome.dir().display());
                RowOutcome::Created
            }
            Ok(BundleOutcome::Skipped { .. }) => RowOutcome::Skipped,
            Err(e) => RowOutcome::Failed(e.to_string()),
        }
    }

    /// Process rows in order. A failed row never stops the batch.
    ///
    /// The scratch directory is removed once all rows are done.
    pub async fn process_rows(
        &self,
        rows: &[&StoryRow],
        event_tx: Option<mpsc::Sender<SyncEvent>>,
    ) -> BatchSummary {
        let mut summary = BatchSummary::default();
        let total = rows.len();

        for (i, row) in rows.iter().enumerate() {
            if let Some(ref tx) = event_tx {
                let _ = tx
                    .send(SyncEvent::Started {
                        index: i + 1,
                        total,
                        row_num: row.row_num,
                        title: row.display_title().to_string(),
                    })
                    .await;
            }

            let outcome = self.process_row(row).await;
            if let RowOutcome::Failed(ref reason) = outcome {
                tracing::warn!("Row {} failed: {}", row.row_num, reason);
            }

            let result = RowResult {
                row_num: row.row_num,
                title: row.display_title().to_string(),
                outcome,
            };
            if let Some(ref tx) = event_tx {
                let _ = tx.send(SyncEvent::Finished(result.clone())).await;
            }
            summary.results.push(result);
        }

        self.fetcher.cleanup().await;
        summary
    }
}

/// Result of a tags-only update for one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagUpdate {
    Updated(Vec<String>),
    NoTags,
    NoTitle,
    MissingStory(String),
    Failed(String),
}

/// Tags-only run totals plus per-row details.
#[derive(Debug, Default)]
pub struct TagsSummary {
    pub updated: usize,
    pub skipped: usize,
    pub no_tags: usize,
    pub details: Vec<(u32, String, TagUpdate)>,
}

/// Rewrite the tags of existing bundles from the spreadsheet.
///
/// Covers and other front matter are untouched; `done` rows are included.
pub fn process_tags_only(
    rows: &[StoryRow],
    range: Option<RowRange>,
    stories_dir: &Path,
) -> TagsSummary {
    let mut summary = TagsSummary::default();

    for row in rows.iter().filter(|r| range.map_or(true, |rg| rg.contains(r.row_num))) {
        let update = tag_update(row, stories_dir);
        match update {
            TagUpdate::Updated(_) => summary.updated += 1,
            TagUpdate::NoTags => summary.no_tags += 1,
            _ => summary.skipped += 1,
        }
        summary
            .details
            .push((row.row_num, row.english_title.clone(), update));
    }
    summary
}

fn tag_update(row: &StoryRow, stories_dir: &Path) -> TagUpdate {
    if row.english_title.is_empty() {
        return TagUpdate::NoTitle;
    }
    let tags = bundle::split_tags(&row.tags);
    if tags.is_empty() {
        return TagUpdate::NoTags;
    }

    let slug = bundle::slugify(&row.english_title);
    let story_dir = stories_dir.join(&slug);
    if slug.is_empty() || !story_dir.is_dir() {
        return TagUpdate::MissingStory(slug);
    }

    match bundle::update_tags(&story_dir, &tags) {
        Ok(()) => TagUpdate::Updated(tags),
        Err(e) => TagUpdate::Failed(e.to_string()),
    }
}

/// Create one story from manually supplied fields and a local cover image.
///
/// Always writes, replacing an existing bundle with the same slug.
pub fn create_single(
    writer: &BundleWriter,
    story: &Story,
    cover: &Path,
) -> Result<BundleOutcome, BundleError> {
    writer.write(story, cover, true)
}
