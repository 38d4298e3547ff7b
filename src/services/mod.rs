//! Service layer for story business logic.
//!
//! Services report progress through event channels and return summaries,
//! leaving all printing to the CLI.

pub mod extract;
pub mod sync;

pub use extract::{
    write_results_csv, ExtractEvent, ExtractedStory, LanguageSelection, MetadataExtractor,
    PdfFindings,
};
pub use sync::{
    create_single, process_tags_only, BatchSummary, RowOutcome, RowResult, StorySync, SyncEvent,
    TagUpdate, TagsSummary,
};
