//! Hugo page bundles for stories.
//!
//! Each story lives in `content/stories/<slug>/` as an `index.md` holding
//! only front matter, next to its `cover.<ext>`.

mod catalog;
mod front_matter;
mod tags;
mod writer;

pub use catalog::{delete_story, find_story, list_stories, story_files, story_slugs, StoryEntry};
pub use front_matter::{slugify, split_tags, split_translators, yaml_safe, FrontMatter, Story};
pub use tags::update_tags;
pub use writer::{BundleOutcome, BundleWriter};

use std::path::PathBuf;

use thiserror::Error;

/// Errors from reading or writing bundles.
#[derive(Debug, Error)]
pub enum BundleError {
    #[error("Cover image not found at {0}")]
    CoverNotFound(PathBuf),

    #[error("Title '{0}' produces an empty slug")]
    EmptySlug(String),

    #[error("No index.md at {0}")]
    MissingIndex(PathBuf),

    #[error("Could not parse front matter in {0}")]
    MalformedFrontMatter(PathBuf),

    #[error("Story '{slug}' not found{}", available_list(.available))]
    NotFound { slug: String, available: Vec<String> },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn available_list(available: &[String]) -> String {
    if available.is_empty() {
        String::new()
    } else {
        format!(". Available stories: {}", available.join(", "))
    }
}
