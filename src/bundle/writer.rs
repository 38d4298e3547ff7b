//! Writes story bundles: `<stories_dir>/<slug>/index.md` plus `cover.<ext>`.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use super::front_matter::{FrontMatter, Story};
use super::BundleError;
use crate::assets::find_cover;

/// What happened to a bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BundleOutcome {
    /// `index.md` and cover were written.
    Written { slug: String, dir: PathBuf },
    /// The bundle was already complete and `force` was off.
    Skipped { slug: String, dir: PathBuf },
}

impl BundleOutcome {
    pub fn dir(&self) -> &Path {
        match self {
            BundleOutcome::Written { dir, .. } | BundleOutcome::Skipped { dir, .. } => dir,
        }
    }
}

/// Creates story bundles under a stories directory.
pub struct BundleWriter {
    stories_dir: PathBuf,
    date: NaiveDate,
}

impl BundleWriter {
    /// Writer stamping bundles with today's date.
    pub fn new(stories_dir: impl Into<PathBuf>) -> Self {
        Self {
            stories_dir: stories_dir.into(),
            date: chrono::Local::now().date_naive(),
        }
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = date;
        self
    }

    pub fn stories_dir(&self) -> &Path {
        &self.stories_dir
    }

    pub fn story_dir(&self, slug: &str) -> PathBuf {
        self.stories_dir.join(slug)
    }

    /// Whether a bundle has both `index.md` and a cover.
    pub fn is_complete(&self, slug: &str) -> bool {
        let dir = self.story_dir(slug);
        dir.join("index.md").is_file() && find_cover(&dir).is_some()
    }

    /// Write the bundle for `story` with `cover` as its image.
    ///
    /// A complete bundle is left untouched unless `force` is set.
    pub fn write(&self, story: &Story, cover: &Path, force: bool) -> Result<BundleOutcome, BundleError> {
        let slug = story.slug();
        if slug.is_empty() {
            return Err(BundleError::EmptySlug(story.english_title.clone()));
        }
        let dir = self.story_dir(&slug);

        if !force && self.is_complete(&slug) {
            tracing::info!("Bundle {} already complete, skipping", slug);
            return Ok(BundleOutcome::Skipped { slug, dir });
        }

        let cover = PathBuf::from(shellexpand::tilde(&cover.to_string_lossy()).as_ref());
        if !cover.is_file() {
            return Err(BundleError::CoverNotFound(cover));
        }

        std::fs::create_dir_all(&dir)?;
        tracing::debug!("Creating story {} in {}", slug, dir.display());

        let cover_name = match cover.extension().and_then(|e| e.to_str()) {
            Some(ext) => format!("cover.{}", ext.to_lowercase()),
            None => "cover".to_string(),
        };
        let cover_dest = dir.join(&cover_name);
        if same_file(&cover, &cover_dest) {
            tracing::debug!("Cover image already in place: {}", cover_name);
        } else if is_bundle_cover(&cover, &dir) {
            // same cover under another name, e.g. cover.JPG
            std::fs::rename(&cover, &cover_dest)?;
            remove_other_covers(&dir, &cover_name)?;
            tracing::debug!("Renamed cover image to {}", cover_name);
        } else {
            remove_other_covers(&dir, &cover_name)?;
            std::fs::copy(&cover, &cover_dest)?;
            tracing::debug!("Copied cover image to {}", cover_dest.display());
        }

        let index = dir.join("index.md");
        let front_matter = FrontMatter::new(story, &cover_name).render(self.date);
        std::fs::write(&index, front_matter)?;
        tracing::info!("Wrote {}", index.display());

        Ok(BundleOutcome::Written { slug, dir })
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// A `cover.*` file directly inside `dir`.
fn is_bundle_cover(file: &Path, dir: &Path) -> bool {
    if file.file_stem().and_then(|s| s.to_str()) != Some("cover") {
        return false;
    }
    match (file.parent().map(Path::canonicalize), dir.canonicalize()) {
        (Some(Ok(parent)), Ok(dir)) => parent == dir,
        _ => false,
    }
}

/// Drop `cover.*` files other than `keep`, so a bundle has a single cover.
fn remove_other_covers(dir: &Path, keep: &str) -> Result<(), BundleError> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        let is_cover = path.file_stem().and_then(|s| s.to_str()) == Some("cover");
        if is_cover && name != keep && path.is_file() {
            std::fs::remove_file(&path)?;
        }
    }
    Ok(())
}
