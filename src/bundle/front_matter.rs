//! Story front matter for Hugo page bundles.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::drive;
use crate::sheet::StoryRow;

static NON_SLUG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// URL slug for a title: lower-case, runs of other characters become `-`.
pub fn slugify(title: &str) -> String {
    let lower = title.to_lowercase();
    NON_SLUG
        .replace_all(&lower, "-")
        .trim_matches('-')
        .to_string()
}

/// Make a value safe inside a double-quoted YAML string.
pub fn yaml_safe(value: &str) -> String {
    value
        .replace(['\u{201C}', '\u{201D}'], "'")
        .replace("&quot;", "'")
        .replace('"', "\\\"")
}

/// Translator names, one per line or comma-separated.
pub fn split_translators(s: &str) -> Vec<String> {
    s.lines()
        .flat_map(|line| line.split(','))
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(String::from)
        .collect()
}

/// Comma-separated tags.
pub fn split_tags(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

/// YAML list items, indented four spaces.
pub(crate) fn yaml_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("    - \"{}\"", yaml_safe(item)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Everything needed to publish one story.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Story {
    pub english_title: String,
    pub tamil_title: String,
    pub english_description: String,
    pub tamil_description: String,
    /// Drive share link of the English PDF.
    pub english_pdf: String,
    /// Drive share link of the Tamil PDF.
    pub tamil_pdf: String,
    /// Raw translator cell (newline or comma separated).
    pub translators: String,
    /// Raw tags cell (comma separated).
    pub tags: String,
}

impl Story {
    pub fn slug(&self) -> String {
        slugify(&self.english_title)
    }
}

impl From<&StoryRow> for Story {
    fn from(row: &StoryRow) -> Self {
        Self {
            english_title: row.english_title.clone(),
            tamil_title: row.tamil_title.clone(),
            english_description: row.english_description.clone(),
            tamil_description: row.tamil_description.clone(),
            english_pdf: row.english_pdf.clone(),
            tamil_pdf: row.tamil_pdf.clone(),
            translators: row.translators.clone(),
            tags: row.tags.clone(),
        }
    }
}

/// Front matter of a story's `index.md`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontMatter {
    pub title: String,
    pub english_description: String,
    pub tamil_description: String,
    pub english_pdf: String,
    pub tamil_pdf: String,
    pub english_title: String,
    pub tamil_title: String,
    pub translators: Vec<String>,
    pub tags: Vec<String>,
    pub cover_image: String,
}

impl FrontMatter {
    /// Front matter for `story` with the cover stored as `cover_image`.
    pub fn new(story: &Story, cover_image: &str) -> Self {
        Self {
            title: story.english_title.clone(),
            english_description: story.english_description.clone(),
            tamil_description: story.tamil_description.clone(),
            english_pdf: drive::preview_url(&story.english_pdf),
            tamil_pdf: drive::preview_url(&story.tamil_pdf),
            english_title: story.english_title.clone(),
            tamil_title: story.tamil_title.clone(),
            translators: split_translators(&story.translators),
            tags: split_tags(&story.tags),
            cover_image: cover_image.to_string(),
        }
    }

    /// Render the `---` delimited document.
    pub fn render(&self, date: NaiveDate) -> String {
        format!(
            "---\n\
title: \"{title}\"\n\
date: {date}\n\
\n\
descriptions:\n  \
  english: \"{english_description}\"\n  \
  tamil: \"{tamil_description}\"\n\
\n\
pdfs:\n  \
  tamil: \"{tamil_pdf}\"\n  \
  english: \"{english_pdf}\"\n\
\n\
titles:\n  \
  english: \"{english_title}\"\n  \
  tamil: \"{tamil_title}\"\n\
\n\
translators:\n\
{translators}\n\
\n\
tags:\n\
{tags}\n\
\n\
coverImage: \"{cover}\"\n\
draft: false\n\
---\n",
            title = yaml_safe(&self.title),
            date = date.format("%Y-%m-%d"),
            english_description = yaml_safe(&self.english_description),
            tamil_description = yaml_safe(&self.tamil_description),
            tamil_pdf = self.tamil_pdf,
            english_pdf = self.english_pdf,
            english_title = yaml_safe(&self.english_title),
            tamil_title = yaml_safe(&self.tamil_title),
            translators = yaml_list(&self.translators),
            tags = yaml_list(&self.tags),
            cover = self.cover_image,
        )
    }
}
