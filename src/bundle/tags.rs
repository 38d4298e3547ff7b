//! In-place update of the `tags:` block of an existing bundle.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use super::front_matter::yaml_list;
use super::BundleError;

static TAGS_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\ntags:\n(?:\s+- [^\n]+\n)*").unwrap());

/// Replace the tags of a story's front matter, keeping everything else.
///
/// Any existing `tags:` block is removed and a new one is appended at the
/// end of the front matter.
pub fn update_tags(story_dir: &Path, tags: &[String]) -> Result<(), BundleError> {
    let index = story_dir.join("index.md");
    if !index.is_file() {
        return Err(BundleError::MissingIndex(index));
    }

    let content = std::fs::read_to_string(&index)?;
    let updated =
        replace_tags(&content, tags).ok_or_else(|| BundleError::MalformedFrontMatter(index.clone()))?;
    std::fs::write(&index, updated)?;
    Ok(())
}

/// `None` when the document has no `---` delimited front matter.
fn replace_tags(content: &str, tags: &[String]) -> Option<String> {
    let mut parts = content.splitn(3, "---");
    let before = parts.next()?;
    let front = parts.next()?;
    let body = parts.next()?;

    let front = TAGS_BLOCK.replace_all(front, "\n");
    let mut front = front.trim_end_matches('\n').to_string();
    front.push('\n');
    front.push_str("\ntags:\n");
    if !tags.is_empty() {
        front.push_str(&yaml_list(tags));
        front.push('\n');
    }

    Some(format!("{}---{}---{}", before, front, body))
}
