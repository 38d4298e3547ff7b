//! Listing and deleting published stories.

use std::path::{Path, PathBuf};

use super::BundleError;

/// A story bundle on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryEntry {
    pub slug: String,
    pub title: String,
}

/// Story slugs: directory names not starting with `_`, sorted.
pub fn story_slugs(stories_dir: &Path) -> Result<Vec<String>, BundleError> {
    if !stories_dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut slugs = Vec::new();
    for entry in std::fs::read_dir(stories_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.starts_with('_') && !name.starts_with('.') {
            slugs.push(name);
        }
    }
    slugs.sort();
    Ok(slugs)
}

/// `title:` value from a bundle's front matter.
fn read_title(story_dir: &Path) -> Option<String> {
    let content = std::fs::read_to_string(story_dir.join("index.md")).ok()?;
    content
        .lines()
        .find_map(|line| line.strip_prefix("title:"))
        .map(|t| t.trim().trim_matches('"').replace("\\\"", "\""))
}

/// All stories with their titles; the slug stands in for a missing title.
pub fn list_stories(stories_dir: &Path) -> Result<Vec<StoryEntry>, BundleError> {
    Ok(story_slugs(stories_dir)?
        .into_iter()
        .map(|slug| {
            let title = read_title(&stories_dir.join(&slug)).unwrap_or_else(|| slug.clone());
            StoryEntry { slug, title }
        })
        .collect())
}

/// Directory of an existing story.
pub fn find_story(stories_dir: &Path, slug: &str) -> Result<PathBuf, BundleError> {
    let valid = !slug.is_empty()
        && !slug.starts_with('_')
        && !slug.contains(['/', '\\'])
        && slug != "."
        && slug != "..";
    let dir = stories_dir.join(slug);
    if valid && dir.is_dir() {
        return Ok(dir);
    }
    Err(BundleError::NotFound {
        slug: slug.to_string(),
        available: story_slugs(stories_dir)?,
    })
}

/// File names inside a story bundle, sorted.
pub fn story_files(story_dir: &Path) -> Result<Vec<String>, BundleError> {
    let mut files: Vec<String> = std::fs::read_dir(story_dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    files.sort();
    Ok(files)
}

/// Remove a story bundle.
pub fn delete_story(stories_dir: &Path, slug: &str) -> Result<PathBuf, BundleError> {
    let dir = find_story(stories_dir, slug)?;
    std::fs::remove_dir_all(&dir)?;
    tracing::info!("Deleted story {}", slug);
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_story(root: &Path, slug: &str, title: Option<&str>) {
        let dir = root.join(slug);
        std::fs::create_dir_all(&dir).unwrap();
        if let Some(title) = title {
            std::fs::write(
                dir.join("index.md"),
                format!("---\ntitle: \"{}\"\ndate: 2024-01-01\n---\n", title),
            )
            .unwrap();
        }
    }

    #[test]
    fn test_list_stories() {
        let root = tempfile::tempdir().unwrap();
        make_story(root.path(), "zebra-days", Some("Zebra Days"));
        make_story(root.path(), "a-cat", None);
        make_story(root.path(), "_index-bundle", Some("Hidden"));
        make_story(root.path(), "quoted", Some(r#"The \"Big\" Cat"#));
        std::fs::write(root.path().join("_index.md"), "").unwrap();

        let stories = list_stories(root.path()).unwrap();
        let slugs: Vec<&str> = stories.iter().map(|s| s.slug.as_str()).collect();
        assert_eq!(slugs, vec!["a-cat", "quoted", "zebra-days"]);
        assert_eq!(stories[0].title, "a-cat");
        assert_eq!(stories[1].title, r#"The "Big" Cat"#);
        assert_eq!(stories[2].title, "Zebra Days");
    }

    #[test]
    fn test_list_missing_dir() {
        assert!(list_stories(Path::new("/nonexistent/stories")).unwrap().is_empty());
    }

    #[test]
    fn test_delete_story() {
        let root = tempfile::tempdir().unwrap();
        make_story(root.path(), "moon", Some("Moon"));
        std::fs::write(root.path().join("moon/cover.png"), b"png").unwrap();

        assert_eq!(
            story_files(&root.path().join("moon")).unwrap(),
            vec!["cover.png", "index.md"]
        );
        delete_story(root.path(), "moon").unwrap();
        assert!(!root.path().join("moon").exists());
    }

    #[test]
    fn test_delete_unknown_lists_available() {
        let root = tempfile::tempdir().unwrap();
        make_story(root.path(), "moon", Some("Moon"));
        make_story(root.path(), "sun", Some("Sun"));

        match delete_story(root.path(), "star").unwrap_err() {
            BundleError::NotFound { slug, available } => {
                assert_eq!(slug, "star");
                assert_eq!(available, vec!["moon", "sun"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_delete_rejects_path_escape() {
        let root = tempfile::tempdir().unwrap();
        let stories = root.path().join("stories");
        std::fs::create_dir_all(&stories).unwrap();
        assert!(matches!(
            delete_story(&stories, ".."),
            Err(BundleError::NotFound { .. })
        ));
        assert!(root.path().exists());
    }
}
