//! Listing and deleting published stories.

use console::style;

use crate::bundle::{delete_story, find_story, list_stories, story_files, BundleError};
use crate::cli::helpers::confirm;
use crate::config::Settings;

pub fn cmd_list(settings: &Settings) -> anyhow::Result<()> {
    let stories = list_stories(&settings.stories_dir)?;
    if stories.is_empty() {
        println!(
            "{} No stories found in {}",
            style("!").yellow(),
            settings.stories_dir.display()
        );
        return Ok(());
    }

    println!("Available stories ({}):", stories.len());
    for story in &stories {
        println!("  - {:30} ({})", story.slug, story.title);
    }
    Ok(())
}

pub fn cmd_delete(settings: &Settings, slug: &str, force: bool) -> anyhow::Result<()> {
    let story_dir = match find_story(&settings.stories_dir, slug) {
        Ok(dir) => dir,
        Err(BundleError::NotFound { slug, available }) => {
            println!("{} Story '{}' not found", style("✗").red(), slug);
            if !available.is_empty() {
                println!("\nAvailable stories:");
                for s in &available {
                    println!("  - {}", s);
                }
            }
            anyhow::bail!("no story named '{}'", slug);
        }
        Err(e) => return Err(e.into()),
    };

    println!("Story to delete: {}", slug);
    println!("Location: {}", story_dir.display());
    println!("Files to be removed:");
    for file in story_files(&story_dir)? {
        println!("  - {}", file);
    }

    if !force && !confirm(&format!("\nAre you sure you want to delete '{}'? (yes/no): ", slug))? {
        println!("{} Deletion cancelled", style("!").yellow());
        return Ok(());
    }

    delete_story(&settings.stories_dir, slug)?;
    println!("\n{} Story '{}' deleted", style("✓").green(), slug);
    println!("\nNext steps:");
    println!("1. Commit the deletion:");
    println!("   git add content/stories/{}", slug);
    println!("   git commit -m 'Delete story: {}'", slug);
    Ok(())
}
