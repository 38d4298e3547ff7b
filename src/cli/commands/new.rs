//! Single story creation from command-line fields.

use std::path::PathBuf;

use clap::Args;
use console::style;

use crate::bundle::{BundleOutcome, BundleWriter, Story};
use crate::config::Settings;
use crate::services::create_single;

#[derive(Args, Debug)]
pub struct NewArgs {
    /// Story title in English
    #[arg(long)]
    english_title: String,
    /// Story title in Tamil
    #[arg(long)]
    tamil_title: String,
    /// Google Drive URL for the English PDF
    #[arg(long)]
    english_pdf: String,
    /// Google Drive URL for the Tamil PDF
    #[arg(long)]
    tamil_pdf: String,
    /// Comma-separated translator names
    #[arg(long)]
    translators: String,
    /// Brief description in English
    #[arg(long)]
    english_description: String,
    /// Brief description in Tamil
    #[arg(long)]
    tamil_description: String,
    /// Path to the cover image file
    #[arg(long)]
    cover_image: PathBuf,
    /// Comma-separated tags
    #[arg(long, default_value = "")]
    tags: String,
}

impl NewArgs {
    fn into_story(self) -> (Story, PathBuf) {
        let story = Story {
            english_title: self.english_title,
            tamil_title: self.tamil_title,
            english_description: self.english_description,
            tamil_description: self.tamil_description,
            english_pdf: self.english_pdf,
            tamil_pdf: self.tamil_pdf,
            translators: self.translators,
            tags: self.tags,
        };
        (story, self.cover_image)
    }
}

pub fn cmd_new(settings: &Settings, args: NewArgs) -> anyhow::Result<()> {
    let (story, cover) = args.into_story();
    let writer = BundleWriter::new(&settings.stories_dir);

    let outcome = create_single(&writer, &story, &cover)?;
    let BundleOutcome::Written { slug, dir } = outcome else {
        return Ok(());
    };

    println!("{} Story created: {}", style("✓").green(), dir.display());
    println!("\nNext steps:");
    println!("1. Preview locally: hugo server -D");
    println!("2. View at: http://localhost:1313/stories/{}/", slug);
    println!(
        "3. Commit: git add content/stories/{} && git commit -m 'Add story: {}'",
        slug, story.english_title
    );
    Ok(())
}
