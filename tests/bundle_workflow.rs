//! Spreadsheet to story bundle workflow, run against local files only.
//!
//! Covers are pre-seeded in the bundle directories so no row touches the
//! network.

use std::path::Path;
use std::time::Duration;

use chrono::NaiveDate;

use eethal_stories::assets::AssetFetcher;
use eethal_stories::bundle::{self, BundleWriter};
use eethal_stories::config::Settings;
use eethal_stories::http_client::HttpClient;
use eethal_stories::services::{process_tags_only, StorySync};
use eethal_stories::sheet::{select_pending, RowRange, SheetSource};

const SHEET: &str = "\u{feff}English Title,Tamil Title,English PDF,Tamil PDF,Image,SW link-Eng,SW link Tamil,Translators,English Description,Tamil Description,Status,Tags
The Moon and the Cap,நிலாவும் தொப்பியும்,https://drive.google.com/file/d/ENG1/view,https://drive.google.com/file/d/TAM1/view,https://drive.google.com/file/d/IMG1/view,,,\"Meena
Ravi\",\"A girl's cap flies to the moon.\",ஒரு சிறுமியின் தொப்பி,,\"moon, family\"
Already Done,முடிந்தது,https://drive.google.com/file/d/ENG2/view,https://drive.google.com/file/d/TAM2/view,https://drive.google.com/file/d/IMG2/view,,,Kavitha,Done story.,முடிந்த கதை,Done,
Missing Bits,,https://drive.google.com/file/d/ENG3/view,,,,,,,,,
,,,,,,,,,,,
Sun Song,சூரியப் பாடல்,https://drive.google.com/file/d/ENG5/view,https://drive.google.com/file/d/TAM5/view,https://drive.google.com/file/d/IMG5/view,,,Arun,The sun sings.,சூரியன் பாடுகிறது,,
";

fn settings(root: &Path) -> Settings {
    Settings {
        temp_dir: root.join("scratch"),
        ..Settings::default()
    }
    .with_site_root(root.to_path_buf())
}

fn seed_cover(stories_dir: &Path, slug: &str, ext: &str) {
    let dir = stories_dir.join(slug);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(format!("cover.{}", ext)), b"image").unwrap();
}

async fn load(root: &Path) -> Vec<eethal_stories::sheet::StoryRow> {
    let csv_path = root.join("stories.csv");
    std::fs::write(&csv_path, SHEET).unwrap();
    let client = HttpClient::builder("test", Duration::from_secs(1), Duration::ZERO)
        .build()
        .unwrap();
    SheetSource::Csv(csv_path).load(&client).await.unwrap()
}

#[tokio::test]
async fn test_sheet_rows_to_bundles() {
    let root = tempfile::tempdir().unwrap();
    let settings = settings(root.path());
    let rows = load(root.path()).await;

    let numbers: Vec<u32> = rows.iter().map(|r| r.row_num).collect();
    assert_eq!(numbers, vec![2, 3, 4, 6]);

    let pending = select_pending(&rows, None, false);
    let titles: Vec<&str> = pending.iter().map(|r| r.english_title.as_str()).collect();
    assert_eq!(titles, vec!["The Moon and the Cap", "Sun Song"]);

    seed_cover(&settings.stories_dir, "the-moon-and-the-cap", "jpg");
    seed_cover(&settings.stories_dir, "sun-song", "png");

    let client = HttpClient::builder("test", Duration::from_secs(1), Duration::ZERO)
        .build()
        .unwrap();
    let fetcher =
        AssetFetcher::new(client, &settings).with_timing(Duration::ZERO, Duration::ZERO);
    let writer = BundleWriter::new(&settings.stories_dir)
        .with_date(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
    let sync = StorySync::new(fetcher, writer, false);

    let summary = sync.process_rows(&pending, None).await;
    assert_eq!(summary.created(), 2);
    assert!(!summary.has_failures());

    let index =
        std::fs::read_to_string(settings.stories_dir.join("the-moon-and-the-cap/index.md"))
            .unwrap();
    assert!(index.starts_with("---\ntitle: \"The Moon and the Cap\"\ndate: 2025-03-01\n"));
    assert!(index.contains("translators:\n    - \"Meena\"\n    - \"Ravi\"\n"));
    assert!(index.contains("tags:\n    - \"moon\"\n    - \"family\"\n"));
    assert!(index.contains("english: \"https://drive.google.com/file/d/ENG1/preview\""));
    assert!(index.contains("coverImage: \"cover.jpg\""));

    // second run finds complete bundles and leaves them alone
    let summary = sync.process_rows(&pending, None).await;
    assert_eq!(summary.skipped(), 2);

    let listed = bundle::list_stories(&settings.stories_dir).unwrap();
    let slugs: Vec<&str> = listed.iter().map(|s| s.slug.as_str()).collect();
    assert_eq!(slugs, vec!["sun-song", "the-moon-and-the-cap"]);
    assert_eq!(listed[1].title, "The Moon and the Cap");
}

#[tokio::test]
async fn test_range_force_and_tags_only() {
    let root = tempfile::tempdir().unwrap();
    let settings = settings(root.path());
    let rows = load(root.path()).await;

    let range = RowRange::parse("3-4").unwrap();
    assert!(select_pending(&rows, Some(range), false).is_empty());
    let forced = select_pending(&rows, Some(range), true);
    assert_eq!(forced.len(), 1);
    assert_eq!(forced[0].english_title, "Already Done");

    assert!(RowRange::parse("9").unwrap().check_within(6).is_err());

    seed_cover(&settings.stories_dir, "the-moon-and-the-cap", "jpg");
    let writer = BundleWriter::new(&settings.stories_dir);
    writer
        .write(
            &bundle::Story::from(&rows[0]),
            &settings.stories_dir.join("the-moon-and-the-cap/cover.jpg"),
            false,
        )
        .unwrap();

    let mut edited = rows.clone();
    edited[0].tags = "moon, bedtime".into();
    let summary = process_tags_only(&edited, None, &settings.stories_dir);
    assert_eq!(summary.updated, 1);

    let index =
        std::fs::read_to_string(settings.stories_dir.join("the-moon-and-the-cap/index.md"))
            .unwrap();
    assert!(index.contains("    - \"bedtime\"\n"));
    assert!(!index.contains("\"family\""));
    assert!(index.contains("coverImage: \"cover.jpg\""));

    bundle::delete_story(&settings.stories_dir, "the-moon-and-the-cap").unwrap();
    assert!(bundle::list_stories(&settings.stories_dir).unwrap().is_empty());
}
