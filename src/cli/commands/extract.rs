//! Metadata extraction from story PDFs.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use console::style;
use tokio::sync::mpsc;

use crate::assets::AssetFetcher;
use crate::cli::helpers::{http_client, load_rows};
use crate::cli::progress::BatchProgress;
use crate::config::Settings;
use crate::ocr::{OcrBackendType, OcrEngine};
use crate::services::{
    write_results_csv, ExtractEvent, ExtractedStory, LanguageSelection, MetadataExtractor,
};
use crate::sheet::{select_extractable, RowRange, SheetSource};
use crate::translate::Translator;

pub struct ExtractOptions {
    pub source: SheetSource,
    pub limit: Option<usize>,
    pub rows: Option<RowRange>,
    pub output: Option<PathBuf>,
    pub languages: LanguageSelection,
    pub ocr: OcrBackendType,
    pub covers_dir: Option<PathBuf>,
    pub show_progress: bool,
}

pub async fn cmd_extract(settings: &Settings, options: ExtractOptions) -> anyhow::Result<()> {
    let client = http_client(settings, "stories")?;

    println!("{} Reading stories from {}", style("→").cyan(), options.source);
    let rows = load_rows(&client, &options.source, options.rows).await?;
    let stories = select_extractable(&rows, options.rows, options.limit);

    if stories.is_empty() {
        println!("{} No stories with SW links found.", style("!").yellow());
        return Ok(());
    }

    let languages = options.languages;
    let total_pdfs: usize = stories
        .iter()
        .map(|s| {
            usize::from(languages.english() && !s.english_pdf.is_empty())
                + usize::from(languages.tamil() && !s.tamil_pdf.is_empty())
        })
        .sum();
    match options.rows {
        Some(range) => println!(
            "{} Found {} stories with SW links in rows {}, {} PDFs to process",
            style("→").cyan(),
            stories.len(),
            range,
            total_pdfs
        ),
        None => println!(
            "{} Found {} stories with SW links, {} PDFs to process",
            style("→").cyan(),
            stories.len(),
            total_pdfs
        ),
    }

    let translator = Translator::new(client.clone(), settings.translate_api_key.clone());
    let can_translate = translator.is_configured();
    let fetcher = AssetFetcher::new(client, settings);
    let mut extractor = MetadataExtractor::new(fetcher, translator, languages);

    if languages.tamil() {
        let engine = OcrEngine::from_settings(options.ocr, settings)?;
        engine.ensure_ready().with_context(|| {
            let other = match options.ocr {
                OcrBackendType::Gemini => "tesseract",
                OcrBackendType::Tesseract => "gemini",
            };
            format!("OCR backend '{}' is not available (try --ocr {})", options.ocr, other)
        })?;
        println!("{} Using {} OCR for garbled Tamil text", style("→").cyan(), options.ocr);
        extractor = extractor.with_ocr(engine);

        if !can_translate {
            println!(
                "  {} GOOGLE_TRANSLATE_API_KEY not set, Tamil descriptions will be read from the PDFs",
                style("!").yellow()
            );
        }
    }

    if let Some(dir) = options.covers_dir {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        extractor = extractor.with_covers_dir(dir);
    }

    let (event_tx, mut event_rx) = mpsc::channel::<ExtractEvent>(100);
    let progress = BatchProgress::new(stories.len(), "Extracting", options.show_progress);
    let start = Instant::now();

    let event_handler = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match event {
                ExtractEvent::Started {
                    index,
                    total,
                    row_num,
                    english_title,
                    tamil_title,
                } => {
                    progress.println(format!(
                        "\n[{}/{}] Row {}: {} / {}  (elapsed: {}s)",
                        index,
                        total,
                        row_num,
                        english_title,
                        tamil_title,
                        start.elapsed().as_secs()
                    ));
                    progress.set_message(english_title);
                }
                ExtractEvent::Finished(story) => {
                    print_story(&progress, &story, languages);
                    progress.inc();
                }
            }
        }
        progress.finish();
    });

    let results = extractor.extract_rows(&stories, Some(event_tx)).await?;
    let _ = event_handler.await;

    println!(
        "\n{} Processed {} stories in {}s",
        style("✓").green(),
        results.len(),
        start.elapsed().as_secs()
    );

    if let Some(path) = options.output {
        let merged: Vec<_> = results.into_iter().map(|s| s.merged).collect();
        write_results_csv(&path, &merged)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!(
            "{} Results written to {} ({} rows)",
            style("✓").green(),
            path.display(),
            merged.len()
        );
    }
    Ok(())
}

fn print_story(progress: &BatchProgress, story: &ExtractedStory, languages: LanguageSelection) {
    let found = &story.findings;
    let shown = |value: &str| {
        if value.is_empty() {
            style("[not found]".to_string()).dim()
        } else {
            style(value.to_string())
        }
    };

    for problem in &found.problems {
        progress.println(format!("  {} {}", style("✗").red(), problem));
    }
    if languages.english() {
        progress.println(format!("  English title: {}", shown(&found.english_title)));
        if !found.translator.is_empty() {
            progress.println(format!("  Translator: {}", found.translator));
        }
        progress.println(format!(
            "  English description: {}",
            shown(&found.english_description)
        ));
        if let Some(ref cover) = found.cover {
            progress.println(format!(
                "  {} Cover saved to {}",
                style("✓").green(),
                cover.display()
            ));
        }
    }
    if languages.tamil() {
        progress.println(format!("  Tamil title: {}", shown(&found.tamil_title)));
        let origin = if found.translated {
            "translated"
        } else {
            "from PDF"
        };
        progress.println(format!(
            "  Tamil description ({}): {}",
            origin,
            shown(&found.tamil_description)
        ));
    }
}
