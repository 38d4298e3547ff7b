//! Metadata extraction from story PDFs.
//!
//! Downloads each row's English and Tamil PDFs, reads titles, translator and
//! descriptions from the text layer (falling back to OCR when the Tamil text
//! layer is garbled), and merges the findings over the spreadsheet values.

use std::io::Write;
use std::path::{Path, PathBuf};

use tokio::sync::mpsc;

use crate::assets::AssetFetcher;
use crate::bundle::slugify;
use crate::classify::{is_garbled, parse_description, parse_first_page, text_lines, FirstPage};
use crate::ocr::{OcrEngine, PageHint};
use crate::pdf::{self, ExtractionError};
use crate::sheet::{Column, StoryRow};
use crate::translate::Translator;

pub const DOWNLOAD_FAILED: &str = "[Download failed]";
pub const NO_TEXT_ON_LAST_PAGE: &str = "[No text found on last page]";
pub const NO_DESCRIPTION_ON_LAST_PAGE: &str = "[No description found on last page]";

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Which PDFs to read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LanguageSelection {
    #[default]
    Both,
    #[value(name = "eng")]
    English,
    #[value(name = "tam")]
    Tamil,
}

impl LanguageSelection {
    pub fn english(self) -> bool {
        matches!(self, Self::Both | Self::English)
    }

    pub fn tamil(self) -> bool {
        matches!(self, Self::Both | Self::Tamil)
    }
}

/// Whether a description is real text rather than a `[...]` placeholder.
pub fn is_usable_description(description: &str) -> bool {
    let d = description.trim();
    !d.is_empty() && !(d.starts_with('[') && d.ends_with(']'))
}

/// Values read from a row's PDFs. Empty strings mean "not found".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PdfFindings {
    pub english_title: String,
    pub tamil_title: String,
    pub translator: String,
    pub english_description: String,
    pub tamil_description: String,
    /// Tamil description came from translating the English one.
    pub translated: bool,
    /// Cover image extracted from the English PDF.
    pub cover: Option<PathBuf>,
    /// Download problems, one line each.
    pub problems: Vec<String>,
}

impl PdfFindings {
    /// Overlay the findings on a spreadsheet row.
    ///
    /// Placeholders never replace a spreadsheet value. The image link always
    /// stays the spreadsheet's.
    pub fn merge(&self, row: &StoryRow) -> StoryRow {
        fn pick(found: &str, sheet: &str) -> String {
            if is_usable_description(found) {
                found.to_string()
            } else {
                sheet.to_string()
            }
        }

        StoryRow {
            english_title: pick(&self.english_title, &row.english_title),
            tamil_title: pick(&self.tamil_title, &row.tamil_title),
            translators: pick(&self.translator, &row.translators),
            english_description: pick(&self.english_description, &row.english_description),
            tamil_description: pick(&self.tamil_description, &row.tamil_description),
            ..row.clone()
        }
    }
}

/// One processed row.
#[derive(Debug, Clone)]
pub struct ExtractedStory {
    pub row_num: u32,
    pub findings: PdfFindings,
    /// Spreadsheet row with the findings merged in.
    pub merged: StoryRow,
}

/// Events emitted during extraction.
#[derive(Debug, Clone)]
pub enum ExtractEvent {
    Started {
        index: usize,
        total: usize,
        row_num: u32,
        english_title: String,
        tamil_title: String,
    },
    Finished(Box<ExtractedStory>),
}

/// Reads story metadata from PDFs.
pub struct MetadataExtractor {
    fetcher: AssetFetcher,
    translator: Translator,
    ocr: Option<OcrEngine>,
    languages: LanguageSelection,
    covers_dir: Option<PathBuf>,
}

impl MetadataExtractor {
    pub fn new(fetcher: AssetFetcher, translator: Translator, languages: LanguageSelection) -> Self {
        Self {
            fetcher,
            translator,
            ocr: None,
            languages,
            covers_dir: None,
        }
    }

    /// OCR fallback for garbled Tamil text layers.
    pub fn with_ocr(mut self, engine: OcrEngine) -> Self {
        self.ocr = Some(engine);
        self
    }

    /// Save covers of rows without an image link into `dir`.
    pub fn with_covers_dir(mut self, dir: PathBuf) -> Self {
        self.covers_dir = Some(dir);
        self
    }

    /// Title and translator from page 1.
    ///
    /// For Tamil PDFs a garbled title triggers OCR, whose result is used only
    /// if its own title reads cleanly.
    pub async fn first_page_info(&self, pdf_path: &Path, tamil: bool) -> FirstPage {
        let text = match page_text(pdf_path, Page::First).await {
            Ok((_, text)) => text,
            Err(e) => {
                tracing::warn!("Error reading page 1: {}", e);
                return FirstPage::default();
            }
        };
        let page = parse_first_page(&text_lines(&text));

        if tamil && is_garbled(&page.title) {
            if let Some(ref ocr) = self.ocr {
                tracing::info!("Text layer garbled, trying OCR on page 1");
                if let Some(ocr_text) = ocr.try_ocr_page(pdf_path, 1, PageHint::First).await {
                    let ocr_page = parse_first_page(&text_lines(&ocr_text));
                    if !is_garbled(&ocr_page.title) {
                        return ocr_page;
                    }
                }
            }
        }
        page
    }

    /// Story description from the last page, or a `[...]` placeholder.
    pub async fn description(&self, pdf_path: &Path, tamil: bool) -> String {
        let (last_page, text) = match page_text(pdf_path, Page::Last).await {
            Ok(found) => found,
            Err(e) => return format!("[Error reading PDF: {}]", e),
        };
        let no_text = text.trim().is_empty();
        let description = if no_text {
            None
        } else {
            parse_description(&text_lines(&text))
        };

        if tamil && description.as_deref().map_or(true, is_garbled) {
            if let Some(ref ocr) = self.ocr {
                tracing::info!("Text layer garbled, trying OCR on last page");
                let ocr_description = ocr
                    .try_ocr_page(pdf_path, last_page, PageHint::Last)
                    .await
                    .and_then(|t| parse_description(&text_lines(&t)))
                    .filter(|d| !is_garbled(d));
                if let Some(d) = ocr_description {
                    return d;
                }
            }
        }

        match description {
            Some(d) => d,
            None if no_text => NO_TEXT_ON_LAST_PAGE.to_string(),
            None => NO_DESCRIPTION_ON_LAST_PAGE.to_string(),
        }
    }

    /// Tamil description: translated from English when possible, otherwise
    /// read from the Tamil PDF.
    async fn tamil_description(&self, pdf_path: &Path, english: &str) -> (String, bool) {
        if is_usable_description(english) && self.translator.is_configured() {
            tracing::info!("Translating English description to Tamil");
            match self.translator.to_tamil(english).await {
                Ok(translated) => return (translated, true),
                Err(e) => tracing::warn!("Translation failed, extracting from Tamil PDF: {}", e),
            }
        }
        (self.description(pdf_path, true).await, false)
    }

    async fn extract_cover(&self, pdf_path: &Path, row: &StoryRow, title: &str) -> Option<PathBuf> {
        let dir = self.covers_dir.as_ref()?;
        let slug = match slugify(title) {
            s if s.is_empty() => format!("row-{}", row.row_num),
            s => s,
        };
        let dest = dir.join(format!("{}_cover.png", slug));

        let pdf_path = pdf_path.to_path_buf();
        let task_dest = dest.clone();
        let result =
            tokio::task::spawn_blocking(move || pdf::extract_cover_image(&pdf_path, &task_dest))
                .await;
        match result {
            Ok(Ok(true)) => Some(dest),
            Ok(Ok(false)) => None,
            Ok(Err(e)) => {
                tracing::warn!("Cover extraction failed for row {}: {}", row.row_num, e);
                None
            }
            Err(e) => {
                tracing::warn!("Cover extraction task failed: {}", e);
                None
            }
        }
    }

    /// Process one row, downloading its PDFs into `work_dir`.
    pub async fn extract_row(&self, row: &StoryRow, work_dir: &Path, index: usize) -> ExtractedStory {
        let mut found = PdfFindings::default();

        if self.languages.english() && !row.english_pdf.is_empty() {
            let pdf_path = work_dir.join(format!("eng_{}.pdf", index));
            tracing::info!("Downloading English PDF for row {}", row.row_num);
            match self.fetcher.download_pdf(&row.english_pdf, &pdf_path).await {
                Ok(()) => {
                    let page = self.first_page_info(&pdf_path, false).await;
                    found.english_description = self.description(&pdf_path, false).await;
                    if row.image.is_empty() {
                        let title = if page.title.is_empty() {
                            &row.english_title
                        } else {
                            &page.title
                        };
                        found.cover = self.extract_cover(&pdf_path, row, title).await;
                    }
                    found.english_title = page.title;
                    found.translator = page.translator;
                }
                Err(e) => {
                    found.english_description = DOWNLOAD_FAILED.to_string();
                    found.problems.push(format!("English PDF: {}", e));
                }
            }
        }

        if self.languages.tamil() && !row.tamil_pdf.is_empty() {
            let pdf_path = work_dir.join(format!("tam_{}.pdf", index));
            tracing::info!("Downloading Tamil PDF for row {}", row.row_num);
            match self.fetcher.download_pdf(&row.tamil_pdf, &pdf_path).await {
                Ok(()) => {
                    let page = self.first_page_info(&pdf_path, true).await;
                    found.tamil_title = page.title;
                    if found.translator.is_empty() {
                        found.translator = page.translator;
                    }
                    let (description, translated) = self
                        .tamil_description(&pdf_path, &found.english_description)
                        .await;
                    found.tamil_description = description;
                    found.translated = translated;
                }
                Err(e) => found.problems.push(format!("Tamil PDF: {}", e)),
            }
        }

        ExtractedStory {
            row_num: row.row_num,
            merged: found.merge(row),
            findings: found,
        }
    }

    /// Process rows in order. PDFs live in a temporary directory removed on
    /// return; the fetcher's scratch directory is cleaned up as well.
    pub async fn extract_rows(
        &self,
        rows: &[&StoryRow],
        event_tx: Option<mpsc::Sender<ExtractEvent>>,
    ) -> std::io::Result<Vec<ExtractedStory>> {
        let work = tempfile::TempDir::new()?;
        let total = rows.len();
        let mut results = Vec::with_capacity(total);

        for (i, row) in rows.iter().enumerate() {
            let index = i + 1;
            if let Some(ref tx) = event_tx {
                let _ = tx
                    .send(ExtractEvent::Started {
                        index,
                        total,
                        row_num: row.row_num,
                        english_title: row.english_title.clone(),
                        tamil_title: row.tamil_title.clone(),
                    })
                    .await;
            }

            let story = self.extract_row(row, work.path(), index).await;

            if let Some(ref tx) = event_tx {
                let _ = tx.send(ExtractEvent::Finished(Box::new(story.clone()))).await;
            }
            results.push(story);
        }

        self.fetcher.cleanup().await;
        Ok(results)
    }
}

#[derive(Debug, Clone, Copy)]
enum Page {
    First,
    Last,
}

/// Text of the first or last page, with its page number.
async fn page_text(pdf_path: &Path, page: Page) -> Result<(u32, String), ExtractionError> {
    let pdf_path = pdf_path.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let num = match page {
            Page::First => 1,
            Page::Last => pdf::page_count(&pdf_path)?.max(1),
        };
        let text = pdf::page_text(&pdf_path, num)?;
        Ok::<_, ExtractionError>((num, text))
    })
    .await
    .map_err(|e| ExtractionError::ExtractionFailed(format!("PDF task failed: {}", e)))?
}

/// Write rows as CSV with a UTF-8 BOM and the spreadsheet's header labels.
pub fn write_results_csv(path: &Path, rows: &[StoryRow]) -> Result<(), csv::Error> {
    let mut file = std::fs::File::create(path)?;
    file.write_all(UTF8_BOM)?;

    let mut writer = csv::Writer::from_writer(file);
    writer.write_record(Column::ALL.iter().map(|c| c.label()))?;
    for row in rows {
        writer.write_record(row.to_record())?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::config::Settings;
    use crate::http_client::HttpClient;
    use crate::sheet::parse_rows;

    fn sheet_row() -> StoryRow {
        StoryRow {
            row_num: 4,
            english_title: "Moon".into(),
            tamil_title: "நிலா".into(),
            image: "https://drive.google.com/file/d/IMG/view".into(),
            sw_link_english: "https://storyweaver.org.in/stories/1".into(),
            translators: "Meena".into(),
            english_description: "From the sheet.".into(),
            status: "done".into(),
            tags: "night".into(),
            ..Default::default()
        }
    }

    fn extractor(temp: &Path, languages: LanguageSelection) -> MetadataExtractor {
        let client = HttpClient::builder("test", Duration::from_secs(1), Duration::ZERO)
            .build()
            .unwrap();
        let settings = Settings {
            temp_dir: temp.join("scratch"),
            ..Settings::default()
        };
        let fetcher = AssetFetcher::new(client.clone(), &settings)
            .with_timing(Duration::ZERO, Duration::ZERO);
        MetadataExtractor::new(fetcher, Translator::new(client, None), languages)
    }

    #[test]
    fn test_language_selection() {
        use clap::ValueEnum;
        let eng = LanguageSelection::from_str("eng", true).unwrap();
        assert!(eng.english() && !eng.tamil());
        let tam = LanguageSelection::from_str("tam", true).unwrap();
        assert!(!tam.english() && tam.tamil());
        assert!(LanguageSelection::default().english() && LanguageSelection::default().tamil());
    }

    #[test]
    fn test_usable_description() {
        assert!(is_usable_description("A girl finds a cap."));
        assert!(!is_usable_description(""));
        assert!(!is_usable_description(DOWNLOAD_FAILED));
        assert!(!is_usable_description(NO_TEXT_ON_LAST_PAGE));
        assert!(!is_usable_description("[Error reading PDF: boom]"));
    }

    #[test]
    fn test_merge_prefers_pdf_values() {
        let found = PdfFindings {
            english_title: "The Moon".into(),
            translator: "Kavitha".into(),
            english_description: DOWNLOAD_FAILED.into(),
            tamil_description: "ஒரு கதை".into(),
            cover: Some(PathBuf::from("covers/the-moon_cover.png")),
            ..Default::default()
        };
        let merged = found.merge(&sheet_row());
        assert_eq!(merged.english_title, "The Moon");
        assert_eq!(merged.tamil_title, "நிலா");
        assert_eq!(merged.translators, "Kavitha");
        assert_eq!(merged.english_description, "From the sheet.");
        assert_eq!(merged.tamil_description, "ஒரு கதை");
        assert_eq!(merged.image, sheet_row().image);
        assert_eq!(merged.status, "done");
        assert_eq!(merged.row_num, 4);
    }

    #[tokio::test]
    async fn test_description_of_unreadable_pdf() {
        let temp = tempfile::tempdir().unwrap();
        let description = extractor(temp.path(), LanguageSelection::Both)
            .description(&temp.path().join("missing.pdf"), false)
            .await;
        assert!(description.starts_with("[Error reading PDF:"));
    }

    #[tokio::test]
    async fn test_row_without_pdfs_keeps_sheet_values() {
        let temp = tempfile::tempdir().unwrap();
        let story = extractor(temp.path(), LanguageSelection::Both)
            .extract_row(&sheet_row(), temp.path(), 1)
            .await;
        assert_eq!(story.findings, PdfFindings::default());
        assert_eq!(story.merged, sheet_row());
    }

    #[tokio::test]
    async fn test_failed_download_marks_description() {
        let temp = tempfile::tempdir().unwrap();
        let mut row = sheet_row();
        row.english_pdf = "not a drive link".into();
        row.tamil_pdf = "also not a drive link".into();

        let story = extractor(temp.path(), LanguageSelection::Both)
            .extract_row(&row, temp.path(), 1)
            .await;
        assert_eq!(story.findings.english_description, DOWNLOAD_FAILED);
        assert_eq!(story.findings.problems.len(), 2);
        assert!(story.findings.problems[0].starts_with("English PDF:"));
        assert_eq!(story.merged.english_description, "From the sheet.");
    }

    #[tokio::test]
    async fn test_language_selection_skips_other_pdf() {
        let temp = tempfile::tempdir().unwrap();
        let mut row = sheet_row();
        row.english_pdf = "not a drive link".into();

        let story = extractor(temp.path(), LanguageSelection::Tamil)
            .extract_row(&row, temp.path(), 1)
            .await;
        assert!(story.findings.english_description.is_empty());
        assert!(story.findings.problems.is_empty());
    }

    #[tokio::test]
    async fn test_extract_rows_emits_events() {
        let temp = tempfile::tempdir().unwrap();
        let row = sheet_row();
        let (tx, mut rx) = mpsc::channel(8);

        let results = extractor(temp.path(), LanguageSelection::Both)
            .extract_rows(&[&row], Some(tx))
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert!(matches!(
            rx.try_recv().unwrap(),
            ExtractEvent::Started { index: 1, total: 1, row_num: 4, .. }
        ));
        assert!(matches!(rx.try_recv().unwrap(), ExtractEvent::Finished(_)));
    }

    #[test]
    fn test_results_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let mut row = sheet_row();
        row.english_description = "Line one,\nline \"two\"".into();
        write_results_csv(&path, &[row.clone()]).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains(
            "English Title,Tamil Title,English PDF,Tamil PDF,Image,SW link-Eng,SW link Tamil,\
             Translators,English Description,Tamil Description,Status,Tags"
        ));

        let parsed = parse_rows(&text).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].english_description, row.english_description);
        assert_eq!(parsed[0].row_num, 2);
    }
}
