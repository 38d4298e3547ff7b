//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod add;
mod check;
mod extract;
mod new;
mod stories;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{load_settings, LoadOptions};
use crate::ocr::OcrBackendType;
use crate::services::LanguageSelection;
use crate::sheet::{RowRange, SheetSource};

use new::NewArgs;

#[derive(Parser)]
#[command(name = "stories")]
#[command(about = "Build bilingual story bundles for the EETHAL website")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Hugo site root (stories go to <root>/content/stories)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print summaries (no progress bar)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

/// Where spreadsheet rows come from.
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Read rows from a local CSV export
    #[arg(long, conflicts_with = "sheet")]
    csv: Option<PathBuf>,

    /// Google Sheets URL (defaults to the configured story sheet)
    #[arg(long)]
    sheet: Option<String>,
}

impl SourceArgs {
    fn into_source(self, default_url: &str) -> SheetSource {
        SheetSource::from_options(self.csv, self.sheet, default_url)
    }
}

/// OCR backend choice on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OcrArg {
    /// Gemini vision model (needs GEMINI_API_KEY)
    Gemini,
    /// Local tesseract with Tamil language data
    Tesseract,
}

impl From<OcrArg> for OcrBackendType {
    fn from(arg: OcrArg) -> Self {
        match arg {
            OcrArg::Gemini => OcrBackendType::Gemini,
            OcrArg::Tesseract => OcrBackendType::Tesseract,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create story bundles from spreadsheet rows
    Add {
        #[command(flatten)]
        source: SourceArgs,
        /// Spreadsheet rows to process, e.g. 5-10 or 7 (row 1 is the header)
        #[arg(long)]
        rows: Option<RowRange>,
        /// Include rows marked done and rewrite complete bundles
        #[arg(short, long)]
        force: bool,
        /// Only update tags of existing stories
        #[arg(long)]
        tags_only: bool,
    },

    /// Create one story from command-line fields and a local cover image
    New(NewArgs),

    /// Read titles, translators and descriptions from story PDFs
    Extract {
        #[command(flatten)]
        source: SourceArgs,
        /// Process only the first N stories (ignored with --rows)
        #[arg(short = 'n', long, default_value = "0")]
        limit: usize,
        /// Spreadsheet rows to process, e.g. 5-10 or 7
        #[arg(long)]
        rows: Option<RowRange>,
        /// Write merged rows to this CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// PDFs to read
        #[arg(long, value_enum, default_value = "both")]
        lang: LanguageSelection,
        /// OCR backend for garbled Tamil text (defaults to the configured one)
        #[arg(long, value_enum)]
        ocr: Option<OcrArg>,
        /// Save covers extracted from English PDFs for rows without an image
        #[arg(long)]
        covers_dir: Option<PathBuf>,
    },

    /// List published stories
    List,

    /// Delete a published story
    Delete {
        /// Story slug (directory name under content/stories)
        slug: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Check external tools and API keys
    Check,
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = load_settings(LoadOptions {
        config_path: cli.config,
        site_root: cli.root,
    })
    .await?;
    let show_progress = !cli.quiet && !cli.verbose;

    match cli.command {
        Commands::Add {
            source,
            rows,
            force,
            tags_only,
        } => {
            let source = source.into_source(&settings.sheet_url);
            if tags_only {
                add::cmd_tags_only(&settings, &source, rows).await
            } else {
                add::cmd_add(&settings, &source, rows, force, show_progress).await
            }
        }
        Commands::New(args) => new::cmd_new(&settings, args),
        Commands::Extract {
            source,
            limit,
            rows,
            output,
            lang,
            ocr,
            covers_dir,
        } => {
            let options = extract::ExtractOptions {
                source: source.into_source(&settings.sheet_url),
                limit: (limit > 0).then_some(limit),
                rows,
                output,
                languages: lang,
                ocr: ocr.map(Into::into).unwrap_or(settings.ocr_backend),
                covers_dir,
                show_progress,
            };
            extract::cmd_extract(&settings, options).await
        }
        Commands::List => stories::cmd_list(&settings),
        Commands::Delete { slug, force } => stories::cmd_delete(&settings, &slug, force),
        Commands::Check => check::cmd_check(&settings),
    }
}
