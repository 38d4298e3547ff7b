//! Availability of external tools and API keys.

use console::style;

use crate::config::Settings;
use crate::ocr::{OcrBackendType, OcrEngine};
use crate::pdf;

fn mark(ok: bool) -> console::StyledObject<&'static str> {
    if ok {
        style("✓").green()
    } else {
        style("✗").red()
    }
}

pub fn cmd_check(settings: &Settings) -> anyhow::Result<()> {
    println!("{} External tools", style("→").cyan());
    for (tool, found) in pdf::check_tools() {
        println!("  {} {}", mark(found), tool);
    }

    println!("\n{} API keys", style("→").cyan());
    println!(
        "  {} GEMINI_API_KEY",
        mark(settings.gemini_api_key.is_some())
    );
    println!(
        "  {} GOOGLE_TRANSLATE_API_KEY",
        mark(settings.translate_api_key.is_some())
    );

    println!("\n{} OCR backends", style("→").cyan());
    for backend_type in [OcrBackendType::Gemini, OcrBackendType::Tesseract] {
        let engine = OcrEngine::from_settings(backend_type, settings)?;
        let backend = engine.backend();
        let selected = if backend_type == settings.ocr_backend {
            " (selected)"
        } else {
            ""
        };
        if backend.is_available() {
            println!("  {} {}{}", mark(true), backend_type, selected);
        } else {
            println!(
                "  {} {}{}: {}",
                mark(false),
                backend_type,
                selected,
                backend.availability_hint()
            );
        }
    }

    println!("\n{} Site", style("→").cyan());
    println!(
        "  {} {}",
        mark(settings.site_root.is_dir()),
        settings.site_root.display()
    );
    println!(
        "  {} {}",
        mark(settings.stories_dir.is_dir()),
        settings.stories_dir.display()
    );
    Ok(())
}
