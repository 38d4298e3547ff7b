//! Story description from a storybook's last page.
//!
//! The last page reads, top to bottom: a reading-level notice, a language
//! tag such as `(English)`, the title, the description, then the publisher
//! footer. OCR output follows the same order but with typos, so the rules
//! below match loosely.

use std::sync::LazyLock;

use regex::Regex;

/// Language tags printed just above the title.
const LANG_TAGS: [&str; 4] = ["(English)", "(Tamil)", "(தமிழ்)", "(ஆங்கிலம்)"];

/// Minimum length of a usable description.
const MIN_DESCRIPTION_CHARS: usize = 10;

static LEVEL_ONLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^Level\s+\d+\s*$").unwrap());
static TAMIL_LEVEL_ONLY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^நிலை\s*\d+\s*$").unwrap());

static TRAILING_STORYWEAVER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s*(?:story\s*weaver|storyweaver)\s*$").unwrap());
static TRAILING_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s*(?:www\.|http)\S*\s*$").unwrap());
static TRAILING_PUNCT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*[,.\-]+\s*$").unwrap());

/// Publisher footer, licence and website lines.
pub fn is_footer_line(line: &str) -> bool {
    let lower = line.to_lowercase();
    const FOOTER_WORDS: [&str; 11] = [
        "pratham",
        "goes digital",
        "storyweaver",
        "story weaver",
        "www.",
        "http",
        ".org",
        ".com",
        "creative commons",
        "cc by",
        "license",
    ];
    FOOTER_WORDS.iter().any(|w| lower.contains(w))
        || lower.contains("copyright")
        || line.contains("பிரதம் புக்ஸ்")
        || line.contains("ஸ்டோரி வீவர்")
        || line.contains("ஸ்டோரிவீவர்")
}

/// The reading-level notice that opens the last page.
pub fn is_level_marker(line: &str) -> bool {
    let lower = line.to_lowercase();
    lower.contains("this is a level")
        || lower.contains("this book")
        || line.contains("இந்த நிலை")
        || (line.contains("நிலை") && line.contains("கதை"))
}

/// Text describing the reader level rather than the story.
pub fn is_level_description(line: &str) -> bool {
    let lower = line.to_lowercase();
    let stripped = line.trim();

    if LEVEL_ONLY.is_match(stripped) || TAMIL_LEVEL_ONLY.is_match(stripped) {
        return true;
    }
    if lower.contains("this is a level") && lower.contains("book") {
        return true;
    }
    if lower.contains("this book") && (lower.contains("reader") || lower.contains("children")) {
        return true;
    }
    if line.contains("இந்த நிலை") && line.contains("புத்தகம்") {
        return true;
    }
    line.contains("நிலை") && (line.contains("புத்தகம்") || line.contains("குழந்தைகளுக்கானது"))
}

/// Strip trailing StoryWeaver mentions, URLs and punctuation.
pub fn clean_description(text: &str) -> String {
    let text = TRAILING_STORYWEAVER.replace(text, "");
    let text = TRAILING_URL.replace(&text, "");
    let text = TRAILING_PUNCT.replace(&text, "");
    text.trim().to_string()
}

/// Whether text is a story description rather than a level notice.
pub fn is_valid_description(text: &str) -> bool {
    let stripped = text.trim();
    if stripped.chars().count() < MIN_DESCRIPTION_CHARS {
        return false;
    }
    !is_level_description(stripped)
}

/// Index where the description begins.
fn description_start(lines: &[String]) -> usize {
    if let Some(i) = lines
        .iter()
        .position(|l| LANG_TAGS.iter().any(|tag| l.contains(tag)))
    {
        // skip the title line after the tag
        return i + 2;
    }
    if let Some(i) = lines.iter().position(|l| is_level_marker(l)) {
        // level marker, language tag, title
        return i + 3;
    }
    lines.len().min(3)
}

/// Extract the story description from last-page lines.
///
/// Returns `None` when nothing usable remains after filtering.
pub fn parse_description(lines: &[String]) -> Option<String> {
    let start = description_start(lines).min(lines.len());
    let end = lines[start..]
        .iter()
        .position(|l| is_footer_line(l))
        .map_or(lines.len(), |offset| start + offset);

    let kept: Vec<&str> = lines[start..end]
        .iter()
        .map(|l| l.as_str())
        .filter(|l| !is_footer_line(l) && !is_level_description(l))
        .collect();
    if kept.is_empty() {
        return None;
    }

    let description = clean_description(&kept.join(" "));
    if description.is_empty() || !is_valid_description(&description) {
        return None;
    }
    Some(description)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::text_lines;

    #[test]
    fn test_footer_lines() {
        assert!(is_footer_line("Pratham Books goes digital to weave"));
        assert!(is_footer_line("Pratham 800ks"));
        assert!(is_footer_line("Read more on www.storyweaver.org.in"));
        assert!(is_footer_line("This work is licensed under CC BY 4.0"));
        assert!(is_footer_line("Copyright 2019"));
        assert!(is_footer_line("பிரதம் புக்ஸ் வெளியீடு"));
        assert!(is_footer_line("ஸ்டோரிவீவர்"));
        assert!(!is_footer_line("A little girl finds a cap on the moon."));
    }

    #[test]
    fn test_level_marker() {
        assert!(is_level_marker("This is a Level 2 book"));
        assert!(is_level_marker("THIS BOOK is for"));
        assert!(is_level_marker("இந்த நிலை 2"));
        assert!(is_level_marker("நிலை 3 கதை"));
        assert!(!is_level_marker("நிலை 3"));
    }

    #[test]
    fn test_level_description() {
        assert!(is_level_description("Level 4"));
        assert!(is_level_description("  level 12  "));
        assert!(is_level_description("நிலை 2"));
        assert!(is_level_description("This is a Level 2 book for children"));
        assert!(is_level_description("This book is for readers who can read"));
        assert!(is_level_description("இந்த நிலை 2 புத்தகம் பழகிய சொற்களை"));
        assert!(is_level_description("நிலை குழந்தைகளுக்கானது"));
        assert!(!is_level_description("A level-headed monkey saves the day."));
    }

    #[test]
    fn test_clean_description() {
        assert_eq!(clean_description("A fun story. StoryWeaver"), "A fun story");
        assert_eq!(clean_description("A fun story story weaver  "), "A fun story");
        assert_eq!(
            clean_description("A fun story, https://storyweaver.org.in/x"),
            "A fun story"
        );
        assert_eq!(clean_description("A fun story --"), "A fun story");
        assert_eq!(clean_description("  Plain  "), "Plain");
    }

    #[test]
    fn test_valid_description() {
        assert!(!is_valid_description("Too short"));
        assert!(!is_valid_description("Level 4"));
        assert!(!is_valid_description("This is a Level 1 book for new readers"));
        assert!(is_valid_description("A monkey learns to share."));
        assert!(is_valid_description("ஒரு குரங்கு பகிர கற்றுக்கொள்கிறது"));
    }

    #[test]
    fn test_parse_with_language_tag() {
        let lines = text_lines(
            "This is a Level 2 book for children who recognise familiar words.\n\
             (English)\n\
             The Moon and the Cap\n\
             A little girl throws her cap so high\n\
             that it lands on the moon.\n\
             Pratham Books goes digital to weave a whole new chapter\n\
             www.prathambooks.org",
        );
        assert_eq!(
            parse_description(&lines).as_deref(),
            Some("A little girl throws her cap so high that it lands on the moon")
        );
    }

    #[test]
    fn test_parse_with_tamil_tag() {
        let lines = text_lines(
            "இந்த நிலை 2 புத்தகம்\n(தமிழ்)\nநிலாவும் தொப்பியும்\nஒரு சிறுமி தன் தொப்பியை நிலா வரை வீசுகிறாள்.\nஸ்டோரிவீவர்",
        );
        assert_eq!(
            parse_description(&lines).as_deref(),
            Some("ஒரு சிறுமி தன் தொப்பியை நிலா வரை வீசுகிறாள்")
        );
    }

    #[test]
    fn test_parse_falls_back_to_level_marker() {
        let lines = text_lines(
            "This book is a Level 1 story\nEnglish\nTitle\nA goat climbs the tallest hill in town.\nPratham Books",
        );
        assert_eq!(
            parse_description(&lines).as_deref(),
            Some("A goat climbs the tallest hill in town")
        );
    }

    #[test]
    fn test_parse_last_resort_skips_three_lines() {
        let lines = text_lines("Level 3\nTag\nTitle\nThe river sings to the fish at night");
        assert_eq!(
            parse_description(&lines).as_deref(),
            Some("The river sings to the fish at night")
        );
    }

    #[test]
    fn test_parse_drops_level_lines_inside_description() {
        let lines = text_lines(
            "(English)\nTitle\nLevel 2\nA crow finds water in a deep pot.\nCreative Commons",
        );
        assert_eq!(
            parse_description(&lines).as_deref(),
            Some("A crow finds water in a deep pot")
        );
    }

    #[test]
    fn test_parse_rejects_invalid() {
        assert_eq!(parse_description(&text_lines("(English)\nTitle\nLevel 4")), None);
        assert_eq!(parse_description(&text_lines("(English)\nTitle\nShort")), None);
        assert_eq!(parse_description(&text_lines("(English)")), None);
        assert_eq!(parse_description(&[]), None);
    }
}
