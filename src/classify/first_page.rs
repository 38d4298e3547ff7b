//! Title and translator from a storybook's first page.

use std::sync::LazyLock;

use regex::Regex;

/// Header and logo lines printed above the title.
static SKIP_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)^EETHAL$",
        r"(?i)^Pratham\s*Books?$",
        r"(?i)^StoryWeaver$",
        r"(?i)^www\.",
        r"(?i)^http",
        r"^\d+$",
        r"^```+$",
        r"^[*#-]+$",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static TRANSLATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:Translator|Translated by)[:\s]+(.+)").unwrap());

/// What the first page says about the story.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FirstPage {
    pub title: String,
    pub translator: String,
}

fn is_header_line(line: &str) -> bool {
    SKIP_PATTERNS.iter().any(|re| re.is_match(line))
}

/// Pick the title and translator out of first-page lines.
///
/// The title is the first non-empty line that is not a header or logo,
/// falling back to the first line.
pub fn parse_first_page(lines: &[String]) -> FirstPage {
    let title = lines
        .iter()
        .map(|l| l.trim())
        .find(|l| !l.is_empty() && !is_header_line(l))
        .or_else(|| lines.first().map(|l| l.trim()))
        .unwrap_or_default()
        .to_string();

    let translator = lines
        .iter()
        .find_map(|l| TRANSLATOR.captures(l))
        .map(|caps| caps[1].trim().to_string())
        .unwrap_or_default();

    FirstPage { title, translator }
}
