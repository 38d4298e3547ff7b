//! Google Drive share-link resolution.
//!
//! Share links arrive in several shapes; every one of them carries a file ID
//! that maps to a direct download URL and an embeddable preview URL.

use std::sync::LazyLock;

use regex::Regex;

/// File ID patterns, tried in order.
static FILE_ID_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"drive\.google\.com/file/d/([a-zA-Z0-9_-]+)",
        r"drive\.google\.com/open\?id=([a-zA-Z0-9_-]+)",
        r"drive\.google\.com/uc\?(?:[^#]*&)?id=([a-zA-Z0-9_-]+)",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Extract the Drive file ID from a share URL.
pub fn extract_file_id(url: &str) -> Option<String> {
    FILE_ID_PATTERNS
        .iter()
        .find_map(|re| re.captures(url))
        .map(|caps| caps[1].to_string())
}

/// Drive endpoint serving file contents.
pub const DOWNLOAD_BASE: &str = "https://drive.google.com/uc";

/// Direct download URL under `base` that skips the virus-scan
/// confirmation page.
pub fn download_url(base: &str, file_id: &str) -> String {
    format!("{}?export=download&id={}&confirm=t", base, file_id)
}

/// Embeddable preview URL for a share link.
///
/// URLs without a recognizable file ID are returned unchanged.
pub fn preview_url(url: &str) -> String {
    match extract_file_id(url) {
        Some(id) => format!("https://drive.google.com/file/d/{}/preview", id),
        None => url.to_string(),
    }
}
