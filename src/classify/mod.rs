//! Pattern rules that turn page text into story metadata.

mod description;
mod first_page;
mod garbled;

pub use description::{
    clean_description, is_footer_line, is_level_description, is_level_marker,
    is_valid_description, parse_description,
};
pub use first_page::{parse_first_page, FirstPage};
pub use garbled::is_garbled;

/// Trimmed, non-empty lines of page text.
pub fn text_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_lines() {
        assert_eq!(
            text_lines("  one \n\n\ttwo\r\n   \nthree"),
            vec!["one", "two", "three"]
        );
        assert!(text_lines("").is_empty());
    }
}
