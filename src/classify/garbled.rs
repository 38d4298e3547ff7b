//! Detection of text layers with broken font encoding.
//!
//! Tamil PDFs with bad font maps yield control characters (e.g. 0x0F) and
//! stray ASCII letters interleaved with Tamil code points.

/// Share of ASCII letters among (Tamil + ASCII letters) above which mixed
/// text is treated as garbled.
const ASCII_RATIO_LIMIT: f64 = 0.1;

fn is_tamil(c: char) -> bool {
    ('\u{0B80}'..='\u{0BFF}').contains(&c)
}

/// Whether extracted text looks garbled and should be OCRed instead.
pub fn is_garbled(text: &str) -> bool {
    if text.is_empty() {
        return true;
    }

    if text
        .chars()
        .any(|c| (c as u32) < 32 && !matches!(c, '\n' | '\r' | '\t'))
    {
        return true;
    }

    let tamil = text.chars().filter(|c| is_tamil(*c)).count();
    if tamil == 0 {
        return false;
    }
    let ascii = text.chars().filter(|c| c.is_ascii_alphabetic()).count();
    ascii > 0 && ascii as f64 / (tamil + ascii) as f64 > ASCII_RATIO_LIMIT
}
