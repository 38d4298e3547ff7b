//! Retry delay helpers shared by downloads and cloud API backends.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

/// "Please retry in 27.5s" style hints in API error bodies.
static RETRY_IN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)retry in (\d+(?:\.\d+)?)").unwrap());

/// "rate", "rate limit", "ratelimited", but not "generate".
static RATE_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\brate").unwrap());

/// Longest wait a server can ask for.
pub const MAX_RETRY_WAIT: Duration = Duration::from_secs(120);

/// Parse Retry-After header value (seconds).
/// Returns duration to wait, or None if header is missing/invalid.
pub fn parse_retry_after(header_value: Option<&str>) -> Option<Duration> {
    let value = header_value?;
    value
        .trim()
        .parse::<u64>()
        .ok()
        .map(|secs| Duration::from_secs(secs).min(MAX_RETRY_WAIT))
}

/// Parse a "retry in N" hint from an error message, adding `buffer`.
///
/// The hint is capped at `MAX_RETRY_WAIT`.
pub fn parse_retry_hint(message: &str, buffer: Duration) -> Option<Duration> {
    let caps = RETRY_IN.captures(message)?;
    let secs: f64 = caps[1].parse().ok()?;
    let hint = Duration::try_from_secs_f64(secs).ok()?;
    Some(hint.min(MAX_RETRY_WAIT) + buffer)
}

/// Linear delay used between download attempts: 3s, 6s, 9s, ...
pub fn linear_delay(attempt: u32, step: Duration) -> Duration {
    step * (attempt + 1)
}

/// Whether an error message describes quota exhaustion or rate limiting.
pub fn looks_rate_limited(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("429") || lower.contains("quota") || RATE_WORD.is_match(&lower)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_retry_after() {
        assert_eq!(parse_retry_after(Some("30")), Some(Duration::from_secs(30)));
        assert_eq!(parse_retry_after(Some("9999")), Some(Duration::from_secs(120)));
        assert_eq!(parse_retry_after(Some("soon")), None);
        assert_eq!(parse_retry_after(None), None);
    }

    #[test]
    fn test_parse_retry_hint() {
        let msg = "429 Resource exhausted. Please retry in 27.5s.";
        let delay = parse_retry_hint(msg, Duration::from_secs(2)).unwrap();
        assert_eq!(delay, Duration::from_millis(29_500));
        assert!(parse_retry_hint("internal error", Duration::ZERO).is_none());
    }

    #[test]
    fn test_parse_retry_hint_is_capped() {
        let buffer = Duration::from_secs(2);
        assert_eq!(
            parse_retry_hint("Please retry in 99999999999999999999999s", buffer),
            Some(MAX_RETRY_WAIT + buffer)
        );
        assert_eq!(
            parse_retry_hint("retry in 600s", Duration::ZERO),
            Some(MAX_RETRY_WAIT)
        );
    }

    #[test]
    fn test_linear_delay() {
        let step = Duration::from_secs(3);
        assert_eq!(linear_delay(0, step), Duration::from_secs(3));
        assert_eq!(linear_delay(2, step), Duration::from_secs(9));
    }

    #[test]
    fn test_looks_rate_limited() {
        assert!(looks_rate_limited("HTTP 429 Too Many Requests"));
        assert!(looks_rate_limited("Quota exceeded for metric"));
        assert!(looks_rate_limited("Rate limit exceeded"));
        assert!(!looks_rate_limited("invalid argument"));
        assert!(!looks_rate_limited("models/x is not found for generateContent"));
    }
}
