//! Google Gemini Vision OCR backend.
//!
//! Sends a rendered page as an inline base64 PNG to `generateContent`.
//! Requires GEMINI_API_KEY.
//!
//! The free tier allows 5 requests per minute, so every successful call is
//! followed by a pause (GEMINI_DELAY_MS, default 13s). Rate-limit answers
//! are retried up to 3 times, waiting for the Retry-After header or the
//! "retry in Ns" hint in the error body plus 2s, else 15s.

use std::path::Path;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::backend::{OcrBackend, OcrBackendType, OcrError, OcrResult, PageHint};
use crate::http_client::HttpClient;
use crate::rate_limit::{looks_rate_limited, parse_retry_after, parse_retry_hint};

/// Retries after the first rate-limited attempt.
const MAX_RETRIES: u32 = 3;

/// Wait when the API gives no retry hint.
const DEFAULT_RETRY_WAIT: Duration = Duration::from_secs(15);

/// Added to the API's own retry hint.
const RETRY_BUFFER: Duration = Duration::from_secs(2);

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

const FIRST_PAGE_PROMPT: &str = "This is the first page of a Tamil children's storybook. \
Extract all text from this image in reading order (top to bottom). \
Include the story title, author, translator, and any other text. \
Ignore logos, website URLs, and organization names like 'EETHAL' or 'Pratham Books'. \
Return only the text content, one line per text element, without any commentary.";

const LAST_PAGE_PROMPT: &str = "This is the last page of a Tamil children's storybook. \
It contains a story description/summary. \
Extract all text from this image in reading order. \
Include the reading level indicator (like 'Level 2'), language tag, title, and the STORY description. \
DO NOT include text that describes what level of reader the book is for \
(like 'This is a Level 2 book for children...'). \
Ignore footer text like 'Pratham Books', 'StoryWeaver', website URLs, and legal text. \
Return only the text content, one line per text element, without any commentary.";

const OTHER_PAGE_PROMPT: &str = "Extract all text from this image. \
This is a page from a Tamil children's storybook. \
Please preserve the exact text layout and return only the text content without any additional commentary.";

/// Extraction prompt for a page.
pub fn prompt_for(hint: PageHint) -> &'static str {
    match hint {
        PageHint::First => FIRST_PAGE_PROMPT,
        PageHint::Last => LAST_PAGE_PROMPT,
        PageHint::Other => OTHER_PAGE_PROMPT,
    }
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiPart {
    Text { text: String },
    InlineData { inline_data: GeminiInlineData },
}

#[derive(Debug, Serialize)]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
struct GeminiGenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
    error: Option<GeminiApiError>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiApiError {
    message: String,
}

impl GeminiResponse {
    /// Concatenated text of the first candidate.
    fn into_text(self) -> Result<String, OcrError> {
        if let Some(error) = self.error {
            return Err(OcrError::OcrFailed(format!(
                "Gemini API error: {}",
                error.message
            )));
        }
        let text: String = self
            .candidates
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();
        Ok(text.trim().to_string())
    }
}

/// How long to wait before retrying a rate-limited request.
fn retry_wait(retry_after: Option<&str>, body: &str, buffer: Duration) -> Duration {
    parse_retry_after(retry_after)
        .map(|d| d + buffer)
        .or_else(|| parse_retry_hint(body, buffer))
        .unwrap_or(DEFAULT_RETRY_WAIT)
}

fn mime_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "image/png",
    }
}

/// Gemini Vision OCR backend.
pub struct GeminiBackend {
    client: HttpClient,
    api_key: Option<String>,
    base_url: String,
    model: String,
    delay: Duration,
    retry_buffer: Duration,
}

impl GeminiBackend {
    /// Create a backend using `client` for requests.
    pub fn new(client: HttpClient, api_key: Option<String>) -> Self {
        Self {
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: API_BASE.to_string(),
            model: "gemini-2.5-pro".to_string(),
            delay: Duration::from_secs(13),
            retry_buffer: RETRY_BUFFER,
        }
    }

    /// Set the model (e.g., "gemini-2.5-pro", "gemini-2.5-flash").
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the pause after each successful request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Send requests to another models endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the margin added to the server's retry hint.
    pub fn with_retry_buffer(mut self, buffer: Duration) -> Self {
        self.retry_buffer = buffer;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(image_bytes: &[u8], mime_type: &str, hint: PageHint) -> GeminiRequest {
        GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![
                    GeminiPart::Text {
                        text: prompt_for(hint).to_string(),
                    },
                    GeminiPart::InlineData {
                        inline_data: GeminiInlineData {
                            mime_type: mime_type.to_string(),
                            data: base64::engine::general_purpose::STANDARD.encode(image_bytes),
                        },
                    },
                ],
            }],
            generation_config: GeminiGenerationConfig { temperature: 0.1 },
        }
    }

    async fn run_gemini(&self, image_path: &Path, hint: PageHint) -> Result<String, OcrError> {
        let api_key = self.api_key.as_ref().ok_or_else(|| {
            OcrError::BackendNotAvailable(
                "GEMINI_API_KEY not set. Get an API key from https://aistudio.google.com/app/apikey"
                    .to_string(),
            )
        })?;

        let image_bytes = tokio::fs::read(image_path).await?;
        let request = Self::build_request(&image_bytes, mime_type_for(image_path), hint);
        let url = format!(
            "{}/{}:generateContent?key={}",
            self.base_url, self.model, api_key
        );

        let mut retries = 0;
        loop {
            let response = self
                .client
                .post_json(&url, &request)
                .await
                .map_err(|e| OcrError::OcrFailed(format!("HTTP request failed: {}", e)))?;

            if response.is_success() {
                let parsed: GeminiResponse = response.json().await.map_err(|e| {
                    OcrError::OcrFailed(format!("Failed to parse response: {}", e))
                })?;
                let text = parsed.into_text()?;

                if self.delay > Duration::ZERO {
                    debug!("Gemini: pausing {:?} after request", self.delay);
                    tokio::time::sleep(self.delay).await;
                }
                return Ok(text);
            }

            let status = response.status;
            let rate_limited_status = response.is_rate_limited();
            let retry_after = response.retry_after().map(str::to_string);
            let body = response.text().await.unwrap_or_default();

            if !(rate_limited_status || looks_rate_limited(&body)) {
                return Err(OcrError::OcrFailed(format!(
                    "Gemini API error ({}): {}",
                    status, body
                )));
            }

            retries += 1;
            if retries > MAX_RETRIES {
                return Err(OcrError::RateLimited {
                    backend: OcrBackendType::Gemini,
                    attempts: MAX_RETRIES,
                });
            }

            let wait = retry_wait(retry_after.as_deref(), &body, self.retry_buffer);
            warn!(
                "Rate limit hit. Waiting {:.0}s before retry {}/{}...",
                wait.as_secs_f64(),
                retries,
                MAX_RETRIES
            );
            tokio::time::sleep(wait).await;
        }
    }
}

#[async_trait]
impl OcrBackend for GeminiBackend {
    fn backend_type(&self) -> OcrBackendType {
        OcrBackendType::Gemini
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    fn availability_hint(&self) -> String {
        if self.api_key.is_none() {
            "GEMINI_API_KEY not set. Get an API key from https://aistudio.google.com/app/apikey\n\
             Then set it with: export GEMINI_API_KEY='your-key-here', or use --ocr tesseract."
                .to_string()
        } else {
            format!("Gemini Vision is available (model: {})", self.model)
        }
    }

    async fn ocr_image(&self, image_path: &Path, hint: PageHint) -> Result<OcrResult, OcrError> {
        let start = Instant::now();
        let text = self.run_gemini(image_path, hint).await?;

        Ok(OcrResult {
            text,
            backend: OcrBackendType::Gemini,
            model: Some(self.model.clone()),
            processing_time_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::canned::{local_client, Canned, CannedServer};

    const OCR_REPLY: &str = r#"{"candidates":[{"content":{"parts":[{"text":"நிலா"}]}}]}"#;

    fn local_backend(server: &CannedServer) -> GeminiBackend {
        GeminiBackend::new(local_client(), Some("key".into()))
            .with_base_url(server.base())
            .with_delay(Duration::ZERO)
            .with_retry_buffer(Duration::ZERO)
    }

    fn page(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("page-1.png");
        std::fs::write(&path, b"png").unwrap();
        path
    }

    fn too_many() -> Canned {
        Canned::new(429, r#"{"error":{"message":"Resource exhausted"}}"#).header("Retry-After", "0")
    }

    fn client() -> HttpClient {
        HttpClient::builder("gemini-test", Duration::from_secs(1), Duration::ZERO)
            .build()
            .unwrap()
    }

    #[test]
    fn test_prompts_per_page() {
        assert!(prompt_for(PageHint::First).contains("translator"));
        assert!(prompt_for(PageHint::Last).contains("STORY description"));
        assert!(prompt_for(PageHint::Other).contains("preserve the exact text layout"));
    }

    #[test]
    fn test_retry_wait() {
        assert_eq!(retry_wait(Some("10"), "", RETRY_BUFFER), Duration::from_secs(12));
        assert_eq!(
            retry_wait(
                None,
                r#"{"error":{"message":"Quota exceeded. Please retry in 20s."}}"#,
                RETRY_BUFFER
            ),
            Duration::from_secs(22)
        );
        assert_eq!(
            retry_wait(None, "quota exceeded", RETRY_BUFFER),
            DEFAULT_RETRY_WAIT
        );
    }

    #[test]
    fn test_request_shape() {
        let request = GeminiBackend::build_request(b"png", "image/png", PageHint::First);
        let json = serde_json::to_value(&request).unwrap();
        let parts = &json["contents"][0]["parts"];
        assert_eq!(parts[0]["text"], FIRST_PAGE_PROMPT);
        assert_eq!(parts[1]["inline_data"]["mime_type"], "image/png");
        assert_eq!(parts[1]["inline_data"]["data"], "cG5n");
    }

    #[test]
    fn test_response_text() {
        let response: GeminiResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"நிலா\n"},{"text":"Level 2"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(response.into_text().unwrap(), "நிலா\nLevel 2");

        let empty: GeminiResponse = serde_json::from_str(r#"{"candidates":[{}]}"#).unwrap();
        assert_eq!(empty.into_text().unwrap(), "");

        let error: GeminiResponse =
            serde_json::from_str(r#"{"error":{"message":"bad image"}}"#).unwrap();
        assert!(error.into_text().is_err());
    }

    #[test]
    fn test_mime_type() {
        assert_eq!(mime_type_for(Path::new("page-1.png")), "image/png");
        assert_eq!(mime_type_for(Path::new("cover.jpeg")), "image/jpeg");
    }

    #[tokio::test]
    async fn test_requires_api_key() {
        let backend = GeminiBackend::new(client(), Some("  ".to_string()));
        assert!(!backend.is_available());
        assert!(backend.availability_hint().contains("GEMINI_API_KEY"));

        let err = backend
            .ocr_image(Path::new("page.png"), PageHint::First)
            .await
            .unwrap_err();
        assert!(matches!(err, OcrError::BackendNotAvailable(_)));
    }

    #[tokio::test]
    async fn test_rate_limited_request_is_retried() {
        let dir = tempfile::tempdir().unwrap();
        let server = CannedServer::start(vec![too_many(), Canned::new(200, OCR_REPLY)]).await;

        let result = local_backend(&server)
            .ocr_image(&page(dir.path()), PageHint::First)
            .await
            .unwrap();
        assert_eq!(result.text, "நிலா");
        assert_eq!(result.model.as_deref(), Some("gemini-2.5-pro"));
        assert_eq!(server.hits(), 2);
    }

    #[tokio::test]
    async fn test_gives_up_after_three_retries() {
        let dir = tempfile::tempdir().unwrap();
        let server = CannedServer::start(vec![too_many()]).await;

        let err = local_backend(&server)
            .ocr_image(&page(dir.path()), PageHint::Last)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            OcrError::RateLimited {
                backend: OcrBackendType::Gemini,
                attempts: 3
            }
        ));
        assert_eq!(server.hits(), 4);
    }

    #[tokio::test]
    async fn test_quota_message_is_retried() {
        let dir = tempfile::tempdir().unwrap();
        let server = CannedServer::start(vec![
            Canned::new(400, r#"{"error":{"message":"Quota exceeded. Please retry in 0s."}}"#),
            Canned::new(200, OCR_REPLY),
        ])
        .await;

        local_backend(&server)
            .ocr_image(&page(dir.path()), PageHint::Other)
            .await
            .unwrap();
        assert_eq!(server.hits(), 2);
    }

    #[tokio::test]
    async fn test_other_errors_are_not_retried() {
        let dir = tempfile::tempdir().unwrap();
        for reply in [
            Canned::new(400, r#"{"error":{"message":"Invalid image"}}"#),
            Canned::new(503, r#"{"error":{"message":"The model is overloaded."}}"#),
        ] {
            let server = CannedServer::start(vec![reply]).await;
            let err = local_backend(&server)
                .ocr_image(&page(dir.path()), PageHint::First)
                .await
                .unwrap_err();
            assert!(matches!(err, OcrError::OcrFailed(_)));
            assert_eq!(server.hits(), 1);
        }
    }

    #[test]
    fn test_builder() {
        let backend = GeminiBackend::new(client(), Some("key".into()))
            .with_model("gemini-2.5-flash")
            .with_delay(Duration::ZERO);
        assert!(backend.is_available());
        assert_eq!(backend.model(), "gemini-2.5-flash");
    }
}
