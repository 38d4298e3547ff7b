//! English to Tamil translation through Google Cloud Translation (v2).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::http_client::HttpClient;

const TRANSLATE_URL: &str = "https://translation.googleapis.com/language/translate/v2";

#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("GOOGLE_TRANSLATE_API_KEY not set")]
    NotConfigured,

    #[error("Translation request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Translation API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Translation API returned no text")]
    Empty,
}

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'a str,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    data: TranslateData,
}

#[derive(Debug, Deserialize)]
struct TranslateData {
    translations: Vec<Translation>,
}

#[derive(Debug, Deserialize)]
struct Translation {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

/// Translates story descriptions.
pub struct Translator {
    client: HttpClient,
    api_key: Option<String>,
}

impl Translator {
    pub fn new(client: HttpClient, api_key: Option<String>) -> Self {
        Self {
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Translate English text to Tamil.
    pub async fn to_tamil(&self, text: &str) -> Result<String, TranslateError> {
        self.translate(text, "en", "ta").await
    }

    pub async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, TranslateError> {
        let api_key = self.api_key.as_ref().ok_or(TranslateError::NotConfigured)?;
        if text.trim().is_empty() {
            return Err(TranslateError::Empty);
        }

        let url = format!("{}?key={}", TRANSLATE_URL, api_key);
        let request = TranslateRequest {
            q: text,
            source,
            target,
            format: "text",
        };

        let response = self.client.post_json(&url, &request).await?;
        if !response.is_success() {
            let status = response.status.as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(TranslateError::Api { status, body });
        }

        let parsed: TranslateResponse = response.json().await?;
        let translated = first_translation(parsed).ok_or(TranslateError::Empty)?;
        tracing::info!("Translated {} chars to {}", text.chars().count(), target);
        Ok(translated)
    }
}

fn first_translation(response: TranslateResponse) -> Option<String> {
    response
        .data
        .translations
        .into_iter()
        .next()
        .map(|t| t.translated_text.trim().to_string())
        .filter(|t| !t.is_empty())
}
