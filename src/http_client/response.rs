//! HTTP response wrapper.

use std::collections::HashMap;

use reqwest::{Response, StatusCode};

/// HTTP response wrapper with headers captured up front.
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HashMap<String, String>,
    body: Response,
}

impl HttpResponse {
    pub(crate) fn from_reqwest(response: Response) -> Self {
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.to_string(), v.to_string()))
            })
            .collect();

        Self {
            status: response.status(),
            headers,
            body: response,
        }
    }

    /// Check if the response is successful.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Check if the response indicates rate limiting (429).
    ///
    /// A 503 means the service is unavailable, not that we asked too often.
    pub fn is_rate_limited(&self) -> bool {
        self.status == StatusCode::TOO_MANY_REQUESTS
    }

    /// Get the Content-Type header.
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type").map(|s| s.as_str())
    }

    /// Get the Retry-After header.
    pub fn retry_after(&self) -> Option<&str> {
        self.headers.get("retry-after").map(|s| s.as_str())
    }

    /// Get response body as bytes.
    pub async fn bytes(self) -> Result<Vec<u8>, reqwest::Error> {
        self.body.bytes().await.map(|b| b.to_vec())
    }

    /// Get response body as text.
    pub async fn text(self) -> Result<String, reqwest::Error> {
        self.body.text().await
    }

    /// Deserialize response body as JSON.
    pub async fn json<T: serde::de::DeserializeOwned>(self) -> Result<T, reqwest::Error> {
        self.body.json().await
    }
}
