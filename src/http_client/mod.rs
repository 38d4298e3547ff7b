//! HTTP client shared by the spreadsheet, Drive, OCR and translation calls.
//!
//! Requests from one client are spaced at least `request_delay` apart.

mod response;
#[cfg(test)]
pub(crate) mod canned;

pub use response::HttpResponse;

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::Client;
use tokio::sync::Mutex;

/// HTTP client with request pacing and logging.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    name: String,
    request_delay: Duration,
    last_request: Arc<Mutex<Option<Instant>>>,
}

/// Builder for constructing `HttpClient` with optional configuration.
pub struct HttpClientBuilder {
    name: String,
    timeout: Duration,
    request_delay: Duration,
    user_agent: Option<String>,
}

impl HttpClientBuilder {
    /// Set the user agent string.
    pub fn user_agent(mut self, ua: &str) -> Self {
        self.user_agent = Some(ua.to_string());
        self
    }

    /// Build the `HttpClient`.
    pub fn build(self) -> Result<HttpClient, reqwest::Error> {
        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("eethal-stories/{}", env!("CARGO_PKG_VERSION")));

        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(self.timeout)
            .gzip(true)
            .build()?;

        Ok(HttpClient {
            client,
            name: self.name,
            request_delay: self.request_delay,
            last_request: Arc::new(Mutex::new(None)),
        })
    }
}

impl HttpClient {
    /// Create a builder for configuring an `HttpClient`.
    ///
    /// - `name`: identifier used in log lines
    /// - `timeout`: request timeout
    /// - `request_delay`: minimum spacing between requests
    pub fn builder(name: &str, timeout: Duration, request_delay: Duration) -> HttpClientBuilder {
        HttpClientBuilder {
            name: name.to_string(),
            timeout,
            request_delay,
            user_agent: None,
        }
    }

    /// Wait until `request_delay` has passed since the previous request.
    async fn pace(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.request_delay {
                tokio::time::sleep(self.request_delay - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    /// Make a GET request. Redirects are followed.
    pub async fn get(&self, url: &str) -> Result<HttpResponse, reqwest::Error> {
        self.pace().await;
        let start = Instant::now();
        let response = self.client.get(url).send().await?;
        tracing::debug!(
            "[{}] GET {} -> {} in {:?}",
            self.name,
            redact_key(url),
            response.status(),
            start.elapsed()
        );
        Ok(HttpResponse::from_reqwest(response))
    }

    /// POST a JSON body.
    pub async fn post_json<T: serde::Serialize + ?Sized>(
        &self,
        url: &str,
        json: &T,
    ) -> Result<HttpResponse, reqwest::Error> {
        self.pace().await;
        let start = Instant::now();
        let response = self.client.post(url).json(json).send().await?;
        tracing::debug!(
            "[{}] POST {} -> {} in {:?}",
            self.name,
            redact_key(url),
            response.status(),
            start.elapsed()
        );
        Ok(HttpResponse::from_reqwest(response))
    }
}

/// Hide `key=` query values so API keys never reach the logs.
fn redact_key(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(mut parsed) => {
            if parsed.query_pairs().any(|(k, _)| k == "key") {
                let pairs: Vec<(String, String)> = parsed
                    .query_pairs()
                    .map(|(k, v)| {
                        let v = if k == "key" { "***".to_string() } else { v.into_owned() };
                        (k.into_owned(), v)
                    })
                    .collect();
                parsed.query_pairs_mut().clear().extend_pairs(pairs);
            }
            parsed.to_string()
        }
        Err(_) => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_key() {
        let redacted =
            redact_key("https://translation.googleapis.com/language/translate/v2?key=secret&q=hi");
        assert!(!redacted.contains("secret"));
        assert!(redacted.contains("q=hi"));
    }

    #[test]
    fn test_redact_key_leaves_other_urls() {
        let url = "https://drive.google.com/uc?export=download&id=abc";
        assert_eq!(redact_key(url), url);
    }

    #[tokio::test]
    async fn test_pacing_spaces_requests() {
        let client = HttpClient::builder("test", Duration::from_secs(5), Duration::from_millis(50))
            .build()
            .unwrap();
        let start = Instant::now();
        client.pace().await;
        client.pace().await;
        assert!(start.elapsed() >= Duration::from_millis(50));
    }
}
