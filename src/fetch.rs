use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::warn;

const MAX_RETRIES: u32 = 3;
const BASE_BACKOFF_MS: u64 = 2000;
pub const DEFAULT_USER_AGENT: &str = "Intel CPU Crawler 1.0";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("server returned status {0}")]
    Status(u16),
    #[error(transparent)]
    Other(#[from] reqwest::Error),
}

pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .default_headers(default_headers())
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    /// Fetch one page body, retrying transient failures with exponential
    /// backoff. Non-retryable statuses fail immediately.
    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let mut last_err = FetchError::Status(0);
        for attempt in 0..=MAX_RETRIES {
            match self.fetch_once(url).await {
                Ok(body) => return Ok(body),
                Err(e) => {
                    if !retryable(&e) || attempt == MAX_RETRIES {
                        return Err(e);
                    }
                    let backoff = Duration::from_millis(BASE_BACKOFF_MS * 2u64.pow(attempt));
                    warn!(
                        "Fetch failed for {} (attempt {}/{}): {}, backing off {:.1}s",
                        url,
                        attempt + 1,
                        MAX_RETRIES,
                        e,
                        backoff.as_secs_f64()
                    );
                    last_err = e;
                    tokio::time::sleep(backoff).await;
                }
            }
        }
        Err(last_err)
    }

    async fn fetch_once(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await.map_err(classify)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        Ok(response.text().await.map_err(classify)?)
    }
}

fn classify(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else if e.is_connect() {
        FetchError::Connect(e.to_string())
    } else {
        FetchError::Other(e)
    }
}

fn retryable(e: &FetchError) -> bool {
    match e {
        FetchError::Timeout | FetchError::Connect(_) => true,
        FetchError::Status(code) => {
            *code == StatusCode::TOO_MANY_REQUESTS.as_u16() || (500..=599).contains(code)
        }
        FetchError::Other(_) => false,
    }
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        "Accept",
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert("Accept-Language", HeaderValue::from_static("en-US,en;q=0.5"));
    headers.insert("Connection", HeaderValue::from_static("keep-alive"));
    headers.insert("Upgrade-Insecure-Requests", HeaderValue::from_static("1"));
    headers.insert("Sec-Fetch-Dest", HeaderValue::from_static("document"));
    headers.insert("Sec-Fetch-Mode", HeaderValue::from_static("navigate"));
    headers.insert("Sec-Fetch-Site", HeaderValue::from_static("none"));
    headers.insert("Cache-Control", HeaderValue::from_static("max-age=0"));
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_errors_retry() {
        assert!(retryable(&FetchError::Timeout));
        assert!(retryable(&FetchError::Connect("refused".into())));
        assert!(retryable(&FetchError::Status(429)));
        assert!(retryable(&FetchError::Status(503)));
    }

    #[test]
    fn client_errors_fail_fast() {
        assert!(!retryable(&FetchError::Status(404)));
        assert!(!retryable(&FetchError::Status(403)));
    }
}
