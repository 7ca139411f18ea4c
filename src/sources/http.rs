use std::time::Duration;

use dashmap::DashMap;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tokio::time::Instant;
use tracing::debug;
use crate::errors::DigfootError;

pub const DEFAULT_USER_AGENT: &str = concat!("digfoot/", env!("CARGO_PKG_VERSION"), " (digital footprint scanner)");

#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub user_agent: String,
    pub request_timeout: Duration,
    /// Minimum spacing between two requests to the same host.
    pub request_delay: Duration,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout: Duration::from_secs(10),
            request_delay: Duration::from_millis(500),
        }
    }
}

/// A fetched page, regardless of status.
#[derive(Debug, Clone)]
pub struct Page {
    pub status: u16,
    pub body: String,
}

impl Page {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Shared HTTP client with per-host politeness.
pub struct HttpClient {
    client: Client,
    delay: Duration,
    next_slot: DashMap<String, Instant>,
}

impl HttpClient {
    pub fn new(settings: &HttpSettings) -> Result<Self, DigfootError> {
        let client = Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(settings.request_timeout)
            .build()
            .map_err(|e| DigfootError::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            delay: settings.request_delay,
            next_slot: DashMap::new(),
        })
    }

    /// Wait until this host's next request slot, reserving the one after it.
    async fn throttle(&self, url: &str) {
        if self.delay.is_zero() {
            return;
        }
        let host = host_of(url).unwrap_or_default();
        let wait = {
            let now = Instant::now();
            let mut slot = self.next_slot.entry(host).or_insert(now);
            let start = (*slot).max(now);
            *slot = start + self.delay;
            start - now
        };
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
    }

    async fn send(&self, url: &str, headers: &[(&str, String)]) -> Result<Response, DigfootError> {
        self.throttle(url).await;
        debug!(url, "GET");
        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(*name, value);
        }
        request.send().await.map_err(|e| DigfootError::from_transport(url, e))
    }

    /// GET a JSON document. `Ok(None)` means the resource does not exist (404).
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        headers: &[(&str, String)],
    ) -> Result<Option<T>, DigfootError> {
        let resp = self.send(url, headers).await?;
        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        check_status(url, &resp)?;
        let body = resp.json::<T>().await
            .map_err(|e| DigfootError::UnexpectedResponse(format!("{}: {}", url, e)))?;
        Ok(Some(body))
    }

    /// GET a page without interpreting non-success statuses, except throttling.
    pub async fn get_page(&self, url: &str) -> Result<Page, DigfootError> {
        let resp = self.send(url, &[]).await?;
        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(DigfootError::RateLimit(url.to_string()));
        }
        let body = resp.text().await.map_err(|e| DigfootError::from_transport(url, e))?;
        Ok(Page { status: status.as_u16(), body })
    }
}

fn check_status(url: &str, resp: &Response) -> Result<(), DigfootError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(());
    }
    match status.as_u16() {
        429 => Err(DigfootError::RateLimit(url.to_string())),
        401 => Err(DigfootError::Authentication(url.to_string())),
        403 => {
            let exhausted = resp.headers()
                .get("x-ratelimit-remaining")
                .and_then(|v| v.to_str().ok())
                .map_or(false, |v| v.trim() == "0");
            if exhausted {
                Err(DigfootError::RateLimit(url.to_string()))
            } else {
                Err(DigfootError::Permission(url.to_string()))
            }
        }
        code => Err(DigfootError::Http { status: code, url: url.to_string() }),
    }
}

pub fn host_of(url: &str) -> Option<String> {
    url::Url::parse(url).ok()?.host_str().map(|h| h.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_of() {
        assert_eq!(host_of("https://API.GitHub.com/search/users?q=x").as_deref(), Some("api.github.com"));
        assert_eq!(host_of("http://127.0.0.1:8080/x").as_deref(), Some("127.0.0.1"));
        assert_eq!(host_of("not a url"), None);
    }

    #[test]
    fn test_default_user_agent_names_tool() {
        assert!(HttpSettings::default().user_agent.starts_with("digfoot/"));
    }

    #[tokio::test]
    async fn test_throttle_spaces_requests_to_same_host() {
        let client = HttpClient::new(&HttpSettings {
            request_delay: Duration::from_millis(50),
            ..Default::default()
        }).unwrap();
        let start = Instant::now();
        client.throttle("https://example.com/a").await;
        client.throttle("https://example.com/b").await;
        client.throttle("https://other.example/").await;
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(50));
        assert!(elapsed < Duration::from_millis(500));
    }
}
