//! Direct HTTP tier using wreq for TLS fingerprint emulation.

use std::time::Duration;

use chrono::Utc;
use tracing::debug;
use wreq::Client;
use wreq_util::Emulation;

use super::{validate_url, FetchResponse};
use crate::error::{Error, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Plain HTTP fetcher with browser impersonation.
pub struct DirectFetcher {
    client: Client,
    accept_language: String,
    user_agent: Option<String>,
}

impl DirectFetcher {
    pub fn new(accept_language: &str, user_agent: Option<String>) -> Result<Self> {
        Self::with_timeout(accept_language, user_agent, REQUEST_TIMEOUT)
    }

    /// Builds the fetcher with a custom request timeout (for testing).
    pub fn with_timeout(
        accept_language: &str,
        user_agent: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .timeout(timeout)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| Error::Retrieval(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            accept_language: accept_language.to_string(),
            user_agent,
        })
    }

    /// Fetches a page. With `force`, appends a timestamp query parameter so
    /// intermediate caches serve a fresh copy.
    pub async fn fetch(&self, url: &str, force: bool) -> Result<FetchResponse> {
        validate_url(url)?;

        let url = if force {
            let sep = if url.contains('?') { '&' } else { '?' };
            format!("{url}{sep}t={}", Utc::now().timestamp_millis())
        } else {
            url.to_string()
        };

        debug!("GET {}", url);

        let mut request = self
            .client
            .get(&url)
            .emulation(Emulation::Chrome131)
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8")
            .header("Accept-Language", &self.accept_language)
            .header("Cache-Control", "no-cache")
            .header("Pragma", "no-cache")
            .header("Upgrade-Insecure-Requests", "1");

        if let Some(ua) = &self.user_agent {
            request = request.header("User-Agent", ua);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Retrieval(format!("request failed: {e}")))?;

        let status = response.status();
        debug!("Response status: {}", status);

        if !status.is_success() {
            return Err(Error::Retrieval(format!("request failed with status: {status}")));
        }

        let html = response
            .text()
            .await
            .map_err(|e| Error::Retrieval(format!("failed to read response body: {e}")))?;

        Ok(FetchResponse {
            status: status.as_u16(),
            html,
            fetched_at: Utc::now(),
            rendered: false,
        })
    }
}
