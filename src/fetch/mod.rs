//! Page retrieval: a direct HTTP tier and a rendered browser tier.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{Error, Result};

mod direct;
pub mod render;

pub use direct::DirectFetcher;
pub use render::{RenderEngine, RenderStatus};

/// Accepts absolute http/https URLs only.
pub fn validate_url(url: &str) -> Result<()> {
    let ok = url.get(..7).is_some_and(|p| p.eq_ignore_ascii_case("http://"))
        || url.get(..8).is_some_and(|p| p.eq_ignore_ascii_case("https://"));

    if ok {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!("URL must be absolute http(s): {url}")))
    }
}

/// A fetched page, from either tier.
#[derive(Debug, Clone, Serialize)]
pub struct FetchResponse {
    pub status: u16,
    pub html: String,
    pub fetched_at: DateTime<Utc>,
    pub rendered: bool,
}

/// Retrieval seam for both tiers, mockable in pipeline tests.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Direct HTTP fetch. `force` adds a cache-busting query parameter.
    async fn direct(&self, url: &str, force: bool) -> Result<FetchResponse>;

    /// Headless-browser fetch, waiting for `wait_selector` when given.
    async fn rendered(&self, url: &str, wait_selector: Option<&str>) -> Result<FetchResponse>;
}

/// Production retriever backed by the HTTP client and the shared render engine.
pub struct Fetcher {
    direct: DirectFetcher,
    wait_ms: u64,
    user_agent: Option<String>,
}

impl Fetcher {
    pub fn new(accept_language: &str, user_agent: Option<String>, wait_ms: u64) -> Result<Self> {
        Ok(Self {
            direct: DirectFetcher::new(accept_language, user_agent.clone())?,
            wait_ms,
            user_agent,
        })
    }
}

#[async_trait]
impl Retriever for Fetcher {
    async fn direct(&self, url: &str, force: bool) -> Result<FetchResponse> {
        self.direct.fetch(url, force).await
    }

    async fn rendered(&self, url: &str, wait_selector: Option<&str>) -> Result<FetchResponse> {
        let engine = RenderEngine::shared().await;
        let (status, html) = engine
            .render(url, wait_selector, self.wait_ms, self.user_agent.as_deref())
            .await?;

        Ok(FetchResponse { status, html, fetched_at: Utc::now(), rendered: true })
    }
}
