//! One-off price lookup for a single URL.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::catalog::{Offer, ResolvedOffer};
use crate::config::Config;
use crate::error::Error;
use crate::extract::{Engine, SelectorHint};
use crate::fetch::{validate_url, Fetcher, RenderStatus, Retriever};
use crate::format::Formatter;
use crate::resolve::Pipeline;

/// Resolves a single URL outside any configured item.
pub struct LookupCommand {
    config: Config,
}

impl LookupCommand {
    /// Creates a new lookup command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Looks up one URL with the production retriever.
    ///
    /// With `rendered`, skips the direct tier entirely and goes straight to
    /// the browser, failing early when no Node runtime is available.
    pub async fn execute(
        &self,
        url: &str,
        selector: Option<&str>,
        rendered: bool,
    ) -> Result<String> {
        if rendered {
            let status = RenderStatus::probe().await;
            if let Some(hint) = status.hint() {
                anyhow::bail!("Rendered fetch unavailable: {hint}");
            }
        }

        let fetcher = Fetcher::new(
            &self.config.accept_language,
            self.config.user_agent.clone(),
            self.config.wait_ms,
        )
        .context("Failed to create HTTP client")?;

        self.execute_with_retriever(fetcher, url, selector, rendered).await
    }

    /// Looks up one URL with a provided retriever (for testing).
    pub async fn execute_with_retriever(
        &self,
        retriever: impl Retriever + 'static,
        url: &str,
        selector: Option<&str>,
        rendered: bool,
    ) -> Result<String> {
        validate_url(url)?;
        info!("Looking up: {}", url);

        let offer = Offer {
            store: "lookup".to_string(),
            url: url.to_string(),
            selector: selector.map(String::from),
        };

        let engine = Engine::new(self.config.currency);
        let formatter = Formatter::new(self.config.format);

        if rendered {
            let wait_selector = selector.map(|s| SelectorHint::parse(s).base().to_string());
            let response = retriever.rendered(url, wait_selector.as_deref()).await?;
            let extraction = engine.extract(&response.html, selector);
            let resolved = match (extraction.amount, extraction.source) {
                (Some(amount), Some(source)) => {
                    ResolvedOffer::resolved(offer, amount, extraction.currency, source, true)
                }
                _ => ResolvedOffer::failed(offer, Error::ExtractionMiss.to_string()),
            };
            return Ok(formatter.format_offer(&resolved));
        }

        let pipeline = Arc::new(Pipeline::new(retriever, engine));
        let resolved = pipeline.resolve_offer(offer, false).await;
        Ok(formatter.format_offer(&resolved))
    }
}
