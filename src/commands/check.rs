//! Full comparison run over every configured item.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::Config;
use crate::extract::Engine;
use crate::fetch::{Fetcher, Retriever};
use crate::format::Formatter;
use crate::resolve::Pipeline;

/// Resolves all configured items and prints a comparison.
pub struct CheckCommand {
    config: Config,
}

impl CheckCommand {
    /// Creates a new check command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Resolves every item with the production retriever.
    pub async fn execute(&self, force: bool) -> Result<String> {
        let fetcher = Fetcher::new(
            &self.config.accept_language,
            self.config.user_agent.clone(),
            self.config.wait_ms,
        )
        .context("Failed to create HTTP client")?;

        self.execute_with_retriever(fetcher, force).await
    }

    /// Resolves every item with a provided retriever (for testing).
    pub async fn execute_with_retriever(
        &self,
        retriever: impl Retriever + 'static,
        force: bool,
    ) -> Result<String> {
        if self.config.items.is_empty() {
            anyhow::bail!(
                "No items configured. Add [[items]] entries to your config file."
            );
        }

        info!("Checking {} item(s)", self.config.items.len());

        let engine = Engine::new(self.config.currency);
        let pipeline = Arc::new(Pipeline::new(retriever, engine));
        let resolved = pipeline.resolve_all(self.config.items.clone(), force).await;

        let formatter = Formatter::new(self.config.format);
        Ok(formatter.format_items(&resolved))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::HashMap;

    use crate::catalog::{Item, Offer};
    use crate::config::OutputFormat;
    use crate::error::Error;
    use crate::extract::Currency;
    use crate::fetch::FetchResponse;

    struct MockRetriever {
        pages: HashMap<String, String>,
    }

    #[async_trait]
    impl Retriever for MockRetriever {
        async fn direct(&self, url: &str, _force: bool) -> crate::error::Result<FetchResponse> {
            match self.pages.get(url) {
                Some(html) => Ok(FetchResponse {
                    status: 200,
                    html: html.clone(),
                    fetched_at: Utc::now(),
                    rendered: false,
                }),
                None => Err(Error::Retrieval("request failed with status: 404".to_string())),
            }
        }

        async fn rendered(
            &self,
            _url: &str,
            _wait_selector: Option<&str>,
        ) -> crate::error::Result<FetchResponse> {
            Err(Error::Render("no sidecar in tests".to_string()))
        }
    }

    fn make_test_config() -> Config {
        Config {
            currency: Currency::Cad,
            format: OutputFormat::Table,
            items: vec![Item {
                id: "eggs".to_string(),
                name: "Eggs (12)".to_string(),
                offers: vec![
                    Offer {
                        store: "No Frills".to_string(),
                        url: "https://www.nofrills.ca/p/1".to_string(),
                        selector: None,
                    },
                    Offer {
                        store: "Walmart".to_string(),
                        url: "https://www.walmart.ca/p/1".to_string(),
                        selector: None,
                    },
                ],
            }],
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_check_command_basic() {
        let pages = HashMap::from([
            (
                "https://www.nofrills.ca/p/1".to_string(),
                r#"<div class="price">$7.49</div>"#.to_string(),
            ),
            (
                "https://www.walmart.ca/p/1".to_string(),
                r#"<div class="price">$6.99</div>"#.to_string(),
            ),
        ]);

        let cmd = CheckCommand::new(make_test_config());
        let output = cmd
            .execute_with_retriever(MockRetriever { pages }, false)
            .await
            .unwrap();

        assert!(output.contains("Eggs (12)"));
        assert!(output.contains("Best: CAD 6.99 at Walmart"));
    }

    #[tokio::test]
    async fn test_check_command_partial_failure() {
        let pages = HashMap::from([(
            "https://www.nofrills.ca/p/1".to_string(),
            r#"<div class="price">$7.49</div>"#.to_string(),
        )]);

        let cmd = CheckCommand::new(make_test_config());
        let output = cmd
            .execute_with_retriever(MockRetriever { pages }, false)
            .await
            .unwrap();

        // The failed offer is reported, the surviving one still wins.
        assert!(output.contains("404"));
        assert!(output.contains("Best: CAD 7.49 at No Frills"));
    }

    #[tokio::test]
    async fn test_check_command_no_items() {
        let config = Config { items: Vec::new(), ..make_test_config() };
        let cmd = CheckCommand::new(config);

        let err = cmd
            .execute_with_retriever(MockRetriever { pages: HashMap::new() }, false)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("No items configured"));
    }

    #[tokio::test]
    async fn test_check_command_json_format() {
        let pages = HashMap::from([
            (
                "https://www.nofrills.ca/p/1".to_string(),
                r#"<div class="price">$7.49</div>"#.to_string(),
            ),
            (
                "https://www.walmart.ca/p/1".to_string(),
                r#"<div class="price">$6.99</div>"#.to_string(),
            ),
        ]);

        let config = Config { format: OutputFormat::Json, ..make_test_config() };
        let cmd = CheckCommand::new(config);
        let output = cmd
            .execute_with_retriever(MockRetriever { pages }, false)
            .await
            .unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed[0]["id"], "eggs");
        assert_eq!(parsed[0]["offers"][1]["best"], true);
    }
}
