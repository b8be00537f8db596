//! The offer resolution pipeline: fetch, extract, escalate, compare.
//!
//! Every offer first goes through the direct HTTP tier. Only when that yields
//! no price does the offer escalate to the rendered tier. Offers within an
//! item resolve concurrently; items resolve concurrently too.

use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::catalog::{Item, Offer, ResolvedItem, ResolvedOffer};
use crate::error::Error;
use crate::extract::{Engine, SelectorHint};
use crate::fetch::Retriever;

/// Drives offers through retrieval and extraction.
pub struct Pipeline<R: Retriever> {
    retriever: R,
    engine: Engine,
}

impl<R: Retriever + 'static> Pipeline<R> {
    pub fn new(retriever: R, engine: Engine) -> Self {
        Self { retriever, engine }
    }

    /// Resolves one offer, escalating to the rendered tier when the direct
    /// fetch produces no price.
    pub async fn resolve_offer(&self, offer: Offer, force: bool) -> ResolvedOffer {
        let hint = offer.selector.as_deref();

        let direct_err = match self.retriever.direct(&offer.url, force).await {
            Ok(response) => {
                let extraction = self.engine.extract(&response.html, hint);
                if let (Some(amount), Some(source)) = (extraction.amount, extraction.source) {
                    debug!(store = %offer.store, amount, "resolved via direct fetch");
                    return ResolvedOffer::resolved(
                        offer,
                        amount,
                        extraction.currency,
                        source,
                        false,
                    );
                }
                None
            }
            Err(Error::InvalidInput(msg)) => {
                // A malformed URL will not get better in a browser.
                return ResolvedOffer::failed(offer, format!("invalid input: {msg}"));
            }
            Err(e) => Some(e.to_string()),
        };

        info!(store = %offer.store, "escalating to rendered fetch");

        // Wait for the offer's own selector when it has one.
        let wait_selector = hint.map(|h| SelectorHint::parse(h).base().to_string());

        let rendered_err = match self.retriever.rendered(&offer.url, wait_selector.as_deref()).await
        {
            Ok(response) => {
                let extraction = self.engine.extract(&response.html, hint);
                if let (Some(amount), Some(source)) = (extraction.amount, extraction.source) {
                    debug!(store = %offer.store, amount, "resolved via rendered fetch");
                    return ResolvedOffer::resolved(
                        offer,
                        amount,
                        extraction.currency,
                        source,
                        true,
                    );
                }
                None
            }
            Err(e) => Some(e.to_string()),
        };

        // The direct tier's error is the more diagnostic one when both
        // tiers failed outright.
        let message = direct_err
            .or(rendered_err)
            .unwrap_or_else(|| Error::ExtractionMiss.to_string());

        warn!(store = %offer.store, error = %message, "offer failed");
        ResolvedOffer::failed(offer, message)
    }

    /// Resolves all of an item's offers concurrently and marks the cheapest.
    pub async fn resolve_item(self: &Arc<Self>, item: Item, force: bool) -> ResolvedItem {
        let mut slots: Vec<Option<ResolvedOffer>> = Vec::with_capacity(item.offers.len());
        slots.resize_with(item.offers.len(), || None);

        let mut tasks = JoinSet::new();
        for (idx, offer) in item.offers.iter().cloned().enumerate() {
            let pipeline = Arc::clone(self);
            tasks.spawn(async move { (idx, pipeline.resolve_offer(offer, force).await) });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((idx, resolved)) => slots[idx] = Some(resolved),
                Err(e) => warn!("offer task failed: {e}"),
            }
        }

        let offers = slots
            .into_iter()
            .zip(item.offers)
            .map(|(slot, offer)| {
                slot.unwrap_or_else(|| {
                    ResolvedOffer::failed(offer, "resolution task panicked".to_string())
                })
            })
            .collect();

        let mut resolved = ResolvedItem { id: item.id, name: item.name, offers };
        resolved.mark_best();
        resolved
    }

    /// Resolves every item, preserving input order.
    pub async fn resolve_all(self: &Arc<Self>, items: Vec<Item>, force: bool) -> Vec<ResolvedItem> {
        let mut slots: Vec<Option<ResolvedItem>> = Vec::with_capacity(items.len());
        slots.resize_with(items.len(), || None);

        let mut tasks = JoinSet::new();
        for (idx, item) in items.into_iter().enumerate() {
            let pipeline = Arc::clone(self);
            tasks.spawn(async move { (idx, pipeline.resolve_item(item, force).await) });
        }

        while let Some(joined) = tasks.join_next().await {
            if let Ok((idx, item)) = joined {
                slots[idx] = Some(item);
            }
        }

        slots.into_iter().flatten().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};

    use crate::error::Result;
    use crate::extract::{Currency, Source};
    use crate::fetch::FetchResponse;

    #[derive(Default)]
    struct MockRetriever {
        direct_results: HashMap<String, Result<String>>,
        rendered_results: HashMap<String, Result<String>>,
        direct_calls: AtomicU32,
        rendered_calls: AtomicU32,
    }

    impl MockRetriever {
        fn direct_ok(mut self, url: &str, html: &str) -> Self {
            self.direct_results.insert(url.to_string(), Ok(html.to_string()));
            self
        }

        fn direct_err(mut self, url: &str, err: Error) -> Self {
            self.direct_results.insert(url.to_string(), Err(err));
            self
        }

        fn rendered_ok(mut self, url: &str, html: &str) -> Self {
            self.rendered_results.insert(url.to_string(), Ok(html.to_string()));
            self
        }

        fn rendered_err(mut self, url: &str, err: Error) -> Self {
            self.rendered_results.insert(url.to_string(), Err(err));
            self
        }
    }

    #[async_trait]
    impl Retriever for MockRetriever {
        async fn direct(&self, url: &str, _force: bool) -> Result<FetchResponse> {
            self.direct_calls.fetch_add(1, Ordering::SeqCst);
            match self.direct_results.get(url) {
                Some(Ok(html)) => Ok(FetchResponse {
                    status: 200,
                    html: html.clone(),
                    fetched_at: Utc::now(),
                    rendered: false,
                }),
                Some(Err(e)) => Err(e.clone()),
                None => Err(Error::Retrieval("unexpected direct fetch".to_string())),
            }
        }

        async fn rendered(&self, url: &str, _wait_selector: Option<&str>) -> Result<FetchResponse> {
            self.rendered_calls.fetch_add(1, Ordering::SeqCst);
            match self.rendered_results.get(url) {
                Some(Ok(html)) => Ok(FetchResponse {
                    status: 200,
                    html: html.clone(),
                    fetched_at: Utc::now(),
                    rendered: true,
                }),
                Some(Err(e)) => Err(e.clone()),
                None => Err(Error::Render("unexpected rendered fetch".to_string())),
            }
        }
    }

    fn offer(url: &str, selector: Option<&str>) -> Offer {
        Offer {
            store: "Test Store".to_string(),
            url: url.to_string(),
            selector: selector.map(String::from),
        }
    }

    fn pipeline(retriever: MockRetriever) -> Arc<Pipeline<MockRetriever>> {
        Arc::new(Pipeline::new(retriever, Engine::new(Currency::Cad)))
    }

    const URL: &str = "https://store.example/p/1";
    const PRICED: &str = r#"<div class="price">$7.49</div>"#;
    const EMPTY: &str = "<html><body><p>loading</p></body></html>";

    #[tokio::test]
    async fn test_direct_success_skips_render() {
        let pipeline = pipeline(MockRetriever::default().direct_ok(URL, PRICED));

        let resolved = pipeline.resolve_offer(offer(URL, None), false).await;

        assert_eq!(resolved.amount, Some(7.49));
        assert_eq!(resolved.currency, Some(Currency::Cad));
        assert_eq!(resolved.source, Some(Source::TextScan));
        assert_eq!(
            resolved.status,
            crate::catalog::OfferStatus::Resolved { rendered: false }
        );
        assert_eq!(pipeline.retriever.rendered_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_extraction_miss_escalates_once() {
        let pipeline = pipeline(
            MockRetriever::default().direct_ok(URL, EMPTY).rendered_ok(URL, PRICED),
        );

        let resolved = pipeline.resolve_offer(offer(URL, None), false).await;

        assert_eq!(resolved.amount, Some(7.49));
        assert_eq!(
            resolved.status,
            crate::catalog::OfferStatus::Resolved { rendered: true }
        );
        assert_eq!(pipeline.retriever.direct_calls.load(Ordering::SeqCst), 1);
        assert_eq!(pipeline.retriever.rendered_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_direct_error_escalates() {
        let pipeline = pipeline(
            MockRetriever::default()
                .direct_err(URL, Error::Retrieval("request failed with status: 403".to_string()))
                .rendered_ok(URL, PRICED),
        );

        let resolved = pipeline.resolve_offer(offer(URL, None), false).await;
        assert_eq!(resolved.amount, Some(7.49));
        assert!(resolved.is_resolved());
    }

    #[tokio::test]
    async fn test_both_tiers_miss_reports_no_price() {
        let pipeline = pipeline(
            MockRetriever::default().direct_ok(URL, EMPTY).rendered_ok(URL, EMPTY),
        );

        let resolved = pipeline.resolve_offer(offer(URL, None), false).await;

        assert!(!resolved.is_resolved());
        assert_eq!(
            resolved.status,
            crate::catalog::OfferStatus::Failed { error: "no price found in page".to_string() }
        );
    }

    #[tokio::test]
    async fn test_both_tiers_error_direct_message_wins() {
        let pipeline = pipeline(
            MockRetriever::default()
                .direct_err(URL, Error::Retrieval("request failed with status: 500".to_string()))
                .rendered_err(URL, Error::Render("nav timeout".to_string())),
        );

        let resolved = pipeline.resolve_offer(offer(URL, None), false).await;

        match resolved.status {
            crate::catalog::OfferStatus::Failed { ref error } => {
                assert!(error.contains("500"), "got {error}");
            }
            _ => panic!("expected failure"),
        }
    }

    #[tokio::test]
    async fn test_invalid_url_never_renders() {
        let pipeline = pipeline(MockRetriever::default().direct_err(
            "ftp://nope",
            Error::InvalidInput("URL must be absolute http(s): ftp://nope".to_string()),
        ));

        let resolved = pipeline.resolve_offer(offer("ftp://nope", None), false).await;

        assert!(!resolved.is_resolved());
        assert_eq!(pipeline.retriever.rendered_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_resolve_item_marks_best_and_keeps_order() {
        let retriever = MockRetriever::default()
            .direct_ok("https://a.example/p", r#"<div class="price">$7.49</div>"#)
            .direct_ok("https://b.example/p", r#"<div class="price">$6.99</div>"#)
            .direct_ok("https://c.example/p", EMPTY)
            .rendered_err("https://c.example/p", Error::Render("nav timeout".to_string()));

        let pipeline = pipeline(retriever);
        let item = Item {
            id: "eggs".to_string(),
            name: "Eggs (12)".to_string(),
            offers: vec![
                offer("https://a.example/p", None),
                offer("https://b.example/p", None),
                offer("https://c.example/p", None),
            ],
        };

        let resolved = pipeline.resolve_item(item, false).await;

        assert_eq!(resolved.offers.len(), 3);
        assert_eq!(resolved.offers[0].offer.url, "https://a.example/p");
        assert!(resolved.offers[1].best);
        assert!(!resolved.offers[2].is_resolved());
    }

    #[tokio::test]
    async fn test_resolve_all_preserves_item_order() {
        let retriever = MockRetriever::default()
            .direct_ok("https://a.example/p", PRICED)
            .direct_ok("https://b.example/p", PRICED);

        let pipeline = pipeline(retriever);
        let items = vec![
            Item {
                id: "first".to_string(),
                name: "First".to_string(),
                offers: vec![offer("https://a.example/p", None)],
            },
            Item {
                id: "second".to_string(),
                name: "Second".to_string(),
                offers: vec![offer("https://b.example/p", None)],
            },
        ];

        let resolved = pipeline.resolve_all(items, false).await;
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].id, "first");
        assert_eq!(resolved[1].id, "second");
    }

    #[tokio::test]
    async fn test_selector_hint_reaches_extraction() {
        let html = r#"<html><body>
            <div class="price">$99.00</div>
            <span class="sale">$4.20</span>
        </body></html>"#;
        let pipeline = pipeline(MockRetriever::default().direct_ok(URL, html));

        let resolved = pipeline.resolve_offer(offer(URL, Some(".sale")), false).await;

        assert_eq!(resolved.amount, Some(4.2));
        assert_eq!(resolved.source, Some(Source::CustomSelector));
    }
}
