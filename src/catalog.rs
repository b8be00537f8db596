//! Watched items, their storefront offers, and resolved comparison results.

use serde::{Deserialize, Serialize};

use crate::extract::{Currency, Source};

/// A product tracked across several storefronts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub name: String,
    pub offers: Vec<Offer>,
}

/// One storefront listing for an item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Offer {
    pub store: String,
    pub url: String,
    /// Optional selector hint, may carry a trailing `::content` marker.
    #[serde(default)]
    pub selector: Option<String>,
}

/// Terminal state of resolving a single offer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum OfferStatus {
    Resolved { rendered: bool },
    Failed { error: String },
}

/// An offer after the retrieval and extraction pipeline has run.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedOffer {
    #[serde(flatten)]
    pub offer: Offer,
    pub amount: Option<f64>,
    pub currency: Option<Currency>,
    pub source: Option<Source>,
    pub status: OfferStatus,
    pub best: bool,
}

impl ResolvedOffer {
    pub fn resolved(
        offer: Offer,
        amount: f64,
        currency: Option<Currency>,
        source: Source,
        rendered: bool,
    ) -> Self {
        Self {
            offer,
            amount: Some(amount),
            currency,
            source: Some(source),
            status: OfferStatus::Resolved { rendered },
            best: false,
        }
    }

    pub fn failed(offer: Offer, error: String) -> Self {
        Self {
            offer,
            amount: None,
            currency: None,
            source: None,
            status: OfferStatus::Failed { error },
            best: false,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.status, OfferStatus::Resolved { .. })
    }
}

/// An item with every offer resolved and the cheapest one marked.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedItem {
    pub id: String,
    pub name: String,
    pub offers: Vec<ResolvedOffer>,
}

impl ResolvedItem {
    /// Marks the cheapest resolved offer. Ties keep the earliest offer.
    pub fn mark_best(&mut self) {
        let mut best: Option<(usize, f64)> = None;
        for (idx, offer) in self.offers.iter().enumerate() {
            let Some(amount) = offer.amount else { continue };
            match best {
                Some((_, current)) if amount >= current => {}
                _ => best = Some((idx, amount)),
            }
        }

        if let Some((idx, _)) = best {
            self.offers[idx].best = true;
        }
    }

    pub fn best(&self) -> Option<&ResolvedOffer> {
        self.offers.iter().find(|o| o.best)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offer(store: &str) -> Offer {
        Offer { store: store.to_string(), url: format!("https://{store}.example/p/1"), selector: None }
    }

    fn resolved(store: &str, amount: f64) -> ResolvedOffer {
        ResolvedOffer::resolved(offer(store), amount, Some(Currency::Cad), Source::MetaTags, false)
    }

    #[test]
    fn test_mark_best_cheapest_wins() {
        let mut item = ResolvedItem {
            id: "eggs".to_string(),
            name: "Eggs".to_string(),
            offers: vec![resolved("a", 7.49), resolved("b", 6.99), resolved("c", 8.25)],
        };
        item.mark_best();

        assert!(item.offers[1].best);
        assert!(!item.offers[0].best);
        assert!(!item.offers[2].best);
        assert_eq!(item.best().unwrap().offer.store, "b");
    }

    #[test]
    fn test_mark_best_tie_keeps_first() {
        let mut item = ResolvedItem {
            id: "eggs".to_string(),
            name: "Eggs".to_string(),
            offers: vec![resolved("a", 7.49), resolved("b", 6.99), resolved("c", 6.99)],
        };
        item.mark_best();

        assert!(item.offers[1].best);
        assert!(!item.offers[2].best);
    }

    #[test]
    fn test_mark_best_skips_failures() {
        let mut item = ResolvedItem {
            id: "eggs".to_string(),
            name: "Eggs".to_string(),
            offers: vec![
                ResolvedOffer::failed(offer("a"), "timed out".to_string()),
                resolved("b", 9.99),
            ],
        };
        item.mark_best();

        assert!(!item.offers[0].best);
        assert!(item.offers[1].best);
    }

    #[test]
    fn test_mark_best_all_failed() {
        let mut item = ResolvedItem {
            id: "eggs".to_string(),
            name: "Eggs".to_string(),
            offers: vec![ResolvedOffer::failed(offer("a"), "no price found in page".to_string())],
        };
        item.mark_best();
        assert!(item.best().is_none());
    }

    #[test]
    fn test_offer_status_serialization() {
        let json = serde_json::to_string(&OfferStatus::Resolved { rendered: true }).unwrap();
        assert_eq!(json, r#"{"state":"resolved","rendered":true}"#);
        let json = serde_json::to_string(&OfferStatus::Failed { error: "x".to_string() }).unwrap();
        assert_eq!(json, r#"{"state":"failed","error":"x"}"#);
    }

    #[test]
    fn test_offer_selector_defaults_to_none() {
        let offer: Offer = toml::from_str(
            r#"
            store = "No Frills"
            url = "https://www.nofrills.ca/p/123"
            "#,
        )
        .unwrap();
        assert!(offer.selector.is_none());
    }
}
