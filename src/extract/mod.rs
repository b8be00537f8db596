//! Price extraction engine.
//!
//! Runs a fixed ladder of strategies against a parsed page until one yields a
//! usable amount: the caller's selector hint, embedded structured product
//! data, price meta tags, then a fallback text scan. Currency is inferred
//! separately once an amount is found, so every strategy benefits from the
//! same inference chain.

use scraper::Html;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

mod currency;
mod custom;
mod dom;
mod meta;
mod numeric;
mod scan;
mod selectors;
mod structured;

pub use currency::Currency;
pub use dom::SelectorHint;

use custom::HintStrategy;
use meta::MetaTagStrategy;
use scan::TextScanStrategy;
use structured::StructuredDataStrategy;

/// Which strategy produced a price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Source {
    #[serde(rename = "custom selector")]
    CustomSelector,
    #[serde(rename = "structured data")]
    StructuredData,
    #[serde(rename = "meta tags")]
    MetaTags,
    #[serde(rename = "fallback text scan")]
    TextScan,
}

impl Source {
    pub fn label(&self) -> &'static str {
        match self {
            Source::CustomSelector => "custom selector",
            Source::StructuredData => "structured data",
            Source::MetaTags => "meta tags",
            Source::TextScan => "fallback text scan",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// The outcome of running the engine over one page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extraction {
    pub amount: Option<f64>,
    pub currency: Option<Currency>,
    pub source: Option<Source>,
}

impl Extraction {
    /// No strategy produced a price.
    pub fn absent() -> Self {
        Self { amount: None, currency: None, source: None }
    }

    pub fn is_found(&self) -> bool {
        self.amount.is_some()
    }
}

/// An amount produced by a single strategy, before currency inference.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub amount: f64,
    pub raw: String,
    pub currency: Option<Currency>,
}

/// A single rung of the extraction ladder.
trait Strategy: Send + Sync {
    fn source(&self) -> Source;

    fn attempt(&self, doc: &Html, hint: Option<&SelectorHint>) -> Option<Candidate>;
}

/// The extraction engine with its fixed strategy order.
pub struct Engine {
    default_currency: Currency,
    strategies: Vec<Box<dyn Strategy>>,
}

impl Engine {
    pub fn new(default_currency: Currency) -> Self {
        Self {
            default_currency,
            strategies: vec![
                Box::new(HintStrategy),
                Box::new(StructuredDataStrategy),
                Box::new(MetaTagStrategy),
                Box::new(TextScanStrategy),
            ],
        }
    }

    /// Extracts a price from raw HTML.
    ///
    /// Strategies run in ladder order; the first one producing a usable,
    /// non-negative amount wins. A candidate without its own currency falls
    /// back to page-level inference.
    pub fn extract(&self, html: &str, hint: Option<&str>) -> Extraction {
        let doc = Html::parse_document(html);
        let hint = hint.map(SelectorHint::parse);

        for strategy in &self.strategies {
            let Some(candidate) = strategy.attempt(&doc, hint.as_ref()) else {
                continue;
            };

            if candidate.amount < 0.0 {
                debug!(
                    source = strategy.source().label(),
                    amount = candidate.amount,
                    "discarding negative amount"
                );
                continue;
            }

            let currency = candidate
                .currency
                .or_else(|| currency::resolve(Some(&candidate.raw), &doc, self.default_currency));

            debug!(
                source = strategy.source().label(),
                amount = candidate.amount,
                raw = %candidate.raw,
                "extracted price"
            );

            return Extraction {
                amount: Some(candidate.amount),
                currency,
                source: Some(strategy.source()),
            };
        }

        Extraction::absent()
    }
}
