//! Extraction strategy 3: price-bearing meta tags and microdata.

use scraper::Html;

use super::dom::{self, SelectorHint};
use super::{numeric, selectors, Candidate, Source, Strategy};

/// Reads the Open Graph / product meta families, then `itemprop` microdata.
pub struct MetaTagStrategy;

impl Strategy for MetaTagStrategy {
    fn source(&self) -> Source {
        Source::MetaTags
    }

    fn attempt(&self, doc: &Html, _hint: Option<&SelectorHint>) -> Option<Candidate> {
        let raw = dom::content_of(doc, &selectors::meta::PRICE_PRODUCT)
            .or_else(|| dom::content_of(doc, &selectors::meta::PRICE_OG))
            .or_else(|| dom::content_of(doc, &selectors::meta::PRICE_ITEMPROP_META))
            .or_else(|| dom::first_text(doc, &selectors::meta::PRICE_ITEMPROP_ANY))?;

        let amount = numeric::normalize(&raw)?;
        // Currency comes from the matching currency-property family via the
        // shared resolver.
        Some(Candidate { amount, raw, currency: None })
    }
}
