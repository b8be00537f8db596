//! Extraction strategy 2: embedded structured product data (JSON-LD).

use scraper::Html;
use serde_json::Value;
use tracing::trace;

use super::dom::SelectorHint;
use super::{numeric, selectors, Candidate, Currency, Source, Strategy};

/// Walks every JSON-LD script block looking for a `Product` with offers.
///
/// Blocks that fail to parse are skipped, not fatal; storefronts routinely
/// ship several blocks of which only one is well-formed.
pub struct StructuredDataStrategy;

impl Strategy for StructuredDataStrategy {
    fn source(&self) -> Source {
        Source::StructuredData
    }

    fn attempt(&self, doc: &Html, _hint: Option<&SelectorHint>) -> Option<Candidate> {
        for script in doc.select(&selectors::structured::LD_JSON) {
            let text: String = script.text().collect();
            if text.trim().is_empty() {
                continue;
            }

            let data: Value = match serde_json::from_str(&text) {
                Ok(v) => v,
                Err(e) => {
                    trace!("skipping malformed JSON-LD block: {e}");
                    continue;
                }
            };

            let nodes = match data {
                Value::Array(items) => items,
                other => vec![other],
            };

            for node in &nodes {
                if !is_product(node) {
                    continue;
                }
                if let Some(candidate) = candidate_from_product(node) {
                    return Some(candidate);
                }
            }
        }

        None
    }
}

/// Whether the node's `@type` is (or includes) `Product`.
fn is_product(node: &Value) -> bool {
    match node.get("@type") {
        Some(Value::String(t)) => t == "Product",
        Some(Value::Array(types)) => types.iter().any(|t| t.as_str() == Some("Product")),
        _ => false,
    }
}

/// Reads the first normalizable offer price from a Product node.
fn candidate_from_product(node: &Value) -> Option<Candidate> {
    let offers = node.get("offers")?;
    let offers: Vec<&Value> = match offers {
        Value::Array(items) => items.iter().collect(),
        single => vec![single],
    };

    for offer in offers {
        let price = offer
            .get("price")
            .or_else(|| offer.pointer("/priceSpecification/price"))
            .or_else(|| offer.get("lowPrice"));

        let raw = match price {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => continue,
        };

        let Some(amount) = numeric::normalize(&raw) else {
            continue;
        };

        let currency = offer
            .get("priceCurrency")
            .or_else(|| offer.pointer("/priceSpecification/priceCurrency"))
            .and_then(Value::as_str)
            .and_then(Currency::from_code);

        return Some(Candidate { amount, raw, currency });
    }

    None
}
