//! Extraction strategy 4: currency-aware text scan over likely containers.

use regex_lite::Regex;
use scraper::Html;
use std::sync::LazyLock;

use super::dom::{self, SelectorHint};
use super::{numeric, selectors, Candidate, Source, Strategy};

/// Matches either a currency symbol followed by a grouped number, or a plain
/// decimal number followed by a 3-letter currency code.
static PRICE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)[$€£¥₹]\s*\d{1,3}(?:[.,\s]?\d{3})*(?:[.,]\d{2})?|\b\d+(?:[.,]\d{2})\s*(?:USD|CAD|EUR|GBP|JPY|INR)\b",
    )
    .unwrap()
});

/// Last-resort scan of container text, in a fixed selector priority order:
/// "class contains price", "id contains price", `data-price` present, then
/// every generic text container in document order.
pub struct TextScanStrategy;

impl Strategy for TextScanStrategy {
    fn source(&self) -> Source {
        Source::TextScan
    }

    fn attempt(&self, doc: &Html, _hint: Option<&SelectorHint>) -> Option<Candidate> {
        let containers = [
            &*selectors::scan::CLASS_PRICE,
            &*selectors::scan::ID_PRICE,
            &*selectors::scan::DATA_PRICE,
            &*selectors::scan::GENERIC,
        ];

        for selector in containers {
            for node in doc.select(selector) {
                let text = dom::text_of(&node);
                if text.is_empty() {
                    continue;
                }

                let Some(matched) = PRICE_PATTERN.find(&text) else {
                    continue;
                };

                let raw = matched.as_str().to_string();
                if let Some(amount) = numeric::normalize(&raw) {
                    return Some(Candidate { amount, raw, currency: None });
                }
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_price_container() {
        let doc = Html::parse_document(r#"<div class="price">$12.99</div>"#);
        let candidate = TextScanStrategy.attempt(&doc, None).unwrap();
        assert_eq!(candidate.amount, 12.99);
        assert_eq!(candidate.raw, "$12.99");
    }

    #[test]
    fn test_container_priority_order() {
        // The id-based container holds the better match, but class wins.
        let doc = Html::parse_document(
            r#"<body>
                <div id="price-box">$5.00</div>
                <div class="price-tag">$9.00</div>
            </body>"#,
        );
        assert_eq!(TextScanStrategy.attempt(&doc, None).unwrap().amount, 9.0);
    }

    #[test]
    fn test_generic_container_fallback() {
        let doc = Html::parse_document("<p>Only 19.99 EUR while stocks last</p>");
        let candidate = TextScanStrategy.attempt(&doc, None).unwrap();
        assert_eq!(candidate.amount, 19.99);
        assert_eq!(candidate.raw, "19.99 EUR");
    }

    #[test]
    fn test_symbol_with_grouping() {
        let doc = Html::parse_document(r#"<span class="price">€1.299,00</span>"#);
        let candidate = TextScanStrategy.attempt(&doc, None).unwrap();
        assert_eq!(candidate.amount, 1299.0);
    }

    #[test]
    fn test_no_price_like_text() {
        let doc = Html::parse_document("<div><p>Currently unavailable</p></div>");
        assert!(TextScanStrategy.attempt(&doc, None).is_none());
    }

    #[test]
    fn test_bare_number_without_code_ignored() {
        // A plain "123" with no symbol or currency code is not a price.
        let doc = Html::parse_document("<p>SKU 123</p>");
        assert!(TextScanStrategy.attempt(&doc, None).is_none());
    }
}
