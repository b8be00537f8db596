//! Extraction strategy 1: caller-supplied selector hint.

use scraper::Html;

use super::dom::{self, SelectorHint};
use super::{numeric, Candidate, Source, Strategy};

/// Resolves the offer's selector hint and normalizes whatever it points at.
///
/// Skipped entirely when the offer carries no hint.
pub struct HintStrategy;

impl Strategy for HintStrategy {
    fn source(&self) -> Source {
        Source::CustomSelector
    }

    fn attempt(&self, doc: &Html, hint: Option<&SelectorHint>) -> Option<Candidate> {
        let raw = dom::select_value(doc, hint?)?;
        let amount = numeric::normalize(&raw)?;
        Some(Candidate { amount, raw, currency: None })
    }
}
