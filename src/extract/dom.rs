//! Thin document-model adapter over `scraper`.
//!
//! Extraction strategies never touch raw markup; they query a parsed tree
//! through the helpers here. The one piece of syntax on top of standard CSS
//! selectors is the `::content` suffix of a selector hint, which forces
//! reading the matched element's `content` attribute.

use scraper::{ElementRef, Html, Selector};
use tracing::warn;

/// A parsed selector hint: base CSS selector plus the `::content` marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorHint {
    base: String,
    force_content: bool,
}

impl SelectorHint {
    /// Parses a raw hint string, splitting off a trailing `::content` token.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.strip_suffix("::content") {
            Some(base) => Self { base: base.trim_end().to_string(), force_content: true },
            None => Self { base: trimmed.to_string(), force_content: false },
        }
    }

    /// The CSS selector portion of the hint.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Whether the hint forces reading the `content` attribute.
    pub fn force_content(&self) -> bool {
        self.force_content
    }
}

/// Resolves a hint against the document and reads its value.
///
/// Meta elements yield their `content` attribute even without the marker;
/// everything else yields trimmed text content.
pub fn select_value(doc: &Html, hint: &SelectorHint) -> Option<String> {
    let selector = match Selector::parse(hint.base()) {
        Ok(s) => s,
        Err(e) => {
            warn!("invalid selector hint {:?}: {e}", hint.base());
            return None;
        }
    };

    let node = doc.select(&selector).next()?;
    let value = if hint.force_content() || node.value().name().eq_ignore_ascii_case("meta") {
        node.value().attr("content").unwrap_or_default().trim().to_string()
    } else {
        text_of(&node)
    };

    (!value.is_empty()).then_some(value)
}

/// Trimmed text content of an element.
pub fn text_of(el: &ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Trimmed, non-empty attribute value of an element.
pub fn attr_of(el: &ElementRef, attr: &str) -> Option<String> {
    el.value().attr(attr).map(str::trim).filter(|v| !v.is_empty()).map(String::from)
}

/// `content` attribute of the first element matching `selector`.
pub fn content_of(doc: &Html, selector: &Selector) -> Option<String> {
    first_attr(doc, selector, "content")
}

/// Named attribute of the first element matching `selector`.
pub fn first_attr(doc: &Html, selector: &Selector, attr: &str) -> Option<String> {
    doc.select(selector).next().and_then(|el| attr_of(&el, attr))
}

/// Trimmed text of the first element matching `selector`.
pub fn first_text(doc: &Html, selector: &Selector) -> Option<String> {
    doc.select(selector).next().map(|el| text_of(&el)).filter(|t| !t.is_empty())
}
