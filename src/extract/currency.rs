//! Currency codes and the currency inference heuristic.

use regex_lite::Regex;
use scraper::Html;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use super::{dom, selectors};

/// Recognized ISO-4217 currency codes.
///
/// A closed allow-list: codes outside it are treated as absent rather than
/// propagated, so downstream display code never sees an arbitrary string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Usd,
    Eur,
    Gbp,
    Jpy,
    Cad,
    Aud,
    Inr,
    Chf,
    Sek,
    Nok,
    Dkk,
    Nzd,
    Cny,
    Mxn,
    Brl,
    Zar,
}

impl Currency {
    /// Returns the ISO code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Jpy => "JPY",
            Currency::Cad => "CAD",
            Currency::Aud => "AUD",
            Currency::Inr => "INR",
            Currency::Chf => "CHF",
            Currency::Sek => "SEK",
            Currency::Nok => "NOK",
            Currency::Dkk => "DKK",
            Currency::Nzd => "NZD",
            Currency::Cny => "CNY",
            Currency::Mxn => "MXN",
            Currency::Brl => "BRL",
            Currency::Zar => "ZAR",
        }
    }

    /// Normalizes a raw code against the allow-list.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "USD" => Some(Currency::Usd),
            "EUR" => Some(Currency::Eur),
            "GBP" => Some(Currency::Gbp),
            "JPY" => Some(Currency::Jpy),
            "CAD" => Some(Currency::Cad),
            "AUD" => Some(Currency::Aud),
            "INR" => Some(Currency::Inr),
            "CHF" => Some(Currency::Chf),
            "SEK" => Some(Currency::Sek),
            "NOK" => Some(Currency::Nok),
            "DKK" => Some(Currency::Dkk),
            "NZD" => Some(Currency::Nzd),
            "CNY" => Some(Currency::Cny),
            "MXN" => Some(Currency::Mxn),
            "BRL" => Some(Currency::Brl),
            "ZAR" => Some(Currency::Zar),
            _ => None,
        }
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Currency::from_code(s).ok_or_else(|| format!("Unknown currency code: {}", s))
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A known-retailer-to-currency mapping, matched against the page host.
struct DomainRule {
    host: LazyLock<Regex>,
    currency: Currency,
}

// Helps disambiguate a bare `$` on Canadian grocery sites.
static DOMAIN_RULES: [DomainRule; 3] = [
    DomainRule {
        host: LazyLock::new(|| {
            Regex::new(
                r"(?i)(?:nofrills|yourindependentgrocer|loblaws|provigo|realcanadiansuperstore)\.",
            )
            .unwrap()
        }),
        currency: Currency::Cad,
    },
    DomainRule {
        host: LazyLock::new(|| Regex::new(r"(?i)walmart\.ca$").unwrap()),
        currency: Currency::Cad,
    },
    DomainRule {
        host: LazyLock::new(|| Regex::new(r"(?i)(?:shop\.crs|coop|co-op)").unwrap()),
        currency: Currency::Cad,
    },
];

/// Infers the currency for a raw price string found in `doc`.
///
/// Priority: domain rules over the page origin, then currency symbols in the
/// raw text (a bare `$` maps to the configured default, never a hardcoded
/// USD), then structured currency metadata, then the default.
pub fn resolve(raw_text: Option<&str>, doc: &Html, default: Currency) -> Option<Currency> {
    if let Some(currency) = domain_currency(doc) {
        return Some(currency);
    }

    if let Some(text) = raw_text {
        if text.contains('€') {
            return Some(Currency::Eur);
        }
        if text.contains('£') {
            return Some(Currency::Gbp);
        }
        if text.contains('¥') {
            return Some(Currency::Jpy);
        }
        if text.contains('₹') {
            return Some(Currency::Inr);
        }
        if text.contains('$') {
            return Some(default);
        }
    }

    metadata_currency(doc).or(Some(default))
}

/// Looks up the page origin host against the domain rule table.
fn domain_currency(doc: &Html) -> Option<Currency> {
    let origin = dom::first_attr(doc, &selectors::origin::CANONICAL, "href")
        .or_else(|| dom::first_attr(doc, &selectors::origin::BASE, "href"))?;
    let host = host_of(&origin)?;

    DOMAIN_RULES.iter().find(|rule| rule.host.is_match(host)).map(|rule| rule.currency)
}

/// Reads the structured currency metadata families, allow-list normalized.
pub fn metadata_currency(doc: &Html) -> Option<Currency> {
    let code = dom::content_of(doc, &selectors::meta::CURRENCY_PRODUCT)
        .or_else(|| dom::content_of(doc, &selectors::meta::CURRENCY_OG))
        .or_else(|| dom::content_of(doc, &selectors::meta::CURRENCY_ITEMPROP_META))
        .or_else(|| dom::content_of(doc, &selectors::meta::CURRENCY_ITEMPROP_ANY))
        .or_else(|| dom::first_text(doc, &selectors::meta::CURRENCY_ITEMPROP_ANY))?;

    Currency::from_code(&code)
}

/// Extracts the hostname from an absolute URL, without a URL parser.
fn host_of(url: &str) -> Option<&str> {
    let rest =
        url.strip_prefix("https://").or_else(|| url.strip_prefix("http://"))?;
    let host = rest.split(['/', '?', '#']).next()?;
    let host = host.rsplit('@').next()?;
    let host = host.split(':').next()?;
    (!host.is_empty()).then_some(host)
}
