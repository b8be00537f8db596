//! CSS selectors used by the extraction strategies.
//!
//! All static selectors live here so strategy code stays free of parse
//! boilerplate. User-supplied selector hints are the one exception; those are
//! parsed at use and treated as a soft failure when invalid.

use scraper::Selector;
use std::sync::LazyLock;

/// Selectors for embedded structured product data.
pub mod structured {
    use super::*;

    /// JSON-LD script blocks.
    pub static LD_JSON: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse(r#"script[type="application/ld+json"]"#).unwrap());
}

/// Selectors for price-bearing meta tags and microdata.
pub mod meta {
    use super::*;

    pub static PRICE_PRODUCT: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse(r#"meta[property="product:price:amount"]"#).unwrap());

    pub static PRICE_OG: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse(r#"meta[property="og:price:amount"]"#).unwrap());

    pub static PRICE_ITEMPROP_META: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse(r#"meta[itemprop="price"]"#).unwrap());

    pub static PRICE_ITEMPROP_ANY: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse(r#"[itemprop="price"]"#).unwrap());

    pub static CURRENCY_PRODUCT: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse(r#"meta[property="product:price:currency"]"#).unwrap());

    pub static CURRENCY_OG: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse(r#"meta[property="og:price:currency"]"#).unwrap());

    pub static CURRENCY_ITEMPROP_META: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse(r#"meta[itemprop="priceCurrency"]"#).unwrap());

    pub static CURRENCY_ITEMPROP_ANY: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse(r#"[itemprop="priceCurrency"]"#).unwrap());
}

/// Container selectors for the fallback text scan, in priority order.
pub mod scan {
    use super::*;

    pub static CLASS_PRICE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse(r#"[class*="price"]"#).unwrap());

    pub static ID_PRICE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse(r#"[id*="price"]"#).unwrap());

    pub static DATA_PRICE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("[data-price]").unwrap());

    /// Last resort: every generic text container in document order.
    pub static GENERIC: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("div, span, p").unwrap());
}

/// Selectors for determining the page's origin.
pub mod origin {
    use super::*;

    pub static CANONICAL: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse(r#"link[rel="canonical"]"#).unwrap());

    pub static BASE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("base").unwrap());
}
