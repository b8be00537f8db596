//! price-scout - Multi-storefront price comparison CLI
//!
//! Fetches product pages across storefronts with TLS fingerprint emulation,
//! extracts prices through a layered strategy ladder, and escalates to a
//! headless browser only when plain HTTP is not enough.

pub mod catalog;
pub mod commands;
pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod format;
pub mod resolve;

pub use catalog::{Item, Offer, ResolvedItem, ResolvedOffer};
pub use config::Config;
pub use error::{Error, Result};
pub use extract::{Currency, Engine, Extraction, Source};
