//! Output formatting for resolved items (table, JSON).

use crate::catalog::{OfferStatus, ResolvedItem, ResolvedOffer};
use crate::config::OutputFormat;

/// Formats resolution results for output.
pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    /// Creates a new formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a full comparison run.
    pub fn format_items(&self, items: &[ResolvedItem]) -> String {
        if items.is_empty() {
            return match self.format {
                OutputFormat::Json => "[]".to_string(),
                OutputFormat::Table => "No items configured.".to_string(),
            };
        }

        match self.format {
            OutputFormat::Json => self.json_items(items),
            OutputFormat::Table => self.table_items(items),
        }
    }

    /// Formats a single resolved offer, for one-off lookups.
    pub fn format_offer(&self, offer: &ResolvedOffer) -> String {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(offer).unwrap_or_else(|_| "{}".to_string())
            }
            OutputFormat::Table => {
                let mut lines = Vec::new();
                lines.push(format!("URL:      {}", offer.offer.url));
                lines.push(format!("Price:    {}", price_cell(offer)));
                if let Some(source) = offer.source {
                    lines.push(format!("Source:   {}{}", source, tier_suffix(offer)));
                }
                if let OfferStatus::Failed { error } = &offer.status {
                    lines.push(format!("Error:    {error}"));
                }
                lines.join("\n")
            }
        }
    }

    fn json_items(&self, items: &[ResolvedItem]) -> String {
        serde_json::to_string_pretty(items).unwrap_or_else(|_| "[]".to_string())
    }

    fn table_items(&self, items: &[ResolvedItem]) -> String {
        let mut lines = Vec::new();

        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                lines.push(String::new());
            }
            lines.push(item.name.clone());
            lines.push("-".repeat(item.name.len().max(8)));

            for offer in &item.offers {
                let marker = if offer.best { "🏆 " } else { "   " };
                match &offer.status {
                    OfferStatus::Resolved { .. } => {
                        lines.push(format!(
                            "{marker}{:<24} {:>12}  {}{}",
                            offer.offer.store,
                            price_cell(offer),
                            offer.source.map(|s| s.label()).unwrap_or(""),
                            tier_suffix(offer),
                        ));
                    }
                    OfferStatus::Failed { error } => {
                        lines.push(format!(
                            "{marker}{:<24} {:>12}  {error}",
                            offer.offer.store, "-",
                        ));
                    }
                }
            }

            match item.best() {
                Some(best) => lines.push(format!(
                    "Best: {} at {}",
                    price_cell(best),
                    best.offer.store
                )),
                None => lines.push("Best: none (no offer resolved)".to_string()),
            }
        }

        lines.join("\n")
    }
}

fn price_cell(offer: &ResolvedOffer) -> String {
    match (offer.amount, offer.currency) {
        (Some(amount), Some(currency)) => format!("{currency} {amount:.2}"),
        (Some(amount), None) => format!("{amount:.2}"),
        _ => "N/A".to_string(),
    }
}

fn tier_suffix(offer: &ResolvedOffer) -> &'static str {
    match offer.status {
        OfferStatus::Resolved { rendered: true } => " (rendered)",
        _ => "",
    }
}
