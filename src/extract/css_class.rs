//! Strategy 4: elements whose class suggests a price.
//!
//! Last resort for pages with no table and no usable text layout. Only
//! elements holding exactly one price are read, which skips wrappers that
//! contain a whole price list.

use crate::extract::{find_decimals, parse_decimal, ExtractOutcome, PageDocument, PriceMap, PriceRange};
use crate::fuel::normalize_fuel_label;
use scraper::Selector;

const PRICE_CLASS_SELECTOR: &str =
    r#"[class*="price"], [class*="fuel"], [class*="cost"], [class*="cena"], [class*="tsena"]"#;

/// Extracts prices from price-like elements
pub fn extract_css_class(document: &PageDocument<'_>) -> ExtractOutcome {
    let Ok(selector) = Selector::parse(PRICE_CLASS_SELECTOR) else {
        return ExtractOutcome::NotFound;
    };

    let mut prices = PriceMap::new();

    for element in document.html().select(&selector) {
        let text = element.text().collect::<Vec<_>>().join(" ");
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");

        let decimals = find_decimals(&text);
        let [number] = decimals.as_slice() else {
            continue;
        };

        let label = text.replacen(number, " ", 1);
        let Some(tag) = normalize_fuel_label(&label) else {
            continue;
        };

        if let Some(price) = parse_decimal(number).filter(|p| PriceRange::GENERAL.contains(*p)) {
            prices.entry(tag).or_insert(price);
        }
    }

    ExtractOutcome::from_map(prices)
}
