//! Strategy 3: label/number patterns over the page text.
//!
//! Each fuel has a label pattern. Five pattern families place a price next to
//! that label; they are tried in order and the first in-range match per fuel
//! is kept.

use crate::extract::{parse_decimal, ExtractOutcome, PageDocument, PriceMap, PriceRange};
use crate::fuel::FuelTag;
use regex::{Captures, Regex};
use rust_decimal::Decimal;
use std::sync::LazyLock;

/// Price with a mandatory decimal part
const NUMBER: &str = r"(?P<price>\d{2,3}[.,]\d{1,2})";
const CURRENCY: &str = r"\s*(?:₽|руб\.?|р\.|rub)";
/// Qualifier after a base grade label; a match that captures it belongs to the premium grade
const PREMIUM_QUALIFIER: &str = r"(?P<qualifier>\s*(?:\+|премиум|premium|plus|ultra))?";

/// A pattern family: builds a full pattern around a label pattern
type Family = fn(&str) -> String;

const FAMILIES: [(&str, Family); 5] = [
    ("average-qualified", average_qualified),
    ("label-number-currency", label_number_currency),
    ("label-number", label_number),
    ("number-currency-label", number_currency_label),
    ("number-label", number_label),
];

/// Compiled families per fuel, in family order
static FUEL_PATTERNS: LazyLock<Vec<(FuelTag, Vec<Regex>)>> = LazyLock::new(|| {
    FuelTag::all()
        .into_iter()
        .map(|tag| {
            let label = label_pattern(tag);
            let regexes = FAMILIES
                .iter()
                .filter_map(|(name, family)| match Regex::new(&family(&label)) {
                    Ok(regex) => Some(regex),
                    Err(e) => {
                        tracing::error!("Invalid {} pattern for {}: {}", name, tag, e);
                        None
                    }
                })
                .collect();
            (tag, regexes)
        })
        .collect()
});

/// Label pattern for a fuel, including the premium guard for base grades
pub fn label_pattern(tag: FuelTag) -> String {
    let label = match tag {
        FuelTag::Ai92 => r"\b(?:аи|ai)[\s-]*92",
        FuelTag::Ai92Plus => r"\b(?:аи|ai)[\s-]*92\s*(?:\+|премиум|premium|plus)",
        FuelTag::Ai95 => r"\b(?:аи|ai)[\s-]*95",
        FuelTag::Ai95Plus => r"\b(?:аи|ai)[\s-]*95\s*(?:\+|премиум|premium|plus|ultra)",
        FuelTag::Ai98 => r"\b(?:аи|ai)[\s-]*98",
        FuelTag::Ai100 => r"\b(?:аи|ai)[\s-]*100",
        FuelTag::Ai100Plus => r"\b(?:аи|ai)[\s-]*100\s*(?:\+|премиум|premium)",
        FuelTag::Diesel => r"(?:\bдт|\bдизел\w*|\bdiesel)",
        FuelTag::DieselPlus => r"(?:\bдт|\bдизел\w*|\bdiesel)\s*(?:\+|премиум|premium)",
        FuelTag::Gas => r"\b(?:газ|метан|cng)\b",
        FuelTag::Propane => r"(?:\bпропан\w*|\bсуг\b|\blpg\b|\bpropane)",
    };

    if tag.is_premium() || matches!(tag, FuelTag::Gas | FuelTag::Propane | FuelTag::Ai98) {
        label.to_string()
    } else {
        format!("{}{}", label, PREMIUM_QUALIFIER)
    }
}

/// `средняя цена ... <label> ... 57.35`
pub fn average_qualified(label: &str) -> String {
    format!(
        r"(?i)(?:средн\w*\s+цен\w*|average\s+price)[^\d]{{0,40}}?{}[^\d+]{{0,30}}?{}",
        label, NUMBER
    )
}

/// `<label> ... 57.35 ₽`
pub fn label_number_currency(label: &str) -> String {
    format!(r"(?i){}[^\d+]{{0,30}}?{}{}", label, NUMBER, CURRENCY)
}

/// `<label> ... 57.35`
pub fn label_number(label: &str) -> String {
    format!(r"(?i){}[^\d+]{{0,30}}?{}", label, NUMBER)
}

/// `57.35 ₽ ... <label>`
pub fn number_currency_label(label: &str) -> String {
    format!(r"(?i){}{}[^\d]{{0,30}}?{}", NUMBER, CURRENCY, label)
}

/// `57.35 ... <label>`
pub fn number_label(label: &str) -> String {
    format!(r"(?i){}[^\d]{{0,30}}?{}", NUMBER, label)
}

/// Price captured by a family match, unless the label carried a premium qualifier
fn price_from(cap: &Captures<'_>) -> Option<Decimal> {
    if cap.name("qualifier").is_some() {
        return None;
    }
    parse_decimal(cap.name("price")?.as_str())
}

/// Extracts prices by matching label/number patterns in the page text
pub fn extract_patterns(document: &PageDocument<'_>) -> ExtractOutcome {
    let text = document.text();
    let mut prices = PriceMap::new();

    for (tag, regexes) in FUEL_PATTERNS.iter() {
        let found = regexes.iter().find_map(|regex| {
            regex
                .captures_iter(text)
                .filter_map(|cap| price_from(&cap))
                .find(|price| PriceRange::GENERAL.contains(*price))
        });

        if let Some(price) = found {
            prices.insert(*tag, price);
        }
    }

    ExtractOutcome::from_map(prices)
}
