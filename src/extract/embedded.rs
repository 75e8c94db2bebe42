//! Strategy 1: prices in script payloads.
//!
//! Pages that render prices client-side ship them as JSON inside `<script>`
//! blocks. Two shapes are recognised: a fuel label used as a key
//! (`"АИ-95": 57.35`) and a small object pairing a label field with a price
//! field (`{"fuel": "ДТ", "price": "66,80"}`).

use crate::extract::{parse_decimal, ExtractOutcome, PageDocument, PriceMap, PriceRange};
use crate::fuel::normalize_fuel_label;
use regex::Regex;
use rust_decimal::Decimal;
use serde_json::Value;
use std::sync::LazyLock;

static SCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b[^>]*>(.*?)</script>").expect("valid regex"));
static KEY_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""([^"\\]{1,40})"\s*:\s*"?(\d{1,3}(?:[.,]\d{1,2})?)"?\s*[,}\]]"#)
        .expect("valid regex")
});
static FLAT_OBJECT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[^{}]{1,400}\}").expect("valid regex"));

const LABEL_FIELDS: [&str; 7] = ["fuel", "fuel_type", "fuelType", "name", "title", "label", "type"];
const PRICE_FIELDS: [&str; 7] = ["price", "avg_price", "avgPrice", "avg", "average", "value", "cost"];

/// Extracts prices from `<script>` payloads
pub fn extract_embedded(document: &PageDocument<'_>) -> ExtractOutcome {
    let mut prices = PriceMap::new();

    for cap in SCRIPT_RE.captures_iter(document.raw()) {
        let Some(body) = cap.get(1).map(|m| m.as_str()) else {
            continue;
        };
        if body.trim().is_empty() {
            continue;
        }

        collect_label_objects(body, &mut prices);
        collect_keyed_numbers(body, &mut prices);
    }

    ExtractOutcome::from_map(prices)
}

/// Reads `{"fuel": <label>, "price": <number>}`-shaped objects
fn collect_label_objects(script: &str, prices: &mut PriceMap) {
    for m in FLAT_OBJECT_RE.find_iter(script) {
        let Ok(Value::Object(object)) = serde_json::from_str::<Value>(m.as_str()) else {
            continue;
        };

        let tag = LABEL_FIELDS
            .iter()
            .filter_map(|field| object.get(*field).and_then(Value::as_str))
            .find_map(normalize_fuel_label);
        let price = PRICE_FIELDS
            .iter()
            .filter_map(|field| object.get(*field))
            .find_map(json_price);

        if let (Some(tag), Some(price)) = (tag, price) {
            if PriceRange::GENERAL.contains(price) {
                prices.entry(tag).or_insert(price);
            }
        }
    }
}

/// Reads `"<label>": <number>` pairs
fn collect_keyed_numbers(script: &str, prices: &mut PriceMap) {
    for cap in KEY_NUMBER_RE.captures_iter(script) {
        let (Some(key), Some(number)) = (cap.get(1), cap.get(2)) else {
            continue;
        };
        let Some(tag) = normalize_fuel_label(key.as_str()) else {
            continue;
        };
        let Some(price) = parse_decimal(number.as_str()) else {
            continue;
        };

        if PriceRange::GENERAL.contains(price) {
            prices.entry(tag).or_insert(price);
        }
    }
}

fn json_price(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => parse_decimal(&n.to_string()),
        Value::String(s) => parse_decimal(s),
        _ => None,
    }
}
