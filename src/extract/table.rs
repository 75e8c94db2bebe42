//! Strategy 2: the page's price table.
//!
//! Header cells are read as fuel labels and one data row supplies the prices:
//! the row labelled as an average if there is one, otherwise the first row
//! holding at least two prices.

use crate::extract::{parse_decimal, ExtractOutcome, PageDocument, PriceMap, PriceRange};
use crate::fuel::{normalize_fuel_label, FuelTag};
use regex::Regex;
use rust_decimal::Decimal;
use scraper::{ElementRef, Selector};
use std::sync::LazyLock;

/// Table selectors from most to least specific
const TABLE_SELECTORS: [&str; 7] = [
    "table.prices-table",
    "table.fuel-prices",
    "table.price-table",
    ".prices table",
    "#prices table",
    "table.table",
    "table",
];

/// Column order assumed when no header cell names a fuel
const POSITIONAL_ORDER: [FuelTag; 6] = [
    FuelTag::Ai92,
    FuelTag::Ai95,
    FuelTag::Ai98,
    FuelTag::Ai100,
    FuelTag::Diesel,
    FuelTag::Propane,
];

const AVERAGE_KEYWORDS: [&str; 3] = ["средн", "average", "avg"];

static CELL_PRICE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\d{1,3}(?:[.,]\d{1,2})?)\s*(?:₽|руб\.?|р\.?|rub)?$").expect("valid regex")
});

/// One table row: `(is_header_cell, text)` per cell
type Row = Vec<(bool, String)>;

/// Extracts prices from the first matching price table
pub fn extract_table(document: &PageDocument<'_>) -> ExtractOutcome {
    for selector in TABLE_SELECTORS {
        let Ok(selector) = Selector::parse(selector) else {
            continue;
        };

        if let Some(table) = document.html().select(&selector).next() {
            let prices = parse_price_table(table);
            if !prices.is_empty() {
                return ExtractOutcome::Found(prices);
            }
        }
    }

    ExtractOutcome::NotFound
}

/// Reads one table into a price map
fn parse_price_table(table: ElementRef<'_>) -> PriceMap {
    let rows = collect_rows(table);
    if rows.is_empty() {
        return PriceMap::new();
    }

    let header_index = rows
        .iter()
        .position(|row| row.iter().all(|(is_header, _)| *is_header))
        .or_else(|| {
            // No <th> row: treat a leading row without prices as the header
            let first = &rows[0];
            first
                .iter()
                .all(|(_, text)| cell_price(text).is_none())
                .then_some(0)
        });

    let header_tags: Vec<Option<FuelTag>> = header_index
        .map(|i| rows[i].iter().map(|(_, text)| normalize_fuel_label(text)).collect())
        .unwrap_or_default();

    let data_rows: Vec<&Row> = rows
        .iter()
        .enumerate()
        .filter(|(i, row)| Some(*i) != header_index && row.iter().any(|(is_header, _)| !is_header))
        .map(|(_, row)| row)
        .collect();

    let Some(row) = pick_data_row(&data_rows) else {
        return PriceMap::new();
    };

    if header_tags.iter().any(Option::is_some) {
        map_by_header(row, &header_tags)
    } else {
        map_by_position(row)
    }
}

fn collect_rows(table: ElementRef<'_>) -> Vec<Row> {
    let (Ok(row_selector), Ok(cell_selector)) = (Selector::parse("tr"), Selector::parse("th, td"))
    else {
        return Vec::new();
    };

    table
        .select(&row_selector)
        .map(|tr| {
            tr.select(&cell_selector)
                .map(|cell| {
                    let text = cell.text().collect::<Vec<_>>().join(" ");
                    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
                    (cell.value().name() == "th", text)
                })
                .collect::<Row>()
        })
        .filter(|row| !row.is_empty())
        .collect()
}

/// Prefers a row labelled as an average, else the first row with two prices
fn pick_data_row<'r>(rows: &[&'r Row]) -> Option<&'r Row> {
    let averaged = rows.iter().find(|row| {
        row.first().is_some_and(|(_, text)| {
            let text = text.to_lowercase();
            AVERAGE_KEYWORDS.iter().any(|k| text.contains(k))
        })
    });

    averaged
        .or_else(|| {
            rows.iter()
                .find(|row| row.iter().filter(|(_, text)| cell_price(text).is_some()).count() >= 2)
        })
        .copied()
}

fn map_by_header(row: &Row, header_tags: &[Option<FuelTag>]) -> PriceMap {
    let mut prices = PriceMap::new();

    for (i, (_, text)) in row.iter().enumerate() {
        let Some(Some(tag)) = header_tags.get(i) else {
            continue;
        };
        if let Some(price) = cell_price(text).filter(|p| PriceRange::TABLE.contains(*p)) {
            prices.entry(*tag).or_insert(price);
        }
    }

    prices
}

fn map_by_position(row: &Row) -> PriceMap {
    row.iter()
        .filter_map(|(_, text)| cell_price(text))
        .zip(POSITIONAL_ORDER)
        .filter(|(price, _)| PriceRange::TABLE.contains(*price))
        .map(|(price, tag)| (tag, price))
        .collect()
}

/// Parses a cell holding only a price, optionally followed by a currency
fn cell_price(text: &str) -> Option<Decimal> {
    let caps = CELL_PRICE_RE.captures(text.trim())?;
    parse_decimal(caps.get(1)?.as_str())
}
