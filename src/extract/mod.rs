//! Price extraction from region pages
//!
//! A region page is run through an ordered list of strategies, each one less
//! dependent on page structure than the one before:
//!
//! 1. [`embedded`] - numbers paired with fuel labels in script payloads
//! 2. [`table`] - the page's price table
//! 3. [`pattern`] - label/number patterns over the visible text
//! 4. [`css_class`] - small elements whose class suggests a price
//!
//! The first strategy whose result passes the plausibility checks wins.

pub mod css_class;
pub mod embedded;
pub mod pattern;
pub mod table;

use crate::fuel::FuelTag;
use regex::Regex;
use rust_decimal::Decimal;
use scraper::Html;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Fuel tag → price per litre
pub type PriceMap = BTreeMap<FuelTag, Decimal>;

/// Octane numbers that a misparsed page tends to report as prices
const OCTANE_NUMBERS: [u32; 4] = [92, 95, 98, 100];

static DECIMAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{2,3}[.,]\d{1,2}").expect("valid regex"));
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid regex"));

/// Result of one extraction strategy
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractOutcome {
    /// The strategy recovered at least one plausible price
    Found(PriceMap),

    /// The strategy recovered nothing usable
    NotFound,
}

impl ExtractOutcome {
    /// Wraps a map, treating an empty one as `NotFound`
    pub fn from_map(map: PriceMap) -> Self {
        if map.is_empty() {
            Self::NotFound
        } else {
            Self::Found(map)
        }
    }
}

/// Accepted price interval, inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceRange {
    pub min: u32,
    pub max: u32,
}

impl PriceRange {
    /// Bounds applied to free-text and script matches
    pub const GENERAL: PriceRange = PriceRange { min: 10, max: 200 };

    /// Bounds applied to table cells
    pub const TABLE: PriceRange = PriceRange { min: 30, max: 200 };

    pub fn contains(&self, price: Decimal) -> bool {
        price >= Decimal::from(self.min) && price <= Decimal::from(self.max)
    }
}

/// Returns true when every price equals one of the octane numbers
///
/// Pages that echo grade names into price positions produce maps like
/// `{AI-92: 92, AI-95: 95}`; such a map is discarded as a whole.
pub fn is_octane_echo(map: &PriceMap) -> bool {
    !map.is_empty()
        && map
            .values()
            .all(|price| OCTANE_NUMBERS.iter().any(|n| *price == Decimal::from(*n)))
}

/// Parses a price written with either decimal separator
pub(crate) fn parse_decimal(text: &str) -> Option<Decimal> {
    Decimal::from_str(&text.trim().replace(',', ".")).ok()
}

/// Finds all decimal-looking numbers (`61.50`, `61,5`) in `text`
pub(crate) fn find_decimals(text: &str) -> Vec<&str> {
    DECIMAL_RE.find_iter(text).map(|m| m.as_str()).collect()
}

/// A parsed region page shared by all strategies
pub struct PageDocument<'a> {
    raw: &'a str,
    html: Html,
    text: String,
}

impl<'a> PageDocument<'a> {
    pub fn parse(raw: &'a str) -> Self {
        Self {
            raw,
            html: Html::parse_document(raw),
            text: strip_markup(raw),
        }
    }

    /// The page exactly as received
    pub fn raw(&self) -> &str {
        self.raw
    }

    /// The parsed DOM
    pub fn html(&self) -> &Html {
        &self.html
    }

    /// Page text with markup removed and whitespace collapsed
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Removes tags, decodes non-breaking spaces and collapses whitespace
fn strip_markup(raw: &str) -> String {
    let without_tags = TAG_RE.replace_all(raw, " ");
    without_tags
        .replace("&nbsp;", " ")
        .replace('\u{a0}', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// A named extraction strategy
#[derive(Clone, Copy)]
pub struct Strategy {
    pub name: &'static str,
    pub run: fn(&PageDocument<'_>) -> ExtractOutcome,
}

impl fmt::Debug for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Strategy").field("name", &self.name).finish()
    }
}

/// The strategies in priority order
pub const DEFAULT_STRATEGIES: [Strategy; 4] = [
    Strategy {
        name: "embedded",
        run: embedded::extract_embedded,
    },
    Strategy {
        name: "table",
        run: table::extract_table,
    },
    Strategy {
        name: "pattern",
        run: pattern::extract_patterns,
    },
    Strategy {
        name: "css-class",
        run: css_class::extract_css_class,
    },
];

/// Runs strategies in order and returns the first plausible result
#[derive(Debug, Clone)]
pub struct ExtractionPipeline {
    strategies: Vec<Strategy>,
}

impl Default for ExtractionPipeline {
    fn default() -> Self {
        Self::new(DEFAULT_STRATEGIES.to_vec())
    }
}

impl ExtractionPipeline {
    /// Creates a pipeline with a custom strategy order
    pub fn new(strategies: Vec<Strategy>) -> Self {
        Self { strategies }
    }

    /// Extracts the price map from a region page
    ///
    /// # Arguments
    ///
    /// * `html` - Page markup
    ///
    /// # Returns
    ///
    /// The prices found by the first successful strategy, or an empty map if
    /// no strategy produced a plausible result
    pub fn extract(&self, html: &str) -> PriceMap {
        self.extract_with_strategy(html)
            .map(|(_, map)| map)
            .unwrap_or_default()
    }

    /// Like [`extract`](Self::extract), also reporting which strategy won
    pub fn extract_with_strategy(&self, html: &str) -> Option<(&'static str, PriceMap)> {
        let document = PageDocument::parse(html);

        for strategy in &self.strategies {
            match (strategy.run)(&document) {
                ExtractOutcome::Found(map) if is_octane_echo(&map) => {
                    tracing::debug!(
                        strategy = strategy.name,
                        "Discarding prices that only repeat octane numbers"
                    );
                }
                ExtractOutcome::Found(map) => {
                    tracing::debug!(
                        strategy = strategy.name,
                        fuels = map.len(),
                        "Extracted prices"
                    );
                    return Some((strategy.name, map));
                }
                ExtractOutcome::NotFound => {
                    tracing::trace!(strategy = strategy.name, "No prices found");
                }
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    const SCRIPT_PAGE: &str = r#"<html><body>
        <h1>Цены на бензин</h1>
        <script>window.prices = {"АИ-92": 52.10, "АИ-95": 57.35, "ДТ": "66,80"};</script>
        </body></html>"#;

    const TABLE_PAGE: &str = r#"<html><body>
        <table class="prices-table">
          <tr><th>Регион</th><th>АИ-92</th><th>АИ-95</th><th>ДТ</th></tr>
          <tr><td>Средняя цена</td><td>52,10</td><td>57.35</td><td>66.80</td></tr>
        </table>
        </body></html>"#;

    #[test]
    fn test_script_and_table_renderings_agree() {
        let pipeline = ExtractionPipeline::default();
        let from_script = pipeline.extract(SCRIPT_PAGE);
        let from_table = pipeline.extract(TABLE_PAGE);

        let expected = PriceMap::from([
            (FuelTag::Ai92, dec("52.10")),
            (FuelTag::Ai95, dec("57.35")),
            (FuelTag::Diesel, dec("66.80")),
        ]);
        assert_eq!(from_script, expected);
        assert_eq!(from_table, expected);
    }

    #[test]
    fn test_first_successful_strategy_wins() {
        let pipeline = ExtractionPipeline::default();
        assert_eq!(
            pipeline.extract_with_strategy(SCRIPT_PAGE).map(|(name, _)| name),
            Some("embedded")
        );
        assert_eq!(
            pipeline.extract_with_strategy(TABLE_PAGE).map(|(name, _)| name),
            Some("table")
        );
    }

    #[test]
    fn test_octane_echo_table_yields_nothing() {
        let page = r#"<table>
            <tr><th>Регион</th><th>АИ-92</th><th>АИ-95</th><th>АИ-98</th><th>АИ-100</th></tr>
            <tr><td>Средняя цена</td><td>92</td><td>95</td><td>98</td><td>100</td></tr>
        </table>"#;
        assert!(ExtractionPipeline::default().extract(page).is_empty());

        let page = page.replace("<td>92</td>", "<td>92.0</td>");
        assert!(ExtractionPipeline::default().extract(&page).is_empty());
    }

    #[test]
    fn test_no_prices_is_empty_not_error() {
        let page = "<html><body><p>Страница не найдена</p></body></html>";
        assert!(ExtractionPipeline::default().extract(page).is_empty());
    }

    #[test]
    fn test_is_octane_echo() {
        let echo = PriceMap::from([(FuelTag::Ai92, dec("92")), (FuelTag::Ai95, dec("95.0"))]);
        assert!(is_octane_echo(&echo));

        let real = PriceMap::from([(FuelTag::Ai92, dec("92")), (FuelTag::Ai95, dec("57.3"))]);
        assert!(!is_octane_echo(&real));

        assert!(!is_octane_echo(&PriceMap::new()));
    }

    #[test]
    fn test_price_ranges() {
        assert!(PriceRange::GENERAL.contains(dec("10")));
        assert!(PriceRange::GENERAL.contains(dec("200.00")));
        assert!(!PriceRange::GENERAL.contains(dec("9.99")));
        assert!(!PriceRange::TABLE.contains(dec("29.9")));
        assert!(PriceRange::TABLE.contains(dec("30")));
    }

    #[test]
    fn test_custom_strategy_order() {
        let pipeline = ExtractionPipeline::new(vec![DEFAULT_STRATEGIES[1]]);
        assert!(pipeline.extract(SCRIPT_PAGE).is_empty());
        assert_eq!(pipeline.extract(TABLE_PAGE).len(), 3);
    }

    #[test]
    fn test_strip_markup() {
        let doc = PageDocument::parse("<p>АИ-95&nbsp;<b>57,35</b>\n\n ₽</p>");
        assert_eq!(doc.text(), "АИ-95 57,35 ₽");
    }
}
