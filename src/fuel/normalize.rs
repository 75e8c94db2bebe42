//! Free-form fuel label normalization
//!
//! Matching runs in four stages, each one more permissive than the last:
//! exact synonym, synonym contained in the label, label contained in a
//! synonym, and finally octane-number and keyword heuristics.

use crate::fuel::FuelTag;
use std::sync::LazyLock;

/// Synonyms per tag, in compact form (lowercase, no hyphens or spaces)
const SYNONYMS: &[(FuelTag, &[&str])] = &[
    (
        FuelTag::Ai92,
        &["92", "ai92", "аи92", "a92", "а92", "регуляр92", "regular92"],
    ),
    (
        FuelTag::Ai92Plus,
        &[
            "92+", "ai92+", "аи92+", "аи92премиум", "ai92premium", "аи92экто", "ai92plus",
            "аи92плюс",
        ],
    ),
    (
        FuelTag::Ai95,
        &["95", "ai95", "аи95", "a95", "а95", "премиум95", "premium95"],
    ),
    (
        FuelTag::Ai95Plus,
        &[
            "95+", "ai95+", "аи95+", "аи95премиум", "ai95premium", "аи95экто", "ai95ultra",
            "аи95ультра", "ai95plus", "аи95плюс",
        ],
    ),
    (
        FuelTag::Ai98,
        &["98", "ai98", "аи98", "a98", "а98", "супер98", "super98"],
    ),
    (FuelTag::Ai100, &["100", "ai100", "аи100", "a100", "а100"]),
    (
        FuelTag::Ai100Plus,
        &["100+", "ai100+", "аи100+", "аи100премиум", "ai100premium"],
    ),
    (
        FuelTag::Diesel,
        &[
            "дт",
            "dt",
            "диз",
            "дизель",
            "дизтопливо",
            "дизельноетопливо",
            "diesel",
            "dieselfuel",
            "солярка",
        ],
    ),
    (
        FuelTag::DieselPlus,
        &[
            "дт+",
            "dt+",
            "дизель+",
            "diesel+",
            "дтпремиум",
            "дизельпремиум",
            "dieselpremium",
            "дтэкто",
            "дтевро+",
        ],
    ),
    (
        FuelTag::Gas,
        &["газ", "gas", "метан", "methane", "cng", "кпг", "природныйгаз"],
    ),
    (
        FuelTag::Propane,
        &[
            "пропан",
            "propane",
            "пропанбутан",
            "суг",
            "lpg",
            "сжиженныйгаз",
            "газпропан",
            "автогаз",
        ],
    ),
];

/// Synonyms eligible for substring matching, longest first.
/// Short and purely numeric forms are left to the heuristics stage.
static SUBSTRING_SYNONYMS: LazyLock<Vec<(FuelTag, &'static str)>> = LazyLock::new(|| {
    let mut entries: Vec<(FuelTag, &'static str)> = SYNONYMS
        .iter()
        .flat_map(|(tag, words)| words.iter().map(move |w| (*tag, *w)))
        .filter(|(_, w)| w.chars().count() >= 3 && w.chars().any(char::is_alphabetic))
        .collect();
    entries.sort_by_key(|(_, w)| std::cmp::Reverse(w.chars().count()));
    entries
});

/// Fragments that mark a label as naming a fuel; qualifier words like
/// "премиум" or "топливо" carry none of them
const FUEL_STEMS: &[&str] = &[
    "аи", "ai", "дт", "dt", "диз", "dies", "солярк", "газ", "gas", "метан", "cng", "кпг", "пропан",
    "propan", "lpg", "суг",
];

/// Maps an arbitrary fuel label to its canonical tag
///
/// # Arguments
///
/// * `text` - Label as found on a page (table header, JSON key, free text)
///
/// # Returns
///
/// * `Some(FuelTag)` - The label names a known fuel grade
/// * `None` - The label is not recognizable as a fuel
///
/// # Example
///
/// ```
/// use fuel_ledger::fuel::{normalize_fuel_label, FuelTag};
///
/// assert_eq!(normalize_fuel_label("Аи-95"), Some(FuelTag::Ai95));
/// assert_eq!(normalize_fuel_label("ДТ+"), Some(FuelTag::DieselPlus));
/// assert_eq!(normalize_fuel_label("Регион"), None);
/// ```
pub fn normalize_fuel_label(text: &str) -> Option<FuelTag> {
    let stripped = strip_label(text);
    let key: String = stripped.chars().filter(|c| *c != '-').collect();
    if key.is_empty() {
        return None;
    }

    exact_match(&key)
        .or_else(|| substring_match(&key))
        .or_else(|| heuristic_match(&key))
}

/// Keeps alphanumerics, `-` and `+`, lowercased
fn strip_label(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '+')
        .flat_map(char::to_lowercase)
        .collect()
}

fn exact_match(key: &str) -> Option<FuelTag> {
    SYNONYMS
        .iter()
        .find(|(_, words)| words.contains(&key))
        .map(|(tag, _)| *tag)
}

fn substring_match(key: &str) -> Option<FuelTag> {
    if let Some((tag, _)) = SUBSTRING_SYNONYMS.iter().find(|(_, w)| key.contains(*w)) {
        return Some(*tag);
    }

    if key.chars().count() < 3 || !key.chars().any(char::is_alphabetic) || !names_a_fuel(key) {
        return None;
    }

    SYNONYMS
        .iter()
        .find(|(_, words)| words.iter().any(|w| w.contains(key)))
        .map(|(tag, _)| *tag)
}

fn names_a_fuel(key: &str) -> bool {
    key.chars().any(|c| c.is_ascii_digit()) || FUEL_STEMS.iter().any(|stem| key.contains(stem))
}

fn heuristic_match(key: &str) -> Option<FuelTag> {
    let premium = key.contains('+');
    let runs = digit_runs(key);
    let has = |n: &str| runs.iter().any(|r| *r == n);

    if has("100") {
        return Some(if premium { FuelTag::Ai100Plus } else { FuelTag::Ai100 });
    }
    if has("98") {
        return Some(FuelTag::Ai98);
    }
    if has("95") {
        return Some(if premium { FuelTag::Ai95Plus } else { FuelTag::Ai95 });
    }
    if has("92") {
        return Some(if premium { FuelTag::Ai92Plus } else { FuelTag::Ai92 });
    }

    if key.starts_with("дт")
        || key.contains("дизел")
        || key.contains("diesel")
        || key.contains("солярк")
    {
        return Some(if premium { FuelTag::DieselPlus } else { FuelTag::Diesel });
    }
    if key.contains("пропан") || key.contains("propan") || key.contains("lpg") {
        return Some(FuelTag::Propane);
    }
    if key.contains("газ") || key.contains("gas") || key.contains("метан") {
        return Some(FuelTag::Gas);
    }

    None
}

/// Splits out maximal runs of ASCII digits
fn digit_runs(key: &str) -> Vec<&str> {
    key.split(|c: char| !c.is_ascii_digit())
        .filter(|run| !run.is_empty())
        .collect()
}
