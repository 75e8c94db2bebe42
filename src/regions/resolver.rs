//! Region list recovery from embedded page data
//!
//! The source page carries its region list inside script blocks, either as a
//! bare `"regions": [...]` array or nested somewhere in a client-side state
//! object. Neither location is stable, so candidates are found with permissive
//! patterns and then checked for shape.

use crate::regions::RegionMap;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// Nesting depth searched inside a parsed state object
const MAX_SEARCH_DEPTH: usize = 8;

static REGIONS_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""regions"\s*:\s*\["#).expect("valid regex"));
static STATE_ASSIGN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:window\.)?(?:__INITIAL_STATE__|__NUXT__|__PRELOADED_STATE__|__DATA__)\s*=\s*")
        .expect("valid regex")
});
static JSON_SCRIPT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<script\b[^>]*type\s*=\s*["']application/(?:ld\+)?json["'][^>]*>(.*?)</script>"#)
        .expect("valid regex")
});

/// Recovers the region id → name table embedded in a page
///
/// # Arguments
///
/// * `html` - Raw page markup
///
/// # Returns
///
/// The region map. An empty map means no usable structure was found; it
/// never means the source has zero regions.
pub fn resolve_regions(html: &str) -> RegionMap {
    for candidate in candidate_fragments(html) {
        let value: Value = match serde_json::from_str(candidate) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!("Discarding unparseable region candidate: {}", e);
                continue;
            }
        };

        let map = regions_from_value(&value);
        if !map.is_empty() {
            tracing::debug!("Resolved {} regions from embedded data", map.len());
            return map;
        }
    }

    RegionMap::new()
}

/// Collects balanced JSON-looking fragments in priority order
fn candidate_fragments(html: &str) -> Vec<&str> {
    let mut fragments = Vec::new();

    for m in REGIONS_KEY_RE.find_iter(html) {
        // The match ends just past the opening bracket
        let start = m.end() - 1;
        if let Some(fragment) = extract_balanced(&html[start..]) {
            fragments.push(fragment);
        }
    }

    for m in STATE_ASSIGN_RE.find_iter(html) {
        let rest = &html[m.end()..];
        if let Some(fragment) = extract_balanced(rest) {
            fragments.push(fragment);
        }
    }

    for cap in JSON_SCRIPT_RE.captures_iter(html) {
        if let Some(body) = cap.get(1) {
            let body = body.as_str().trim();
            if !body.is_empty() {
                fragments.push(body);
            }
        }
    }

    fragments
}

/// Extracts a balanced `[...]` or `{...}` literal from the start of `s`
///
/// Tracks bracket depth while respecting string literals and escapes. Returns
/// the shortest complete literal, or `None` if `s` does not start with an
/// opening bracket or the literal is unterminated.
fn extract_balanced(s: &str) -> Option<&str> {
    let close = match s.chars().next()? {
        '[' => ']',
        '{' => '}',
        _ => return None,
    };

    let mut depth: i32 = 0;
    let mut in_string = false;
    let mut escape = false;
    for (i, c) in s.char_indices() {
        if escape {
            escape = false;
            continue;
        }
        if in_string {
            match c {
                '\\' => escape = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '[' | '{' => depth += 1,
            ']' | '}' => {
                depth -= 1;
                if depth == 0 {
                    return (c == close).then(|| &s[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Finds a region list inside an arbitrary JSON value
fn regions_from_value(value: &Value) -> RegionMap {
    if let Value::Array(items) = value {
        if looks_like_region_list(items) {
            return build_region_map(items);
        }
    }

    if let Some(items) = find_regions_key(value, 0) {
        let map = build_region_map(items);
        if !map.is_empty() {
            return map;
        }
    }

    find_region_like_array(value, 0)
        .map(|items| build_region_map(items))
        .unwrap_or_default()
}

/// Depth-bounded search for an array stored under a `regions` key
fn find_regions_key(value: &Value, depth: usize) -> Option<&Vec<Value>> {
    if depth > MAX_SEARCH_DEPTH {
        return None;
    }

    match value {
        Value::Object(map) => {
            if let Some(Value::Array(items)) = map.get("regions") {
                if looks_like_region_list(items) {
                    return Some(items);
                }
            }
            map.values().find_map(|v| find_regions_key(v, depth + 1))
        }
        Value::Array(items) => items.iter().find_map(|v| find_regions_key(v, depth + 1)),
        _ => None,
    }
}

/// Depth-bounded search for any array whose first element is region-shaped
fn find_region_like_array(value: &Value, depth: usize) -> Option<&Vec<Value>> {
    if depth > MAX_SEARCH_DEPTH {
        return None;
    }

    match value {
        Value::Array(items) if looks_like_region_list(items) => Some(items),
        Value::Array(items) => items
            .iter()
            .find_map(|v| find_region_like_array(v, depth + 1)),
        Value::Object(map) => map
            .values()
            .find_map(|v| find_region_like_array(v, depth + 1)),
        _ => None,
    }
}

fn looks_like_region_list(items: &[Value]) -> bool {
    items.first().is_some_and(|first| {
        first.get("id").is_some() && (first.get("value").is_some() || first.get("name").is_some())
    })
}

/// Builds the map, skipping entries whose id or name cannot be read.
/// Later duplicates overwrite earlier ones.
fn build_region_map(items: &[Value]) -> RegionMap {
    let mut map = RegionMap::new();

    for item in items {
        let Some(id) = item.get("id").and_then(coerce_region_id) else {
            continue;
        };
        let name = item
            .get("value")
            .and_then(Value::as_str)
            .or_else(|| item.get("name").and_then(Value::as_str))
            .map(str::trim)
            .filter(|name| !name.is_empty());

        if let Some(name) = name {
            map.insert(id, name.to_string());
        }
    }

    map
}

fn coerce_region_id(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|id| u32::try_from(id).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
