use serde_json::Value as JsonValue;

/// Literal sites print when a field is unknown.
const PLACEHOLDER: &str = "N/A";

pub(crate) fn is_placeholder(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.is_empty() || trimmed == PLACEHOLDER
}

/// Scalar view of a value. Blank strings, placeholders, and compound values are absent.
pub(crate) fn scalar_text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) if !is_placeholder(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// List view of a value: arrays yield their scalar items, strings split on commas.
pub(crate) fn list_items(value: &JsonValue) -> Vec<String> {
    match value {
        JsonValue::Array(items) => items
            .iter()
            .filter_map(scalar_text)
            .map(|s| s.trim().to_string())
            .filter(|s| !is_placeholder(s))
            .collect(),
        JsonValue::String(s) => split_comma_list(s),
        JsonValue::Number(_) | JsonValue::Bool(_) => scalar_text(value).into_iter().collect(),
        _ => Vec::new(),
    }
}

pub(crate) fn split_comma_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !is_placeholder(s))
        .map(ToString::to_string)
        .collect()
}

/// Trim, drop empties, and keep the first occurrence of each exact value.
pub(crate) fn dedupe_trimmed<I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut out: Vec<String> = Vec::new();
    for item in items {
        let trimmed = item.trim();
        if trimmed.is_empty() || out.iter().any(|seen| seen == trimmed) {
            continue;
        }
        out.push(trimmed.to_string());
    }
    out
}
