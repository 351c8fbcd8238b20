use std::sync::LazyLock;

use pitchside_core::{Format, RawVenueRecord, StatSlot};
use regex::Regex;
use serde_json::{json, Map, Value as JsonValue};

use crate::fields::CanonicalField;
use crate::values::{list_items, scalar_text, split_comma_list};

/// Alternate spellings promoted to the canonical key when that key is unset.
const PROMOTIONS: [(&str, CanonicalField); 7] = [
    ("Opened", CanonicalField::Opened),
    ("opened", CanonicalField::Opened),
    ("Curator", CanonicalField::Curator),
    ("curator", CanonicalField::Curator),
    ("floodLights", CanonicalField::Floodlights),
    ("Flood Lights", CanonicalField::Floodlights),
    ("Floodlights", CanonicalField::Floodlights),
];

const MAX_CAPACITY_DIGITS: usize = 6;

/// Rewrite one source's raw record onto canonical keys and shapes.
///
/// Returns a new record; the input is never modified.
pub fn normalize(raw: &RawVenueRecord) -> RawVenueRecord {
    let mut record = raw.clone();
    record.remove("scraped");

    split_known_as(&mut record);
    normalize_capacity_fields(&mut record);
    promote_alternates(&mut record);
    fold_alternate_names(&mut record);
    reshape_flattened_stats(&mut record);

    record
}

fn is_set(record: &RawVenueRecord, key: &str) -> bool {
    record.get(key).and_then(scalar_text).is_some()
}

fn known_as_list(record: &RawVenueRecord) -> Vec<String> {
    record
        .get(CanonicalField::AlsoKnownAs.key())
        .map(list_items)
        .unwrap_or_default()
}

fn split_known_as(record: &mut RawVenueRecord) {
    let canonical = CanonicalField::AlsoKnownAs.key();
    let mut names = known_as_list(record);
    let mut touched = matches!(record.get(canonical), Some(JsonValue::String(_)));

    for alias in CanonicalField::AlsoKnownAs.aliases() {
        if let Some(JsonValue::String(text)) = record.get(alias) {
            names.extend(split_comma_list(text));
            record.remove(alias);
            touched = true;
        }
    }

    if touched {
        record.insert(canonical, names);
    }
}

static PARENTHETICAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\([^)]*\)").expect("parenthetical pattern"));

/// Reduce a free-text capacity to at most six digits.
///
/// Closed `(...)` remarks and every character other than digits are removed;
/// an empty or all-zero result is unknown.
pub fn normalize_capacity(text: &str) -> Option<String> {
    let mut digits = PARENTHETICAL
        .replace_all(text, "")
        .chars()
        .filter(char::is_ascii_digit)
        .collect::<String>();
    digits.truncate(MAX_CAPACITY_DIGITS);
    if digits.is_empty() || digits.chars().all(|c| c == '0') {
        None
    } else {
        Some(digits)
    }
}

fn normalize_capacity_fields(record: &mut RawVenueRecord) {
    for key in CanonicalField::Capacity.candidate_keys() {
        let Some(JsonValue::String(text)) = record.get(key) else {
            continue;
        };
        match normalize_capacity(text) {
            Some(cleaned) => {
                record.insert(key, cleaned);
            }
            None => {
                record.remove(key);
            }
        }
    }
}

fn promote_alternates(record: &mut RawVenueRecord) {
    for (alternate, field) in PROMOTIONS {
        let canonical = field.key();
        if is_set(record, canonical) || !is_set(record, alternate) {
            continue;
        }
        if let Some(value) = record.remove(alternate) {
            record.insert(canonical, value);
        }
    }
}

/// A second name for the venue becomes an also-known-as entry instead of
/// competing with the canonical name.
fn fold_alternate_names(record: &mut RawVenueRecord) {
    let canonical_key = CanonicalField::VenueName.key();
    let Some(canonical) = record.get(canonical_key).and_then(scalar_text) else {
        return;
    };

    let mut prepend = Vec::new();
    for alias in CanonicalField::VenueName.aliases() {
        let Some(value) = record.remove(alias) else {
            continue;
        };
        if let Some(name) = scalar_text(&value) {
            if name.trim() != canonical.trim() && !prepend.contains(&name) {
                prepend.push(name);
            }
        }
    }
    if prepend.is_empty() {
        return;
    }

    let existing = known_as_list(record);
    prepend.retain(|name| !existing.contains(name));
    prepend.extend(existing);
    record.insert(CanonicalField::AlsoKnownAs.key(), prepend);
}

fn text_at(object: &Map<String, JsonValue>, keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|key| object.get(*key).and_then(scalar_text))
        .next()
        .unwrap_or_default()
}

fn flattened_summary(stats: &Map<String, JsonValue>, prefix: &str) -> JsonValue {
    let field = |suffix: &str| text_at(stats, &[format!("{prefix}{suffix}").as_str()]);
    json!({
        "date": field("Date"),
        "year": field("Year"),
        "teams": field("Teams"),
        "matchResult": field("Result"),
    })
}

fn extreme_summary(stats: &Map<String, JsonValue>, key: &str) -> JsonValue {
    let empty = Map::new();
    let extreme = stats.get(key).and_then(JsonValue::as_object).unwrap_or(&empty);
    json!({
        "score": text_at(extreme, &["total", "score"]),
        "date": text_at(extreme, &["date"]),
        "year": text_at(extreme, &["year"]),
        "teams": text_at(extreme, &["teams"]),
        "matchResult": text_at(extreme, &["result"]),
    })
}

fn reshape_format(format: Format, stats: &Map<String, JsonValue>) -> JsonValue {
    let title = format.title();
    let mut out = Map::new();
    out.insert(
        StatSlot::FirstMatch.key().to_string(),
        flattened_summary(stats, &format!("first{title}")),
    );
    out.insert(
        StatSlot::RecentMatch.key().to_string(),
        flattened_summary(stats, &format!("recent{title}")),
    );
    out.insert(
        StatSlot::HighestTeamScore.key().to_string(),
        extreme_summary(stats, "Highest"),
    );
    out.insert(
        StatSlot::LowestTeamScore.key().to_string(),
        extreme_summary(stats, "Lowest"),
    );
    JsonValue::Object(out)
}

/// Turn `oStats.<format>.firstOdiDate`-style keys into `stats.<format>.firstMatch.date`.
fn reshape_flattened_stats(record: &mut RawVenueRecord) {
    let Some(flat) = record.remove("oStats") else {
        return;
    };
    let Some(flat) = flat.as_object() else {
        return;
    };

    let mut stats = match record.remove("stats") {
        Some(JsonValue::Object(existing)) => existing,
        _ => Map::new(),
    };
    for format in Format::ALL {
        if let Some(per_format) = flat.get(format.key()).and_then(JsonValue::as_object) {
            stats.insert(format.key().to_string(), reshape_format(format, per_format));
        }
    }
    record.insert("stats", stats);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(value: JsonValue) -> RawVenueRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn capacity_strips_commentary_and_separators() {
        assert_eq!(normalize_capacity("1,00,000 (renovated)").as_deref(), Some("100000"));
        assert_eq!(normalize_capacity("68,000").as_deref(), Some("68000"));
        assert_eq!(normalize_capacity("approx. 33,500 seats").as_deref(), Some("33500"));
        assert_eq!(normalize_capacity("1,32,000,000").as_deref(), Some("132000"));
    }

    #[test]
    fn capacity_keeps_digits_after_an_unclosed_paren() {
        assert_eq!(normalize_capacity("(renovated 50,000").as_deref(), Some("50000"));
        assert_eq!(normalize_capacity("25,000 (approx").as_deref(), Some("25000"));
    }

    #[test]
    fn capacity_of_zeros_or_nothing_is_unknown() {
        assert_eq!(normalize_capacity("000000"), None);
        assert_eq!(normalize_capacity("0,000,000 (est)"), None);
        assert_eq!(normalize_capacity("(unknown)"), None);
        assert_eq!(normalize_capacity(""), None);
    }

    #[test]
    fn zero_capacity_is_removed_from_the_record() {
        let out = normalize(&record(json!({ "Capacity": "000000", "capacity": "25,000" })));
        assert_eq!(out.get("Capacity"), None);
        assert_eq!(out.get("capacity"), Some(&json!("25000")));
    }

    #[test]
    fn known_as_string_becomes_list() {
        let out = normalize(&record(json!({ "sKnownAs": "Feroz Shah Kotla, , Kotla " })));
        assert_eq!(out.get("sKnownAs"), None);
        assert_eq!(out.get("aAlsoKnownAs"), Some(&json!(["Feroz Shah Kotla", "Kotla"])));
    }

    #[test]
    fn alternates_promote_only_when_canonical_unset() {
        let out = normalize(&record(json!({
            "Opened": "1864",
            "Curator": "Anonymous",
            "sCurator": "Named",
            "floodLights": "Yes"
        })));
        assert_eq!(out.get("sOpened"), Some(&json!("1864")));
        assert_eq!(out.get("Opened"), None);
        assert_eq!(out.get("sCurator"), Some(&json!("Named")));
        assert_eq!(out.get("Curator"), Some(&json!("Anonymous")));
        assert_eq!(out.get("sFloodlights"), Some(&json!("Yes")));
        assert_eq!(out.get("floodLights"), None);
    }

    #[test]
    fn differing_venue_name_is_prepended_to_known_as() {
        let out = normalize(&record(json!({
            "sVenueName": "Arun Jaitley Stadium",
            "venueName": "Feroz Shah Kotla",
            "aAlsoKnownAs": ["Kotla"]
        })));
        assert_eq!(out.get("venueName"), None);
        assert_eq!(out.get("sVenueName"), Some(&json!("Arun Jaitley Stadium")));
        assert_eq!(out.get("aAlsoKnownAs"), Some(&json!(["Feroz Shah Kotla", "Kotla"])));
    }

    #[test]
    fn matching_venue_name_is_dropped_silently() {
        let out = normalize(&record(json!({
            "sVenueName": "Eden Gardens",
            "venueName": "Eden Gardens"
        })));
        assert_eq!(out.get("venueName"), None);
        assert_eq!(out.get("aAlsoKnownAs"), None);
    }

    #[test]
    fn flattened_stats_are_reshaped_with_empty_defaults() {
        let out = normalize(&record(json!({
            "oStats": {
                "odi": {
                    "firstOdiDate": "Jan 5",
                    "firstOdiYear": "1971",
                    "firstOdiTeams": "AUS vs ENG",
                    "Highest": { "total": "344/7", "result": "won" }
                },
                "t20": "not an object"
            }
        })));
        assert_eq!(out.get("oStats"), None);
        assert_eq!(
            out.get("stats"),
            Some(&json!({
                "odi": {
                    "firstMatch": { "date": "Jan 5", "year": "1971", "teams": "AUS vs ENG", "matchResult": "" },
                    "recentMatch": { "date": "", "year": "", "teams": "", "matchResult": "" },
                    "highestTeamScore": { "score": "344/7", "date": "", "year": "", "teams": "", "matchResult": "won" },
                    "lowestTeamScore": { "score": "", "date": "", "year": "", "teams": "", "matchResult": "" }
                }
            }))
        );
    }

    #[test]
    fn normalize_leaves_input_untouched_and_invents_nothing() {
        let input = record(json!({ "scraped": true, "dimensions": "150m" }));
        let out = normalize(&input);
        assert_eq!(input.get("scraped"), Some(&json!(true)));
        assert_eq!(out.len(), 1);
        assert_eq!(out.get("dimensions"), Some(&json!("150m")));
        assert!(normalize(&RawVenueRecord::new()).is_empty());
    }
}
