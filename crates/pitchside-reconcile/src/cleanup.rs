use std::collections::BTreeMap;

use pitchside_core::{CanonicalVenueRecord, FormatStats, MatchSummary, StatSlot};
use serde_json::{Map, Value as JsonValue};

/// Recursively drop null, blank strings, and lists/objects that end up empty.
///
/// String items inside lists are trimmed; other strings keep their text.
/// Returns `None` when nothing of `value` survives.
pub fn cleanup_value(value: &JsonValue) -> Option<JsonValue> {
    match value {
        JsonValue::Null => None,
        JsonValue::String(s) if s.trim().is_empty() => None,
        JsonValue::String(_) | JsonValue::Number(_) | JsonValue::Bool(_) => Some(value.clone()),
        JsonValue::Array(items) => {
            let cleaned = items
                .iter()
                .filter_map(|item| match item {
                    JsonValue::String(s) => {
                        let trimmed = s.trim();
                        (!trimmed.is_empty()).then(|| JsonValue::String(trimmed.to_string()))
                    }
                    other => cleanup_value(other),
                })
                .collect::<Vec<_>>();
            (!cleaned.is_empty()).then_some(JsonValue::Array(cleaned))
        }
        JsonValue::Object(map) => {
            let cleaned = cleanup_map(map);
            (!cleaned.is_empty()).then_some(JsonValue::Object(cleaned))
        }
    }
}

pub fn cleanup_map(map: &Map<String, JsonValue>) -> Map<String, JsonValue> {
    map.iter()
        .filter_map(|(key, value)| cleanup_value(value).map(|v| (key.clone(), v)))
        .collect()
}

fn clean_text(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn clean_summary(summary: Option<MatchSummary>) -> Option<MatchSummary> {
    let summary = summary?;
    let cleaned = MatchSummary {
        date: clean_text(summary.date),
        year: clean_text(summary.year),
        teams: clean_text(summary.teams),
        match_result: clean_text(summary.match_result),
        score: clean_text(summary.score),
    };
    (!cleaned.is_empty()).then_some(cleaned)
}

fn clean_format_stats(stats: FormatStats) -> Option<FormatStats> {
    let mut cleaned = FormatStats::default();
    for slot in StatSlot::ALL {
        cleaned.set_slot(slot, clean_summary(stats.slot(slot).cloned()));
    }
    (!cleaned.is_empty()).then_some(cleaned)
}

/// Typed counterpart of [`cleanup_value`] for a reconciled record.
pub fn cleanup_record(record: CanonicalVenueRecord) -> CanonicalVenueRecord {
    CanonicalVenueRecord {
        venue_name: clean_text(record.venue_name),
        also_known_as: clean_list(record.also_known_as),
        area: clean_text(record.area),
        time_zone: clean_text(record.time_zone),
        opened: clean_text(record.opened),
        capacity: clean_text(record.capacity),
        ends: clean_list(record.ends),
        floodlights: clean_text(record.floodlights),
        curator: clean_text(record.curator),
        pitch: clean_text(record.pitch),
        home_teams: clean_list(record.home_teams),
        other_sports: clean_list(record.other_sports),
        stats: record
            .stats
            .into_iter()
            .filter_map(|(format, stats)| clean_format_stats(stats).map(|s| (format, s)))
            .collect(),
        extra: record
            .extra
            .into_iter()
            .filter_map(|(key, value)| cleanup_value(&value).map(|v| (key, v)))
            .collect::<BTreeMap<_, _>>(),
    }
}
