use std::collections::BTreeMap;

use pitchside_core::{Format, FormatStats, MatchSummary, StatSlot};
use serde_json::{Map, Value as JsonValue};

use crate::values::scalar_text;

fn slot_for_key(key: &str, format: Format) -> Option<StatSlot> {
    let lower = key.trim().to_ascii_lowercase();
    let fmt = format.key();
    let is = |stem: &str| lower == stem || lower == format!("{stem}match") || lower == format!("{stem}{fmt}");
    if is("first") {
        Some(StatSlot::FirstMatch)
    } else if is("recent") {
        Some(StatSlot::RecentMatch)
    } else if matches!(lower.as_str(), "highest" | "highestteamscore" | "highesttotal") {
        Some(StatSlot::HighestTeamScore)
    } else if matches!(lower.as_str(), "lowest" | "lowestteamscore" | "lowesttotal") {
        Some(StatSlot::LowestTeamScore)
    } else {
        None
    }
}

fn text_field(object: &Map<String, JsonValue>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| object.get(*key).and_then(scalar_text))
}

fn teams_field(object: &Map<String, JsonValue>) -> Option<String> {
    match object.get("teams") {
        Some(JsonValue::Array(items)) => {
            let names = items.iter().filter_map(scalar_text).collect::<Vec<_>>();
            (!names.is_empty()).then(|| names.join(" vs "))
        }
        Some(other) => scalar_text(other),
        None => None,
    }
}

fn parse_summary(value: &JsonValue) -> Option<MatchSummary> {
    let object = value.as_object()?;
    let summary = MatchSummary {
        date: text_field(object, &["date"]),
        year: text_field(object, &["year"]),
        teams: teams_field(object),
        match_result: text_field(object, &["matchResult", "result"]),
        score: text_field(object, &["score", "total"]),
    };
    (!summary.is_empty()).then_some(summary)
}

/// Lenient reader for a source's `stats` value.
///
/// Format keys are matched case-insensitively; sub-record keys may be
/// canonical (`firstMatch`) or format-qualified (`firstOdi`, `Highest`).
/// Anything that is not the expected shape is skipped.
pub fn parse_stats(value: &JsonValue) -> BTreeMap<Format, FormatStats> {
    let mut out = BTreeMap::new();
    let Some(by_format) = value.as_object() else {
        return out;
    };
    for (format_key, per_format) in by_format {
        let (Some(format), Some(per_format)) = (Format::from_label(format_key), per_format.as_object()) else {
            continue;
        };
        let entry: &mut FormatStats = out.entry(format).or_default();
        for (slot_key, summary) in per_format {
            let Some(slot) = slot_for_key(slot_key, format) else {
                continue;
            };
            if entry.slot(slot).is_some() {
                continue;
            }
            entry.set_slot(slot, parse_summary(summary));
        }
    }
    out.retain(|_, stats| !stats.is_empty());
    out
}

/// Fill each format's slots from the first source (in the order given) that has them.
pub(crate) fn merge_stats<'a, I>(sources: I) -> BTreeMap<Format, FormatStats>
where
    I: IntoIterator<Item = &'a BTreeMap<Format, FormatStats>>,
{
    let mut merged: BTreeMap<Format, FormatStats> = BTreeMap::new();
    for stats in sources {
        for (format, per_format) in stats {
            let target = merged.entry(*format).or_default();
            for slot in StatSlot::ALL {
                if target.slot(slot).is_none() {
                    target.set_slot(slot, per_format.slot(slot).cloned());
                }
            }
        }
    }
    merged.retain(|_, stats| !stats.is_empty());
    merged
}
