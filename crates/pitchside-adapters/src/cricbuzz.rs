use std::collections::BTreeMap;

use pitchside_core::{Format, RawVenueRecord, SourceId, StatSlot};
use scraper::Html;
use serde_json::{json, Map, Value as JsonValue};

use crate::{element_text, selector, year_in, AdapterError, SourceAdapter};

const NAME_SELECTORS: [&str; 4] = ["h1", ".cb-nav-hdr", ".cb-font-24", ".cb-font-20"];

/// Aggregate rows of the stats tables that have no place in the venue record.
const SUMMARY_LABELS: [&str; 11] = [
    "Total matches",
    "Matches won batting first",
    "Matches won bowling first",
    "Average 1st Inns scores",
    "Average 2nd Inns scores",
    "Average 3rd Inns scores",
    "Average 4th Inns scores",
    "Highest total recorded",
    "Lowest total recorded",
    "Highest score chased",
    "Lowest score defended",
];

/// Venue profile pages: a label/value info table followed by per-format stats tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct CricbuzzAdapter;

fn heading_format(text: &str) -> Option<Format> {
    let lower = text.to_ascii_lowercase();
    if lower.contains("test") {
        Some(Format::Test)
    } else if lower.contains("odi") {
        Some(Format::Odi)
    } else if lower.contains("t20") || lower.contains("twenty") {
        Some(Format::T20)
    } else {
        None
    }
}

fn stat_slot(label: &str) -> Option<StatSlot> {
    let lower = label.trim().to_ascii_lowercase();
    [
        ("first", StatSlot::FirstMatch),
        ("recent", StatSlot::RecentMatch),
        ("highest", StatSlot::HighestTeamScore),
        ("lowest", StatSlot::LowestTeamScore),
    ]
    .into_iter()
    .find_map(|(prefix, slot)| lower.starts_with(prefix).then_some(slot))
}

fn stat_key(slot: StatSlot, format: Format) -> String {
    match slot {
        StatSlot::FirstMatch => format!("first{}", format.title()),
        StatSlot::RecentMatch => format!("recent{}", format.title()),
        _ => slot.key().to_string(),
    }
}

/// Score rows read `657/8 (ENG vs IND, 2016)`; match rows read `ENG vs AUS, Dec 1934`.
fn stat_summary(slot: StatSlot, value: &str) -> JsonValue {
    let year = year_in(value).unwrap_or_default();
    if slot.carries_score() {
        let score = value.split_whitespace().next().unwrap_or_default();
        return json!({ "score": score, "year": year });
    }
    let (teams, date) = value
        .split_once(',')
        .map(|(teams, date)| (teams.trim(), date.trim()))
        .unwrap_or((value.trim(), ""));
    json!({ "teams": teams, "date": date, "year": year })
}

fn venue_name(document: &Html) -> Result<Option<String>, AdapterError> {
    for css in NAME_SELECTORS {
        let sel = selector(css)?;
        if let Some(text) = document.select(&sel).next().map(element_text) {
            let len = text.chars().count();
            if len > 3 && len < 100 {
                return Ok(Some(text));
            }
        }
    }
    Ok(None)
}

impl SourceAdapter for CricbuzzAdapter {
    fn source(&self) -> SourceId {
        SourceId::Cricbuzz
    }

    fn parse(&self, html: &str) -> Result<RawVenueRecord, AdapterError> {
        let document = Html::parse_document(html);
        let markers = selector("h1, h2, h3, h4, .cb-font-18, .cb-font-16, table")?;
        let rows = selector("tr")?;
        let cells = selector("td")?;

        let mut record = RawVenueRecord::new();
        let mut stats: BTreeMap<Format, Map<String, JsonValue>> = BTreeMap::new();
        let mut current_format = None;

        for element in document.select(&markers) {
            if element.value().name() != "table" {
                if let Some(format) = heading_format(&element_text(element)) {
                    current_format = Some(format);
                }
                continue;
            }
            for row in element.select(&rows) {
                let texts = row.select(&cells).map(element_text).collect::<Vec<_>>();
                let [label, value, ..] = texts.as_slice() else {
                    continue;
                };
                if label.is_empty() || value.is_empty() {
                    continue;
                }
                if let (Some(format), Some(slot)) = (current_format, stat_slot(label)) {
                    stats
                        .entry(format)
                        .or_default()
                        .entry(stat_key(slot, format))
                        .or_insert_with(|| stat_summary(slot, value));
                    continue;
                }
                if SUMMARY_LABELS.iter().any(|known| known.eq_ignore_ascii_case(label)) {
                    continue;
                }
                if !record.contains_key(label) {
                    record.insert(label.clone(), value.clone());
                }
            }
        }

        if let Some(name) = venue_name(&document)? {
            record.insert("Name", name);
        }
        if !stats.is_empty() {
            let by_format = stats
                .into_iter()
                .map(|(format, per_format)| (format.key().to_string(), JsonValue::Object(per_format)))
                .collect::<Map<_, _>>();
            record.insert("stats", by_format);
        }
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <div class="cb-nav-hdr">Wankhede Stadium, Mumbai</div>
          <table>
            <tr><td>Opened</td><td>1974</td></tr>
            <tr><td>Capacity</td><td>33,108</td></tr>
            <tr><td>Known as</td><td>Wankhede</td></tr>
            <tr><td>Ends</td><td>Garware Pavilion End, Tata End</td></tr>
            <tr><td>Curator</td><td></td></tr>
          </table>
          <h3>Test Stats</h3>
          <table>
            <tr><td>Total matches</td><td>26</td></tr>
            <tr><td>Highest total recorded</td><td>631/10 (IND vs ENG, 2016)</td></tr>
            <tr><td>Lowest total recorded</td><td>62/10 (NZ vs IND, 2021)</td></tr>
          </table>
          <h3>ODI Stats</h3>
          <table>
            <tr><td>First ODI</td><td>IND vs SL, Jan 1987</td></tr>
          </table>
        </body></html>
    "#;

    #[test]
    fn info_table_rows_become_keys_and_summary_rows_are_dropped() {
        let record = CricbuzzAdapter.parse(PAGE).unwrap();
        assert_eq!(record.get("Name"), Some(&json!("Wankhede Stadium, Mumbai")));
        assert_eq!(record.get("Opened"), Some(&json!("1974")));
        assert_eq!(record.get("Capacity"), Some(&json!("33,108")));
        assert_eq!(record.get("Ends"), Some(&json!("Garware Pavilion End, Tata End")));
        assert!(record.get("Curator").is_none());
        assert!(record.get("Total matches").is_none());
    }

    #[test]
    fn stats_tables_are_keyed_by_the_preceding_format_heading() {
        let record = CricbuzzAdapter.parse(PAGE).unwrap();
        assert_eq!(
            record.get("stats"),
            Some(&json!({
                "test": {
                    "highestTeamScore": { "score": "631/10", "year": "2016" },
                    "lowestTeamScore": { "score": "62/10", "year": "2021" }
                },
                "odi": {
                    "firstOdi": { "teams": "IND vs SL", "date": "Jan 1987", "year": "1987" }
                }
            }))
        );
    }

    #[test]
    fn page_without_markup_yields_empty_record() {
        let record = CricbuzzAdapter.parse("<html><body><h1>404</h1></body></html>").unwrap();
        assert!(record.is_empty());
    }
}
