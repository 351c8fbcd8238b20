use std::collections::BTreeMap;

use pitchside_core::{Format, RawVenueRecord, SourceId, StatSlot};
use scraper::{ElementRef, Html};
use serde_json::{json, Map, Value as JsonValue};

use crate::{
    closest, element_text, next_element, select_first_text, selector, text_or_none, year_in,
    AdapterError, SourceAdapter,
};

const HEADER_NAME: &str = r#"p[class="text-text-header/60 md:text-sm text-xs font-semibold"]"#;
const VENUE_CARD: &str = "div.bg-foreGround.px-4.pb-2.rounded-md";
const LABEL_ROW: &str = ".flex.items-center.py-2.gap-2";
const FORMAT_SECTION: &str = "div.grid > section.bg-foreGround";
const SCORE_CARD: &str = "div.flex.flex-col.items-center.justify-center";

/// Venue card label, output key.
const CARD_FIELDS: [(&str, &str); 3] = [
    ("Country :", "country"),
    ("Capacity :", "capacity"),
    ("Flood Lights :", "floodLights"),
];

/// Lowercased row label, output key. Unlisted labels keep their own text.
const LABEL_KEYS: [(&str, &str); 6] = [
    ("name", "Name"),
    ("country", "Country"),
    ("city", "City"),
    ("capacity", "Capacity"),
    ("bowling ends", "Bowling Ends"),
    ("flood lights", "Flood Lights"),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct CricketDotComAdapter;

fn before_comma(text: &str) -> Option<String> {
    text.split(',').next().and_then(|head| text_or_none(head.to_string()))
}

fn venue_name(document: &Html) -> Result<Option<String>, AdapterError> {
    let header = select_first_text(document, HEADER_NAME)?;
    let name = match header.as_deref().and_then(before_comma) {
        Some(name) => Some(name),
        None => select_first_text(document, "h1")?.as_deref().and_then(before_comma),
    };
    Ok(name)
}

fn card_fields(document: &Html, record: &mut RawVenueRecord) -> Result<(), AdapterError> {
    let card_sel = selector(VENUE_CARD)?;
    let p_sel = selector("p")?;
    let Some(card) = document.select(&card_sel).next() else {
        return Ok(());
    };
    for (label, key) in CARD_FIELDS {
        let value = card
            .select(&p_sel)
            .find(|p| element_text(*p).contains(label))
            .and_then(next_element)
            .filter(|next| next.value().name() == "p")
            .and_then(|next| text_or_none(element_text(next)))
            .filter(|value| value != "-");
        if let Some(value) = value {
            record.insert(key, value);
        }
    }
    Ok(())
}

fn label_rows(document: &Html, record: &mut RawVenueRecord) -> Result<(), AdapterError> {
    let row_sel = selector(LABEL_ROW)?;
    let p_sel = selector("p")?;
    for row in document.select(&row_sel) {
        let texts = row.select(&p_sel).map(element_text).collect::<Vec<_>>();
        let (Some(label), Some(value)) = (texts.first(), texts.last()) else {
            continue;
        };
        if texts.len() < 2 || value.is_empty() || value == "-" {
            continue;
        }
        let label = label.trim_end_matches(':').trim();
        let key = LABEL_KEYS
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(label))
            .map(|(_, key)| (*key).to_string())
            .unwrap_or_else(|| label.to_string());
        if !key.is_empty() {
            record.insert(key, value.clone());
        }
    }
    Ok(())
}

fn section_format(text: &str) -> Option<Format> {
    if text.contains("ODI") {
        Some(Format::Odi)
    } else if text.contains("T20") || text.contains("Twenty20") {
        Some(Format::T20)
    } else if text.contains("Test") {
        Some(Format::Test)
    } else {
        None
    }
}

/// Smallest section around the `h2` whose text contains `marker`.
fn block_for<'a>(section: ElementRef<'a>, marker: &str) -> Result<Option<ElementRef<'a>>, AdapterError> {
    let h2_sel = selector("h2")?;
    Ok(section
        .select(&h2_sel)
        .find(|h2| element_text(*h2).contains(marker))
        .map(|h2| closest(h2, "section").unwrap_or(section)))
}

fn first_text_in(scope: ElementRef<'_>, css: &str) -> Result<String, AdapterError> {
    let sel = selector(css)?;
    Ok(scope.select(&sel).next().map(element_text).unwrap_or_default())
}

fn non_empty(summary: JsonValue) -> Option<JsonValue> {
    let has_text = summary
        .as_object()
        .is_some_and(|fields| fields.values().any(|v| v.as_str().is_some_and(|s| !s.is_empty())));
    has_text.then_some(summary)
}

fn match_info(section: ElementRef<'_>, marker: &str) -> Result<Option<JsonValue>, AdapterError> {
    let Some(block) = block_for(section, marker)? else {
        return Ok(None);
    };
    let date = first_text_in(block, "p.text-text-header")?;
    let span_sel = selector("span.flex.flex-col")?;
    let p_sel = selector("p")?;
    let lines = block
        .select(&span_sel)
        .next()
        .map(|span| span.select(&p_sel).map(element_text).collect::<Vec<_>>())
        .unwrap_or_default();
    let teams = lines.first().cloned().unwrap_or_default();
    let mut result = lines.get(1).cloned().unwrap_or_default();
    if let Some((_, rest)) = result.split_once(" - ") {
        result = rest.trim().to_string();
    }
    let year = year_in(&date).unwrap_or_default();
    Ok(non_empty(json!({
        "date": date,
        "year": year,
        "teams": teams,
        "matchResult": result,
    })))
}

fn score_info(section: ElementRef<'_>, marker: &str) -> Result<Option<JsonValue>, AdapterError> {
    let Some(block) = block_for(section, marker)? else {
        return Ok(None);
    };
    let card_sel = selector(SCORE_CARD)?;
    let p_sel = selector("p")?;
    let cards = block.select(&card_sel).collect::<Vec<_>>();
    let Some(score_card) = cards.first() else {
        return Ok(None);
    };
    let score = score_card.select(&p_sel).next().map(element_text).unwrap_or_default();
    let info = cards
        .get(1)
        .map(|card| card.select(&p_sel).map(element_text).collect::<Vec<_>>())
        .unwrap_or_default();
    let teams = info.first().cloned().unwrap_or_default();
    let result = info
        .last()
        .filter(|_| info.len() > 1)
        .map(|line| match line.rsplit_once("- ") {
            Some((_, tail)) => tail.trim().to_string(),
            None => line.clone(),
        })
        .unwrap_or_default();

    let raw_date = first_text_in(block, "p.text-text-header")?;
    let date = match raw_date.get(..5) {
        Some(prefix) if prefix.eq_ignore_ascii_case("score") => raw_date[5..].trim().to_string(),
        _ => raw_date,
    };
    let year = year_in(&date).unwrap_or_default();
    Ok(non_empty(json!({
        "score": score,
        "date": date,
        "year": year,
        "teams": teams,
        "matchResult": result,
    })))
}

fn format_stats(document: &Html) -> Result<BTreeMap<Format, Map<String, JsonValue>>, AdapterError> {
    let section_sel = selector(FORMAT_SECTION)?;
    let mut stats: BTreeMap<Format, Map<String, JsonValue>> = BTreeMap::new();
    for section in document.select(&section_sel) {
        let text = element_text(section);
        let Some(format) = section_format(&text) else {
            continue;
        };
        let entry = stats.entry(format).or_default();
        let title = format.title();
        if let Some(summary) = match_info(section, "1st")? {
            entry.insert(format!("first{title}"), summary);
        }
        if let Some(summary) = match_info(section, "Recent")? {
            entry.insert(format!("recent{title}"), summary);
        }
        for (marker, slot) in [
            ("Highest Team Score", StatSlot::HighestTeamScore),
            ("Lowest Team Score", StatSlot::LowestTeamScore),
        ] {
            if !text.contains(marker) {
                continue;
            }
            if let Some(summary) = score_info(section, marker)? {
                entry.insert(slot.key().to_string(), summary);
            }
        }
    }
    stats.retain(|_, per_format| !per_format.is_empty());
    Ok(stats)
}

impl SourceAdapter for CricketDotComAdapter {
    fn source(&self) -> SourceId {
        SourceId::CricketDotCom
    }

    fn parse(&self, html: &str) -> Result<RawVenueRecord, AdapterError> {
        let document = Html::parse_document(html);
        let mut record = RawVenueRecord::new();

        if let Some(name) = venue_name(&document)? {
            record.insert("venueName", name);
        }
        label_rows(&document, &mut record)?;
        card_fields(&document, &mut record)?;

        let stats = format_stats(&document)?;
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
