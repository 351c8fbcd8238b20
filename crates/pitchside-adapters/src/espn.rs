use pitchside_core::{RawVenueRecord, SourceId};
use scraper::Html;
use serde_json::Value as JsonValue;

use crate::{element_text, select_first_text, selector, split_list, AdapterError, SourceAdapter};

#[derive(Debug, Clone, Copy)]
enum ValueShape {
    Text,
    List,
    /// Comma list that also uses " as well as " between the last two items.
    Prose,
}

/// Row label fragment, output key, value shape.
const ROWS: [(&str, &str, ValueShape); 10] = [
    ("Also knows as", "alsoKnownAs", ValueShape::List),
    ("Established", "opened", ValueShape::Text),
    ("Capacity", "capacity", ValueShape::Text),
    ("Playing area", "dimensions", ValueShape::Text),
    ("End Names", "ends", ValueShape::List),
    ("Flood Light", "floodLights", ValueShape::Text),
    ("Home Teams", "homeTeams", ValueShape::List),
    ("Other Sports", "otherSports", ValueShape::Prose),
    ("Pitch", "pitch", ValueShape::Text),
    ("Curator", "curator", ValueShape::Text),
];

/// Cricinfo ground pages: name in the document title, details in a two-column table.
#[derive(Debug, Clone, Copy, Default)]
pub struct EspnAdapter;

fn title_name(title: &str) -> Option<String> {
    let name = title
        .split('|')
        .next()
        .and_then(|head| head.split(',').next())
        .map(str::trim)
        .unwrap_or_default();
    if name.is_empty() || name.eq_ignore_ascii_case("overview") {
        None
    } else {
        Some(name.to_string())
    }
}

fn shaped(value: &str, shape: ValueShape) -> Option<JsonValue> {
    let items = match shape {
        ValueShape::Text => return Some(JsonValue::String(value.to_string())),
        ValueShape::List => split_list(value),
        ValueShape::Prose => split_list(&value.replace(" as well as ", ",")),
    };
    (!items.is_empty()).then(|| JsonValue::from(items))
}

impl SourceAdapter for EspnAdapter {
    fn source(&self) -> SourceId {
        SourceId::Espn
    }

    fn parse(&self, html: &str) -> Result<RawVenueRecord, AdapterError> {
        let document = Html::parse_document(html);
        let rows_sel = selector("tr")?;
        let cells_sel = selector("td")?;

        let rows = document
            .select(&rows_sel)
            .filter_map(|row| {
                let cells = row.select(&cells_sel).map(element_text).collect::<Vec<_>>();
                match cells.as_slice() {
                    [label, value, ..] => Some((label.clone(), value.clone())),
                    _ => None,
                }
            })
            .collect::<Vec<_>>();

        let mut record = RawVenueRecord::new();
        if let Some(name) = select_first_text(&document, "title")?.as_deref().and_then(title_name) {
            record.insert("venueName", name);
        }
        for (fragment, key, shape) in ROWS {
            let Some((_, value)) = rows.iter().find(|(label, _)| label.contains(fragment)) else {
                continue;
            };
            if value.is_empty() {
                continue;
            }
            if let Some(value) = shaped(value, shape) {
                record.insert(key, value);
            }
        }
        Ok(record)
    }
}
