use std::collections::BTreeMap;

use pitchside_core::{CanonicalVenueRecord, RawVenueRecord, SourceId};
use serde_json::Value as JsonValue;
use tracing::trace;

use crate::cleanup::{cleanup_record, cleanup_value};
use crate::fields::{is_reserved_key, CanonicalField, FieldKind, AREA_KEYS, AREA_PRIORITY};
use crate::normalize::normalize;
use crate::stats::{merge_stats, parse_stats};
use crate::values::{dedupe_trimmed, list_items, scalar_text};

/// The three raw records of one venue, one per source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceRecords {
    pub cricbuzz: RawVenueRecord,
    pub espn: RawVenueRecord,
    pub cricket_dot_com: RawVenueRecord,
}

impl SourceRecords {
    pub fn new(cricbuzz: RawVenueRecord, espn: RawVenueRecord, cricket_dot_com: RawVenueRecord) -> Self {
        Self {
            cricbuzz,
            espn,
            cricket_dot_com,
        }
    }

    pub fn get(&self, source: SourceId) -> &RawVenueRecord {
        match source {
            SourceId::Cricbuzz => &self.cricbuzz,
            SourceId::Espn => &self.espn,
            SourceId::CricketDotCom => &self.cricket_dot_com,
        }
    }

    pub fn get_mut(&mut self, source: SourceId) -> &mut RawVenueRecord {
        match source {
            SourceId::Cricbuzz => &mut self.cricbuzz,
            SourceId::Espn => &mut self.espn,
            SourceId::CricketDotCom => &mut self.cricket_dot_com,
        }
    }

    pub fn is_empty(&self) -> bool {
        SourceId::PRIORITY.iter().all(|source| self.get(*source).is_empty())
    }

    fn normalized(&self) -> SourceRecords {
        let mut out = SourceRecords::default();
        for source in SourceId::PRIORITY {
            *out.get_mut(source) = normalize(self.get(source));
        }
        out
    }
}

/// Whitespace runs become a single underscore.
pub fn normalize_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut in_space = false;
    for ch in key.chars() {
        if ch.is_whitespace() {
            if !in_space {
                out.push('_');
            }
            in_space = true;
        } else {
            out.push(ch);
            in_space = false;
        }
    }
    out
}

/// First hit over `(source, key)` candidates, in the order given.
fn first_present<'a, I, T>(candidates: I, read: impl Fn(&JsonValue) -> Option<T>) -> Option<(SourceId, &'a str, T)>
where
    I: IntoIterator<Item = (SourceId, &'a RawVenueRecord, &'a str)>,
{
    candidates
        .into_iter()
        .find_map(|(source, record, key)| record.get(key).and_then(&read).map(|v| (source, key, v)))
}

fn resolve_scalar(records: &SourceRecords, field: CanonicalField) -> Option<String> {
    let direct = SourceId::PRIORITY
        .into_iter()
        .map(|source| (source, records.get(source), field.key()));
    let aliased = SourceId::PRIORITY.into_iter().flat_map(|source| {
        field
            .aliases()
            .iter()
            .map(move |alias| (source, records.get(source), *alias))
    });

    let (source, key, value) = first_present(direct.chain(aliased), scalar_text)?;
    trace!(field = field.key(), %source, key, "resolved scalar");
    Some(value)
}

fn resolve_area(records: &SourceRecords) -> Option<String> {
    let candidates = AREA_PRIORITY.into_iter().flat_map(|source| {
        AREA_KEYS
            .iter()
            .map(move |key| (source, records.get(source), *key))
    });
    let (source, key, value) = first_present(candidates, scalar_text)?;
    trace!(field = CanonicalField::Area.key(), %source, key, "resolved area");
    Some(value)
}

fn union_list(records: &SourceRecords, field: CanonicalField) -> Vec<String> {
    let items = SourceId::PRIORITY.into_iter().flat_map(|source| {
        let record = records.get(source);
        field
            .candidate_keys()
            .filter_map(move |key| record.get(key))
            .flat_map(list_items)
    });
    dedupe_trimmed(items)
}

fn passthrough(records: &SourceRecords) -> BTreeMap<String, JsonValue> {
    let mut extra = BTreeMap::new();
    for source in SourceId::PRIORITY {
        for (key, value) in records.get(source).iter() {
            if is_reserved_key(key) {
                continue;
            }
            let normalized = normalize_key(key);
            if is_reserved_key(&normalized) || extra.contains_key(&normalized) {
                continue;
            }
            if matches!(value, JsonValue::String(_)) && scalar_text(value).is_none() {
                continue;
            }
            if let Some(value) = cleanup_value(value) {
                extra.insert(normalized, value);
            }
        }
    }
    extra
}

fn set_scalar(record: &mut CanonicalVenueRecord, field: CanonicalField, value: Option<String>) {
    let slot = match field {
        CanonicalField::VenueName => &mut record.venue_name,
        CanonicalField::Opened => &mut record.opened,
        CanonicalField::Capacity => &mut record.capacity,
        CanonicalField::Area => &mut record.area,
        CanonicalField::TimeZone => &mut record.time_zone,
        CanonicalField::Floodlights => &mut record.floodlights,
        CanonicalField::Curator => &mut record.curator,
        CanonicalField::Pitch => &mut record.pitch,
        _ => return,
    };
    *slot = value;
}

fn set_list(record: &mut CanonicalVenueRecord, field: CanonicalField, value: Vec<String>) {
    let slot = match field {
        CanonicalField::OtherSports => &mut record.other_sports,
        CanonicalField::HomeTeams => &mut record.home_teams,
        CanonicalField::Ends => &mut record.ends,
        CanonicalField::AlsoKnownAs => &mut record.also_known_as,
        _ => return,
    };
    *slot = value;
}

/// Merge records that have already been through [`normalize`].
pub fn merge_normalized(records: &SourceRecords) -> CanonicalVenueRecord {
    let mut record = CanonicalVenueRecord::default();

    for field in CanonicalField::ALL {
        match (field, field.kind()) {
            (CanonicalField::Area, _) => set_scalar(&mut record, field, resolve_area(records)),
            (_, FieldKind::Scalar) => set_scalar(&mut record, field, resolve_scalar(records, field)),
            (_, FieldKind::List) => set_list(&mut record, field, union_list(records, field)),
        }
    }

    let per_source = SourceId::PRIORITY
        .into_iter()
        .map(|source| {
            records
                .get(source)
                .get("stats")
                .map(parse_stats)
                .unwrap_or_default()
        })
        .collect::<Vec<_>>();
    record.stats = merge_stats(&per_source);
    record.extra = passthrough(records);

    cleanup_record(record)
}

/// Normalize each source, merge under source priority, and clean the result.
///
/// Scalars: first source with the canonical key, else first source with an
/// alias. Area uses its own chain. Lists are unioned and deduplicated in
/// first-seen order. Unmapped keys pass through with whitespace as `_`.
pub fn merge(records: &SourceRecords) -> CanonicalVenueRecord {
    merge_normalized(&records.normalized())
}
