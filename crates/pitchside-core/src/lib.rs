//! Core domain model shared by the adapters, the reconciler, and the batch driver.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

pub const CRATE_NAME: &str = "pitchside-core";

/// The three venue sites, in merge priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceId {
    Cricbuzz,
    Espn,
    CricketDotCom,
}

impl SourceId {
    pub const PRIORITY: [SourceId; 3] = [SourceId::Cricbuzz, SourceId::Espn, SourceId::CricketDotCom];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceId::Cricbuzz => "cricbuzz",
            SourceId::Espn => "espn",
            SourceId::CricketDotCom => "cricket-dot-com",
        }
    }

    /// Key naming this source's page inside a catalog entry's `oThirdparty` object.
    pub fn url_key(&self) -> &'static str {
        match self {
            SourceId::Cricbuzz => "cricbuzzUrl",
            SourceId::Espn => "espnUrl",
            SourceId::CricketDotCom => "cricketDotComUrl",
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Loosely-typed venue record produced by one adapter.
///
/// Keys follow whatever convention the source site uses. An empty record
/// means the adapter found nothing (or failed).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawVenueRecord(Map<String, JsonValue>);

impl RawVenueRecord {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Option<JsonValue> {
        self.0.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<JsonValue> {
        self.0.remove(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &JsonValue)> {
        self.0.iter()
    }
}

impl From<Map<String, JsonValue>> for RawVenueRecord {
    fn from(map: Map<String, JsonValue>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>> FromIterator<(K, JsonValue)> for RawVenueRecord {
    fn from_iter<I: IntoIterator<Item = (K, JsonValue)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Cricket match format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Test,
    Odi,
    T20,
}

impl Format {
    pub const ALL: [Format; 3] = [Format::Test, Format::Odi, Format::T20];

    pub fn key(&self) -> &'static str {
        match self {
            Format::Test => "test",
            Format::Odi => "odi",
            Format::T20 => "t20",
        }
    }

    /// Capitalized form used inside flattened stat keys (`firstOdiDate`).
    pub fn title(&self) -> &'static str {
        match self {
            Format::Test => "Test",
            Format::Odi => "Odi",
            Format::T20 => "T20",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "test" | "tests" => Some(Format::Test),
            "odi" | "odis" => Some(Format::Odi),
            "t20" | "t20i" | "t20is" | "twenty20" => Some(Format::T20),
            _ => None,
        }
    }
}

/// One of the four per-format match records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatSlot {
    FirstMatch,
    RecentMatch,
    HighestTeamScore,
    LowestTeamScore,
}

impl StatSlot {
    pub const ALL: [StatSlot; 4] = [
        StatSlot::FirstMatch,
        StatSlot::RecentMatch,
        StatSlot::HighestTeamScore,
        StatSlot::LowestTeamScore,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            StatSlot::FirstMatch => "firstMatch",
            StatSlot::RecentMatch => "recentMatch",
            StatSlot::HighestTeamScore => "highestTeamScore",
            StatSlot::LowestTeamScore => "lowestTeamScore",
        }
    }

    pub fn carries_score(&self) -> bool {
        matches!(self, StatSlot::HighestTeamScore | StatSlot::LowestTeamScore)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teams: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<String>,
}

impl MatchSummary {
    pub fn is_empty(&self) -> bool {
        self.date.is_none()
            && self.year.is_none()
            && self.teams.is_none()
            && self.match_result.is_none()
            && self.score.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatStats {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_match: Option<MatchSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recent_match: Option<MatchSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highest_team_score: Option<MatchSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lowest_team_score: Option<MatchSummary>,
}

impl FormatStats {
    pub fn slot(&self, slot: StatSlot) -> Option<&MatchSummary> {
        match slot {
            StatSlot::FirstMatch => self.first_match.as_ref(),
            StatSlot::RecentMatch => self.recent_match.as_ref(),
            StatSlot::HighestTeamScore => self.highest_team_score.as_ref(),
            StatSlot::LowestTeamScore => self.lowest_team_score.as_ref(),
        }
    }

    pub fn set_slot(&mut self, slot: StatSlot, summary: Option<MatchSummary>) {
        let target = match slot {
            StatSlot::FirstMatch => &mut self.first_match,
            StatSlot::RecentMatch => &mut self.recent_match,
            StatSlot::HighestTeamScore => &mut self.highest_team_score,
            StatSlot::LowestTeamScore => &mut self.lowest_team_score,
        };
        *target = summary;
    }

    pub fn is_empty(&self) -> bool {
        StatSlot::ALL
            .iter()
            .all(|slot| self.slot(*slot).map_or(true, MatchSummary::is_empty))
    }
}

/// Reconciled venue record. Absent fields mean "unknown".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalVenueRecord {
    #[serde(rename = "sVenueName", default, skip_serializing_if = "Option::is_none")]
    pub venue_name: Option<String>,
    #[serde(rename = "aAlsoKnownAs", default, skip_serializing_if = "Vec::is_empty")]
    pub also_known_as: Vec<String>,
    #[serde(rename = "sArea", default, skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
    #[serde(rename = "sTimeZone", default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
    #[serde(rename = "sOpened", default, skip_serializing_if = "Option::is_none")]
    pub opened: Option<String>,
    #[serde(rename = "sCapacity", default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<String>,
    #[serde(rename = "aEnds", default, skip_serializing_if = "Vec::is_empty")]
    pub ends: Vec<String>,
    #[serde(rename = "sFloodlights", default, skip_serializing_if = "Option::is_none")]
    pub floodlights: Option<String>,
    #[serde(rename = "sCurator", default, skip_serializing_if = "Option::is_none")]
    pub curator: Option<String>,
    #[serde(rename = "sPitch", default, skip_serializing_if = "Option::is_none")]
    pub pitch: Option<String>,
    #[serde(rename = "aHomeTeams", default, skip_serializing_if = "Vec::is_empty")]
    pub home_teams: Vec<String>,
    #[serde(rename = "aOtherSports", default, skip_serializing_if = "Vec::is_empty")]
    pub other_sports: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub stats: BTreeMap<Format, FormatStats>,
    /// Source fields with no canonical mapping, keyed by their normalized name.
    #[serde(flatten)]
    pub extra: BTreeMap<String, JsonValue>,
}

impl CanonicalVenueRecord {
    pub fn is_empty(&self) -> bool {
        self.venue_name.is_none()
            && self.also_known_as.is_empty()
            && self.area.is_none()
            && self.time_zone.is_none()
            && self.opened.is_none()
            && self.capacity.is_none()
            && self.ends.is_empty()
            && self.floodlights.is_none()
            && self.curator.is_none()
            && self.pitch.is_none()
            && self.home_teams.is_empty()
            && self.other_sports.is_empty()
            && self.stats.is_empty()
            && self.extra.is_empty()
    }
}
