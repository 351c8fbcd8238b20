use pitchside_core::SourceId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Scalar,
    List,
}

/// Output fields with a fixed name in the canonical schema.
///
/// Area is listed here for key bookkeeping but is resolved through its own
/// chain ([`AREA_PRIORITY`] x [`AREA_KEYS`]), never through [`CanonicalField::aliases`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalField {
    VenueName,
    Opened,
    Capacity,
    Area,
    TimeZone,
    Floodlights,
    Curator,
    Pitch,
    OtherSports,
    HomeTeams,
    Ends,
    AlsoKnownAs,
}

/// Source order for the area field. Deliberately differs from [`SourceId::PRIORITY`].
pub const AREA_PRIORITY: [SourceId; 3] = [SourceId::Cricbuzz, SourceId::CricketDotCom, SourceId::Espn];

/// Keys checked, in order, inside each source when resolving the area field.
pub const AREA_KEYS: [&str; 6] = ["sArea", "sLocation", "location", "Location", "Country", "country"];

impl CanonicalField {
    pub const ALL: [CanonicalField; 12] = [
        CanonicalField::VenueName,
        CanonicalField::Opened,
        CanonicalField::Capacity,
        CanonicalField::Area,
        CanonicalField::TimeZone,
        CanonicalField::Floodlights,
        CanonicalField::Curator,
        CanonicalField::Pitch,
        CanonicalField::OtherSports,
        CanonicalField::HomeTeams,
        CanonicalField::Ends,
        CanonicalField::AlsoKnownAs,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            CanonicalField::VenueName => "sVenueName",
            CanonicalField::Opened => "sOpened",
            CanonicalField::Capacity => "sCapacity",
            CanonicalField::Area => "sArea",
            CanonicalField::TimeZone => "sTimeZone",
            CanonicalField::Floodlights => "sFloodlights",
            CanonicalField::Curator => "sCurator",
            CanonicalField::Pitch => "sPitch",
            CanonicalField::OtherSports => "aOtherSports",
            CanonicalField::HomeTeams => "aHomeTeams",
            CanonicalField::Ends => "aEnds",
            CanonicalField::AlsoKnownAs => "aAlsoKnownAs",
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            CanonicalField::OtherSports
            | CanonicalField::HomeTeams
            | CanonicalField::Ends
            | CanonicalField::AlsoKnownAs => FieldKind::List,
            _ => FieldKind::Scalar,
        }
    }

    /// Source-specific spellings, searched in order after the canonical key.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            CanonicalField::VenueName => &["venueName", "Name", "sName"],
            CanonicalField::Opened => &["opened", "Opened", "Established", "sEstablishment", "Establishment"],
            CanonicalField::Capacity => &["Capacity", "capacity"],
            CanonicalField::Area => &AREA_KEYS,
            CanonicalField::TimeZone => &["Time Zone", "timeZone", "sTimezone", "time_zone", "Time_Zone"],
            CanonicalField::Floodlights => {
                &["Flood Lights", "Floodlights", "Flood lights", "floodLights", "flood lights"]
            }
            CanonicalField::Curator => &["Curator", "curator", "groundsman", "pitchCurator"],
            CanonicalField::Pitch => &["pitchType", "pitchCondition", "surface", "pitch", "Pitch"],
            CanonicalField::OtherSports => &[
                "Other Sports",
                "Other sports",
                "Other_Sports_it_is_home_to",
                "other_sports",
                "sports",
                "sOtherSports",
                "otherSports",
            ],
            CanonicalField::HomeTeams => {
                &["homeTeams", "home_to", "homeTo", "Home Teams", "Home to", "home to", "Home Team"]
            }
            CanonicalField::Ends => &["ends", "Ends", "Bowling Ends", "End Names"],
            CanonicalField::AlsoKnownAs => {
                &["Also known as", "Known as", "alsoKnownAs", "Also knows as", "sKnownAs"]
            }
        }
    }

    /// Canonical key followed by every alias.
    pub fn candidate_keys(&self) -> impl Iterator<Item = &'static str> {
        std::iter::once(self.key()).chain(self.aliases().iter().copied())
    }

    /// True when `key` names this field in any spelling.
    pub fn matches_key(&self, key: &str) -> bool {
        self.candidate_keys().any(|k| k == key)
    }

    pub fn for_key(key: &str) -> Option<CanonicalField> {
        Self::ALL.into_iter().find(|field| field.matches_key(key))
    }
}

/// Keys consumed by the reconciler itself rather than passed through.
pub(crate) const RESERVED_KEYS: [&str; 3] = ["stats", "oStats", "scraped"];

pub(crate) fn is_reserved_key(key: &str) -> bool {
    RESERVED_KEYS.contains(&key) || CanonicalField::for_key(key).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_alias_is_claimed_by_two_fields() {
        for field in CanonicalField::ALL {
            for key in field.candidate_keys() {
                assert_eq!(
                    CanonicalField::for_key(key),
                    Some(field),
                    "{key} resolves to a different field"
                );
            }
        }
    }

    #[test]
    fn list_fields_use_array_prefix() {
        for field in CanonicalField::ALL {
            let is_list = field.kind() == FieldKind::List;
            assert_eq!(field.key().starts_with('a'), is_list, "{}", field.key());
        }
    }

    #[test]
    fn area_chain_skips_espn_until_last() {
        assert_eq!(AREA_PRIORITY.last(), Some(&SourceId::Espn));
        assert!(is_reserved_key("Country"));
        assert!(is_reserved_key("oStats"));
        assert!(!is_reserved_key("dimensions"));
    }
}
