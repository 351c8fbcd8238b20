//! Reconciliation core: per-source normalization, priority merge, and cleanup.
//!
//! Everything here is a pure function of its inputs. Adapters hand over
//! loosely-typed [`RawVenueRecord`]s; [`merge`] returns one
//! [`CanonicalVenueRecord`] with no empty placeholders.

mod cleanup;
mod fields;
mod merge;
mod normalize;
mod stats;
mod values;

pub use cleanup::{cleanup_map, cleanup_record, cleanup_value};
pub use fields::{CanonicalField, FieldKind, AREA_KEYS, AREA_PRIORITY};
pub use merge::{merge, merge_normalized, normalize_key, SourceRecords};
pub use normalize::{normalize, normalize_capacity};
pub use stats::parse_stats;

pub use pitchside_core::{CanonicalVenueRecord, RawVenueRecord, SourceId};

pub const CRATE_NAME: &str = "pitchside-reconcile";
