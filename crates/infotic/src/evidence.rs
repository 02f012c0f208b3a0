//! Core evidence types for infotic.
//!
//! This module defines the record an inspector submits for a network node:
//! what was photographed, where, and when.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{Error, Result};

/// The kinds of evidence offered by the capture form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceKind {
    /// A new installation at the node.
    Installation,
    /// Routine maintenance work.
    Maintenance,
    /// A fault or damage found on site.
    Fault,
    /// A general inspection visit.
    Inspection,
}

impl EvidenceKind {
    /// All kinds, in the order the form lists them.
    pub const ALL: [Self; 4] = [
        Self::Installation,
        Self::Maintenance,
        Self::Fault,
        Self::Inspection,
    ];

    /// The value stored in the record's `type` field.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Installation => "installation",
            Self::Maintenance => "maintenance",
            Self::Fault => "fault",
            Self::Inspection => "inspection",
        }
    }
}

impl fmt::Display for EvidenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EvidenceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| Error::UnknownEvidenceKind(s.to_string()))
    }
}

/// Best-effort position attached to a record.
///
/// Both coordinates are `None` when no position provider was available. A
/// provider that fails or times out yields `0, 0` instead.
///
/// Whole-degree coordinates serialize as JSON integers (`0`, not `0.0`), the
/// same text a browser's `JSON.stringify` produces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Latitude in decimal degrees.
    #[serde(serialize_with = "serialize_coordinate")]
    pub lat: Option<f64>,
    /// Longitude in decimal degrees.
    #[serde(serialize_with = "serialize_coordinate")]
    pub lon: Option<f64>,
}

/// Largest integer an `f64` holds exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

#[allow(clippy::cast_possible_truncation)]
fn serialize_coordinate<S: Serializer>(
    value: &Option<f64>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match *value {
        Some(v) if v.fract() == 0.0 && v.abs() <= MAX_SAFE_INTEGER => {
            serializer.serialize_i64(v as i64)
        }
        Some(v) => serializer.serialize_f64(v),
        None => serializer.serialize_none(),
    }
}

/// ISO-8601 timestamps with exactly three fractional digits, as written by
/// `Date.prototype.toISOString`.
mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        timestamp: &DateTime<Utc>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&timestamp.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let text = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&text)
            .map(|t| t.with_timezone(&Utc))
            .map_err(de::Error::custom)
    }
}

impl Location {
    /// A known position.
    #[must_use]
    pub fn at(lat: f64, lon: f64) -> Self {
        Self {
            lat: Some(lat),
            lon: Some(lon),
        }
    }

    /// No position provider was available.
    #[must_use]
    pub fn unsupported() -> Self {
        Self::default()
    }

    /// The position provider failed; recorded as `0, 0`.
    #[must_use]
    pub fn fallback() -> Self {
        Self::at(0.0, 0.0)
    }

    /// Check whether both coordinates are present.
    #[must_use]
    pub fn is_known(&self) -> bool {
        self.lat.is_some() && self.lon.is_some()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => write!(f, "Lat {lat:.4}, Lon {lon:.4}"),
            _ => f.write_str("location unavailable"),
        }
    }
}

/// One evidence submission.
///
/// Serialized with the field names `id`, `nodeId`, `type`, `photo`,
/// `location` and `timestamp`. Records are never mutated once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceRecord {
    /// Creation time in epoch milliseconds. Not guaranteed unique.
    pub id: i64,

    /// Identifier of the inspected network node.
    pub node_id: String,

    /// Kind of evidence, normally one of [`EvidenceKind`].
    #[serde(rename = "type")]
    pub kind: String,

    /// Photo as a base64 image data URI.
    pub photo: String,

    /// Where the evidence was captured.
    pub location: Location,

    /// When the evidence was captured, to the millisecond.
    #[serde(with = "iso_millis")]
    pub timestamp: DateTime<Utc>,
}

impl EvidenceRecord {
    /// Create a record stamped with the current time.
    ///
    /// The id is derived from the wall clock, so two records created in the
    /// same millisecond share an id.
    #[must_use]
    pub fn new(
        node_id: impl Into<String>,
        kind: EvidenceKind,
        photo: String,
        location: Location,
    ) -> Self {
        Self::created_at(Utc::now(), node_id, kind, photo, location)
    }

    /// Create a record stamped with the given time.
    ///
    /// The time is truncated to milliseconds so it agrees with the id.
    #[must_use]
    pub fn created_at(
        timestamp: DateTime<Utc>,
        node_id: impl Into<String>,
        kind: EvidenceKind,
        photo: String,
        location: Location,
    ) -> Self {
        let timestamp = timestamp.trunc_subsecs(3);
        Self {
            id: timestamp.timestamp_millis(),
            node_id: node_id.into(),
            kind: kind.as_str().to_string(),
            photo,
            location,
            timestamp,
        }
    }

    /// The parsed kind, if the stored `type` is one the form offers.
    #[must_use]
    pub fn evidence_kind(&self) -> Option<EvidenceKind> {
        self.kind.parse().ok()
    }
}
