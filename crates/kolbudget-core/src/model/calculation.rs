use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use uuid::Uuid;

use super::level::Level;

/// Opaque identifier of a saved calculation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CalculationId(String);

impl CalculationId {
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CalculationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for CalculationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A named, immutable point-in-time copy of the working set.
///
/// Fields are private so that a snapshot cannot be edited once constructed;
/// the `levels` vector is an owned clone of whatever was passed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedCalculation {
    id: CalculationId,
    name: String,
    #[serde(default)]
    levels: Vec<Level>,
    #[serde(with = "iso_millis")]
    created_at: DateTime<Utc>,
}

impl SavedCalculation {
    /// Snapshot `levels` by value under a fresh id.
    #[must_use]
    pub fn new(name: impl Into<String>, levels: &[Level], created_at: DateTime<Utc>) -> Self {
        Self::with_id(CalculationId::generate(), name, levels.to_vec(), created_at)
    }

    #[must_use]
    pub fn with_id(
        id: CalculationId,
        name: impl Into<String>,
        levels: Vec<Level>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            levels,
            created_at,
        }
    }

    #[must_use]
    pub const fn id(&self) -> &CalculationId {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// ISO-8601 timestamps with millisecond precision and a `Z` suffix, e.g.
/// `2026-10-14T09:30:00.000Z`. Parsing accepts any RFC 3339 offset.
mod iso_millis {
    use super::{DateTime, Deserialize, Deserializer, SecondsFormat, Serializer, Utc};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|parsed| parsed.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::level::{LevelId, NewLevel, Span};
    use chrono::TimeZone;
    use serde_json::json;

    fn created() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 14, 9, 30, 0)
            .single()
            .expect("valid timestamp")
    }

    #[test]
    fn snapshot_owns_a_copy_of_levels() {
        let mut levels = vec![Level::with_id(
            LevelId::from("l1"),
            NewLevel::new("KOC", 1, Span::new(800, 1500), Span::new(1600, 3000)),
        )];
        let saved = SavedCalculation::new("Plan A", &levels, created());
        levels[0].count = 99;
        levels.clear();
        assert_eq!(saved.levels().len(), 1);
        assert_eq!(saved.levels()[0].count, 1);
    }

    #[test]
    fn serializes_created_at_with_millis() {
        let saved = SavedCalculation::with_id(CalculationId::from("c1"), "Plan A", vec![], created());
        let value = serde_json::to_value(&saved).expect("serialize");
        assert_eq!(
            value,
            json!({
                "id": "c1",
                "name": "Plan A",
                "levels": [],
                "createdAt": "2026-10-14T09:30:00.000Z",
            })
        );
    }

    #[test]
    fn parses_offset_timestamps_into_utc() {
        let saved: SavedCalculation = serde_json::from_value(json!({
            "id": "c1",
            "name": "Plan A",
            "levels": [],
            "createdAt": "2026-10-14T11:30:00+02:00",
        }))
        .expect("decode");
        assert_eq!(saved.created_at(), created());
    }

    #[test]
    fn rejects_unparseable_timestamp() {
        let result = serde_json::from_value::<SavedCalculation>(json!({
            "id": "c1",
            "name": "Plan A",
            "levels": [],
            "createdAt": "yesterday",
        }));
        assert!(result.is_err());
    }
}
