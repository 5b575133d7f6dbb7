//! JSON encoding of the saved-calculation blob.
//!
//! Decoding is lenient per entry: the blob must be a JSON array, but an entry
//! that does not decode is dropped and counted instead of failing the whole
//! load.

use serde_json::Value;

use crate::model::SavedCalculation;

/// Entries recovered from a blob.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Decoded {
    pub entries: Vec<SavedCalculation>,
    pub discarded: usize,
}

/// Decode a stored blob.
///
/// # Errors
///
/// Returns the parse error if `raw` is not a JSON array at all.
pub fn decode(raw: &str) -> Result<Decoded, serde_json::Error> {
    let values: Vec<Value> = serde_json::from_str(raw)?;
    let mut decoded = Decoded::default();
    for (index, value) in values.into_iter().enumerate() {
        match serde_json::from_value::<SavedCalculation>(value) {
            Ok(entry) => decoded.entries.push(entry),
            Err(err) => {
                tracing::debug!(index, error = %err, "dropping undecodable saved calculation");
                decoded.discarded += 1;
            }
        }
    }
    Ok(decoded)
}

/// Encode entries in their stored order.
///
/// # Errors
///
/// Propagates serializer failures.
pub fn encode(entries: &[SavedCalculation]) -> Result<String, serde_json::Error> {
    serde_json::to_string(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CalculationId, Level, LevelId, NewLevel, Span};
    use chrono::{TimeZone, Utc};

    fn sample() -> SavedCalculation {
        let created = Utc
            .with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
            .single()
            .expect("valid timestamp");
        SavedCalculation::with_id(
            CalculationId::from("c1"),
            "Plan A",
            vec![Level::with_id(
                LevelId::from("l1"),
                NewLevel::new("KOC", 2, Span::new(800, 1500), Span::new(1600, 3000)),
            )],
            created,
        )
    }

    #[test]
    fn encoded_blob_decodes_to_same_entries() {
        let blob = encode(&[sample()]).expect("encode");
        let decoded = decode(&blob).expect("decode");
        assert_eq!(decoded.entries, vec![sample()]);
        assert_eq!(decoded.discarded, 0);
    }

    #[test]
    fn encoded_layout_matches_wire_format() {
        let blob = encode(&[sample()]).expect("encode");
        assert!(blob.starts_with(r#"[{"id":"c1","name":"Plan A","levels":[{"id":"l1""#));
        assert!(blob.contains(r#""costMin":800"#));
        assert!(blob.ends_with(r#""createdAt":"2026-03-01T12:00:00.000Z"}]"#));
    }

    #[test]
    fn bad_entries_are_dropped_and_counted() {
        let blob = r#"[
            {"id":"c1","name":"ok","levels":[],"createdAt":"2026-03-01T12:00:00.000Z"},
            {"id":"c2","name":"no timestamp","levels":[]},
            42,
            {"id":"c3","name":"also ok","levels":[{"id":"l1","count":"x"}],"createdAt":"2026-03-02T12:00:00.000Z"}
        ]"#;
        let decoded = decode(blob).expect("array parses");
        assert_eq!(decoded.discarded, 2);
        let ids: Vec<_> = decoded.entries.iter().map(|e| e.id().as_str()).collect();
        assert_eq!(ids, vec!["c1", "c3"]);
        assert_eq!(decoded.entries[1].levels()[0].count, 0);
    }

    #[test]
    fn non_array_blob_is_an_error() {
        assert!(decode("{not json").is_err());
        assert!(decode(r#"{"id":"c1"}"#).is_err());
        assert!(decode("null").is_err());
    }
}
