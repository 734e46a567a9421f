//! Per-entity watermarks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::entity::EntityType;

/// Mapping from entity type key to the latest timestamp already processed.
///
/// Serialized as a flat JSON object of ISO-8601 strings, e.g.
/// `{"film": "2024-01-01T00:00:00Z"}`. Keys are kept as strings so that a
/// file written with unknown keys still loads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Watermarks(BTreeMap<String, DateTime<Utc>>);

impl Watermarks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, entity: EntityType) -> Option<DateTime<Utc>> {
        self.0.get(entity.as_str()).copied()
    }

    /// The watermark for `entity`, or the Unix epoch if none was stored.
    pub fn get_or_epoch(&self, entity: EntityType) -> DateTime<Utc> {
        self.get(entity).unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }

    /// Set the watermark, returning the previous value.
    pub fn set(&mut self, entity: EntityType, timestamp: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.0.insert(entity.as_str().to_string(), timestamp)
    }

    /// Restore the watermark to a previous value (`None` removes it).
    pub fn restore(&mut self, entity: EntityType, previous: Option<DateTime<Utc>>) {
        match previous {
            Some(timestamp) => {
                self.0.insert(entity.as_str().to_string(), timestamp);
            }
            None => {
                self.0.remove(entity.as_str());
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_absent_key_defaults_to_epoch() {
        let marks = Watermarks::new();
        assert_eq!(marks.get(EntityType::Film), None);
        assert_eq!(marks.get_or_epoch(EntityType::Film).timestamp(), 0);
    }

    #[test]
    fn test_json_shape() {
        let mut marks = Watermarks::new();
        let t = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        marks.set(EntityType::Film, t);

        let json = serde_json::to_string(&marks).unwrap();
        assert_eq!(json, r#"{"film":"2024-05-01T12:30:00Z"}"#);

        let parsed: Watermarks = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.get(EntityType::Film), Some(t));
    }

    #[test]
    fn test_unknown_keys_are_tolerated() {
        let parsed: Watermarks =
            serde_json::from_str(r#"{"film_work":"2024-05-01T12:30:00+03:00"}"#).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed.get(EntityType::Film), None);
    }

    #[test]
    fn test_restore_previous_value() {
        let mut marks = Watermarks::new();
        let t = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let previous = marks.set(EntityType::Genre, t);
        marks.restore(EntityType::Genre, previous);
        assert!(marks.is_empty());
    }
}
