// src/survey/models.rs
use crate::extractors::TableKind;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

pub const RESPONSE_ID: &str = "response_id";

/// One respondent's answers across every table, flattened.
///
/// Keys follow `{table_tag}_{field}`. Serializes as a flat JSON object with
/// `response_id` first and the remaining keys in sorted order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "BTreeMap<String, String>")]
pub struct CompositeResponse {
    response_id: String,
    fields: BTreeMap<String, String>,
}

impl CompositeResponse {
    pub fn new(response_id: impl Into<String>, fields: BTreeMap<String, String>) -> Self {
        Self {
            response_id: response_id.into(),
            fields,
        }
    }

    pub fn response_id(&self) -> &str {
        &self.response_id
    }

    /// Looks up a prefixed key, e.g. `summary_address`.
    pub fn get(&self, key: &str) -> Option<&str> {
        if key == RESPONSE_ID {
            return Some(&self.response_id);
        }
        self.fields.get(key).map(String::as_str)
    }

    pub fn field(&self, kind: TableKind, field: &str) -> Option<&str> {
        self.get(&kind.prefixed(field))
    }

    /// Prefixed keys other than `response_id`, sorted.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Total key count, `response_id` included.
    pub fn key_count(&self) -> usize {
        self.fields.len() + 1
    }
}

impl TryFrom<BTreeMap<String, String>> for CompositeResponse {
    type Error = String;

    fn try_from(mut map: BTreeMap<String, String>) -> Result<Self, Self::Error> {
        let response_id = map
            .remove(RESPONSE_ID)
            .ok_or_else(|| format!("record without '{}'", RESPONSE_ID))?;
        Ok(Self::new(response_id, map))
    }
}

impl Serialize for CompositeResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.key_count()))?;
        map.serialize_entry(RESPONSE_ID, &self.response_id)?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CompositeResponse {
        let fields = BTreeMap::from([
            ("q9_notes".to_string(), "maybe".to_string()),
            ("summary_address".to_string(), "12 Oak Ln".to_string()),
        ]);
        CompositeResponse::new("4", fields)
    }

    #[test]
    fn serializes_response_id_first() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert_eq!(
            json,
            r#"{"response_id":"4","q9_notes":"maybe","summary_address":"12 Oak Ln"}"#
        );
    }

    #[test]
    fn loads_back_from_json() {
        let json = serde_json::to_string(&sample()).unwrap();
        let loaded: CompositeResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded, sample());
        assert_eq!(loaded.field(TableKind::Summary, "address"), Some("12 Oak Ln"));
        assert_eq!(loaded.get("response_id"), Some("4"));
        assert_eq!(loaded.key_count(), 3);
    }

    #[test]
    fn rejects_record_without_id() {
        let err = serde_json::from_str::<CompositeResponse>(r#"{"q10_q10_text":"x"}"#);
        assert!(err.is_err());
    }
}
