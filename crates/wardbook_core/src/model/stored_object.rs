//! Stored record shape and payload merge rules.
//!
//! # Responsibility
//! - Define the record returned by every store operation.
//! - Own the shallow-merge rule applied by `update`.
//!
//! # Invariants
//! - `object_id` and `created_at` never change after creation.
//! - `updated_at` never moves backwards for one record.
//! - Merge touches top-level payload keys only; nested values are replaced
//!   wholesale.

use crate::model::collection::CollectionName;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Caller-supplied record payload. The store never validates its shape.
pub type Payload = Map<String, Value>;

/// Generated record identifier, unique within its collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(Uuid);

impl ObjectId {
    /// Generates a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for ObjectId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl Display for ObjectId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ObjectId {
    type Err = uuid::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value.trim()).map(Self)
    }
}

/// A persisted record: identifier, collection tag, payload and audit times.
///
/// Serialized with camelCase names to match the shape dashboard code reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredObject {
    pub object_id: ObjectId,
    pub object_type: CollectionName,
    pub object_data: Payload,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds, `>= created_at`.
    pub updated_at: i64,
}

impl StoredObject {
    /// Builds a fresh record with a generated id and both timestamps at `now_ms`.
    pub(crate) fn new(collection: CollectionName, payload: Payload, now_ms: i64) -> Self {
        Self {
            object_id: ObjectId::generate(),
            object_type: collection,
            object_data: payload,
            created_at: now_ms,
            updated_at: now_ms,
        }
    }

    /// Shallow-merges `partial` into the payload and refreshes `updated_at`.
    pub(crate) fn apply_update(&mut self, partial: Payload, now_ms: i64) {
        shallow_merge(&mut self.object_data, partial);
        self.updated_at = self.updated_at.max(now_ms);
    }

    /// Returns a top-level payload field as a string, if it is one.
    pub fn field_str(&self, key: &str) -> Option<&str> {
        self.object_data.get(key).and_then(Value::as_str)
    }
}

/// Overwrites same-named top-level keys of `target` with those of `partial`.
///
/// Keys absent from `partial` are kept. Nested objects are not merged
/// recursively.
pub fn shallow_merge(target: &mut Payload, partial: Payload) {
    for (key, value) in partial {
        target.insert(key, value);
    }
}

/// Current wall-clock time in Unix epoch milliseconds.
pub(crate) fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
        })
}

#[cfg(test)]
mod tests {
    use super::{shallow_merge, ObjectId, Payload, StoredObject};
    use crate::model::collection::CollectionName;
    use serde_json::json;

    fn payload(value: serde_json::Value) -> Payload {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn shallow_merge_keeps_unmentioned_keys() {
        let mut target = payload(json!({"name": "Ana", "status": "Ingresado"}));
        shallow_merge(&mut target, payload(json!({"status": "Dado de alta"})));
        assert_eq!(
            serde_json::Value::Object(target),
            json!({"name": "Ana", "status": "Dado de alta"})
        );
    }

    #[test]
    fn shallow_merge_replaces_nested_values_wholesale() {
        let mut target = payload(json!({"contact": {"phone": "1", "email": "a@b"}}));
        shallow_merge(&mut target, payload(json!({"contact": {"phone": "2"}})));
        assert_eq!(target["contact"], json!({"phone": "2"}));
    }

    #[test]
    fn apply_update_never_moves_updated_at_backwards() {
        let mut object = StoredObject::new(CollectionName::patient(), Payload::new(), 2_000);
        object.apply_update(Payload::new(), 1_000);
        assert_eq!(object.updated_at, 2_000);
        assert_eq!(object.created_at, 2_000);

        object.apply_update(Payload::new(), 3_000);
        assert_eq!(object.updated_at, 3_000);
        assert_eq!(object.created_at, 2_000);
    }

    #[test]
    fn serializes_with_camel_case_field_names() {
        let object = StoredObject::new(
            CollectionName::doctor(),
            payload(json!({"name": "Luis"})),
            10,
        );
        let value = serde_json::to_value(&object).unwrap();
        assert_eq!(value["objectType"], json!("doctor"));
        assert_eq!(value["objectData"]["name"], json!("Luis"));
        assert_eq!(value["createdAt"], json!(10));
        assert_eq!(value["objectId"], json!(object.object_id.to_string()));
    }

    #[test]
    fn object_id_parses_its_display_form() {
        let id = ObjectId::generate();
        let parsed: ObjectId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!("not-a-uuid".parse::<ObjectId>().is_err());
    }
}
