//! Coercion between native values and BSON.
//!
//! [`to_wire`] and [`from_wire`] are structural and recursive: maps become
//! documents (keys kept in iteration order), sequences become arrays, null
//! stays null, scalars map to their BSON counterparts. Driver-native scalars
//! with no native counterpart (object ids, dates, binary, timestamps, ...)
//! travel through [`Value::Native`] untouched in both directions.
//!
//! ```rust
//! use ferrodoc_core::Value;
//! use ferrodoc_mongodb::document::{from_wire, to_wire};
//! use serde_json::json;
//!
//! let native = Value::from(json!({ "name": "Jane", "tags": ["a", "b"], "boss": null }));
//! assert_eq!(from_wire(to_wire(&native)), native);
//! ```

use bson::{Bson, Document, oid::ObjectId};
use ferrodoc_core::{Map, ValidationError, ValidationResult, Value};

use crate::error::{MongoError, MongoResult};

/// Coerce a native value into BSON.
pub fn to_wire(value: &Value) -> Bson {
    match value {
        Value::Null => Bson::Null,
        Value::Bool(b) => Bson::Boolean(*b),
        Value::Int(i) => Bson::Int64(*i),
        Value::Float(f) => Bson::Double(*f),
        Value::String(s) => Bson::String(s.clone()),
        Value::Array(items) => Bson::Array(items.iter().map(to_wire).collect()),
        Value::Map(map) => Bson::Document(map_to_document(map)),
        Value::Native(native) => native.as_bson().clone(),
    }
}

/// Coerce BSON into a native value.
///
/// Both integer widths decode to [`Value::Int`].
pub fn from_wire(bson: Bson) -> Value {
    Value::from(bson)
}

/// Coerce a native map into a document.
pub fn map_to_document(map: &Map) -> Document {
    map.iter()
        .map(|(key, value)| (key.to_string(), to_wire(value)))
        .collect()
}

/// Coerce a native value that must be a map into a document.
///
/// `context` names the argument in the error (`data`, `where`, ...).
pub fn to_document(value: &Value, context: &'static str) -> ValidationResult<Document> {
    match value {
        Value::Map(map) => Ok(map_to_document(map)),
        other => Err(ValidationError::invalid_document(context, "map", other)),
    }
}

/// Coerce a filter; null matches everything.
pub fn to_filter(value: &Value) -> ValidationResult<Document> {
    match value {
        Value::Null => Ok(Document::new()),
        other => to_document(other, "where"),
    }
}

/// Coerce a document into a native map value.
pub fn from_document(doc: Document) -> Value {
    Value::from(Bson::Document(doc))
}

/// Return `doc` with `_id` set to `id`, placed first.
///
/// An existing `_id` is kept in place.
pub fn with_id(doc: Document, id: Bson) -> Document {
    if doc.contains_key("_id") {
        return doc;
    }
    let mut stored = Document::new();
    stored.insert("_id", id);
    stored.extend(doc);
    stored
}

/// Parse an ObjectId from a string.
pub fn parse_object_id(s: &str) -> MongoResult<Value> {
    Ok(Value::from(ObjectId::parse_str(s)?))
}

/// Driver-native scalar helpers.
///
/// These build and read the [`Value::Native`] pass-through values for types the
/// native model has no variant for.
pub mod scalars {
    use super::*;
    use chrono::{DateTime, Utc};
    use uuid::Uuid;

    /// Create a new ObjectId value.
    pub fn object_id() -> Value {
        Value::from(ObjectId::new())
    }

    /// Read an ObjectId value.
    pub fn as_object_id(value: &Value) -> Option<ObjectId> {
        match value {
            Value::Native(native) => native.as_bson().as_object_id(),
            _ => None,
        }
    }

    /// Wrap a UUID as BSON Binary.
    pub fn uuid(uuid: Uuid) -> Value {
        Value::from(Bson::Binary(bson::Binary {
            subtype: bson::spec::BinarySubtype::Uuid,
            bytes: uuid.as_bytes().to_vec(),
        }))
    }

    /// Read a UUID from BSON Binary or a string.
    pub fn as_uuid(value: &Value) -> MongoResult<Uuid> {
        let binary = match value {
            Value::Native(native) => match native.as_bson() {
                Bson::Binary(binary) => Some(binary),
                _ => None,
            },
            _ => None,
        };
        match (binary, value) {
            (Some(binary), _) => {
                let bytes: [u8; 16] = binary
                    .bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| MongoError::serialization("invalid UUID bytes"))?;
                Ok(Uuid::from_bytes(bytes))
            }
            (None, Value::String(s)) => Uuid::parse_str(s)
                .map_err(|e| MongoError::serialization(format!("invalid UUID string: {}", e))),
            (None, _) => Err(MongoError::serialization(
                "expected Binary or String for UUID",
            )),
        }
    }

    /// Wrap a timestamp as BSON DateTime.
    pub fn datetime(dt: DateTime<Utc>) -> Value {
        Value::from(Bson::DateTime(bson::DateTime::from_chrono(dt)))
    }

    /// Read a BSON DateTime.
    pub fn as_datetime(value: &Value) -> MongoResult<DateTime<Utc>> {
        match value {
            Value::Native(native) => match native.as_bson() {
                Bson::DateTime(dt) => Ok(dt.to_chrono()),
                _ => Err(MongoError::serialization("expected DateTime")),
            },
            _ => Err(MongoError::serialization("expected DateTime")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use uuid::Uuid;

    #[test]
    fn test_to_wire_structure() {
        let native = Value::from(json!({
            "name": "John",
            "age": 40,
            "score": 1.5,
            "active": true,
            "tags": ["x", 2],
            "address": { "city": "Oslo", "zip": null }
        }));

        assert_eq!(
            to_wire(&native),
            Bson::Document(doc! {
                "name": "John",
                "age": 40_i64,
                "score": 1.5,
                "active": true,
                "tags": ["x", 2_i64],
                "address": { "city": "Oslo", "zip": Bson::Null }
            })
        );
    }

    #[test]
    fn test_key_order_follows_map() {
        let native = Value::map().with("z", 1).with("a", 2).with("m", 3);
        let Bson::Document(doc) = to_wire(&native) else {
            panic!("expected a document");
        };
        let keys: Vec<&str> = doc.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_from_wire_structure() {
        let wire = doc! { "n": 1_i32, "big": 5_i64, "list": [doc! { "x": Bson::Null }] };
        assert_eq!(
            from_document(wire),
            Value::from(json!({ "n": 1, "big": 5, "list": [{ "x": null }] }))
        );
    }

    #[test]
    fn test_round_trip() {
        let values = [
            Value::Null,
            Value::from(json!([])),
            Value::from(json!({})),
            Value::from(json!({ "a": [1, [2, [3, { "b": null }]]], "c": "d", "e": -0.25 })),
            Value::from(json!([{ "k": false }, "s", 9])),
        ];
        for value in values {
            assert_eq!(from_wire(to_wire(&value)), value);
        }
    }

    #[test]
    fn test_passthrough_scalars() {
        let oid = ObjectId::new();
        let stamp = Bson::Timestamp(bson::Timestamp {
            time: 10,
            increment: 2,
        });
        let native = Value::map()
            .with("_id", oid)
            .with("at", Value::from(stamp.clone()));

        let wire = to_wire(&native);
        assert_eq!(wire, Bson::Document(doc! { "_id": oid, "at": stamp.clone() }));
        assert_eq!(from_wire(wire), native);
    }

    #[test]
    fn test_round_trip_from_any_bson() {
        let wire = [
            Bson::Int32(5),
            Bson::Null,
            Bson::String("x".into()),
            Bson::Double(2.5),
            Bson::Array(vec![Bson::Int32(1), Bson::Boolean(false)]),
            Bson::Document(doc! { "n": 1_i32 }),
            Bson::Timestamp(bson::Timestamp { time: 1, increment: 1 }),
            Bson::ObjectId(ObjectId::new()),
        ];
        for bson in wire {
            let value = Value::from(bson);
            assert_eq!(from_wire(to_wire(&value)), value);
        }
        assert_eq!(from_wire(Bson::Int32(5)), Value::Int(5));
        let stamp = Bson::Timestamp(bson::Timestamp { time: 1, increment: 1 });
        assert!(matches!(from_wire(stamp), Value::Native(_)));
    }

    #[test]
    fn test_to_document_requires_map() {
        assert!(to_document(&Value::map().with("a", 1), "data").is_ok());
        let err = to_document(&Value::from(json!([1, 2])), "data").unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidDocument {
                context: "data",
                expected: "map",
                actual: "array"
            }
        );
    }

    #[test]
    fn test_null_filter_matches_all() {
        assert_eq!(to_filter(&Value::Null).unwrap(), Document::new());
        assert!(to_filter(&Value::from("name")).is_err());
    }

    #[test]
    fn test_with_id_places_id_first() {
        let oid = ObjectId::new();
        let stored = with_id(doc! { "name": "Jane" }, Bson::ObjectId(oid));
        let keys: Vec<&str> = stored.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["_id", "name"]);

        let existing = with_id(doc! { "name": "Jane", "_id": 7 }, Bson::ObjectId(oid));
        assert_eq!(existing.get_i32("_id").unwrap(), 7);
    }

    #[test]
    fn test_parse_object_id() {
        let oid = ObjectId::new();
        assert_eq!(parse_object_id(&oid.to_hex()).unwrap(), Value::from(oid));
        assert!(parse_object_id("invalid").is_err());
    }

    #[test]
    fn test_uuid_scalar() {
        let id = Uuid::new_v4();
        let value = scalars::uuid(id);
        assert_eq!(scalars::as_uuid(&value).unwrap(), id);
        assert_eq!(from_wire(to_wire(&value)), value);
        assert_eq!(
            scalars::as_uuid(&Value::from(id.to_string())).unwrap(),
            id
        );
    }

    #[test]
    fn test_datetime_scalar() {
        let now = chrono::Utc::now();
        let value = scalars::datetime(now);
        assert_eq!(
            scalars::as_datetime(&value).unwrap().timestamp_millis(),
            now.timestamp_millis()
        );
        assert!(scalars::as_datetime(&Value::Null).is_err());
    }
}
