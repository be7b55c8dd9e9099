//! Write-status records for replace operations.

use bson::{Bson, Document};
use ferrodoc_core::Value;

use crate::document::{from_wire, to_wire};

/// Outcome of a write, as reported by the server.
///
/// Unacknowledged writes report nothing; every field is then absent and
/// `acknowledged` is `false`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WriteStatus {
    /// Whether the server acknowledged the write.
    pub acknowledged: bool,
    /// Documents matched by the filter.
    pub matched_count: Option<u64>,
    /// Documents modified.
    pub modified_count: Option<u64>,
    /// `_id` of the upserted document, if one was inserted.
    pub upserted_id: Option<Value>,
}

impl WriteStatus {
    /// Decode a wire status document.
    ///
    /// Reads `acknowledged`, `matchedCount`, `modifiedCount` and `upsertedId`;
    /// absent or null fields decode as absent rather than failing.
    pub fn from_document(doc: &Document) -> Self {
        Self {
            acknowledged: doc.get_bool("acknowledged").unwrap_or(false),
            matched_count: doc.get("matchedCount").and_then(count),
            modified_count: doc.get("modifiedCount").and_then(count),
            upserted_id: doc
                .get("upsertedId")
                .filter(|id| !matches!(id, Bson::Null))
                .cloned()
                .map(from_wire),
        }
    }

    /// Encode as a wire status document, omitting absent fields.
    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        doc.insert("acknowledged", self.acknowledged);
        if let Some(matched) = self.matched_count {
            doc.insert("matchedCount", wire_count(matched));
        }
        if let Some(modified) = self.modified_count {
            doc.insert("modifiedCount", wire_count(modified));
        }
        if let Some(ref id) = self.upserted_id {
            doc.insert("upsertedId", to_wire(id));
        }
        doc
    }

    /// Check if the write inserted a new document.
    pub fn is_upsert(&self) -> bool {
        self.upserted_id.is_some()
    }
}

fn count(bson: &Bson) -> Option<u64> {
    match bson {
        Bson::Int32(n) => u64::try_from(*n).ok(),
        Bson::Int64(n) => u64::try_from(*n).ok(),
        Bson::Double(n) if *n >= 0.0 && n.fract() == 0.0 => Some(*n as u64),
        _ => None,
    }
}

fn wire_count(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::{doc, oid::ObjectId};

    #[test]
    fn test_decode_acknowledged_update() {
        let status = WriteStatus::from_document(&doc! {
            "acknowledged": true,
            "matchedCount": 1_i64,
            "modifiedCount": 1_i32,
        });
        assert_eq!(
            status,
            WriteStatus {
                acknowledged: true,
                matched_count: Some(1),
                modified_count: Some(1),
                upserted_id: None,
            }
        );
        assert!(!status.is_upsert());
    }

    #[test]
    fn test_decode_upsert() {
        let oid = ObjectId::new();
        let status = WriteStatus::from_document(&doc! {
            "acknowledged": true,
            "matchedCount": 0,
            "modifiedCount": 0,
            "upsertedId": oid,
        });
        assert_eq!(status.matched_count, Some(0));
        assert_eq!(status.modified_count, Some(0));
        assert_eq!(status.upserted_id, Some(Value::from(oid)));
        assert!(status.is_upsert());
    }

    #[test]
    fn test_decode_unacknowledged_tolerates_absent_fields() {
        assert_eq!(WriteStatus::from_document(&doc! {}), WriteStatus::default());

        let status = WriteStatus::from_document(&doc! {
            "acknowledged": false,
            "matchedCount": Bson::Null,
            "upsertedId": Bson::Null,
        });
        assert_eq!(status, WriteStatus::default());
    }

    #[test]
    fn test_encode_matches_decode() {
        let status = WriteStatus {
            acknowledged: true,
            matched_count: Some(0),
            modified_count: Some(0),
            upserted_id: Some(Value::Int(42)),
        };
        assert_eq!(WriteStatus::from_document(&status.to_document()), status);
        assert_eq!(
            WriteStatus::default().to_document(),
            doc! { "acknowledged": false }
        );
    }
}
