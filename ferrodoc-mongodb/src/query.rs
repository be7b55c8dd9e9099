//! Projection and sort document building.
//!
//! ```rust
//! use bson::doc;
//! use ferrodoc_mongodb::query::projection;
//!
//! assert_eq!(projection(&[]), doc! {});
//! assert_eq!(projection(&["name".to_string()]), doc! { "_id": 0, "name": 1 });
//! ```

use bson::Document;
use ferrodoc_core::{Direction, FetchOptions, Map, ValidationError, ValidationResult, Value};

/// Build a projection document from field names.
///
/// An empty list returns all fields. Otherwise every named field is included
/// and `_id` is excluded unless it was named.
pub fn projection(fields: &[String]) -> Document {
    let mut doc = Document::new();
    if fields.is_empty() {
        return doc;
    }
    if !fields.iter().any(|field| field == "_id") {
        doc.insert("_id", 0);
    }
    for field in fields {
        doc.insert(field.as_str(), 1);
    }
    doc
}

/// Build a sort document from a field-to-direction map, keeping its order.
pub fn sorting(spec: &Map) -> ValidationResult<Document> {
    let mut doc = Document::new();
    for (field, direction) in spec {
        let direction =
            Direction::parse(direction).ok_or_else(|| ValidationError::SortDirection {
                direction: direction.clone(),
                spec: Value::Map(spec.clone()),
            })?;
        doc.insert(field.as_str(), direction.marker());
    }
    Ok(doc)
}

/// A validated find: everything the driver needs besides the filter.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FindSpec {
    /// Projection; `None` returns all fields.
    pub projection: Option<Document>,
    /// Sort order; `None` leaves the server's natural order.
    pub sort: Option<Document>,
    /// Matches to skip.
    pub skip: u64,
    /// Maximum matches; `0` is unbounded.
    pub limit: u64,
    /// Only the first match is wanted.
    pub one: bool,
}

impl FindSpec {
    /// Build the projection and sort documents for `options`.
    pub fn build(options: &FetchOptions) -> ValidationResult<Self> {
        let projection = projection(&options.only);
        let sort = sorting(&options.sort)?;
        Ok(Self {
            projection: (!projection.is_empty()).then_some(projection),
            sort: (!sort.is_empty()).then_some(sort),
            skip: options.skip,
            limit: options.limit,
            one: options.one,
        })
    }

    /// The effective limit as the driver expects it, `None` when unbounded.
    pub fn effective_limit(&self) -> Option<i64> {
        if self.one {
            Some(1)
        } else if self.limit > 0 {
            Some(i64::try_from(self.limit).unwrap_or(i64::MAX))
        } else {
            None
        }
    }
}
