//! Typed per-command options.
//!
//! Each struct mirrors the named options of one command's [`Signature`]
//! and can be built either fluently or from a [`Bound`] call.
//!
//! [`Signature`]: crate::signature::Signature

use smol_str::SmolStr;

use crate::error::ValidationResult;
use crate::signature::Bound;
use crate::value::{Map, Value};

/// Sort direction for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Ascending (`1`).
    Asc,
    /// Descending (`-1`).
    Desc,
}

impl Direction {
    /// Interpret a native value as a direction.
    ///
    /// Accepts the symbols `asc`/`ascending`/`desc`/`descending` and the
    /// numbers `1` and `-1`, integral floats included.
    pub fn parse(value: &Value) -> Option<Self> {
        match value {
            Value::Int(1) => Some(Self::Asc),
            Value::Int(-1) => Some(Self::Desc),
            Value::Float(f) if *f == 1.0 => Some(Self::Asc),
            Value::Float(f) if *f == -1.0 => Some(Self::Desc),
            Value::String(s) => match s.as_str() {
                "asc" | "ascending" => Some(Self::Asc),
                "desc" | "descending" => Some(Self::Desc),
                _ => None,
            },
            _ => None,
        }
    }

    /// The wire marker for this direction.
    pub const fn marker(self) -> i32 {
        match self {
            Self::Asc => 1,
            Self::Desc => -1,
        }
    }
}

impl From<Direction> for Value {
    fn from(d: Direction) -> Self {
        match d {
            Direction::Asc => Value::from("asc"),
            Direction::Desc => Value::from("desc"),
        }
    }
}

/// Options for `insert`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InsertOptions {
    /// Insert an array of documents in one call.
    pub batch: bool,
}

impl InsertOptions {
    /// Options for a batch insert.
    pub fn batch() -> Self {
        Self { batch: true }
    }

    /// Read options from a bound call.
    pub fn from_bound<C>(bound: &Bound<C>) -> ValidationResult<Self> {
        Ok(Self {
            batch: bound.bool_option("batch")?,
        })
    }
}

/// Options for `fetch`: everything in a query specification except the filter.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FetchOptions {
    /// Fields to return; empty returns all fields.
    pub only: Vec<String>,
    /// Field to direction, in priority order. Values are validated when the
    /// command is dispatched.
    pub sort: Map,
    /// Number of matches to skip.
    pub skip: u64,
    /// Maximum number of matches; `0` is unbounded.
    pub limit: u64,
    /// Return the match count instead of documents.
    pub count: bool,
    /// Return only the first match.
    pub one: bool,
    /// Return the query plan instead of documents.
    pub explain: bool,
}

impl FetchOptions {
    /// Create default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the returned fields.
    pub fn only<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.only = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Append a sort key.
    pub fn sort(mut self, field: impl Into<SmolStr>, direction: impl Into<Value>) -> Self {
        self.sort.insert(field.into(), direction.into());
        self
    }

    /// Set the number of matches to skip.
    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = skip;
        self
    }

    /// Set the match limit.
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    /// Return the match count.
    pub fn count(mut self, count: bool) -> Self {
        self.count = count;
        self
    }

    /// Return only the first match.
    pub fn one(mut self, one: bool) -> Self {
        self.one = one;
        self
    }

    /// Return the query plan.
    pub fn explain(mut self, explain: bool) -> Self {
        self.explain = explain;
        self
    }

    /// Read options from a bound call.
    pub fn from_bound<C>(bound: &Bound<C>) -> ValidationResult<Self> {
        let only = match bound.option("only") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(fields)) => fields
                .iter()
                .map(|field| match field {
                    Value::String(name) => Ok(name.clone()),
                    other => Err(bound.type_error("only", "array of field names", other)),
                })
                .collect::<ValidationResult<Vec<String>>>()?,
            Some(other) => return Err(bound.type_error("only", "array of field names", other)),
        };

        let sort = match bound.option("sort") {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Map(spec)) => spec.clone(),
            Some(other) => return Err(bound.type_error("sort", "map of field to direction", other)),
        };

        Ok(Self {
            only,
            sort,
            skip: bound.count_option("skip")?,
            limit: bound.count_option("limit")?,
            count: bound.bool_option("count")?,
            one: bound.bool_option("one")?,
            explain: bound.bool_option("explain")?,
        })
    }
}

/// Options for `remove`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RemoveOptions {
    /// Remove at most one match.
    pub one: bool,
}

impl RemoveOptions {
    /// Remove at most one match.
    pub fn one() -> Self {
        Self { one: true }
    }

    /// Read options from a bound call.
    pub fn from_bound<C>(bound: &Bound<C>) -> ValidationResult<Self> {
        Ok(Self {
            one: bound.bool_option("one")?,
        })
    }
}

/// Options for `replace`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReplaceOptions {
    /// Insert the replacement when nothing matches.
    pub upsert: bool,
}

impl ReplaceOptions {
    /// Insert when nothing matches.
    pub fn upsert() -> Self {
        Self { upsert: true }
    }

    /// Read options from a bound call.
    pub fn from_bound<C>(bound: &Bound<C>) -> ValidationResult<Self> {
        Ok(Self {
            upsert: bound.bool_option("upsert")?,
        })
    }
}
