//! Application-level values.
//!
//! [`Value`] is what callers hand to commands and what commands hand back:
//! ordered maps, sequences, scalars and null. Driver-native scalars that have
//! no application-level counterpart (object ids, timestamps, binary blobs)
//! ride along untouched in the [`Value::Native`] arm.
//!
//! Converting from [`Bson`] normalizes: BSON types with a native counterpart
//! become that variant, so a [`Native`] never holds null, a bool, a number,
//! a string, an array or a document.
//!
//! ```rust
//! use ferrodoc_core::Value;
//! use serde_json::json;
//!
//! let user = Value::from(json!({ "name": "John", "age": 40 }));
//! assert_eq!(user.get("name").and_then(Value::as_str), Some("John"));
//! assert_eq!(user.get("age").and_then(Value::as_i64), Some(40));
//! ```

use std::fmt;

use bson::Bson;
use bson::oid::ObjectId;
use indexmap::IndexMap;
use smol_str::SmolStr;

/// Ordered map used for native mappings.
pub type Map = IndexMap<SmolStr, Value>;

/// A native value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Null value.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// String value.
    String(String),
    /// Ordered sequence of values.
    Array(Vec<Value>),
    /// Ordered key/value mapping.
    Map(Map),
    /// Driver-native scalar passed through without interpretation.
    Native(Native),
}

/// An opaque driver-native scalar.
///
/// Only built by `Value::from(Bson)`, which keeps every type with a native
/// counterpart out of it.
#[derive(Debug, Clone, PartialEq)]
pub struct Native(Bson);

impl Native {
    /// Borrow the wrapped BSON value.
    pub fn as_bson(&self) -> &Bson {
        &self.0
    }

    /// Unwrap the BSON value.
    pub fn into_bson(self) -> Bson {
        self.0
    }
}

impl Value {
    /// Create an empty map value.
    pub fn map() -> Self {
        Self::Map(Map::new())
    }

    /// Insert `key` into a map value, builder style.
    ///
    /// Non-map values are returned unchanged.
    pub fn with(mut self, key: impl Into<SmolStr>, value: impl Into<Value>) -> Self {
        if let Self::Map(map) = &mut self {
            map.insert(key.into(), value.into());
        }
        self
    }

    /// Check if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Check if this is a map value.
    pub fn is_map(&self) -> bool {
        matches!(self, Self::Map(_))
    }

    /// Borrow the map, if this is one.
    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Borrow the elements, if this is an array.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Borrow the string, if this is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get an integer, if this is one.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get a boolean, if this is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Look up a key in a map value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|map| map.get(key))
    }

    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Map(_) => "map",
            Self::Native(_) => "native",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Map(map) => {
                f.write_str("{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
            Self::Native(n) => write!(f, "{}", n.0),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::Array(v)
    }
}

impl From<Map> for Value {
    fn from(v: Map) -> Self {
        Self::Map(v)
    }
}

impl From<ObjectId> for Value {
    fn from(v: ObjectId) -> Self {
        Self::Native(Native(Bson::ObjectId(v)))
    }
}

impl From<Bson> for Value {
    fn from(v: Bson) -> Self {
        match v {
            Bson::Null => Self::Null,
            Bson::Boolean(b) => Self::Bool(b),
            Bson::Int32(i) => Self::Int(i64::from(i)),
            Bson::Int64(i) => Self::Int(i),
            Bson::Double(f) => Self::Float(f),
            Bson::String(s) => Self::String(s),
            Bson::Array(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            Bson::Document(doc) => Self::Map(
                doc.into_iter()
                    .map(|(k, v)| (SmolStr::from(k), Self::from(v)))
                    .collect(),
            ),
            other => Self::Native(Native(other)),
        }
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::Array(items.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(object) => Self::Map(
                object
                    .into_iter()
                    .map(|(k, v)| (SmolStr::from(k), Self::from(v)))
                    .collect(),
            ),
        }
    }
}
