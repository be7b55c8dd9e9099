//! Command signatures and argument binding.
//!
//! A command is called with a fixed number of positional arguments followed
//! by a free-form tail. The tail holds named options as name/value pairs and,
//! anywhere among them, at most one completion callback:
//!
//! ```rust
//! use ferrodoc_core::signature::{Arg, Command};
//! use ferrodoc_core::Value;
//!
//! fn done() {}
//!
//! let tail: Vec<Arg<fn()>> = vec![
//!     Arg::value("one"),
//!     Arg::value(true),
//!     Arg::Callback(done as fn()),
//!     Arg::value("limit"),
//!     Arg::value(5),
//! ];
//!
//! let bound = Command::Fetch
//!     .signature()
//!     .bind(vec![Value::map()], tail)
//!     .unwrap();
//!
//! assert!(bound.callback.is_some());
//! assert_eq!(bound.option("one"), Some(&Value::Bool(true)));
//! assert_eq!(bound.option("limit"), Some(&Value::Int(5)));
//! // Defaults fill in everything that was not supplied.
//! assert_eq!(bound.option("skip"), Some(&Value::Int(0)));
//! ```
//!
//! In a typed call path the tail is replaced by the option structs in
//! [`crate::options`] and an explicit `Option<Callback>`.

use std::fmt;

use indexmap::IndexMap;
use tracing::trace;

use crate::error::{ValidationError, ValidationResult};
use crate::value::Value;

/// The commands this layer knows how to dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Insert one document, or a batch.
    Insert,
    /// Query a collection.
    Fetch,
    /// Fetch with `one` pre-set.
    FetchOne,
    /// Fetch with `count` pre-set.
    FetchCount,
    /// Delete matching documents.
    Remove,
    /// Remove with `one` pre-set.
    RemoveOne,
    /// Replace the first matching document.
    Replace,
    /// Drop a collection.
    Drop,
}

impl Command {
    /// All commands.
    pub const ALL: [Command; 8] = [
        Self::Insert,
        Self::Fetch,
        Self::FetchOne,
        Self::FetchCount,
        Self::Remove,
        Self::RemoveOne,
        Self::Replace,
        Self::Drop,
    ];

    /// Command name as used in logs and errors.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Fetch => "fetch",
            Self::FetchOne => "fetch-one",
            Self::FetchCount => "fetch-count",
            Self::Remove => "remove",
            Self::RemoveOne => "remove-one",
            Self::Replace => "replace",
            Self::Drop => "drop",
        }
    }

    /// The declared signature of this command.
    pub fn signature(self) -> Signature {
        let name = self.name();
        match self {
            Self::Insert => Signature::new(name, &["data"]).option("batch", false),
            Self::Fetch => fetch_options(Signature::new(name, &["where"]))
                .option("count", false)
                .option("one", false),
            Self::FetchOne => fetch_options(Signature::new(name, &["where"])),
            Self::FetchCount => Signature::new(name, &["where"]),
            Self::Remove => Signature::new(name, &["where"]).option("one", false),
            Self::RemoveOne => Signature::new(name, &["where"]),
            Self::Replace => {
                Signature::new(name, &["where", "replacement"]).option("upsert", false)
            }
            Self::Drop => Signature::new(name, &[]),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn fetch_options(signature: Signature) -> Signature {
    signature
        .option("only", Value::Array(Vec::new()))
        .option("sort", Value::map())
        .option("skip", 0)
        .option("limit", 0)
        .option("explain", false)
}

/// Declared parameters of a command.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    /// Command name.
    pub command: &'static str,
    /// Required positional parameter names, in order.
    pub positionals: &'static [&'static str],
    /// Named options with their defaults, in declaration order.
    pub options: IndexMap<&'static str, Value>,
}

impl Signature {
    /// Declare a signature with the given positionals and no options.
    pub fn new(command: &'static str, positionals: &'static [&'static str]) -> Self {
        Self {
            command,
            positionals,
            options: IndexMap::new(),
        }
    }

    /// Declare a named option with a default.
    pub fn option(mut self, name: &'static str, default: impl Into<Value>) -> Self {
        self.options.insert(name, default.into());
        self
    }

    /// Bind a call's arguments against this signature.
    ///
    /// The first callback found in `tail` becomes the completion callback;
    /// any further callbacks are ignored. The remaining tail values are read
    /// pairwise as option name and value.
    pub fn bind<C>(&self, positionals: Vec<Value>, tail: Vec<Arg<C>>) -> ValidationResult<Bound<C>> {
        if positionals.len() != self.positionals.len() {
            return Err(ValidationError::Arity {
                command: self.command,
                expected: self.positionals.len(),
                actual: positionals.len(),
            });
        }

        let mut callback = None;
        let mut values = Vec::with_capacity(tail.len());
        for arg in tail {
            match arg {
                Arg::Callback(cb) if callback.is_none() => callback = Some(cb),
                Arg::Callback(_) => {
                    trace!(command = self.command, "Ignoring extra callback in tail");
                }
                Arg::Value(value) => values.push(value),
            }
        }

        let mut options = self.options.clone();
        let mut values = values.into_iter();
        while let Some(name) = values.next() {
            let name = match name {
                Value::String(name) => name,
                other => {
                    return Err(ValidationError::OptionName {
                        command: self.command,
                        name: other,
                    });
                }
            };
            let Some(value) = values.next() else {
                return Err(ValidationError::DanglingOption {
                    command: self.command,
                    name: Value::String(name),
                });
            };
            match options.get_mut(name.as_str()) {
                Some(slot) => *slot = value,
                None => {
                    return Err(ValidationError::UnknownOption {
                        command: self.command,
                        name,
                    });
                }
            }
        }

        Ok(Bound {
            command: self.command,
            positionals: self.positionals.iter().copied().zip(positionals).collect(),
            options,
            callback,
        })
    }
}

/// One element of a call's variable tail.
pub enum Arg<C> {
    /// An option name or option value.
    Value(Value),
    /// A completion callback.
    Callback(C),
}

impl<C> Arg<C> {
    /// Wrap a plain value.
    pub fn value(value: impl Into<Value>) -> Self {
        Self::Value(value.into())
    }

    /// Check if this is a callback.
    pub fn is_callback(&self) -> bool {
        matches!(self, Self::Callback(_))
    }
}

impl<C> From<Value> for Arg<C> {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl<C> fmt::Debug for Arg<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Self::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

/// The result of binding a call against a [`Signature`].
pub struct Bound<C> {
    /// Command name.
    pub command: &'static str,
    /// Positional values keyed by parameter name.
    pub positionals: IndexMap<&'static str, Value>,
    /// Every declared option, defaults applied.
    pub options: IndexMap<&'static str, Value>,
    /// The completion callback, if one was passed.
    pub callback: Option<C>,
}

impl<C> Bound<C> {
    /// Get a positional value by parameter name.
    pub fn positional(&self, name: &str) -> Option<&Value> {
        self.positionals.get(name)
    }

    /// Remove a positional value by parameter name.
    pub fn take_positional(&mut self, name: &str) -> Value {
        self.positionals.shift_remove(name).unwrap_or_default()
    }

    /// Get a resolved option by name.
    pub fn option(&self, name: &str) -> Option<&Value> {
        self.options.get(name)
    }

    /// Read a boolean option.
    pub fn bool_option(&self, name: &'static str) -> ValidationResult<bool> {
        match self.option(name) {
            None => Ok(false),
            Some(Value::Bool(b)) => Ok(*b),
            Some(other) => Err(self.type_error(name, "bool", other)),
        }
    }

    /// Read a non-negative integer option.
    pub fn count_option(&self, name: &'static str) -> ValidationResult<u64> {
        match self.option(name) {
            None => Ok(0),
            Some(Value::Int(i)) if *i >= 0 => Ok(*i as u64),
            Some(other) => Err(self.type_error(name, "non-negative integer", other)),
        }
    }

    /// Build a type error for option `name`.
    pub fn type_error(&self, name: &'static str, expected: &'static str, actual: &Value) -> ValidationError {
        ValidationError::OptionType {
            command: self.command,
            name,
            expected,
            actual: actual.clone(),
        }
    }
}

impl<C> fmt::Debug for Bound<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bound")
            .field("command", &self.command)
            .field("positionals", &self.positionals)
            .field("options", &self.options)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Cb = &'static str;

    fn fetch(tail: Vec<Arg<Cb>>) -> ValidationResult<Bound<Cb>> {
        Command::Fetch.signature().bind(vec![Value::map()], tail)
    }

    #[test]
    fn test_defaults_applied() {
        let bound = fetch(vec![]).unwrap();
        assert!(bound.callback.is_none());
        assert_eq!(bound.option("only"), Some(&Value::Array(vec![])));
        assert_eq!(bound.option("limit"), Some(&Value::Int(0)));
        assert!(!bound.bool_option("count").unwrap());
        assert_eq!(bound.positional("where"), Some(&Value::map()));
    }

    #[test]
    fn test_callback_position_irrelevant() {
        let first = fetch(vec![
            Arg::Callback("cb"),
            Arg::value("one"),
            Arg::value(true),
        ])
        .unwrap();
        let middle = fetch(vec![
            Arg::value("skip"),
            Arg::value(2),
            Arg::Callback("cb"),
            Arg::value("one"),
            Arg::value(true),
        ])
        .unwrap();
        let last = fetch(vec![Arg::value("one"), Arg::value(true), Arg::Callback("cb")]).unwrap();

        for bound in [&first, &middle, &last] {
            assert_eq!(bound.callback, Some("cb"));
            assert!(bound.bool_option("one").unwrap());
        }
        assert_eq!(middle.count_option("skip").unwrap(), 2);
    }

    #[test]
    fn test_first_callback_wins() {
        let bound = fetch(vec![Arg::Callback("first"), Arg::Callback("second")]).unwrap();
        assert_eq!(bound.callback, Some("first"));
    }

    #[test]
    fn test_arity() {
        let err = Command::Replace
            .signature()
            .bind::<Cb>(vec![Value::map()], vec![])
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::Arity {
                command: "replace",
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn test_dangling_option() {
        let err = fetch(vec![Arg::value("limit")]).unwrap_err();
        assert!(matches!(err, ValidationError::DanglingOption { .. }));
    }

    #[test]
    fn test_option_name_must_be_string() {
        let err = fetch(vec![Arg::value(1), Arg::value(2)]).unwrap_err();
        assert!(matches!(err, ValidationError::OptionName { .. }));
    }

    #[test]
    fn test_unknown_option() {
        let err = Command::Remove
            .signature()
            .bind::<Cb>(vec![Value::map()], vec![Arg::value("upsert"), Arg::value(true)])
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnknownOption {
                command: "remove",
                name: "upsert".into()
            }
        );
    }

    #[test]
    fn test_option_type_checks() {
        let bound = fetch(vec![Arg::value("limit"), Arg::value(-1)]).unwrap();
        assert!(matches!(
            bound.count_option("limit"),
            Err(ValidationError::OptionType { name: "limit", .. })
        ));

        let bound = fetch(vec![Arg::value("one"), Arg::value("yes")]).unwrap();
        assert!(bound.bool_option("one").is_err());
    }

    #[test]
    fn test_later_option_overrides() {
        let bound = fetch(vec![
            Arg::value("limit"),
            Arg::value(1),
            Arg::value("limit"),
            Arg::value(7),
        ])
        .unwrap();
        assert_eq!(bound.count_option("limit").unwrap(), 7);
    }

    #[test]
    fn test_every_command_binds_with_defaults() {
        for command in Command::ALL {
            let signature = command.signature();
            let positionals = vec![Value::map(); signature.positionals.len()];
            let bound = signature.bind::<Cb>(positionals, vec![]).unwrap();
            assert_eq!(bound.options.len(), signature.options.len());
        }
    }
}
