//! Validation errors raised before a command is dispatched.
//!
//! Every error in this module is produced synchronously on the caller's
//! thread while arguments are bound and wire documents are built. No
//! asynchronous work has been scheduled when one is returned, so they are
//! never delivered through a callback or a completion handle.

use thiserror::Error;

use crate::value::Value;

/// Result type for argument binding and document building.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Errors detected while validating a command's arguments.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A sort direction was neither ascending nor descending.
    #[error("invalid sort direction {direction} in {spec}")]
    SortDirection {
        /// The offending direction.
        direction: Value,
        /// The full sort specification, for diagnostics.
        spec: Value,
    },

    /// A value did not have the shape a wire document requires.
    #[error("invalid document for {context}: expected {expected}, got {actual}")]
    InvalidDocument {
        /// What the document was for (`data`, `where`, `replacement`, ...).
        context: &'static str,
        /// The expected shape.
        expected: &'static str,
        /// The shape that was supplied.
        actual: &'static str,
    },

    /// Wrong number of positional arguments.
    #[error("{command} expects {expected} positional argument(s), got {actual}")]
    Arity {
        /// Command name.
        command: &'static str,
        /// Declared positional count.
        expected: usize,
        /// Supplied positional count.
        actual: usize,
    },

    /// An option name had no value following it.
    #[error("{command}: option {name} is missing a value")]
    DanglingOption {
        /// Command name.
        command: &'static str,
        /// The unpaired option name.
        name: Value,
    },

    /// An option name was not a string.
    #[error("{command}: option names must be strings, got {name}")]
    OptionName {
        /// Command name.
        command: &'static str,
        /// The offending name.
        name: Value,
    },

    /// An option that the command does not declare.
    #[error("{command} does not accept option {name:?}")]
    UnknownOption {
        /// Command name.
        command: &'static str,
        /// The undeclared option.
        name: String,
    },

    /// An option value of the wrong type.
    #[error("{command}: option {name:?} expects {expected}, got {actual}")]
    OptionType {
        /// Command name.
        command: &'static str,
        /// Option name.
        name: &'static str,
        /// Expected type.
        expected: &'static str,
        /// The supplied value.
        actual: Value,
    },
}

impl ValidationError {
    /// Create an invalid document error for `actual`.
    pub fn invalid_document(context: &'static str, expected: &'static str, actual: &Value) -> Self {
        Self::InvalidDocument {
            context,
            expected,
            actual: actual.kind(),
        }
    }

    /// Check if this is a sort direction error.
    pub fn is_sort_direction(&self) -> bool {
        matches!(self, Self::SortDirection { .. })
    }

    /// Check if this error came from argument binding rather than document building.
    pub fn is_binding_error(&self) -> bool {
        matches!(
            self,
            Self::Arity { .. }
                | Self::DanglingOption { .. }
                | Self::OptionName { .. }
                | Self::UnknownOption { .. }
                | Self::OptionType { .. }
        )
    }
}

/// A completion handle whose producer went away without writing a result.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[error("completion was dropped before a result was delivered")]
pub struct Abandoned;
