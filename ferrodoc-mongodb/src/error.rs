//! Error types for MongoDB operations.
//!
//! [`MongoError`] is what arrives in a callback or a completion handle.
//! Validation problems are caught before dispatch and returned directly as
//! [`ValidationError`]; the `Validation` variant only exists so callers can
//! funnel both kinds through one `?`.
//!
//! A single-document fetch that matches nothing is not an error: it yields
//! [`Reply::NotFound`](crate::dispatch::Reply::NotFound).

use ferrodoc_core::{Abandoned, ValidationError};
use thiserror::Error;

/// Result type for MongoDB operations.
pub type MongoResult<T> = Result<T, MongoError>;

/// Errors that can occur during MongoDB operations.
#[derive(Error, Debug)]
pub enum MongoError {
    /// MongoDB driver error.
    #[error("mongodb error: {0}")]
    Driver(#[from] mongodb::error::Error),

    /// Arguments rejected before dispatch.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Connection error.
    #[error("connection error: {0}")]
    Connection(String),

    /// Query execution error reported by a driver.
    #[error("query error: {0}")]
    Query(String),

    /// Document serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Invalid ObjectId.
    #[error("invalid object id: {0}")]
    InvalidObjectId(String),

    /// The operation finished without delivering a result.
    #[error("{0}")]
    Abandoned(#[from] Abandoned),
}

impl MongoError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a query error.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query(message.into())
    }

    /// Create a serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }

    /// Check if this error was raised before dispatch.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this error was reported by the database or its driver.
    pub fn is_operation(&self) -> bool {
        matches!(self, Self::Driver(_) | Self::Query(_))
    }

    /// Check if the result was never delivered.
    pub fn is_abandoned(&self) -> bool {
        matches!(self, Self::Abandoned(_))
    }
}

impl From<bson::oid::Error> for MongoError {
    fn from(err: bson::oid::Error) -> Self {
        MongoError::InvalidObjectId(err.to_string())
    }
}
