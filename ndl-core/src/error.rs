//! Error types for ndl-core

use crate::location::Location;
use thiserror::Error;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type
#[derive(Error, Debug)]
pub enum Error {
    /// Unknown name, alias collision, duplicate object
    #[error("{location}: name error: {message}")]
    Name { location: Location, message: String },

    /// Missing/duplicated member type, operator not allowed for a type
    #[error("{location}: type error: {message}")]
    Type { location: Location, message: String },

    /// C3 merge failure; lists the conflicting candidate heads
    #[error("linearization of '{object}' failed: no consistent order for [{}]", candidates.join(", "))]
    Linearization {
        object: String,
        candidates: Vec<String>,
    },

    /// Runtime value operation failure (division by zero, kind mismatch)
    #[error("value error: {0}")]
    Value(String),

    /// Invariant breach; should not occur
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a name error
    pub fn name(location: Location, message: impl Into<String>) -> Self {
        Error::Name {
            location,
            message: message.into(),
        }
    }

    /// Create a type error
    pub fn type_error(location: Location, message: impl Into<String>) -> Self {
        Error::Type {
            location,
            message: message.into(),
        }
    }

    /// Create a linearization error from the remaining candidate heads
    pub fn linearization(object: impl Into<String>, candidates: Vec<String>) -> Self {
        Error::Linearization {
            object: object.into(),
            candidates,
        }
    }

    /// Create a value error
    pub fn value(message: impl Into<String>) -> Self {
        Error::Value(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal(message.into())
    }
}
