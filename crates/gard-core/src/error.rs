//! Error types for gard operations.
//!
//! This module provides the common `Error` type and `Result<T>` alias used by
//! both gard crates. Uses `thiserror` for derive macros.
//!
//! Denied access is not an error: the mediation surface routes it through the
//! forbidden callback instead. Errors only come from malformed permission
//! specifications, configuration loading, and user-supplied callables.

use thiserror::Error;

/// Errors that can occur in gard operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed permission specification or access value.
    #[error("Invalid permission spec: {0}")]
    InvalidSpec(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A property was invoked but does not hold a function.
    #[error("Property is not callable: {0}")]
    NotCallable(String),

    /// A bound function outlived the object it was bound to.
    #[error("Bound receiver was dropped: {0}")]
    DetachedReceiver(String),

    /// Failure raised by a user-supplied callback or function.
    #[error("Callback error: {0}")]
    Callback(String),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid permission spec error.
    pub fn invalid_spec(msg: impl Into<String>) -> Self {
        Self::InvalidSpec(msg.into())
    }

    /// Create a serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Create a not-callable error for the given property.
    pub fn not_callable(property: impl Into<String>) -> Self {
        Self::NotCallable(property.into())
    }

    /// Create a callback error.
    pub fn callback(msg: impl Into<String>) -> Self {
        Self::Callback(msg.into())
    }

    /// Returns true if this error came from a malformed spec or config.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Config(_) | Self::InvalidSpec(_))
    }
}

/// Result type alias using gard's Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            Error::invalid_spec("bad").to_string(),
            "Invalid permission spec: bad"
        );
        assert_eq!(
            Error::not_callable("val").to_string(),
            "Property is not callable: val"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_error_is_configuration() {
        assert!(Error::config("x").is_configuration());
        assert!(Error::invalid_spec("x").is_configuration());
        assert!(!Error::callback("x").is_configuration());
    }
}
