//! Error types for request builder configuration.
//!
//! This module contains the error type returned while building a
//! [`ClientConfig`](crate::ClientConfig) or validating its newtypes.
//!
//! # Example
//!
//! ```rust
//! use fluent_request::{BearerToken, ConfigError};
//!
//! let result = BearerToken::new("");
//! assert!(matches!(result, Err(ConfigError::EmptyBearerToken)));
//! ```

use thiserror::Error;

/// Errors that can occur while configuring the request builder.
///
/// Each variant provides a clear, actionable error message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Base URL is invalid.
    #[error("Invalid base URL '{url}'. Expected a host such as 'api.example.com' or 'https://api.example.com'.")]
    InvalidBaseUrl {
        /// The invalid URL that was provided.
        url: String,
    },

    /// Bearer token cannot be empty.
    #[error("Bearer token cannot be empty. Please provide a valid token.")]
    EmptyBearerToken,

    /// Timeout must be positive.
    #[error("Invalid timeout '{value}'. Expected a positive number of seconds.")]
    InvalidTimeout {
        /// The raw value that was rejected.
        value: String,
    },
}
