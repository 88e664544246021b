//! HTTP-specific error types for the request builder.
//!
//! # Error Handling
//!
//! - [`InvalidHttpRequestError`]: the accumulated options cannot form a request
//!   (missing or ambiguous body). Returned before anything is sent.
//! - [`HttpError`]: unified error type for a dispatch, covering invalid
//!   requests, transport failures, JSON decoding, and unreadable upload files.
//!
//! # Example
//!
//! ```rust,ignore
//! use fluent_request::HttpError;
//!
//! match builder.get_json("/status").await {
//!     Ok(value) => println!("Status: {value}"),
//!     Err(HttpError::InvalidRequest(e)) => println!("Fix the call sequence: {e}"),
//!     Err(HttpError::Network(e)) => println!("Network error: {e}"),
//!     Err(HttpError::Decode(e)) => println!("Malformed JSON: {e}"),
//!     Err(HttpError::File { path, source }) => println!("{}: {source}", path.display()),
//! }
//! ```

use std::path::PathBuf;

use thiserror::Error;

/// Error returned when the accumulated options cannot form a valid request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidHttpRequestError {
    /// The HTTP method is not one of the supported methods.
    #[error("Invalid Http method {method}.")]
    InvalidMethod {
        /// The invalid method that was provided.
        method: String,
    },

    /// No body was configured for a call that requires one.
    #[error("Data not set with json, form or multipart. Call with_json(), with_form() or with_multipart() first.")]
    MissingBody,

    /// More than one body encoding was configured.
    #[error("Data set as {modes}. Choose only one method to send data.")]
    AmbiguousBody {
        /// The body encodings that were set, joined with " and ".
        modes: String,
    },
}

/// Unified error type for dispatching a request.
#[derive(Debug, Error)]
pub enum HttpError {
    /// The request was rejected before sending.
    #[error(transparent)]
    InvalidRequest(#[from] InvalidHttpRequestError),

    /// Network or connection error, including timeouts.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The response body was not valid JSON.
    #[error("Failed to decode response body as JSON: {0}")]
    Decode(#[from] serde_json::Error),

    /// A file for a multipart part could not be opened.
    #[error("Failed to open '{}' for upload: {source}", .path.display())]
    File {
        /// The path that could not be opened.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl HttpError {
    /// Returns `true` if the error comes from the call sequence rather than
    /// from sending the request.
    #[must_use]
    pub const fn is_invalid_request(&self) -> bool {
        matches!(self, Self::InvalidRequest(_))
    }
}
