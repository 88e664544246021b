//! Validated newtype wrappers for configuration values.
//!
//! This module provides type-safe wrappers around string values that validate
//! their contents on construction. Invalid values are rejected with clear error messages.

use crate::error::ConfigError;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A validated bearer token.
///
/// This newtype ensures the token is non-empty and masks its value
/// in debug output to prevent accidental exposure in logs.
///
/// # Example
///
/// ```rust
/// use fluent_request::BearerToken;
///
/// let token = BearerToken::new("my-token").unwrap();
/// assert_eq!(format!("{:?}", token), "BearerToken(*****)");
/// assert_eq!(token.as_ref(), "my-token");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    /// Creates a new validated bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyBearerToken`] if the token is empty.
    pub fn new(token: impl Into<String>) -> Result<Self, ConfigError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(ConfigError::EmptyBearerToken);
        }
        Ok(Self(token))
    }

    /// Returns the value for an `Authorization` header.
    #[must_use]
    pub fn header_value(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl AsRef<str> for BearerToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(*****)")
    }
}

/// A base URL (scheme and host) for the target service.
///
/// A value without a scheme gets one prepended: `https://` when the secure
/// flag is set, `http://` otherwise. A value that already carries a scheme
/// is kept verbatim.
///
/// # Example
///
/// ```rust
/// use fluent_request::BaseUrl;
///
/// let url = BaseUrl::new("api.example.com", false).unwrap();
/// assert_eq!(url.as_ref(), "http://api.example.com");
///
/// let url = BaseUrl::new("api.example.com", true).unwrap();
/// assert_eq!(url.scheme(), "https");
///
/// let url = BaseUrl::new("http://localhost:8080", true).unwrap();
/// assert_eq!(url.as_ref(), "http://localhost:8080");
/// assert_eq!(url.host_name(), Some("localhost"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BaseUrl {
    url: String,
    scheme_end: usize,
    host_start: usize,
    host_end: usize,
}

impl BaseUrl {
    /// Creates a base URL, inferring the scheme when it is missing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] if the scheme is malformed or
    /// the host is empty.
    pub fn new(url: impl Into<String>, use_https: bool) -> Result<Self, ConfigError> {
        let url = url.into();
        let url = url.trim();

        let url = if url.contains("://") {
            url.to_string()
        } else {
            let scheme = if use_https { "https://" } else { "http://" };
            format!("{scheme}{url}")
        };

        Self::parse(url)
    }

    fn parse(url: String) -> Result<Self, ConfigError> {
        let Some(scheme_end) = url.find("://") else {
            return Err(ConfigError::InvalidBaseUrl { url });
        };

        if !Self::is_valid_scheme(&url[..scheme_end]) {
            return Err(ConfigError::InvalidBaseUrl { url });
        }

        let host_start = scheme_end + 3;
        let remainder = &url[host_start..];
        let host_end = remainder
            .find([':', '/', '?', '#'])
            .map_or(url.len(), |i| host_start + i);

        if host_end == host_start {
            return Err(ConfigError::InvalidBaseUrl { url });
        }

        Ok(Self {
            url,
            scheme_end,
            host_start,
            host_end,
        })
    }

    fn is_valid_scheme(scheme: &str) -> bool {
        let mut chars = scheme.chars();
        chars.next().is_some_and(|c| c.is_ascii_alphabetic())
            && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    }

    /// Returns the URL scheme (e.g., "https").
    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.url[..self.scheme_end]
    }

    /// Returns the host name portion of the URL.
    #[must_use]
    pub fn host_name(&self) -> Option<&str> {
        let host = &self.url[self.host_start..self.host_end];
        if host.is_empty() {
            None
        } else {
            Some(host)
        }
    }

    /// Joins the base URL with a base path and a request path.
    ///
    /// The pieces are concatenated; only a doubled `/` at the seam between
    /// the base URL and the paths is collapsed.
    #[must_use]
    pub fn join(&self, base_path: &str, path: &str) -> String {
        let suffix = format!("{base_path}{path}");
        if self.url.ends_with('/') && suffix.starts_with('/') {
            format!("{}{}", self.url.trim_end_matches('/'), suffix)
        } else {
            format!("{}{}", self.url, suffix)
        }
    }
}

impl AsRef<str> for BaseUrl {
    fn as_ref(&self) -> &str {
        &self.url
    }
}

impl fmt::Display for BaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

impl Serialize for BaseUrl {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.url)
    }
}

impl<'de> Deserialize<'de> for BaseUrl {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s, false).map_err(de::Error::custom)
    }
}
