//! Configuration types for the request builder.
//!
//! This module provides the explicit configuration that every
//! [`RequestBuilder`](crate::RequestBuilder) is constructed with. It replaces
//! any process-wide lookup of default hosts, paths, and tokens.
//!
//! # Overview
//!
//! - [`ClientConfig`]: defaults shared by request builders
//! - [`ClientConfigBuilder`]: a builder for constructing [`ClientConfig`] instances
//! - [`BaseUrl`]: a base URL with scheme inference
//! - [`BearerToken`]: a validated bearer token with masked debug output
//!
//! # Example
//!
//! ```rust
//! use fluent_request::{BearerToken, ClientConfig};
//! use std::time::Duration;
//!
//! let config = ClientConfig::builder()
//!     .default_host("api.example.com")
//!     .default_base_path("/api/v1")
//!     .default_bearer_token(BearerToken::new("token").unwrap())
//!     .timeout(Duration::from_secs(5))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.default_base_path(), "/api/v1");
//! ```

mod newtypes;

pub use newtypes::{BaseUrl, BearerToken};

use std::time::Duration;

use crate::error::ConfigError;

/// Default request timeout applied to the underlying client.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Environment variable holding the default host.
pub const ENV_API_HOST: &str = "FLUENT_REQUEST_API_HOST";
/// Environment variable holding the default base path.
pub const ENV_API_PATH: &str = "FLUENT_REQUEST_API_PATH";
/// Environment variable holding the default bearer token.
pub const ENV_API_TOKEN: &str = "FLUENT_REQUEST_API_TOKEN";
/// Environment variable holding the timeout in seconds.
pub const ENV_TIMEOUT_SECS: &str = "FLUENT_REQUEST_TIMEOUT_SECS";

/// Defaults shared by request builders.
///
/// # Thread Safety
///
/// `ClientConfig` is `Clone`, `Send`, and `Sync`; a single instance can be
/// shared by every builder in a process.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    default_host: Option<String>,
    default_base_path: String,
    default_bearer_token: Option<BearerToken>,
    timeout: Duration,
    user_agent_prefix: Option<String>,
}

impl ClientConfig {
    /// Creates a new builder for constructing a `ClientConfig`.
    #[must_use]
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// Reads the defaults from the environment.
    ///
    /// Unset variables leave the corresponding default empty. Blank values
    /// are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let mut builder = Self::builder();
        if let Some(host) = get(ENV_API_HOST) {
            builder = builder.default_host(host);
        }
        if let Some(path) = get(ENV_API_PATH) {
            builder = builder.default_base_path(path);
        }
        if let Some(token) = get(ENV_API_TOKEN) {
            builder = builder.default_bearer_token(BearerToken::new(token)?);
        }
        if let Some(raw) = get(ENV_TIMEOUT_SECS) {
            let parsed = raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|secs| *secs > 0.0)
                .and_then(|secs| Duration::try_from_secs_f64(secs).ok());
            let Some(timeout) = parsed else {
                return Err(ConfigError::InvalidTimeout { value: raw });
            };
            builder = builder.timeout(timeout);
        }
        builder.build()
    }

    /// Returns the default host, if configured.
    #[must_use]
    pub fn default_host(&self) -> Option<&str> {
        self.default_host.as_deref()
    }

    /// Returns the default base path (empty when not configured).
    #[must_use]
    pub fn default_base_path(&self) -> &str {
        &self.default_base_path
    }

    /// Returns the default bearer token, if configured.
    #[must_use]
    pub const fn default_bearer_token(&self) -> Option<&BearerToken> {
        self.default_bearer_token.as_ref()
    }

    /// Returns the timeout applied to the underlying client.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the user agent prefix, if configured.
    #[must_use]
    pub fn user_agent_prefix(&self) -> Option<&str> {
        self.user_agent_prefix.as_deref()
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            default_host: None,
            default_base_path: String::new(),
            default_bearer_token: None,
            timeout: DEFAULT_TIMEOUT,
            user_agent_prefix: None,
        }
    }
}

// Verify ClientConfig is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ClientConfig>();
};

/// Builder for constructing [`ClientConfig`] instances.
///
/// # Defaults
///
/// - `default_host`: `None`
/// - `default_base_path`: empty
/// - `default_bearer_token`: `None`
/// - `timeout`: 2 seconds
/// - `user_agent_prefix`: `None`
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    default_host: Option<String>,
    default_base_path: Option<String>,
    default_bearer_token: Option<BearerToken>,
    timeout: Option<Duration>,
    user_agent_prefix: Option<String>,
}

impl ClientConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the host used when a builder is created without a base URL.
    ///
    /// The host may omit its scheme; it is inferred per builder.
    #[must_use]
    pub fn default_host(mut self, host: impl Into<String>) -> Self {
        self.default_host = Some(host.into());
        self
    }

    /// Sets the base path used when none is given to `get_http_client`.
    #[must_use]
    pub fn default_base_path(mut self, path: impl Into<String>) -> Self {
        self.default_base_path = Some(path.into());
        self
    }

    /// Sets the token used by `with_bearer` when none is given.
    #[must_use]
    pub fn default_bearer_token(mut self, token: BearerToken) -> Self {
        self.default_bearer_token = Some(token);
        self
    }

    /// Sets the timeout for the underlying client.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the user agent prefix for HTTP requests.
    #[must_use]
    pub fn user_agent_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.user_agent_prefix = Some(prefix.into());
        self
    }

    /// Builds the [`ClientConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] if the default host cannot form
    /// a base URL, or [`ConfigError::InvalidTimeout`] for a zero timeout.
    pub fn build(self) -> Result<ClientConfig, ConfigError> {
        if let Some(host) = &self.default_host {
            BaseUrl::new(host.as_str(), false)?;
        }

        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);
        if timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout {
                value: format!("{timeout:?}"),
            });
        }

        Ok(ClientConfig {
            default_host: self.default_host,
            default_base_path: self.default_base_path.unwrap_or_default(),
            default_bearer_token: self.default_bearer_token,
            timeout,
            user_agent_prefix: self.user_agent_prefix,
        })
    }
}
