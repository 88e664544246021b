//! # fluent-request
//!
//! A fluent request builder over [`reqwest`]: accumulate headers, auth,
//! query parameters, and one body encoding through chained calls, then send
//! a single request either awaited in place or detached with callbacks.
//!
//! ## Overview
//!
//! This crate provides:
//! - Explicit configuration via [`ClientConfig`] and [`ClientConfigBuilder`]
//!   (default host, base path, bearer token, timeout)
//! - Base URLs with scheme inference via [`BaseUrl`]
//! - [`RequestBuilder`] with lazy client construction and GET/POST/PUT/DELETE
//!   dispatch, raw or JSON-decoded
//! - Multipart file upload
//! - Explicit `Result`s for every failure, with error logging through `tracing`
//!
//! ## Quick Start
//!
//! ```rust
//! use fluent_request::{ClientConfig, RequestBuilder};
//!
//! let config = ClientConfig::builder()
//!     .default_host("api.example.com")
//!     .default_base_path("/api/v1")
//!     .build()
//!     .unwrap();
//!
//! let mut builder = RequestBuilder::new(&config, None, true).unwrap();
//! builder
//!     .with_query([("page", "1")])
//!     .with_headers([("X-Trace-Id", "abc")]);
//!
//! assert_eq!(builder.base_url().as_ref(), "https://api.example.com");
//! ```
//!
//! ## Making Requests
//!
//! ```rust,ignore
//! use fluent_request::{ClientConfig, RequestBuilder};
//! use serde_json::json;
//!
//! let config = ClientConfig::from_env()?;
//! let mut builder = RequestBuilder::new(&config, None, false)?;
//!
//! // Awaited, JSON-decoded
//! let user = builder
//!     .get_http_client(None, None)?
//!     .with_json(json!({"name": "alice"}))
//!     .post_json("/users")
//!     .await?;
//!
//! // Detached, with callbacks
//! builder.get_async(
//!     "/health",
//!     |response| println!("status {}", response.code),
//!     |error| eprintln!("health check failed: {error}"),
//! )?;
//! ```
//!
//! ## Design Principles
//!
//! - **No global state**: defaults come from an injected [`ClientConfig`]
//! - **Fail-fast validation**: newtypes validate on construction; body
//!   encodings are checked before sending
//! - **Observable failures**: errors are logged and returned, never swallowed
//! - **Async-first**: designed for use with the Tokio runtime

pub mod clients;
pub mod config;
pub mod error;

pub use config::{BaseUrl, BearerToken, ClientConfig, ClientConfigBuilder};
pub use error::ConfigError;

// Re-export HTTP client types
pub use clients::{
    BodyMode, HttpError, HttpMethod, HttpResponse, InvalidHttpRequestError, MultipartPart,
    PartContents, RequestBuilder, RequestOptions,
};
