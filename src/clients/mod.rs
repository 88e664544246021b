//! HTTP client types for building and dispatching requests.
//!
//! # Overview
//!
//! - [`RequestBuilder`]: accumulates options and dispatches requests
//! - [`RequestOptions`]: the option set sent with each request
//! - [`HttpResponse`]: a response with status, headers, and raw body
//! - [`HttpMethod`]: supported HTTP methods (GET, POST, PUT, DELETE)
//! - [`MultipartPart`]: a named segment of a multipart body
//! - [`HttpError`]: unified dispatch error
//!
//! # Dispatch
//!
//! Every verb comes in two forms:
//!
//! - awaited (`get`, `post_json`, ...): resolves to a `Result`; transport
//!   failures are logged with `tracing` and returned as `Err`
//! - detached (`get_async`, `post_json_async`, ...): spawns the request on the
//!   Tokio runtime and calls exactly one of the two callbacks on completion
//!
//! No retries are performed; the underlying client enforces the configured
//! timeout (2 seconds by default).

mod errors;
mod http_request;
mod http_response;
mod request_builder;

pub use errors::{HttpError, InvalidHttpRequestError};
pub use http_request::{BodyMode, HttpMethod, MultipartPart, PartContents, RequestOptions};
pub use http_response::HttpResponse;
pub use request_builder::{RequestBuilder, SDK_VERSION};
