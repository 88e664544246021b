//! Fluent request builder over a lazily constructed `reqwest` client.
//!
//! This module provides the [`RequestBuilder`] type: it accumulates request
//! options through chained calls and dispatches them either awaited in place
//! or detached onto the Tokio runtime with success and error callbacks.

use std::path::PathBuf;

use tokio::task::JoinHandle;

use crate::clients::errors::{HttpError, InvalidHttpRequestError};
use crate::clients::http_request::{HttpMethod, MultipartPart, RequestOptions};
use crate::clients::http_response::HttpResponse;
use crate::config::{BaseUrl, BearerToken, ClientConfig};
use crate::error::ConfigError;

/// Crate version from Cargo.toml.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Fluent builder for requests against a single base URL.
///
/// The builder holds:
/// - the base URL (scheme inferred at construction) and the active base path
/// - the accumulated [`RequestOptions`]
/// - one `reqwest::Client`, built on first use and reused afterwards
///
/// Options persist across dispatches, so one builder can send several
/// requests of the same shape. Configuration methods take `&mut self`; a
/// builder is meant to be driven from one task at a time.
///
/// # Example
///
/// ```rust,ignore
/// use fluent_request::{ClientConfig, RequestBuilder};
/// use serde_json::json;
///
/// let config = ClientConfig::builder()
///     .default_host("api.example.com")
///     .default_base_path("/api/v1")
///     .build()?;
///
/// let mut builder = RequestBuilder::new(&config, None, true)?;
/// let created = builder
///     .get_http_client(None, Some("token"))?
///     .with_json(json!({"name": "widget"}))
///     .post_json("/widgets")
///     .await?;
/// ```
#[derive(Debug)]
pub struct RequestBuilder {
    config: ClientConfig,
    base_url: BaseUrl,
    base_path: String,
    client: Option<reqwest::Client>,
    options: RequestOptions,
}

// Verify RequestBuilder is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<RequestBuilder>();
};

impl RequestBuilder {
    /// Creates a builder for `base_url`, or for the configured default host.
    ///
    /// A URL without a scheme gets `https://` when `use_https` is set and
    /// `http://` otherwise. The base path starts as the configured default.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] if no URL is given and no
    /// default host is configured, or if the URL is malformed.
    pub fn new(
        config: &ClientConfig,
        base_url: Option<&str>,
        use_https: bool,
    ) -> Result<Self, ConfigError> {
        let raw = base_url
            .or_else(|| config.default_host())
            .ok_or_else(|| ConfigError::InvalidBaseUrl { url: String::new() })?;

        Ok(Self {
            config: config.clone(),
            base_url: BaseUrl::new(raw, use_https)?,
            base_path: config.default_base_path().to_string(),
            client: None,
            options: RequestOptions::default(),
        })
    }

    /// Returns the base URL.
    #[must_use]
    pub const fn base_url(&self) -> &BaseUrl {
        &self.base_url
    }

    /// Returns the active base path.
    #[must_use]
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Sets the base path, falling back to the configured default.
    pub fn set_base_path(&mut self, base_path: Option<&str>) -> &mut Self {
        self.base_path = base_path
            .unwrap_or_else(|| self.config.default_base_path())
            .to_string();
        self
    }

    /// Returns the accumulated options.
    #[must_use]
    pub const fn options(&self) -> &RequestOptions {
        &self.options
    }

    /// Returns the configuration this builder was created with.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns `true` once the underlying client has been built.
    #[must_use]
    pub const fn has_client(&self) -> bool {
        self.client.is_some()
    }

    /// Returns the `User-Agent` sent with every request.
    #[must_use]
    pub fn user_agent(&self) -> String {
        let prefix = self
            .config
            .user_agent_prefix()
            .map_or(String::new(), |prefix| format!("{prefix} | "));
        let rust_version = env!("CARGO_PKG_RUST_VERSION");
        format!("{prefix}fluent-request v{SDK_VERSION} | Rust {rust_version}")
    }

    /// Builds the underlying client if needed, sets the base path, and
    /// applies bearer authentication.
    ///
    /// The client is built only on the first call. `base_path` falls back to
    /// the configured default; `bearer` falls back to the configured token.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Network`] if the client cannot be built.
    pub fn get_http_client(
        &mut self,
        base_path: Option<&str>,
        bearer: Option<&str>,
    ) -> Result<&mut Self, HttpError> {
        self.ensure_client()?;
        self.set_base_path(base_path);
        self.with_bearer(bearer, true);
        Ok(self)
    }

    /// Sets basic-auth credentials.
    pub fn with_auth(&mut self, user: impl Into<String>, password: impl Into<String>) -> &mut Self {
        self.options.auth = Some((user.into(), password.into()));
        self
    }

    /// Sets a JSON body.
    pub fn with_json(&mut self, data: impl Into<serde_json::Value>) -> &mut Self {
        self.options.json = Some(data.into());
        self
    }

    /// Sets the query parameters, replacing any previous ones.
    pub fn with_query<I, K, V>(&mut self, data: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.options.query = Some(collect_pairs(data));
        self
    }

    /// Sets an urlencoded form body.
    pub fn with_form<I, K, V>(&mut self, data: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.options.form_params = Some(collect_pairs(data));
        self
    }

    /// Sets a multipart body.
    pub fn with_multipart(&mut self, parts: impl IntoIterator<Item = MultipartPart>) -> &mut Self {
        self.options.multipart = Some(parts.into_iter().collect());
        self
    }

    /// Sets `Authorization: Bearer <token>`, and `Content-Type:
    /// application/json` when `as_json` is set.
    ///
    /// Without a token (or with a blank one) the configured default is used.
    /// If neither exists the `Authorization` header is left untouched.
    pub fn with_bearer(&mut self, token: Option<&str>, as_json: bool) -> &mut Self {
        let token = token
            .and_then(|token| BearerToken::new(token).ok())
            .or_else(|| self.config.default_bearer_token().cloned());

        let options = &mut self.options;
        options.headers_mut();

        if as_json {
            options.set_header("Content-Type", "application/json");
        }

        match token {
            Some(token) => options.set_header("Authorization", token.header_value()),
            None => tracing::debug!("No bearer token given or configured; Authorization not set"),
        }

        self
    }

    /// Merges headers into the existing ones.
    ///
    /// Values for a key that is already present are appended, so
    /// `with_headers([("A", "1")])` followed by `with_headers([("A", "2")])`
    /// sends both values.
    pub fn with_headers<I, K, V>(&mut self, headers: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.options.merge_headers(headers);
        self
    }

    /// Checks that exactly one body encoding (json, form, or multipart) is set.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidHttpRequestError::MissingBody`] or
    /// [`InvalidHttpRequestError::AmbiguousBody`].
    pub fn check_data(&self) -> Result<(), InvalidHttpRequestError> {
        self.options.check_data()
    }

    /// Sends a request and waits for the response.
    ///
    /// A status other than 200 is logged but still returned as `Ok`.
    /// Transport failures are logged and returned as `Err`; invalid option
    /// combinations are returned without logging.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] if the options are invalid, an upload file cannot
    /// be opened, or the transport fails (including timeouts).
    pub async fn request(
        &mut self,
        method: HttpMethod,
        path: &str,
    ) -> Result<HttpResponse, HttpError> {
        let url = self.url(path);
        let result = match self.ensure_client() {
            Ok(client) => execute(client, method, &url, self.options.clone()).await,
            Err(error) => Err(error),
        };

        match result {
            Ok(response) => {
                if response.code != 200 {
                    tracing::error!(
                        "Request {} {} did not return 200, received status {}",
                        method,
                        url,
                        response.code
                    );
                }
                Ok(response)
            }
            Err(error) => {
                if !error.is_invalid_request() {
                    tracing::error!("Request {} {} failed: {}", method, url, error);
                }
                Err(error)
            }
        }
    }

    /// Like [`request`](Self::request), but decodes the body as JSON.
    ///
    /// An empty body decodes to `Value::Null`. A malformed body is logged and
    /// returned as [`HttpError::Decode`].
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] for the failures of [`request`](Self::request)
    /// and for malformed JSON.
    pub async fn request_json(
        &mut self,
        method: HttpMethod,
        path: &str,
    ) -> Result<serde_json::Value, HttpError> {
        let response = self.request(method, path).await?;

        if response.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(serde_json::Value::Null);
        }

        response.json().map_err(|error| {
            tracing::error!(
                "Response to {} {} is not valid JSON: {}",
                method,
                self.url(path),
                error
            );
            HttpError::Decode(error)
        })
    }

    /// Spawns the request on the Tokio runtime and returns immediately.
    ///
    /// Exactly one callback runs once the request completes: `on_success`
    /// with the response (any status), or `on_error` with the failure. The
    /// options are snapshotted, so the builder can be reconfigured while the
    /// request is in flight.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Network`] if the client cannot be built; the
    /// callbacks are not invoked in that case.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn request_async<S, E>(
        &mut self,
        method: HttpMethod,
        path: &str,
        on_success: S,
        on_error: E,
    ) -> Result<JoinHandle<()>, HttpError>
    where
        S: FnOnce(HttpResponse) + Send + 'static,
        E: FnOnce(HttpError) + Send + 'static,
    {
        let client = self.ensure_client()?;
        let url = self.url(path);
        let options = self.options.clone();

        tracing::debug!("Dispatching {} {} in the background", method, url);

        Ok(tokio::spawn(async move {
            match execute(client, method, &url, options).await {
                Ok(response) => on_success(response),
                Err(error) => on_error(error),
            }
        }))
    }

    /// Detached form of [`request_json`](Self::request_json).
    ///
    /// The callbacks receive the raw [`HttpResponse`]; no JSON decoding is
    /// done on this path.
    ///
    /// # Errors
    ///
    /// See [`request_async`](Self::request_async).
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn request_json_async<S, E>(
        &mut self,
        method: HttpMethod,
        path: &str,
        on_success: S,
        on_error: E,
    ) -> Result<JoinHandle<()>, HttpError>
    where
        S: FnOnce(HttpResponse) + Send + 'static,
        E: FnOnce(HttpError) + Send + 'static,
    {
        self.request_async(method, path, on_success, on_error)
    }

    /// Sends a GET request.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn get(&mut self, path: &str) -> Result<HttpResponse, HttpError> {
        self.request(HttpMethod::Get, path).await
    }

    /// Sends a POST request.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn post(&mut self, path: &str) -> Result<HttpResponse, HttpError> {
        self.request(HttpMethod::Post, path).await
    }

    /// Sends a PUT request.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn put(&mut self, path: &str) -> Result<HttpResponse, HttpError> {
        self.request(HttpMethod::Put, path).await
    }

    /// Sends a DELETE request.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn delete(&mut self, path: &str) -> Result<HttpResponse, HttpError> {
        self.request(HttpMethod::Delete, path).await
    }

    /// Sends a GET request and decodes the JSON body.
    ///
    /// # Errors
    ///
    /// See [`request_json`](Self::request_json).
    pub async fn get_json(&mut self, path: &str) -> Result<serde_json::Value, HttpError> {
        self.request_json(HttpMethod::Get, path).await
    }

    /// Checks the body, sends a POST request, and decodes the JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::InvalidRequest`] if [`check_data`](Self::check_data)
    /// fails; see [`request_json`](Self::request_json) otherwise.
    pub async fn post_json(&mut self, path: &str) -> Result<serde_json::Value, HttpError> {
        self.check_data()?;
        self.request_json(HttpMethod::Post, path).await
    }

    /// Checks the body, sends a PUT request, and decodes the JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::InvalidRequest`] if [`check_data`](Self::check_data)
    /// fails; see [`request_json`](Self::request_json) otherwise.
    pub async fn put_json(&mut self, path: &str) -> Result<serde_json::Value, HttpError> {
        self.check_data()?;
        self.request_json(HttpMethod::Put, path).await
    }

    /// Checks the body, sends a DELETE request, and decodes the JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::InvalidRequest`] if [`check_data`](Self::check_data)
    /// fails; see [`request_json`](Self::request_json) otherwise.
    pub async fn delete_json(&mut self, path: &str) -> Result<serde_json::Value, HttpError> {
        self.check_data()?;
        self.request_json(HttpMethod::Delete, path).await
    }

    /// Spawns a GET request.
    ///
    /// # Errors
    ///
    /// See [`request_async`](Self::request_async).
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn get_async<S, E>(
        &mut self,
        path: &str,
        on_success: S,
        on_error: E,
    ) -> Result<JoinHandle<()>, HttpError>
    where
        S: FnOnce(HttpResponse) + Send + 'static,
        E: FnOnce(HttpError) + Send + 'static,
    {
        self.request_async(HttpMethod::Get, path, on_success, on_error)
    }

    /// Spawns a POST request.
    ///
    /// # Errors
    ///
    /// See [`request_async`](Self::request_async).
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn post_async<S, E>(
        &mut self,
        path: &str,
        on_success: S,
        on_error: E,
    ) -> Result<JoinHandle<()>, HttpError>
    where
        S: FnOnce(HttpResponse) + Send + 'static,
        E: FnOnce(HttpError) + Send + 'static,
    {
        self.request_async(HttpMethod::Post, path, on_success, on_error)
    }

    /// Spawns a PUT request.
    ///
    /// # Errors
    ///
    /// See [`request_async`](Self::request_async).
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn put_async<S, E>(
        &mut self,
        path: &str,
        on_success: S,
        on_error: E,
    ) -> Result<JoinHandle<()>, HttpError>
    where
        S: FnOnce(HttpResponse) + Send + 'static,
        E: FnOnce(HttpError) + Send + 'static,
    {
        self.request_async(HttpMethod::Put, path, on_success, on_error)
    }

    /// Spawns a DELETE request.
    ///
    /// # Errors
    ///
    /// See [`request_async`](Self::request_async).
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn delete_async<S, E>(
        &mut self,
        path: &str,
        on_success: S,
        on_error: E,
    ) -> Result<JoinHandle<()>, HttpError>
    where
        S: FnOnce(HttpResponse) + Send + 'static,
        E: FnOnce(HttpError) + Send + 'static,
    {
        self.request_async(HttpMethod::Delete, path, on_success, on_error)
    }

    /// Spawns a GET request on the JSON path.
    ///
    /// # Errors
    ///
    /// See [`request_json_async`](Self::request_json_async).
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn get_json_async<S, E>(
        &mut self,
        path: &str,
        on_success: S,
        on_error: E,
    ) -> Result<JoinHandle<()>, HttpError>
    where
        S: FnOnce(HttpResponse) + Send + 'static,
        E: FnOnce(HttpError) + Send + 'static,
    {
        self.request_json_async(HttpMethod::Get, path, on_success, on_error)
    }

    /// Checks the body and spawns a POST request on the JSON path.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::InvalidRequest`] if [`check_data`](Self::check_data)
    /// fails; see [`request_json_async`](Self::request_json_async) otherwise.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn post_json_async<S, E>(
        &mut self,
        path: &str,
        on_success: S,
        on_error: E,
    ) -> Result<JoinHandle<()>, HttpError>
    where
        S: FnOnce(HttpResponse) + Send + 'static,
        E: FnOnce(HttpError) + Send + 'static,
    {
        self.check_data()?;
        self.request_json_async(HttpMethod::Post, path, on_success, on_error)
    }

    /// Checks the body and spawns a PUT request on the JSON path.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::InvalidRequest`] if [`check_data`](Self::check_data)
    /// fails; see [`request_json_async`](Self::request_json_async) otherwise.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn put_json_async<S, E>(
        &mut self,
        path: &str,
        on_success: S,
        on_error: E,
    ) -> Result<JoinHandle<()>, HttpError>
    where
        S: FnOnce(HttpResponse) + Send + 'static,
        E: FnOnce(HttpError) + Send + 'static,
    {
        self.check_data()?;
        self.request_json_async(HttpMethod::Put, path, on_success, on_error)
    }

    /// Checks the body and spawns a DELETE request on the JSON path.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::InvalidRequest`] if [`check_data`](Self::check_data)
    /// fails; see [`request_json_async`](Self::request_json_async) otherwise.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn delete_json_async<S, E>(
        &mut self,
        path: &str,
        on_success: S,
        on_error: E,
    ) -> Result<JoinHandle<()>, HttpError>
    where
        S: FnOnce(HttpResponse) + Send + 'static,
        E: FnOnce(HttpError) + Send + 'static,
    {
        self.check_data()?;
        self.request_json_async(HttpMethod::Delete, path, on_success, on_error)
    }

    /// Uploads files and form fields as a multipart POST and decodes the
    /// JSON response.
    ///
    /// Each `files` entry (field name → path) becomes a part streaming the
    /// file; each `form` entry becomes a text part. `query` replaces the query
    /// parameters. Every failure is logged once and returned.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::File`] for an unreadable file, and the failures of
    /// [`post_json`](Self::post_json) otherwise.
    pub async fn upload<F, FK, FP, G, GK, GV, Q, QK, QV>(
        &mut self,
        path: &str,
        files: F,
        form: G,
        query: Q,
    ) -> Result<serde_json::Value, HttpError>
    where
        F: IntoIterator<Item = (FK, FP)>,
        FK: Into<String>,
        FP: Into<PathBuf>,
        G: IntoIterator<Item = (GK, GV)>,
        GK: Into<String>,
        GV: Into<String>,
        Q: IntoIterator<Item = (QK, QV)>,
        QK: Into<String>,
        QV: Into<String>,
    {
        let parts = files
            .into_iter()
            .map(|(name, file)| MultipartPart::file(name, file))
            .chain(
                form.into_iter()
                    .map(|(name, contents)| MultipartPart::text(name, contents)),
            );

        self.with_query(query).with_multipart(parts);

        let result = self.post_json(path).await;
        if let Err(error) = &result {
            // transport and decoding failures are already logged by request()
            if error.is_invalid_request() {
                tracing::error!("Upload to {} failed: {}", self.url(path), error);
            }
        }
        result
    }

    fn url(&self, path: &str) -> String {
        self.base_url.join(&self.base_path, path)
    }

    /// Returns the underlying client, building it on first use.
    fn ensure_client(&mut self) -> Result<reqwest::Client, HttpError> {
        if let Some(client) = &self.client {
            return Ok(client.clone());
        }

        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(self.config.timeout())
            .user_agent(self.user_agent())
            .default_headers(default_headers())
            .build()?;

        tracing::debug!(
            "Built HTTP client for {} with timeout {:?}",
            self.base_url,
            self.config.timeout()
        );

        self.client = Some(client.clone());
        Ok(client)
    }
}

fn default_headers() -> reqwest::header::HeaderMap {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::ACCEPT,
        reqwest::header::HeaderValue::from_static("application/json"),
    );
    headers
}

fn collect_pairs<I, K, V>(data: I) -> std::collections::HashMap<String, String>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    data.into_iter()
        .map(|(key, value)| (key.into(), value.into()))
        .collect()
}

async fn execute(
    client: reqwest::Client,
    method: HttpMethod,
    url: &str,
    options: RequestOptions,
) -> Result<HttpResponse, HttpError> {
    let request = options
        .apply(client.request(method.to_reqwest(), url))
        .await?;
    let response = request.send().await?;
    Ok(HttpResponse::from_reqwest(response).await?)
}
