//! Request types for the request builder.
//!
//! This module provides [`HttpMethod`] and [`RequestOptions`], the mutable
//! option set a [`RequestBuilder`](crate::RequestBuilder) accumulates before
//! dispatch, together with the multipart part types.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use reqwest::multipart::{Form, Part};

use crate::clients::errors::{HttpError, InvalidHttpRequestError};

/// HTTP methods supported by the request builder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// HTTP GET method.
    Get,
    /// HTTP POST method.
    Post,
    /// HTTP PUT method.
    Put,
    /// HTTP DELETE method.
    Delete,
}

impl HttpMethod {
    /// Returns the method name as sent on the wire.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }

    pub(crate) fn to_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Delete => reqwest::Method::DELETE,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = InvalidHttpRequestError;

    /// Parses a method name case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "DELETE" => Ok(Self::Delete),
            _ => Err(InvalidHttpRequestError::InvalidMethod {
                method: s.to_string(),
            }),
        }
    }
}

/// The body encodings a request can carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BodyMode {
    /// A JSON document (`application/json`).
    Json,
    /// Urlencoded form fields (`application/x-www-form-urlencoded`).
    Form,
    /// A `multipart/form-data` body.
    Multipart,
}

impl fmt::Display for BodyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => f.write_str("json"),
            Self::Form => f.write_str("form"),
            Self::Multipart => f.write_str("multipart"),
        }
    }
}

/// The content of a multipart part.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PartContents {
    /// Literal text.
    Text(String),
    /// Literal bytes.
    Bytes(Vec<u8>),
    /// A file streamed from disk when the request is sent.
    File(PathBuf),
}

/// A named segment of a multipart body.
///
/// # Example
///
/// ```rust
/// use fluent_request::clients::{MultipartPart, PartContents};
///
/// let part = MultipartPart::file("avatar", "/tmp/avatar.png");
/// assert_eq!(part.name, "avatar");
/// assert!(matches!(part.contents, PartContents::File(_)));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MultipartPart {
    /// The form field name.
    pub name: String,
    /// The part content.
    pub contents: PartContents,
}

impl MultipartPart {
    /// Creates a text part.
    #[must_use]
    pub fn text(name: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contents: PartContents::Text(contents.into()),
        }
    }

    /// Creates a part from raw bytes.
    #[must_use]
    pub fn bytes(name: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            contents: PartContents::Bytes(contents.into()),
        }
    }

    /// Creates a part that streams the file at `path`.
    #[must_use]
    pub fn file(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            contents: PartContents::File(path.into()),
        }
    }

    async fn into_reqwest(self) -> Result<(String, Part), HttpError> {
        let part = match self.contents {
            PartContents::Text(text) => Part::text(text),
            PartContents::Bytes(bytes) => Part::bytes(bytes),
            PartContents::File(path) => open_file_part(&path).await?,
        };
        Ok((self.name, part))
    }
}

async fn open_file_part(path: &Path) -> Result<Part, HttpError> {
    let to_error = |source| HttpError::File {
        path: path.to_path_buf(),
        source,
    };

    let file = tokio::fs::File::open(path).await.map_err(to_error)?;
    let length = file.metadata().await.map_err(to_error)?.len();

    let part = Part::stream_with_length(file, length);
    Ok(match path.file_name() {
        Some(file_name) => part.file_name(file_name.to_string_lossy().into_owned()),
        None => part,
    })
}

/// Options accumulated for a request.
///
/// At most one body encoding should be set; [`RequestOptions::verify`]
/// enforces this before any request is sent.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RequestOptions {
    /// Basic-auth username and password.
    pub auth: Option<(String, String)>,
    /// JSON body.
    pub json: Option<serde_json::Value>,
    /// Query parameters appended to the URL.
    pub query: Option<HashMap<String, String>>,
    /// Urlencoded form body.
    pub form_params: Option<HashMap<String, String>>,
    /// Multipart body parts.
    pub multipart: Option<Vec<MultipartPart>>,
    /// Headers keyed by lowercased name; a key may hold several values.
    pub headers: Option<HashMap<String, Vec<String>>>,
}

impl RequestOptions {
    /// Returns the body encodings currently set, in a fixed order.
    #[must_use]
    pub fn body_modes(&self) -> Vec<BodyMode> {
        let mut modes = Vec::new();
        if self.json.is_some() {
            modes.push(BodyMode::Json);
        }
        if self.form_params.is_some() {
            modes.push(BodyMode::Form);
        }
        if self.multipart.is_some() {
            modes.push(BodyMode::Multipart);
        }
        modes
    }

    /// Checks that exactly one body encoding is set.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidHttpRequestError::MissingBody`] when none is set and
    /// [`InvalidHttpRequestError::AmbiguousBody`] when several are.
    pub fn check_data(&self) -> Result<(), InvalidHttpRequestError> {
        if self.body_modes().is_empty() {
            return Err(InvalidHttpRequestError::MissingBody);
        }
        self.verify()
    }

    /// Checks that at most one body encoding is set.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidHttpRequestError::AmbiguousBody`] when several are set.
    pub fn verify(&self) -> Result<(), InvalidHttpRequestError> {
        let modes = self.body_modes();
        if modes.len() > 1 {
            let modes: Vec<String> = modes.iter().map(ToString::to_string).collect();
            return Err(InvalidHttpRequestError::AmbiguousBody {
                modes: modes.join(" and "),
            });
        }
        Ok(())
    }

    /// Ensures the header map exists and returns it.
    pub fn headers_mut(&mut self) -> &mut HashMap<String, Vec<String>> {
        self.headers.get_or_insert_with(HashMap::new)
    }

    /// Replaces every value of `key` with `value`; names match case-insensitively.
    pub fn set_header(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.headers_mut()
            .insert(header_key(key.into()), vec![value.into()]);
    }

    /// Appends the given values to the existing ones; nothing is overwritten.
    pub fn merge_headers<I, K, V>(&mut self, headers: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let existing = self.headers_mut();
        for (key, value) in headers {
            existing
                .entry(header_key(key.into()))
                .or_default()
                .push(value.into());
        }
    }

    /// Returns the values stored for a header name, matched case-insensitively.
    #[must_use]
    pub fn header_values(&self, key: &str) -> Option<&[String]> {
        self.headers
            .as_ref()
            .and_then(|headers| headers.get(&key.to_ascii_lowercase()))
            .map(Vec::as_slice)
    }

    /// Applies these options to a reqwest request, opening upload files.
    pub(crate) async fn apply(
        &self,
        mut request: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder, HttpError> {
        self.verify()?;

        // form and multipart bodies carry their own content type
        let body_sets_content_type = self.form_params.is_some() || self.multipart.is_some();

        if let Some(headers) = &self.headers {
            for (key, values) in headers {
                if body_sets_content_type && key.eq_ignore_ascii_case("content-type") {
                    continue;
                }
                for value in values {
                    request = request.header(key.as_str(), value.as_str());
                }
            }
        }

        if let Some((user, password)) = &self.auth {
            request = request.basic_auth(user, Some(password));
        }

        if let Some(query) = self.query.as_ref().filter(|query| !query.is_empty()) {
            request = request.query(query);
        }

        if let Some(json) = &self.json {
            request = request.json(json);
        } else if let Some(form) = &self.form_params {
            request = request.form(form);
        } else if let Some(parts) = &self.multipart {
            let mut form = Form::new();
            for part in parts.iter().cloned() {
                let (name, part) = part.into_reqwest().await?;
                form = form.part(name, part);
            }
            request = request.multipart(form);
        }

        Ok(request)
    }
}

/// Header names compare case-insensitively; they are stored lowercased.
fn header_key(mut key: String) -> String {
    key.make_ascii_lowercase();
    key
}
