//! HTTP response type returned by the request builder.

use std::borrow::Cow;
use std::collections::HashMap;

/// A response received from the target service.
///
/// Holds the status code, the headers (lowercased names, possibly several
/// values each), and the raw body.
///
/// # Example
///
/// ```rust
/// use fluent_request::HttpResponse;
/// use std::collections::HashMap;
///
/// let response = HttpResponse::new(200, HashMap::new(), br#"{"ok":true}"#.to_vec());
/// assert!(response.is_ok());
/// assert_eq!(response.json().unwrap(), serde_json::json!({"ok": true}));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    /// The HTTP status code.
    pub code: u16,
    /// Response headers (headers may have multiple values).
    pub headers: HashMap<String, Vec<String>>,
    /// The raw response body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Creates a new `HttpResponse`.
    #[must_use]
    pub const fn new(code: u16, headers: HashMap<String, Vec<String>>, body: Vec<u8>) -> Self {
        Self {
            code,
            headers,
            body,
        }
    }

    pub(crate) async fn from_reqwest(response: reqwest::Response) -> Result<Self, reqwest::Error> {
        let code = response.status().as_u16();
        let headers = Self::parse_response_headers(response.headers());
        let body = response.bytes().await?.to_vec();
        Ok(Self::new(code, headers, body))
    }

    /// Parses response headers into a `HashMap`.
    fn parse_response_headers(
        headers: &reqwest::header::HeaderMap,
    ) -> HashMap<String, Vec<String>> {
        let mut result: HashMap<String, Vec<String>> = HashMap::new();
        for (name, value) in headers {
            let key = name.as_str().to_lowercase();
            let value = value.to_str().unwrap_or_default().to_string();
            result.entry(key).or_default().push(value);
        }
        result
    }

    /// Returns `true` if the response status code is in the 2xx range.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.code >= 200 && self.code <= 299
    }

    /// Returns the first value of a header, matched case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_lowercase())
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Returns the body as text, replacing invalid UTF-8.
    #[must_use]
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Decodes the body as a JSON value.
    ///
    /// # Errors
    ///
    /// Returns the decoding error if the body is not valid JSON. An empty
    /// body is not valid JSON.
    pub fn json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}
