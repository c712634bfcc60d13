//! Outgoing HTTP response type and the [`IntoResponse`] conversion trait.
//!
//! A response is *written* once it has a body, even an empty one set on
//! purpose via [`ResponseBuilder::no_body`]. [`Response::status`] alone only
//! picks a status code and leaves the response unwritten, which is what lets
//! the [`ErrorReporter`](crate::middleware::ErrorReporter) fill it in later.

use bytes::Bytes;
use http::StatusCode;
use http::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use http_body_util::Full;
use tracing::warn;

const JSON: &str = "application/json";
const TEXT: &str = "text/plain; charset=utf-8";
const OCTET_STREAM: &str = "application/octet-stream";

// ── Response ─────────────────────────────────────────────────────────────────

/// An outgoing HTTP response.
///
/// # Shortcuts (200 OK, no custom headers needed)
///
/// ```rust
/// use http::StatusCode;
/// use reqlog::Response;
///
/// Response::json(br#"{"id":1}"#.to_vec());
/// Response::text("hello");
/// Response::status(StatusCode::NO_CONTENT);
/// ```
///
/// # Builder (custom status or headers)
///
/// ```rust
/// use http::StatusCode;
/// use reqlog::Response;
///
/// Response::builder()
///     .status(StatusCode::CREATED)
///     .header("location", "/users/42")
///     .json(br#"{"id":42}"#.to_vec());
/// ```
#[derive(Debug)]
pub struct Response {
    pub(crate) body: Option<Vec<u8>>,
    pub(crate) headers: HeaderMap,
    pub(crate) status: StatusCode,
}

impl Response {
    /// `200 OK`, `application/json`.
    pub fn json(body: Vec<u8>) -> Self {
        Self::builder().json(body)
    }

    /// `200 OK`, `text/plain; charset=utf-8`.
    pub fn text(body: impl Into<String>) -> Self {
        Self::builder().text(body)
    }

    /// Status only. Nothing is written yet.
    pub fn status(code: StatusCode) -> Self {
        Self { body: None, headers: HeaderMap::new(), status: code }
    }

    /// Builder for responses that need a custom status or extra headers.
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder { headers: HeaderMap::new(), status: StatusCode::OK }
    }

    pub fn status_code(&self) -> StatusCode { self.status }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &[u8] { self.body.as_deref().unwrap_or_default() }

    /// Whether a body has been set.
    pub fn is_written(&self) -> bool {
        self.body.is_some()
    }

    /// Case-insensitive header lookup; the first value wins. Values that are
    /// not visible ASCII read as absent here; use [`headers`](Self::headers)
    /// for the raw bytes.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Set a header from text, replacing every existing value with the same
    /// name. An invalid name or value is dropped with a warning.
    pub fn set_header(&mut self, name: &str, value: &str) {
        if let Some((name, value)) = parse_header(name, value) {
            self.headers.insert(name, value);
        }
    }

    /// Set a header from an already-valid value, byte for byte, replacing
    /// every existing value with the same name.
    pub fn insert_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    /// Write a JSON body and keep the current status code.
    pub(crate) fn write_json(&mut self, body: Vec<u8>) {
        self.headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON));
        self.body = Some(body);
    }

    /// Convert into the hyper representation.
    pub(crate) fn into_inner(self) -> http::Response<Full<Bytes>> {
        let mut res = http::Response::new(Full::new(Bytes::from(self.body.unwrap_or_default())));
        *res.status_mut() = self.status;
        *res.headers_mut() = self.headers;
        res
    }
}

/// Headers come in as text from handlers; a typo must not fail the response.
fn parse_header(name: &str, value: &str) -> Option<(HeaderName, HeaderValue)> {
    match (HeaderName::try_from(name), HeaderValue::try_from(value)) {
        (Ok(n), Ok(v)) => Some((n, v)),
        _ => {
            warn!(header = %name, "dropping invalid response header");
            None
        }
    }
}

// ── ResponseBuilder ───────────────────────────────────────────────────────────

/// Fluent builder for [`Response`].
///
/// Obtain via [`Response::builder()`]. Defaults to `200 OK`.
/// Terminated by a body method, so a built response is always written.
pub struct ResponseBuilder {
    headers: HeaderMap,
    status: StatusCode,
}

impl ResponseBuilder {
    pub fn status(mut self, code: StatusCode) -> Self {
        self.status = code;
        self
    }

    /// Append a header. An invalid name or value is dropped with a warning.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let Some((name, value)) = parse_header(name, value) {
            self.headers.append(name, value);
        }
        self
    }

    /// Terminate with a JSON body (`application/json`).
    pub fn json(self, body: Vec<u8>) -> Response {
        self.finish(HeaderValue::from_static(JSON), body)
    }

    /// Terminate with a plain-text body (`text/plain; charset=utf-8`).
    pub fn text(self, body: impl Into<String>) -> Response {
        self.finish(HeaderValue::from_static(TEXT), body.into().into_bytes())
    }

    /// Terminate with a body of any content type. An unparseable content
    /// type falls back to `application/octet-stream`.
    pub fn bytes(self, content_type: &str, body: Vec<u8>) -> Response {
        let content_type = HeaderValue::try_from(content_type)
            .unwrap_or_else(|_| HeaderValue::from_static(OCTET_STREAM));
        self.finish(content_type, body)
    }

    /// Terminate with an intentionally empty body (e.g. `204`, `301`).
    pub fn no_body(self) -> Response {
        Response { body: Some(Vec::new()), headers: self.headers, status: self.status }
    }

    /// A content type set explicitly through [`header`](Self::header) wins.
    fn finish(mut self, content_type: HeaderValue, body: Vec<u8>) -> Response {
        self.headers.entry(CONTENT_TYPE).or_insert(content_type);
        Response { body: Some(body), headers: self.headers, status: self.status }
    }
}

// ── IntoResponse ──────────────────────────────────────────────────────────────

/// Conversion into an HTTP [`Response`].
///
/// Implement on your own types to return them directly from handlers.
pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response { self }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Response { Response::text(self) }
}

impl IntoResponse for String {
    fn into_response(self) -> Response { Response::text(self) }
}

/// Return a status directly from a handler: `return StatusCode::NOT_FOUND`.
/// The response stays unwritten.
impl IntoResponse for StatusCode {
    fn into_response(self) -> Response { Response::status(self) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_only_is_not_written() {
        let res = Response::status(StatusCode::BAD_REQUEST);
        assert!(!res.is_written());
        assert!(res.body().is_empty());
    }

    #[test]
    fn bodies_mark_the_response_written() {
        assert!(Response::text("hi").is_written());
        assert!(Response::json(b"{}".to_vec()).is_written());
        assert!(Response::builder().status(StatusCode::NO_CONTENT).no_body().is_written());
    }

    #[test]
    fn set_header_replaces_case_insensitively() {
        let mut res = Response::builder().header("X-Reqid", "old").text("hi");
        res.set_header("x-reqid", "new");

        assert_eq!(res.header("X-REQID"), Some("new"));
        assert_eq!(res.headers().get_all("x-reqid").iter().count(), 1);
    }

    #[test]
    fn insert_header_keeps_non_ascii_bytes() {
        let mut res = Response::status(StatusCode::OK);
        let value = HeaderValue::from_bytes("café".as_bytes()).unwrap();
        res.insert_header(HeaderName::from_static("x-reqid"), value);

        assert_eq!(res.headers().get("x-reqid").unwrap().as_bytes(), "café".as_bytes());
        assert_eq!(res.header("x-reqid"), None);
    }

    #[test]
    fn write_json_keeps_status() {
        let mut res = Response::status(StatusCode::UNPROCESSABLE_ENTITY);
        res.write_json(b"[]".to_vec());

        assert!(res.is_written());
        assert_eq!(res.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(res.header("content-type"), Some(JSON));
    }

    #[test]
    fn invalid_headers_are_dropped() {
        let res = Response::builder()
            .header("x-ok", "1")
            .header("bad header", "2")
            .header("x-bad-value", "line\nbreak")
            .text("hi");

        assert_eq!(res.header("x-ok"), Some("1"));
        assert_eq!(res.headers().len(), 2); // content-type + x-ok
    }

    #[test]
    fn explicit_content_type_wins() {
        let res = Response::builder()
            .header("content-type", "application/problem+json")
            .json(b"{}".to_vec());

        assert_eq!(res.header("content-type"), Some("application/problem+json"));
        assert_eq!(res.headers().get_all("content-type").iter().count(), 1);
    }

    #[test]
    fn into_inner_carries_status_headers_and_body() {
        let res = Response::builder()
            .status(StatusCode::CREATED)
            .header("location", "/users/42")
            .json(b"{}".to_vec())
            .into_inner();

        assert_eq!(res.status(), StatusCode::CREATED);
        assert_eq!(res.headers().get("location").unwrap(), "/users/42");
        assert_eq!(res.headers().get("content-type").unwrap(), JSON);
    }
}
