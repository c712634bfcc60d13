//! Incoming HTTP request type.

use std::collections::HashMap;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::{Method, Uri};

use crate::errors::{Errors, RequestError};

/// An incoming HTTP request plus the per-request state middleware shares.
pub struct Request {
    pub(crate) method: Method,
    pub(crate) uri: Uri,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Bytes,
    pub(crate) params: HashMap<String, String>,
    pub(crate) remote_addr: SocketAddr,
    pub(crate) request_id: Option<String>,
    pub(crate) errors: Errors,
}

impl Request {
    /// A bodyless request. The server builds requests itself; this exists so
    /// handlers and middleware can be driven directly in tests.
    pub fn new(method: Method, uri: Uri, remote_addr: SocketAddr) -> Self {
        Self {
            method,
            uri,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            params: HashMap::new(),
            remote_addr,
            request_id: None,
            errors: Errors::new(),
        }
    }

    pub(crate) fn from_parts(
        parts: http::request::Parts,
        body: Bytes,
        remote_addr: SocketAddr,
    ) -> Self {
        Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
            params: HashMap::new(),
            remote_addr,
            request_id: None,
            errors: Errors::new(),
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn method(&self) -> &Method { &self.method }
    pub fn uri(&self) -> &Uri { &self.uri }
    pub fn path(&self) -> &str { self.uri.path() }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }
    pub fn remote_addr(&self) -> SocketAddr { self.remote_addr }

    /// Path plus query string, as sent on the request line (`/users?page=2`).
    pub fn request_uri(&self) -> &str {
        self.uri
            .path_and_query()
            .map_or_else(|| self.uri.path(), |pq| pq.as_str())
    }

    /// Case-insensitive header lookup. Values that are not visible ASCII are
    /// treated as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/{id}`, `req.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Best guess at the client address behind a reverse proxy.
    ///
    /// First parseable entry of `X-Forwarded-For`, then `X-Real-IP`, then the
    /// socket peer. Only meaningful when the proxy in front overwrites these
    /// headers; a client talking to the service directly can forge them.
    pub fn client_ip(&self) -> IpAddr {
        let forwarded = self
            .header("x-forwarded-for")
            .and_then(|v| v.split(',').next())
            .and_then(|v| v.trim().parse().ok());

        forwarded
            .or_else(|| self.header("x-real-ip").and_then(|v| v.trim().parse().ok()))
            .unwrap_or_else(|| self.remote_addr.ip())
    }

    /// The id the [`Logger`](crate::middleware::Logger) resolved for this
    /// request. `None` when no logger runs in front of the handler.
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    /// Errors recorded so far. Cloning the handle shares the list.
    pub fn errors(&self) -> &Errors {
        &self.errors
    }

    /// Record an error against this request.
    pub fn push_error(&self, err: RequestError) {
        self.errors.push(err);
    }
}

// Bodies can be large and binary; print the length only.
impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("uri", &self.uri)
            .field("headers", &self.headers)
            .field("body_len", &self.body.len())
            .field("remote_addr", &self.remote_addr)
            .finish_non_exhaustive()
    }
}
