//! Errors attached to a request while it is being handled.
//!
//! Handlers and middleware record problems with [`Request::push_error`]
//! instead of (or in addition to) shaping the response themselves. The
//! access log prints the [`ErrorKind::PRIVATE`] ones; the
//! [`ErrorReporter`](crate::middleware::ErrorReporter) turns the rest into a
//! JSON body when nobody wrote one.
//!
//! [`Request::push_error`]: crate::Request::push_error

use std::fmt::{self, Write as _};
use std::ops::BitOr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

// ── ErrorKind ─────────────────────────────────────────────────────────────────

/// Classification bit set for a [`RequestError`].
///
/// Filters are bit sets too: an error matches a filter when they share at
/// least one bit, so `PRIVATE | PUBLIC` selects both and `ANY` selects all.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct ErrorKind(u64);

impl ErrorKind {
    /// Failed to bind request input (body, query, params).
    pub const BIND: Self = Self(1 << 63);
    /// Failed to render the response.
    pub const RENDER: Self = Self(1 << 62);
    /// Internal detail: logged, not meant for the client.
    pub const PRIVATE: Self = Self(1 << 0);
    /// Safe to show to the client.
    pub const PUBLIC: Self = Self(1 << 1);
    /// Every kind.
    pub const ANY: Self = Self(u64::MAX);

    pub fn matches(self, filter: ErrorKind) -> bool {
        self.0 & filter.0 != 0
    }
}

impl BitOr for ErrorKind {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

// ── RequestError ──────────────────────────────────────────────────────────────

/// One error recorded against a request.
///
/// Serializes as a JSON object:
///
/// - no metadata: `{"error": "<message>"}`
/// - object metadata: its keys, plus `"error"` unless the metadata already
///   has one, so `json!({"field": "email"})` gives
///   `{"error": "<message>", "field": "email"}`
/// - any other metadata: `{"error": "<message>", "meta": <value>}`
///
/// The kind is never serialized.
#[derive(Clone, Debug)]
pub struct RequestError {
    message: String,
    kind: ErrorKind,
    meta: Option<Value>,
}

impl RequestError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { message: message.into(), kind, meta: None }
    }

    pub fn private(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::PRIVATE, message)
    }

    pub fn public(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::PUBLIC, message)
    }

    /// Attach structured metadata, e.g. `json!({"field": "email"})`.
    pub fn with_meta(mut self, meta: Value) -> Self {
        self.meta = Some(meta);
        self
    }

    pub fn message(&self) -> &str { &self.message }
    pub fn kind(&self) -> ErrorKind { self.kind }
    pub fn meta(&self) -> Option<&Value> { self.meta.as_ref() }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for RequestError {}

impl Serialize for RequestError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut object = match &self.meta {
            Some(Value::Object(fields)) => fields.clone(),
            Some(other) => Map::from_iter([("meta".to_owned(), other.clone())]),
            None => Map::new(),
        };
        object
            .entry("error")
            .or_insert_with(|| Value::String(self.message.clone()));
        object.serialize(serializer)
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

/// The error list of one request.
///
/// A clone is another handle to the same list. Middleware keeps a clone so
/// it can still read what downstream handlers recorded after the request
/// itself has been moved into [`Next::run`](crate::middleware::Next::run).
#[derive(Clone, Debug, Default)]
pub struct Errors(Arc<Mutex<Vec<RequestError>>>);

impl Errors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, err: RequestError) {
        self.lock().push(err);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Every recorded error matching `filter`, in insertion order.
    pub fn by_kind(&self, filter: ErrorKind) -> Vec<RequestError> {
        self.lock()
            .iter()
            .filter(|e| e.kind.matches(filter))
            .cloned()
            .collect()
    }

    /// Human-readable listing of the errors matching `filter`, one block each:
    ///
    /// ```text
    /// Error #01: connection refused
    ///      Meta: {"db":"primary"}
    /// ```
    ///
    /// Empty when nothing matches.
    pub fn comment(&self, filter: ErrorKind) -> String {
        let mut out = String::new();
        for (i, err) in self.by_kind(filter).iter().enumerate() {
            // Writing into a String cannot fail.
            let _ = writeln!(out, "Error #{:02}: {}", i + 1, err.message);
            if let Some(meta) = &err.meta {
                let _ = writeln!(out, "     Meta: {meta}");
            }
        }
        out
    }

    // A panicking handler must not take the access log down with it.
    fn lock(&self) -> MutexGuard<'_, Vec<RequestError>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
