//! Fallback JSON body for recorded request errors.

use tracing::error;

use crate::errors::ErrorKind;
use crate::handler::BoxFuture;
use crate::middleware::{Middleware, Next};
use crate::request::Request;

/// Writes recorded errors as a JSON array when the handler wrote nothing.
///
/// After the rest of the pipeline returns, if the response is still
/// unwritten and the request has errors matching the configured kind, the
/// body becomes `[{"error": "..."}, ...]`. The status code the handler chose
/// is kept. A written response is never touched.
///
/// ```rust,no_run
/// use reqlog::{ErrorKind, Router};
/// use reqlog::middleware::ErrorReporter;
///
/// let app = Router::new().layer(ErrorReporter::for_kind(ErrorKind::PUBLIC));
/// ```
#[derive(Clone, Copy, Debug)]
pub struct ErrorReporter {
    kind: ErrorKind,
}

impl ErrorReporter {
    /// Reports errors of every kind.
    pub fn new() -> Self {
        Self::for_kind(ErrorKind::ANY)
    }

    pub fn for_kind(kind: ErrorKind) -> Self {
        Self { kind }
    }
}

impl Default for ErrorReporter {
    fn default() -> Self { Self::new() }
}

impl Middleware for ErrorReporter {
    fn handle(&self, req: Request, next: Next) -> BoxFuture {
        let kind = self.kind;
        Box::pin(async move {
            let errors = req.errors().clone();
            let mut res = next.run(req).await;
            if res.is_written() {
                return res;
            }

            let matching = errors.by_kind(kind);
            if matching.is_empty() {
                return res;
            }
            match serde_json::to_vec(&matching) {
                Ok(body) => res.write_json(body),
                Err(e) => error!("failed to serialize request errors: {e}"),
            }
            res
        })
    }
}
