//! Access log configuration.
//!
//! Built in code with the builder methods, or loaded once at startup with
//! [`LoggerConfig::from_env`]:
//!
//! ```bash
//! export REQLOG_SKIP_PATHS="/healthz,/readyz"   # no access log for health checks
//! export REQLOG_TAG="API"                       # [API] [<id>] [Route Start] ...
//! ```

use std::collections::HashSet;
use std::env;
use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

/// Default tag at the start of every access log line.
pub const DEFAULT_TAG: &str = "HTTP";

/// Where access log lines go. Shared by every in-flight request.
pub type Sink = Arc<Mutex<dyn Write + Send>>;

/// Configuration for the [`Logger`](crate::middleware::Logger) middleware.
#[derive(Clone)]
pub struct LoggerConfig {
    pub(crate) sink: Sink,
    pub(crate) skip_paths: HashSet<String>,
    pub(crate) tag: String,
}

impl LoggerConfig {
    /// Stdout, nothing skipped, tag [`DEFAULT_TAG`].
    pub fn new() -> Self {
        Self {
            sink: Arc::new(Mutex::new(io::stdout())),
            skip_paths: HashSet::new(),
            tag: DEFAULT_TAG.to_owned(),
        }
    }

    /// Defaults overridden by `REQLOG_SKIP_PATHS` (comma separated) and
    /// `REQLOG_TAG`. Unset or empty variables keep the default.
    pub fn from_env() -> Self {
        let mut config = Self::new();
        if let Ok(paths) = env::var("REQLOG_SKIP_PATHS") {
            config.skip_paths = parse_skip_paths(&paths);
        }
        if let Ok(tag) = env::var("REQLOG_TAG") {
            if !tag.trim().is_empty() {
                config.tag = tag.trim().to_owned();
            }
        }
        config
    }

    /// Write lines to `out` (a file, a socket, a buffer, ...).
    pub fn output(self, out: impl Write + Send + 'static) -> Self {
        self.shared_output(Arc::new(Mutex::new(out)))
    }

    /// Write lines to a sink the caller keeps a handle to.
    pub fn shared_output(mut self, sink: Sink) -> Self {
        self.sink = sink;
        self
    }

    /// Request URIs (path plus query) that produce no access log lines.
    pub fn skip_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip_paths.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    pub fn is_skipped(&self, request_uri: &str) -> bool {
        self.skip_paths.contains(request_uri)
    }

    /// Best effort: a failing sink must never fail the request.
    pub(crate) fn write_line(&self, line: &str) {
        let mut out = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = out.write_all(line.as_bytes());
        let _ = out.flush();
    }
}

impl Default for LoggerConfig {
    fn default() -> Self { Self::new() }
}

impl fmt::Debug for LoggerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerConfig")
            .field("skip_paths", &self.skip_paths)
            .field("tag", &self.tag)
            .finish_non_exhaustive()
    }
}

fn parse_skip_paths(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_owned)
        .collect()
}
