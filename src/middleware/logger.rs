//! Request id + colored access log.
//!
//! Two lines per request, one before the handler runs and one after:
//!
//! ```text
//! [HTTP] [aBcD...] [Route Start]	2026/10/19 - 14:03:07 |<blue>  <reset> GET     /users
//! [HTTP] [aBcD...] [Route End]	2026/10/19 - 14:03:07 |<green> 201 <reset>|    1.204312ms | 10.0.0.9 |<blue>  <reset> GET     /users
//! ```
//!
//! The end line is followed by the request's private errors, if any.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use http::header::{HeaderName, HeaderValue};
use http::{Method, StatusCode};
use tracing::{Instrument, debug, info_span};

use crate::color::Color;
use crate::config::LoggerConfig;
use crate::errors::ErrorKind;
use crate::handler::BoxFuture;
use crate::middleware::{Middleware, Next};
use crate::reqid::Seed;
use crate::request::Request;
use crate::response::Response;

/// Header carrying the request id, inbound and outbound.
pub const REQUEST_ID_HEADER: &str = "X-Reqid";

const TIME_FORMAT: &str = "%Y/%m/%d - %H:%M:%S";

/// Access log middleware.
///
/// For every request it resolves a request id (the inbound `X-Reqid` header,
/// or a fresh one from its [`Seed`]), exposes it via
/// [`Request::request_id`], echoes it byte for byte in the `X-Reqid`
/// response header and, unless the request URI is in the skip-set, writes a
/// start and an end line to the configured sink.
///
/// Downstream work runs inside a `request` tracing span tagged with the id,
/// so `tracing` events from handlers correlate with the access log.
#[derive(Clone)]
pub struct Logger {
    inner: Arc<Inner>,
}

struct Inner {
    config: LoggerConfig,
    seed: Seed,
}

impl Logger {
    /// Logs everything to stdout.
    pub fn new() -> Self {
        Self::with_config(LoggerConfig::new())
    }

    /// Logs to `out`, except for requests to `skip_paths`.
    pub fn with_writer<I, S>(out: impl std::io::Write + Send + 'static, skip_paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_config(LoggerConfig::new().output(out).skip_paths(skip_paths))
    }

    /// Uses the process-wide [`Seed::process`], so every logger in the
    /// process mints ids with the same prefix.
    pub fn with_config(config: LoggerConfig) -> Self {
        Self::with_seed(config, Seed::process())
    }

    /// Uses a caller-chosen seed, e.g. [`Seed::from_raw`] in tests.
    pub fn with_seed(config: LoggerConfig, seed: Seed) -> Self {
        Self { inner: Arc::new(Inner { config, seed }) }
    }

    pub fn config(&self) -> &LoggerConfig {
        &self.inner.config
    }

    pub fn seed(&self) -> Seed {
        self.inner.seed
    }
}

impl Default for Logger {
    fn default() -> Self { Self::new() }
}

impl Middleware for Logger {
    fn handle(&self, req: Request, next: Next) -> BoxFuture {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move { inner.log(req, next).await })
    }
}

impl Inner {
    async fn log(&self, mut req: Request, next: Next) -> Response {
        let started = Instant::now();
        let start = Local::now();

        let (id_value, id) = self.resolve_id(&req);
        req.request_id = Some(id.clone());

        let uri = req.request_uri().to_owned();
        let method = req.method().clone();
        let client_ip = req.client_ip();
        let errors = req.errors().clone();
        let logged = !self.config.is_skipped(&uri);

        let span = info_span!("request", reqid = %id, %method, uri = %uri);
        if logged {
            self.config.write_line(&start_line(&self.config.tag, &id, &start, &method, &uri));
            debug!(parent: &span, request = ?req, "route start");
        }

        let mut res = next.run(req).instrument(span).await;
        res.insert_header(HeaderName::from_static("x-reqid"), id_value);

        if logged {
            let end = EndLine {
                tag: &self.config.tag,
                id: &id,
                at: Local::now(),
                status: res.status_code(),
                latency: started.elapsed(),
                client_ip,
                method: &method,
                uri: &uri,
                comment: errors.comment(ErrorKind::PRIVATE),
            };
            self.config.write_line(&end.render());
        }
        res
    }

    /// The id as it goes on the wire, and a printable form for the log.
    ///
    /// An inbound header is reused as is, even when it is not visible ASCII;
    /// only a missing or empty one is replaced.
    fn resolve_id(&self, req: &Request) -> (HeaderValue, String) {
        if let Some(value) = req.headers().get(REQUEST_ID_HEADER).filter(|v| !v.is_empty()) {
            let printable = String::from_utf8_lossy(value.as_bytes()).into_owned();
            return (value.clone(), printable);
        }

        let id = self.seed.generate();
        match HeaderValue::try_from(id.as_str()) {
            Ok(value) => (value, id),
            Err(_) => unreachable!("URL-safe base64 id {id:?} is always a valid header value"),
        }
    }
}

fn start_line(tag: &str, id: &str, at: &DateTime<Local>, method: &Method, uri: &str) -> String {
    format!(
        "[{tag}] [{id}] [Route Start]\t{} |{}  {} {:<7} {uri}\n",
        at.format(TIME_FORMAT),
        Color::for_method(method),
        Color::Reset,
        method.as_str(),
    )
}

struct EndLine<'a> {
    tag: &'a str,
    id: &'a str,
    at: DateTime<Local>,
    status: StatusCode,
    latency: Duration,
    client_ip: IpAddr,
    method: &'a Method,
    uri: &'a str,
    comment: String,
}

impl EndLine<'_> {
    fn render(&self) -> String {
        format!(
            "[{}] [{}] [Route End]\t{} |{} {:>3} {}| {:>13} | {} |{}  {} {:<7} {}\n{}",
            self.tag,
            self.id,
            self.at.format(TIME_FORMAT),
            Color::for_status(self.status),
            self.status.as_u16(),
            Color::Reset,
            format!("{:?}", self.latency),
            self.client_ip,
            Color::for_method(self.method),
            Color::Reset,
            self.method.as_str(),
            self.uri,
            self.comment,
        )
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE;
    use chrono::TimeZone;

    use super::*;
    use crate::config::Sink;
    use crate::errors::RequestError;
    use crate::router::Router;

    fn capture() -> (Arc<Mutex<Vec<u8>>>, Sink) {
        let buf = Arc::new(Mutex::new(Vec::new()));
        let sink: Sink = buf.clone();
        (buf, sink)
    }

    fn output(buf: &Arc<Mutex<Vec<u8>>>) -> String {
        String::from_utf8(buf.lock().unwrap().clone()).unwrap()
    }

    fn request(method: Method, uri: &str) -> Request {
        Request::new(method, uri.parse().unwrap(), "10.0.0.9:5123".parse().unwrap())
    }

    fn with_reqid(req: Request, id: &'static str) -> Request {
        req.with_header(HeaderName::from_static("x-reqid"), HeaderValue::from_static(id))
    }

    fn app(sink: Sink, skip: &[&str]) -> Router {
        let config = LoggerConfig::new()
            .shared_output(sink)
            .skip_paths(skip.iter().copied())
            .tag("TEST");

        Router::new()
            .layer(Logger::with_config(config))
            .on(Method::GET, "/users", |_req: Request| async {
                Response::builder().status(StatusCode::CREATED).json(b"{}".to_vec())
            })
            .on(Method::GET, "/health", |_req: Request| async { "ok" })
            .on(Method::GET, "/whoami", |req: Request| async move {
                req.request_id().unwrap_or_default().to_owned()
            })
            .on(Method::POST, "/fail", |req: Request| async move {
                req.push_error(RequestError::private("db down"));
                req.push_error(RequestError::public("try again"));
                StatusCode::INTERNAL_SERVER_ERROR
            })
    }

    #[tokio::test]
    async fn generates_an_id_when_the_header_is_missing() {
        let (_buf, sink) = capture();
        let res = app(sink, &[]).call(request(Method::GET, "/users")).await;

        let id = res.header(REQUEST_ID_HEADER).unwrap();
        assert!(!id.is_empty());
        assert_eq!(URL_SAFE.decode(id).unwrap().len(), 12);
    }

    #[tokio::test]
    async fn reuses_the_inbound_id_verbatim() {
        let (buf, sink) = capture();
        let req = with_reqid(request(Method::GET, "/users"), "abc123");

        let res = app(sink, &[]).call(req).await;

        assert_eq!(res.header(REQUEST_ID_HEADER), Some("abc123"));
        assert!(output(&buf).contains("[TEST] [abc123] [Route Start]"));
    }

    #[tokio::test]
    async fn echoes_non_ascii_ids_byte_for_byte() {
        let (buf, sink) = capture();
        let value = HeaderValue::from_bytes("café".as_bytes()).unwrap();
        let req = request(Method::GET, "/users")
            .with_header(HeaderName::from_static("x-reqid"), value);

        let res = app(sink, &[]).call(req).await;

        let echoed = res.headers().get(REQUEST_ID_HEADER).unwrap();
        assert_eq!(echoed.as_bytes(), "café".as_bytes());
        assert!(output(&buf).contains("[TEST] [café] [Route Start]"));
    }

    #[test]
    fn loggers_share_the_process_seed() {
        let a = Logger::new();
        let b = Logger::with_config(LoggerConfig::new().tag("OTHER"));

        assert_eq!(a.seed(), Seed::process());
        assert_eq!(b.seed(), Seed::process());
        assert_eq!(Logger::with_seed(LoggerConfig::new(), Seed::from_raw(9)).seed().value(), 9);
    }

    #[tokio::test]
    async fn generated_ids_start_with_the_logger_seed() {
        let (_buf, sink) = capture();
        let config = LoggerConfig::new().shared_output(sink);
        let app = Router::new()
            .layer(Logger::with_seed(config, Seed::from_raw(0x0403_0201)))
            .on(Method::GET, "/", |_req: Request| async { "ok" });

        let res = app.call(request(Method::GET, "/")).await;

        let raw = URL_SAFE.decode(res.header(REQUEST_ID_HEADER).unwrap()).unwrap();
        assert_eq!(&raw[..4], &[1, 2, 3, 4]);
    }

    /// Accepts at most three bytes per `write`, so one line takes many calls.
    struct Trickle(Vec<u8>);

    impl std::io::Write for Trickle {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            let n = buf.len().min(3);
            self.0.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_requests_never_interleave_lines() {
        const REQUESTS: usize = 64;

        let trickle = Arc::new(Mutex::new(Trickle(Vec::new())));
        let sink: Sink = trickle.clone();
        let app = Arc::new(app(sink, &[]));

        let mut set = tokio::task::JoinSet::new();
        for _ in 0..REQUESTS {
            let app = Arc::clone(&app);
            set.spawn(async move { app.call(request(Method::GET, "/users")).await.status_code() });
        }
        while let Some(status) = set.join_next().await {
            assert_eq!(status.unwrap(), StatusCode::CREATED);
        }

        let out = String::from_utf8(trickle.lock().unwrap().0.clone()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), REQUESTS * 2);
        for line in &lines {
            assert!(line.starts_with("[TEST] ["), "{line:?}");
            assert!(line.contains("[Route Start]\t") || line.contains("[Route End]\t"), "{line:?}");
            assert!(line.ends_with(" GET     /users"), "{line:?}");
        }
        let starts = lines.iter().filter(|l| l.contains("[Route Start]")).count();
        assert_eq!(starts, REQUESTS);
    }

    #[tokio::test]
    async fn handlers_see_the_resolved_id() {
        let (_buf, sink) = capture();
        let req = with_reqid(request(Method::GET, "/whoami"), "abc123");

        let res = app(sink, &[]).call(req).await;

        assert_eq!(res.body(), b"abc123");
    }

    #[tokio::test]
    async fn skipped_paths_log_nothing_but_keep_the_header() {
        let (buf, sink) = capture();
        let req = with_reqid(request(Method::GET, "/health"), "abc123");

        let res = app(sink, &["/health"]).call(req).await;

        assert_eq!(res.header(REQUEST_ID_HEADER), Some("abc123"));
        assert_eq!(output(&buf), "");
    }

    #[tokio::test]
    async fn skipped_paths_ignore_errors_too() {
        let (buf, sink) = capture();
        app(sink, &["/fail"]).call(request(Method::POST, "/fail")).await;
        assert_eq!(output(&buf), "");
    }

    #[tokio::test]
    async fn logs_start_and_end_with_colors() {
        let (buf, sink) = capture();
        app(sink, &["/health"]).call(request(Method::GET, "/users")).await;

        let out = output(&buf);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);

        assert!(lines[0].contains("[Route Start]\t"));
        assert!(lines[0].ends_with(&format!("|{}  {} GET     /users", Color::Blue, Color::Reset)));

        assert!(lines[1].contains("[Route End]\t"));
        assert!(lines[1].contains(&format!("|{} 201 {}|", Color::Green, Color::Reset)));
        assert!(lines[1].contains(" | 10.0.0.9 |"));
        assert!(lines[1].ends_with(&format!("|{}  {} GET     /users", Color::Blue, Color::Reset)));
    }

    #[tokio::test]
    async fn end_line_carries_private_errors_only() {
        let (buf, sink) = capture();
        app(sink, &[]).call(request(Method::POST, "/fail")).await;

        let out = output(&buf);
        assert!(out.contains(&format!("|{} 500 {}|", Color::Red, Color::Reset)));
        assert!(out.ends_with("/fail\nError #01: db down\n"));
        assert!(!out.contains("try again"));
    }

    #[tokio::test]
    async fn unmatched_routes_are_logged_as_404() {
        let (buf, sink) = capture();
        let res = app(sink, &[]).call(request(Method::GET, "/nope?x=1")).await;

        assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
        assert!(res.header(REQUEST_ID_HEADER).is_some());
        let out = output(&buf);
        assert!(out.contains(&format!("|{} 404 {}|", Color::Yellow, Color::Reset)));
        assert!(out.contains("GET     /nope?x=1"));
    }

    #[test]
    fn start_line_format() {
        let at = Local.with_ymd_and_hms(2026, 10, 19, 14, 3, 7).unwrap();
        let line = start_line("HTTP", "id1", &at, &Method::DELETE, "/users/7");
        assert_eq!(
            line,
            "[HTTP] [id1] [Route Start]\t2026/10/19 - 14:03:07 |\x1b[97;41m  \x1b[0m DELETE  /users/7\n",
        );
    }

    #[test]
    fn end_line_format() {
        let line = EndLine {
            tag: "HTTP",
            id: "id1",
            at: Local.with_ymd_and_hms(2026, 10, 19, 14, 3, 7).unwrap(),
            status: StatusCode::MOVED_PERMANENTLY,
            latency: Duration::from_micros(1500),
            client_ip: "203.0.113.7".parse().unwrap(),
            method: &Method::OPTIONS,
            uri: "/",
            comment: String::new(),
        }
        .render();

        assert_eq!(
            line,
            "[HTTP] [id1] [Route End]\t2026/10/19 - 14:03:07 |\x1b[90;47m 301 \x1b[0m|         1.5ms | 203.0.113.7 |\x1b[90;47m  \x1b[0m OPTIONS /\n",
        );
    }
}
