//! # reqlog
//!
//! Request ids, a colored access log, and JSON error reporting for HTTP
//! services, on top of a minimal hyper-based router.
//!
//! ## What a request goes through
//!
//! - [`middleware::Logger`] picks up the inbound `X-Reqid` header or mints a
//!   new id, echoes it on the response, and writes a start and an end line
//!   (status, latency, client IP) to a configurable sink.
//! - Handlers record problems with [`Request::push_error`].
//! - [`middleware::ErrorReporter`] turns those errors into a JSON array when
//!   the handler left the response body unwritten.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use reqlog::middleware::{ErrorReporter, Logger};
//! use reqlog::{LoggerConfig, Method, Request, RequestError, Router, Server, StatusCode};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), reqlog::Error> {
//!     let logger = Logger::with_config(LoggerConfig::from_env().skip_paths(["/healthz"]));
//!
//!     let app = Router::new()
//!         .layer(logger)
//!         .layer(ErrorReporter::new())
//!         .on(Method::GET,  "/healthz", |_req: Request| async { "ok" })
//!         .on(Method::POST, "/users",   create_user);
//!
//!     Server::bind("0.0.0.0:3000")?.serve(app).await
//! }
//!
//! async fn create_user(req: Request) -> StatusCode {
//!     if req.body().is_empty() {
//!         req.push_error(RequestError::public("body is required"));
//!         return StatusCode::BAD_REQUEST; // ErrorReporter writes the JSON
//!     }
//!     StatusCode::CREATED
//! }
//! ```

mod color;
mod config;
mod error;
mod errors;
mod handler;
mod reqid;
mod request;
mod response;
mod router;
mod server;

pub mod middleware;

pub use color::Color;
pub use config::{DEFAULT_TAG, LoggerConfig, Sink};
pub use error::Error;
pub use errors::{ErrorKind, Errors, RequestError};
pub use handler::{BoxFuture, Handler};
pub use reqid::{ID_LEN, Seed};
pub use request::Request;
pub use response::{IntoResponse, Response, ResponseBuilder};
pub use router::Router;
pub use server::Server;

pub use http::{Method, StatusCode};
