//! Access log + error reporting on a small JSON API.
//!
//! Run with:
//!   RUST_LOG=debug REQLOG_SKIP_PATHS=/healthz cargo run --example basic
//!
//! Try:
//!   curl -i http://localhost:3000/users/42
//!   curl -i -H 'X-Reqid: my-trace-1' http://localhost:3000/users/42
//!   curl -i -X POST http://localhost:3000/users            # empty body → JSON errors
//!   curl -i http://localhost:3000/healthz                  # not logged

use reqlog::middleware::{ErrorReporter, Logger};
use reqlog::{LoggerConfig, Method, Request, RequestError, Response, Router, Server, StatusCode};
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), reqlog::Error> {
    tracing_subscriber::fmt::init();

    let app = Router::new()
        .layer(Logger::with_config(LoggerConfig::from_env()))
        .layer(ErrorReporter::new())
        .on(Method::GET,    "/users/{id}", get_user)
        .on(Method::POST,   "/users",      create_user)
        .on(Method::DELETE, "/users/{id}", delete_user)
        .on(Method::GET,    "/healthz",    |_req: Request| async { "ok" });

    Server::bind("0.0.0.0:3000")?.serve(app).await
}

async fn get_user(req: Request) -> Response {
    let id = req.param("id").unwrap_or("unknown");
    tracing::info!(user = id, "loading user"); // carries the request id span
    Response::json(format!(r#"{{"id":"{id}","name":"alice"}}"#).into_bytes())
}

// Errors are recorded, not rendered: ErrorReporter writes the body.
async fn create_user(req: Request) -> StatusCode {
    if req.body().is_empty() {
        req.push_error(RequestError::public("body is required").with_meta(json!({"field": "body"})));
        req.push_error(RequestError::private("empty POST from client"));
        return StatusCode::BAD_REQUEST;
    }
    StatusCode::CREATED
}

async fn delete_user(_req: Request) -> Response {
    Response::builder().status(StatusCode::NO_CONTENT).no_body()
}
