//! Route handlers and the endpoint they become.
//!
//! A route handler is any `async fn(Request) -> impl IntoResponse`. The
//! router cannot store handlers of different concrete types side by side,
//! and the middleware chain has to finish in *something* it can call without
//! knowing that type, so every handler is turned into an [`Endpoint`]: one
//! shared closure from [`Request`] to a boxed future of [`Response`].
//!
//! ```text
//! async fn hello(req: Request) -> &'static str       ← user writes this
//!        ↓ Router::on(Method::GET, "/", hello)
//! Arc<dyn Fn(Request) -> BoxFuture>                   ← Endpoint, stored in the route tree
//!        ↓ Router::call picks the route, builds a Next
//! Logger → ErrorReporter → … → endpoint(req)          ← last step of Next::run
//! ```
//!
//! Per request that costs one `Arc` clone, one indirect call and one future
//! allocation. The allocation is the price of naming the future's type in a
//! trait signature ([`Middleware::handle`](crate::middleware::Middleware::handle)
//! returns the same [`BoxFuture`]).

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use http::StatusCode;

use crate::request::Request;
use crate::response::{IntoResponse, Response};

/// A heap-allocated, type-erased future that resolves to a [`Response`].
///
/// Pinned because the runtime polls it in place and an `async` block may
/// hold references into itself. `Send + 'static` lets tokio move it between
/// worker threads and keep it past the call that created it.
pub type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// The innermost step of the pipeline: what runs once every middleware has
/// called [`Next::run`](crate::middleware::Next::run).
///
/// Shared by every request that hits the route, hence `Arc` + `Sync`.
pub(crate) type Endpoint = Arc<dyn Fn(Request) -> BoxFuture + Send + Sync + 'static>;

/// Anything usable as a route handler.
///
/// Implemented for every `Fn(Request) -> impl Future<Output = impl IntoResponse>`,
/// which covers `async fn` items and closures returning `async` blocks. The
/// conversion happens once, at registration; nothing is generic at request time.
pub trait Handler: Send + Sync + 'static {
    #[doc(hidden)]
    fn into_endpoint(self) -> Endpoint;
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn into_endpoint(self) -> Endpoint {
        Arc::new(move |req: Request| -> BoxFuture {
            // Start the user's future now, convert its output when it resolves.
            let fut = (self)(req);
            Box::pin(async move { fut.await.into_response() })
        })
    }
}

/// Endpoint for requests no route matched.
///
/// Status only, left unwritten, so middleware such as
/// [`ErrorReporter`](crate::middleware::ErrorReporter) can still fill in a body.
pub(crate) async fn not_found(_req: Request) -> StatusCode {
    StatusCode::NOT_FOUND
}
