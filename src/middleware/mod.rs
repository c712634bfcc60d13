//! Middleware layer.
//!
//! Middleware wraps the rest of the pipeline: it sees the request before the
//! route handler does and the response after. Register with
//! [`Router::layer`](crate::Router::layer); the first layer registered is the
//! outermost, so it runs first on the way in and last on the way out.
//!
//! Built-in middleware:
//! - [`Logger`]: request id, colored start/end access log lines
//! - [`ErrorReporter`]: turns recorded request errors into a JSON body
//!
//! Ad-hoc middleware is one closure away:
//!
//! ```rust,no_run
//! use reqlog::middleware::{self, Next};
//! use reqlog::{Request, Response, Router};
//!
//! let app = Router::new().layer(middleware::from_fn(|req: Request, next: Next| async move {
//!     let mut res = next.run(req).await;
//!     res.set_header("x-served-by", "reqlog");
//!     res
//! }));
//! ```

mod error_report;
mod logger;

use std::future::Future;
use std::sync::Arc;

use crate::handler::{BoxFuture, Endpoint};
use crate::request::Request;
use crate::response::Response;

pub use error_report::ErrorReporter;
pub use logger::{Logger, REQUEST_ID_HEADER};

/// A step in the request pipeline.
///
/// `handle` receives the request and the rest of the pipeline. Call
/// [`Next::run`] to continue, or return a response without calling it to
/// short-circuit.
pub trait Middleware: Send + Sync + 'static {
    fn handle(&self, req: Request, next: Next) -> BoxFuture;
}

pub(crate) type BoxedMiddleware = Arc<dyn Middleware>;

/// The remainder of the pipeline after the current middleware.
pub struct Next {
    stack: Arc<[BoxedMiddleware]>,
    index: usize,
    endpoint: Endpoint,
}

impl Next {
    pub(crate) fn new(stack: Arc<[BoxedMiddleware]>, endpoint: Endpoint) -> Self {
        Self { stack, index: 0, endpoint }
    }

    /// Run the next middleware, or the route handler once the stack is exhausted.
    pub fn run(mut self, req: Request) -> BoxFuture {
        match self.stack.get(self.index).map(Arc::clone) {
            Some(mw) => {
                self.index += 1;
                mw.handle(req, self)
            }
            None => (self.endpoint)(req),
        }
    }
}

/// Middleware from an async closure `Fn(Request, Next) -> Future<Output = Response>`.
pub fn from_fn<F, Fut>(f: F) -> FromFn<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    FromFn(f)
}

/// See [`from_fn`].
pub struct FromFn<F>(F);

impl<F, Fut> Middleware for FromFn<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    fn handle(&self, req: Request, next: Next) -> BoxFuture {
        Box::pin((self.0)(req, next))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use http::{Method, StatusCode};

    use super::*;
    use crate::handler::Handler;

    fn req() -> Request {
        Request::new(Method::GET, "/".parse().unwrap(), "127.0.0.1:9000".parse().unwrap())
    }

    fn tracer(trail: Arc<Mutex<Vec<&'static str>>>, name: &'static str) -> impl Middleware {
        from_fn(move |req: Request, next: Next| {
            let trail = Arc::clone(&trail);
            async move {
                trail.lock().unwrap().push(name);
                let res = next.run(req).await;
                trail.lock().unwrap().push(name);
                res
            }
        })
    }

    #[tokio::test]
    async fn first_layer_is_outermost() {
        let trail = Arc::new(Mutex::new(Vec::new()));
        let stack: Arc<[BoxedMiddleware]> = Arc::from(vec![
            Arc::new(tracer(Arc::clone(&trail), "outer")) as BoxedMiddleware,
            Arc::new(tracer(Arc::clone(&trail), "inner")) as BoxedMiddleware,
        ]);
        let endpoint = (|_req: Request| async { "done" }).into_endpoint();

        let res = Next::new(stack, endpoint).run(req()).await;

        assert_eq!(res.body(), b"done");
        assert_eq!(*trail.lock().unwrap(), ["outer", "inner", "inner", "outer"]);
    }

    #[tokio::test]
    async fn middleware_can_short_circuit() {
        let stack: Arc<[BoxedMiddleware]> = Arc::from(vec![Arc::new(from_fn(
            |_req: Request, _next: Next| async { Response::status(StatusCode::FORBIDDEN) },
        )) as BoxedMiddleware]);
        let endpoint = (|_req: Request| async { "unreachable" }).into_endpoint();

        let res = Next::new(stack, endpoint).run(req()).await;

        assert_eq!(res.status_code(), StatusCode::FORBIDDEN);
        assert!(!res.is_written());
    }

    #[tokio::test]
    async fn empty_stack_calls_the_endpoint() {
        let endpoint = (|req: Request| async move { req.path().to_owned() }).into_endpoint();
        let res = Next::new(Arc::from(Vec::new()), endpoint).run(req()).await;
        assert_eq!(res.body(), b"/");
    }
}
