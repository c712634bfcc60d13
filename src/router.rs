//! Radix-tree request router with a middleware stack.
//!
//! One tree per HTTP method, O(path-length) lookup. Every request, matched
//! or not, passes through the same middleware stack, so the access log also
//! sees the 404s.

use std::collections::HashMap;
use std::sync::Arc;

use http::Method;
use matchit::Router as MatchitRouter;

use crate::handler::{self, Endpoint, Handler};
use crate::middleware::{BoxedMiddleware, Middleware, Next};
use crate::request::Request;
use crate::response::Response;

/// The application router.
///
/// Build it once at startup; pass it to [`Server::serve`](crate::Server::serve).
/// Registration methods return `self` so calls chain naturally.
pub struct Router {
    routes: HashMap<Method, MatchitRouter<Endpoint>>,
    stack: Arc<[BoxedMiddleware]>,
    fallback: Endpoint,
}

impl Router {
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
            stack: Arc::from(Vec::new()),
            fallback: handler::not_found.into_endpoint(),
        }
    }

    /// Register a handler for a method + path pair.
    ///
    /// Path parameters use `{name}` syntax; `req.param("name")` retrieves them:
    ///
    /// ```rust,no_run
    /// # use reqlog::{Method, Request, Response, Router};
    /// # async fn get_user(_: Request) -> Response { Response::text("") }
    /// # async fn create_user(_: Request) -> Response { Response::text("") }
    /// Router::new()
    ///     .on(Method::GET,  "/users/{id}", get_user)
    ///     .on(Method::POST, "/users",      create_user);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid route or conflicts with an existing one.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, handler.into_endpoint())
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    /// Wrap every route in `middleware`. Earlier layers wrap later ones.
    pub fn layer(mut self, middleware: impl Middleware) -> Self {
        let mut stack = self.stack.to_vec();
        stack.push(Arc::new(middleware));
        self.stack = stack.into();
        self
    }

    /// Run one request through the middleware stack and its route.
    ///
    /// The server calls this per request; tests can call it directly.
    pub async fn call(&self, mut req: Request) -> Response {
        let endpoint = match self.lookup(&req.method, req.uri.path()) {
            Some((handler, params)) => {
                req.params = params;
                handler
            }
            None => Arc::clone(&self.fallback),
        };
        Next::new(Arc::clone(&self.stack), endpoint).run(req).await
    }

    fn lookup(
        &self,
        method: &Method,
        path: &str,
    ) -> Option<(Endpoint, HashMap<String, String>)> {
        let tree = self.routes.get(method)?;
        let matched = tree.at(path).ok()?;
        let handler = Arc::clone(matched.value);
        let params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((handler, params))
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}
