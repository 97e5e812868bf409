//! Radix-tree request router.
//!
//! One tree per HTTP method. O(path-length) lookup. Used for the debug
//! listener, where a handful of introspection endpoints share one port; the
//! add binding itself answers on every path.

use std::collections::HashMap;
use std::future;
use std::sync::Arc;

use http::{Method, StatusCode};
use matchit::Router as MatchitRouter;

use crate::context::Context;
use crate::endpoint::{BoxFuture, BoxedEndpoint, Endpoint};
use crate::error::Error;
use crate::request::Request;
use crate::response::{IntoResponse, Response};

/// Routes requests to endpoints by method and path.
///
/// Build it once at startup and hand it to [`Server::serve`](crate::Server::serve).
/// Unknown paths answer `404 Not Found`.
#[derive(Default)]
pub struct Router {
    routes: HashMap<Method, MatchitRouter<BoxedEndpoint<Request, Response>>>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an endpoint for a method + path pair. Returns `self` for
    /// chaining.
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid route or conflicts with one already
    /// registered for `method`. Routes are fixed at startup.
    pub fn on(mut self, method: Method, path: &str, endpoint: impl Endpoint<Request, Response>) -> Self {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, endpoint.boxed())
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    pub fn get(self, path: &str, endpoint: impl Endpoint<Request, Response>) -> Self {
        self.on(Method::GET, path, endpoint)
    }

    fn lookup(&self, method: &Method, path: &str) -> Option<BoxedEndpoint<Request, Response>> {
        let tree = self.routes.get(method)?;
        tree.at(path).ok().map(|matched| Arc::clone(matched.value))
    }
}

impl Endpoint<Request, Response> for Router {
    fn call(&self, ctx: Context, req: Request) -> BoxFuture<Result<Response, Error>> {
        match self.lookup(req.method(), req.path()) {
            Some(endpoint) => endpoint.call(ctx, req),
            None => Box::pin(future::ready(Ok(StatusCode::NOT_FOUND.into_response()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use http::HeaderMap;

    use super::*;
    use crate::endpoint::endpoint_fn;
    use crate::health;

    fn get(path: &str) -> Request {
        Request::new(Method::GET, path, HeaderMap::new(), Vec::new())
    }

    #[tokio::test]
    async fn routes_by_method_and_path() {
        let echo = endpoint_fn(|_ctx: Context, req: Request| async move {
            Ok::<_, Error>(Response::text(req.path().to_owned()))
        });
        let router = Router::new().get("/debug/vars", echo).get("/healthz", endpoint_fn(health::liveness));

        let res = router.call(Context::background(), get("/debug/vars")).await.unwrap();
        assert_eq!(res.body(), b"/debug/vars");

        let res = router.call(Context::background(), get("/healthz")).await.unwrap();
        assert_eq!(res.body(), b"ok");

        let res = router.call(Context::background(), get("/nowhere")).await.unwrap();
        assert_eq!(res.status_code(), StatusCode::NOT_FOUND);

        let post = Request::new(Method::POST, "/debug/vars", HeaderMap::new(), Vec::new());
        let res = router.call(Context::background(), post).await.unwrap();
        assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
    }
}
