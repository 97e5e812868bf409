//! Debug listener handlers.
//!
//! | Path | Answers |
//! |---|---|
//! | `/healthz` | Is the process alive? Always `ok`. |
//! | `/readyz` | Can it serve traffic? Always `ready`. |
//! | `/debug/vars` | Request counters of the add binding, as JSON. |
//!
//! None of these require credentials. Keep the debug address off public
//! interfaces.

use std::sync::Arc;

use crate::context::Context;
use crate::endpoint::{Endpoint, endpoint_fn};
use crate::error::Error;
use crate::metrics::Metrics;
use crate::request::Request;
use crate::response::{IntoResponse, Response};
use crate::router::Router;
use crate::transport::encode_json;

/// Liveness probe. If the process can answer at all, it is alive.
pub async fn liveness(_ctx: Context, _req: Request) -> Result<Response, Error> {
    Ok("ok".into_response())
}

/// Readiness probe. The add service has no dependencies to wait for.
pub async fn readiness(_ctx: Context, _req: Request) -> Result<Response, Error> {
    Ok("ready".into_response())
}

/// Serves a JSON snapshot of `metrics`.
pub fn vars(metrics: Arc<Metrics>) -> impl Endpoint<Request, Response> {
    endpoint_fn(move |_ctx: Context, _req: Request| {
        let snapshot = metrics.snapshot();
        async move { encode_json(&snapshot).map(Response::json) }
    })
}

/// The debug listener's routes.
pub fn router(metrics: Arc<Metrics>) -> Router {
    Router::new()
        .get("/healthz", endpoint_fn(liveness))
        .get("/readyz", endpoint_fn(readiness))
        .get("/debug/vars", vars(metrics))
}

#[cfg(test)]
mod tests {
    use http::{HeaderMap, Method, StatusCode};

    use super::*;

    async fn get(router: &Router, path: &str) -> Response {
        let req = Request::new(Method::GET, path, HeaderMap::new(), Vec::new());
        router.call(Context::background(), req).await.unwrap()
    }

    #[tokio::test]
    async fn probes_answer_without_credentials() {
        let router = router(Arc::default());
        assert_eq!(get(&router, "/healthz").await.body(), b"ok");
        assert_eq!(get(&router, "/readyz").await.body(), b"ready");
    }

    #[tokio::test]
    async fn vars_reports_counters() {
        let metrics = Arc::new(Metrics::default());
        metrics.request();
        metrics.success();
        let res = get(&router(Arc::clone(&metrics)), "/debug/vars").await;
        assert_eq!(res.status_code(), StatusCode::OK);

        let body: serde_json::Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(body["requests"], 1);
        assert_eq!(body["succeeded"], 1);
        assert_eq!(body["failed"], 0);
    }
}
