//! HTTP binding: the adapter between an exchange and an [`Endpoint`].
//!
//! One exchange runs through these steps, in order:
//!
//! 1. **before** hooks derive the call [`Context`] from the request
//!    ([`basic_auth`] puts the caller's credentials there);
//! 2. **decode** turns the body into the endpoint's request type; a failure
//!    answers right away and the endpoint is never called;
//! 3. the endpoint is **invoked**;
//! 4. on success, **after** hooks fill in response headers
//!    ([`set_content_type`]);
//! 5. **encode** writes the response value as the body.
//!
//! Any error becomes a response carrying the error's status and message.
//! Nothing is retried.

use std::future;
use std::sync::Arc;

use bytes::Bytes;
use http::HeaderMap;
use http::header::CONTENT_TYPE;
use serde::Serialize;
use serde::de::{DeserializeOwned, Error as _};
use tracing::{Instrument, Span, warn};

use crate::context::Context;
use crate::credentials::Credentials;
use crate::endpoint::{BoxFuture, BoxedEndpoint, Endpoint};
use crate::error::Error;
use crate::metrics::Metrics;
use crate::request::Request;
use crate::response::{ContentType, Response};

/// Derives the call context from the inbound request.
pub type Before = Arc<dyn Fn(Context, &Request) -> Context + Send + Sync>;

/// Adjusts outgoing headers after a successful call.
pub type After = Arc<dyn Fn(&mut HeaderMap) + Send + Sync>;

/// Parses a request body into `Req`.
pub type Decode<Req> = fn(&Request) -> Result<Req, Error>;

/// Serialises a response value into a body.
pub type Encode<Resp> = fn(&Resp) -> Result<Bytes, Error>;

// ── Hooks ─────────────────────────────────────────────────────────────────────

/// Puts the `Authorization: Basic` credentials into the context.
///
/// A missing or malformed header yields credentials with `present == false`.
pub fn basic_auth() -> Before {
    Arc::new(|ctx: Context, req: &Request| ctx.with_credentials(Credentials::from_headers(req.headers())))
}

/// Sets the response content type.
pub fn set_content_type(content_type: ContentType) -> After {
    Arc::new(move |headers: &mut HeaderMap| {
        headers.insert(CONTENT_TYPE, content_type.header_value());
    })
}

// ── JSON codec ────────────────────────────────────────────────────────────────

/// Decodes a JSON object body.
///
/// Anything other than an object (including arrays that would otherwise
/// fill a struct positionally) is rejected.
pub fn decode_json<T: DeserializeOwned>(req: &Request) -> Result<T, Error> {
    let value: serde_json::Value = serde_json::from_slice(req.body()).map_err(Error::Decode)?;
    if !value.is_object() {
        return Err(Error::Decode(serde_json::Error::custom("expected a JSON object")));
    }
    serde_json::from_value(value).map_err(Error::Decode)
}

/// Encodes a value as JSON followed by a newline.
pub fn encode_json<T: Serialize>(value: &T) -> Result<Bytes, Error> {
    let mut body = serde_json::to_vec(value).map_err(Error::Encode)?;
    body.push(b'\n');
    Ok(body.into())
}

// ── Binding ───────────────────────────────────────────────────────────────────

/// Serves one endpoint over HTTP.
///
/// The binding is itself an `Endpoint<Request, Response>` that never fails:
/// every error has already been turned into a response.
pub struct HttpBinding<Req, Resp> {
    endpoint: BoxedEndpoint<Req, Resp>,
    decode: Decode<Req>,
    encode: Encode<Resp>,
    before: Vec<Before>,
    after: Arc<Vec<After>>,
    metrics: Arc<Metrics>,
    span: Span,
}

impl<Req, Resp> HttpBinding<Req, Resp> {
    pub fn new(endpoint: BoxedEndpoint<Req, Resp>, decode: Decode<Req>, encode: Encode<Resp>) -> Self {
        Self {
            endpoint,
            decode,
            encode,
            before: Vec::new(),
            after: Arc::new(Vec::new()),
            metrics: Arc::default(),
            span: Span::none(),
        }
    }

    /// Appends a before hook. Hooks run in the order they were added.
    pub fn before(mut self, hook: Before) -> Self {
        self.before.push(hook);
        self
    }

    /// Appends an after hook. Hooks run in the order they were added.
    pub fn after(mut self, hook: After) -> Self {
        Arc::make_mut(&mut self.after).push(hook);
        self
    }

    /// Counters to bump for each exchange.
    pub fn metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Span that this binding's log events are emitted in.
    pub fn span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

impl<Req, Resp> Endpoint<Request, Response> for HttpBinding<Req, Resp>
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    fn call(&self, ctx: Context, req: Request) -> BoxFuture<Result<Response, Error>> {
        self.metrics.request();

        let ctx = self.before.iter().fold(ctx, |ctx, hook| hook(ctx, &req));

        let request = match (self.decode)(&req) {
            Ok(request) => request,
            Err(err) => {
                self.metrics.decode_error();
                self.span.in_scope(|| warn!(path = req.path(), error = %err, "rejected request"));
                return Box::pin(future::ready(Ok(Response::error(&err))));
            }
        };

        let fut = self.endpoint.call(ctx, request);
        let encode = self.encode;
        let after = Arc::clone(&self.after);
        let metrics = Arc::clone(&self.metrics);

        Box::pin(
            async move {
                let response = match fut.await {
                    Ok(response) => response,
                    Err(err) => {
                        metrics.failure();
                        return Ok(Response::error(&err));
                    }
                };

                let mut headers = HeaderMap::new();
                for hook in after.iter() {
                    hook(&mut headers);
                }

                match encode(&response) {
                    Ok(body) => {
                        metrics.success();
                        Ok(Response::builder().headers(headers).body(body))
                    }
                    Err(err) => {
                        metrics.failure();
                        warn!(error = %err, "encode failed");
                        Ok(Response::error(&err))
                    }
                }
            }
            .instrument(self.span.clone()),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use http::header::{AUTHORIZATION, HeaderValue};
    use http::{Method, StatusCode};
    use serde::Deserialize;

    use super::*;
    use crate::endpoint::endpoint_fn;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Pair {
        x: i64,
        y: i64,
    }

    #[derive(Serialize)]
    struct Sum {
        s: i64,
    }

    fn post(body: &str, auth: Option<(&str, &str)>) -> Request {
        let mut headers = HeaderMap::new();
        if let Some((u, p)) = auth {
            let value = format!("Basic {}", STANDARD.encode(format!("{u}:{p}")));
            headers.insert(AUTHORIZATION, HeaderValue::from_str(&value).unwrap());
        }
        Request::new(Method::POST, "/", headers, body.to_owned())
    }

    fn sum() -> BoxedEndpoint<Pair, Sum> {
        endpoint_fn(|_ctx: Context, p: Pair| async move { Ok::<_, Error>(Sum { s: p.x + p.y }) }).boxed()
    }

    #[test]
    fn decode_json_accepts_objects_only() {
        let ok: Pair = decode_json(&post(r#"{"x":1,"y":2}"#, None)).unwrap();
        assert_eq!(ok, Pair { x: 1, y: 2 });

        for body in ["[1,2]", "{", "", r#"{"x":"1","y":2}"#, "3"] {
            let err = decode_json::<Pair>(&post(body, None)).unwrap_err();
            assert!(matches!(err, Error::Decode(_)), "{body:?} gave {err:?}");
        }
    }

    #[test]
    fn encode_json_appends_newline() {
        assert_eq!(&encode_json(&Sum { s: 5 }).unwrap()[..], b"{\"s\":5}\n");
    }

    #[tokio::test]
    async fn success_runs_after_hooks_in_order_and_encodes() {
        let binding = HttpBinding::new(sum(), decode_json, encode_json)
            .after(set_content_type(ContentType::Json))
            .after(Arc::new(|h: &mut HeaderMap| {
                h.insert(CONTENT_TYPE, HeaderValue::from_static("text/x-overridden"));
            }));

        let res = binding.call(Context::background(), post(r#"{"x":2,"y":3}"#, None)).await.unwrap();
        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(res.body(), b"{\"s\":5}\n");
        assert_eq!(res.headers()[CONTENT_TYPE], "text/x-overridden");
    }

    #[tokio::test]
    async fn decode_failure_never_reaches_endpoint() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let counted = endpoint_fn(move |_ctx: Context, p: Pair| {
            seen.fetch_add(1, Ordering::SeqCst);
            async move { Ok::<_, Error>(Sum { s: p.x }) }
        })
        .boxed();
        let metrics = Arc::new(Metrics::default());
        let binding = HttpBinding::new(counted, decode_json, encode_json).metrics(Arc::clone(&metrics));

        let res = binding.call(Context::background(), post("not json", None)).await.unwrap();
        assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
        assert!(std::str::from_utf8(res.body()).unwrap().starts_with("decode: "));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(metrics.snapshot().decode_errors, 1);
    }

    #[tokio::test]
    async fn before_hook_feeds_credentials_to_the_endpoint() {
        let whoami = endpoint_fn(|ctx: Context, _p: Pair| async move {
            let name = ctx.credentials().map(|c| c.username.clone()).unwrap_or_default();
            Ok::<_, Error>(name)
        })
        .boxed();
        let binding = HttpBinding::new(whoami, decode_json, |s: &String| encode_json(s)).before(basic_auth());

        let res = binding
            .call(Context::background(), post(r#"{"x":0,"y":0}"#, Some(("alice", "pw"))))
            .await
            .unwrap();
        assert_eq!(res.body(), b"\"alice\"\n");
    }

    #[tokio::test]
    async fn before_hooks_run_in_the_order_added() {
        fn tag(name: &'static str) -> Before {
            Arc::new(move |ctx: Context, _req: &Request| {
                let seen = ctx.credentials().map(|c| c.username.clone()).unwrap_or_default();
                ctx.with_credentials(Credentials::new(format!("{seen}{name}"), ""))
            })
        }
        let whoami = endpoint_fn(|ctx: Context, _p: Pair| async move {
            Ok::<_, Error>(ctx.credentials().map(|c| c.username.clone()).unwrap_or_default())
        })
        .boxed();
        let binding = HttpBinding::new(whoami, decode_json, |s: &String| encode_json(s))
            .before(tag("first,"))
            .before(tag("second"));

        let res = binding.call(Context::background(), post(r#"{"x":0,"y":0}"#, None)).await.unwrap();
        assert_eq!(res.body(), b"\"first,second\"\n");
    }

    #[tokio::test]
    async fn pipeline_errors_become_responses_without_after_hooks() {
        let failing = endpoint_fn(|_ctx: Context, _p: Pair| async { Err::<Sum, _>(Error::NotAuthorized) }).boxed();
        let binding = HttpBinding::new(failing, decode_json, encode_json).after(set_content_type(ContentType::Json));

        let res = binding.call(Context::background(), post(r#"{"x":1,"y":1}"#, None)).await.unwrap();
        assert_eq!(res.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(res.headers()[CONTENT_TYPE], ContentType::Text.as_str());
        assert_eq!(res.body(), b"user not authorized");
    }
}
