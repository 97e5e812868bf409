//! The add service: payloads, the business endpoint, and how the pipeline
//! and its HTTP binding are assembled.

use std::future;

use serde::{Deserialize, Serialize};
use tracing::Span;

use crate::context::Context;
use crate::endpoint::{BoxFuture, BoxedEndpoint, Endpoint};
use crate::error::Error;
use crate::middleware::{Authenticate, Authorize, Chain, Trace};
use crate::response::ContentType;
use crate::transport::{self, After, Before, HttpBinding};

/// Request for the add method. Missing fields decode as zero.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct AddRequest {
    pub a: i64,
    pub b: i64,
}

/// Response to the add method.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct AddResponse {
    pub v: i64,
}

/// `a + b`, wrapping on overflow.
pub fn add(_ctx: &Context, a: i64, b: i64) -> i64 {
    a.wrapping_add(b)
}

/// Wraps a business `add` function as an endpoint.
///
/// The context's cancellation is polled once, when the endpoint is called.
/// If it is already cancelled the call fails with [`Error::Cancelled`] and
/// `add` is not run; cancelling later has no effect on the call.
pub fn make_endpoint<F>(add: F) -> AddEndpoint<F>
where
    F: Fn(&Context, i64, i64) -> i64 + Send + Sync + 'static,
{
    AddEndpoint { add }
}

/// Endpoint returned by [`make_endpoint`].
pub struct AddEndpoint<F> {
    add: F,
}

impl<F> Endpoint<AddRequest, AddResponse> for AddEndpoint<F>
where
    F: Fn(&Context, i64, i64) -> i64 + Send + Sync + 'static,
{
    fn call(&self, ctx: Context, req: AddRequest) -> BoxFuture<Result<AddResponse, Error>> {
        if ctx.is_cancelled() {
            return Box::pin(future::ready(Err(Error::Cancelled)));
        }
        let v = (self.add)(&ctx, req.a, req.b);
        Box::pin(future::ready(Ok(AddResponse { v })))
    }
}

/// Assembles the add pipeline.
///
/// Layers, outermost first: trace, authorize (`identity`), authenticate,
/// add. Authorization running ahead of authentication is the order this
/// service has always had; a caller with the wrong username is told
/// "not authorized" even when their password would also fail.
pub fn pipeline(identity: &str, span: Span) -> BoxedEndpoint<AddRequest, AddResponse> {
    Chain::new(make_endpoint(add))
        .layer(Authenticate)
        .layer(Authorize::new(identity))
        .layer(Trace::new("add", span))
        .build()
}

/// Binds the add pipeline to HTTP with a JSON codec.
///
/// `before` hooks run in the given order. The JSON content type is set
/// before any of the `after` hooks run.
pub fn make_http_binding(
    endpoint: BoxedEndpoint<AddRequest, AddResponse>,
    before: Vec<Before>,
    after: Vec<After>,
) -> HttpBinding<AddRequest, AddResponse> {
    let binding = HttpBinding::new(endpoint, transport::decode_json, transport::encode_json)
        .after(transport::set_content_type(ContentType::Json));
    let binding = before.into_iter().fold(binding, HttpBinding::before);
    after.into_iter().fold(binding, HttpBinding::after)
}
