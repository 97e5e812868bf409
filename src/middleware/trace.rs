//! Call tracing middleware.

use std::sync::Arc;
use std::time::Instant;

use tracing::{Instrument, Span, info, warn};

use crate::context::Context;
use crate::endpoint::{BoxFuture, BoxedEndpoint, Endpoint};
use crate::error::Error;
use crate::middleware::Middleware;

/// Logs one event per call: the method name, the outcome and how long the
/// inner endpoint took.
///
/// Events are emitted inside the span given at construction, so the caller
/// decides where they land and what fields they carry.
#[derive(Clone, Debug)]
pub struct Trace {
    method: &'static str,
    span: Span,
}

impl Trace {
    pub fn new(method: &'static str, span: Span) -> Self {
        Self { method, span }
    }
}

impl<Req, Resp> Middleware<Req, Resp> for Trace
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    fn wrap(&self, next: BoxedEndpoint<Req, Resp>) -> BoxedEndpoint<Req, Resp> {
        Arc::new(Traced { method: self.method, span: self.span.clone(), next })
    }
}

struct Traced<Req, Resp> {
    method: &'static str,
    span: Span,
    next: BoxedEndpoint<Req, Resp>,
}

impl<Req, Resp> Endpoint<Req, Resp> for Traced<Req, Resp>
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    fn call(&self, ctx: Context, req: Req) -> BoxFuture<Result<Resp, Error>> {
        let method = self.method;
        let start = Instant::now();
        let fut = self.next.call(ctx, req);
        Box::pin(
            async move {
                let result = fut.await;
                let took = start.elapsed();
                match &result {
                    Ok(_) => info!(method, ?took, "ok"),
                    Err(err) => warn!(method, ?took, error = %err, "failed"),
                }
                result
            }
            .instrument(self.span.clone()),
        )
    }
}
