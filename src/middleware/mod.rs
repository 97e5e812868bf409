//! Middleware layer.
//!
//! A middleware turns one [`Endpoint`](crate::Endpoint) into another. It
//! either forwards a call to the endpoint it wraps, returning that result
//! verbatim, or rejects the call with its own error and never touches the
//! inner endpoint.
//!
//! Order matters. A [`Chain`] applies layers in the order they are added, so
//! the layer added *last* is the outermost one and runs *first*:
//!
//! ```text
//! Chain::new(add)          add
//!     .layer(Authenticate) Authenticate(add)
//!     .layer(Authorize)    Authorize(Authenticate(add))   ← runs first
//! ```
//!
//! Built-in middleware:
//! - [`Authorize`]: the caller's username must be the configured identity
//! - [`Authenticate`]: the caller's credentials must pass the basic check
//! - [`Trace`]: one log event per call with outcome and latency

mod auth;
mod trace;

pub use auth::{Authenticate, Authorize};
pub use trace::Trace;

use crate::endpoint::{BoxedEndpoint, Endpoint};

/// A transform from one endpoint to another.
pub trait Middleware<Req, Resp> {
    fn wrap(&self, next: BoxedEndpoint<Req, Resp>) -> BoxedEndpoint<Req, Resp>;
}

/// Any `Fn(BoxedEndpoint) -> BoxedEndpoint` is a middleware.
impl<F, Req, Resp> Middleware<Req, Resp> for F
where
    F: Fn(BoxedEndpoint<Req, Resp>) -> BoxedEndpoint<Req, Resp>,
{
    fn wrap(&self, next: BoxedEndpoint<Req, Resp>) -> BoxedEndpoint<Req, Resp> {
        self(next)
    }
}

/// Builds a pipeline by wrapping an endpoint in successive layers.
pub struct Chain<Req, Resp> {
    endpoint: BoxedEndpoint<Req, Resp>,
}

impl<Req, Resp> Chain<Req, Resp> {
    pub fn new(endpoint: impl Endpoint<Req, Resp>) -> Self {
        Self { endpoint: endpoint.boxed() }
    }

    /// Wraps everything added so far in `middleware`, making it the new
    /// outermost layer.
    pub fn layer(self, middleware: impl Middleware<Req, Resp>) -> Self {
        Self { endpoint: middleware.wrap(self.endpoint) }
    }

    /// Finishes the chain. The result is immutable and safe to call from
    /// any number of tasks at once.
    pub fn build(self) -> BoxedEndpoint<Req, Resp> {
        self.endpoint
    }
}
