//! The endpoint contract and its type-erased forms.
//!
//! # How endpoints are stored
//!
//! Middleware wraps endpoints of *different* concrete types: a business
//! function, an auth check around it, a tracer around that. The composed
//! pipeline is built once and shared by every request, so each layer is
//! boxed behind a trait object and held in an `Arc`:
//!
//! ```text
//! endpoint_fn(|ctx, req| async { … })      ← user writes this
//!        ↓ .boxed()
//! Arc::new(FnEndpoint(f))                  ← heap-allocated wrapper
//!        ↓ stored as BoxedEndpoint<Req, Resp>
//! endpoint.call(ctx, req) per request      ← one vtable dispatch
//!        ↓
//! Box::pin(f(ctx, req))                    ← BoxFuture
//! ```
//!
//! Endpoints are parameterised by their request and response types, so a
//! middleware chain that mixes payloads is rejected at compile time. Where a
//! caller needs the fully generic `(context, any) -> any` contract,
//! [`erase`] provides it and reports a mismatch as
//! [`Error::BadRequestShape`].

use std::any::{self, Any};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::context::Context;
use crate::error::Error;

/// A heap-allocated, type-erased future.
///
/// `Send + 'static` lets tokio move the future across worker threads.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// An asynchronous call: `(context, request) -> Result<response, error>`.
///
/// Implementations know nothing about transport or credentials formats;
/// those reach them only through the [`Context`].
pub trait Endpoint<Req, Resp>: Send + Sync + 'static {
    fn call(&self, ctx: Context, req: Req) -> BoxFuture<Result<Resp, Error>>;

    /// Moves `self` behind an `Arc` so it can be shared and wrapped.
    fn boxed(self) -> BoxedEndpoint<Req, Resp>
    where
        Self: Sized,
    {
        Arc::new(self)
    }
}

/// A shared, type-erased endpoint. Cloning costs one atomic increment.
pub type BoxedEndpoint<Req, Resp> = Arc<dyn Endpoint<Req, Resp>>;

impl<Req, Resp, E> Endpoint<Req, Resp> for Arc<E>
where
    E: Endpoint<Req, Resp> + ?Sized,
{
    fn call(&self, ctx: Context, req: Req) -> BoxFuture<Result<Resp, Error>> {
        (**self).call(ctx, req)
    }
}

// ── Closures ──────────────────────────────────────────────────────────────────

/// Turns an async closure into an [`Endpoint`].
///
/// ```rust
/// use addsvc::{Context, Endpoint, Error, endpoint_fn};
///
/// let double = endpoint_fn(|_ctx: Context, n: i64| async move { Ok::<_, Error>(n * 2) });
/// # let _ = double.boxed();
/// ```
pub fn endpoint_fn<F>(f: F) -> FnEndpoint<F> {
    FnEndpoint(f)
}

/// Newtype returned by [`endpoint_fn`].
pub struct FnEndpoint<F>(F);

impl<F, Fut, Req, Resp> Endpoint<Req, Resp> for FnEndpoint<F>
where
    F: Fn(Context, Req) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Resp, Error>> + Send + 'static,
{
    fn call(&self, ctx: Context, req: Req) -> BoxFuture<Result<Resp, Error>> {
        Box::pin((self.0)(ctx, req))
    }
}

// ── Erasure ───────────────────────────────────────────────────────────────────

/// A request or response value of unknown type.
pub type AnyValue = Box<dyn Any + Send>;

/// Wraps a typed endpoint so it accepts and returns [`AnyValue`].
///
/// A request that is not a `Req` fails with [`Error::BadRequestShape`]
/// without calling `inner`; no coercion is attempted.
pub fn erase<Req, Resp>(inner: BoxedEndpoint<Req, Resp>) -> BoxedEndpoint<AnyValue, AnyValue>
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    Arc::new(Erased { inner })
}

struct Erased<Req, Resp> {
    inner: BoxedEndpoint<Req, Resp>,
}

impl<Req, Resp> Endpoint<AnyValue, AnyValue> for Erased<Req, Resp>
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    fn call(&self, ctx: Context, req: AnyValue) -> BoxFuture<Result<AnyValue, Error>> {
        match req.downcast::<Req>() {
            Ok(req) => {
                let fut = self.inner.call(ctx, *req);
                Box::pin(async move { fut.await.map(|resp| Box::new(resp) as AnyValue) })
            }
            Err(_) => {
                let expected = any::type_name::<Req>();
                Box::pin(async move { Err(Error::BadRequestShape { expected }) })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::error::ErrorKind;

    fn double() -> BoxedEndpoint<i64, i64> {
        endpoint_fn(|_ctx: Context, n: i64| async move { Ok::<_, Error>(n * 2) }).boxed()
    }

    #[tokio::test]
    async fn closure_endpoint_is_callable_through_arc() {
        let e = double();
        let shared = Arc::clone(&e);
        assert_eq!(e.call(Context::background(), 4).await.unwrap(), 8);
        assert_eq!(shared.call(Context::background(), -1).await.unwrap(), -2);
    }

    #[tokio::test]
    async fn erased_endpoint_round_trips_matching_type() {
        let e = erase(double());
        let out = e.call(Context::background(), Box::new(21_i64) as AnyValue).await.unwrap();
        assert_eq!(*out.downcast::<i64>().unwrap(), 42);
    }

    #[tokio::test]
    async fn erased_endpoint_rejects_wrong_shape_without_calling_inner() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let inner = endpoint_fn(move |_ctx: Context, n: i64| {
            seen.fetch_add(1, Ordering::SeqCst);
            async move { Ok::<_, Error>(n) }
        })
        .boxed();

        let err = erase(inner)
            .call(Context::background(), Box::new("not a number") as AnyValue)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequestShape);
        assert!(err.to_string().contains("i64"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
