//! Authorization and authentication layers.
//!
//! Both read the [`Credentials`](crate::Credentials) the transport placed in
//! the [`Context`]. A context without credentials fails with
//! [`Error::UnauthenticatedContext`] instead of panicking.

use std::future;
use std::sync::Arc;

use crate::context::Context;
use crate::endpoint::{BoxFuture, BoxedEndpoint, Endpoint};
use crate::error::Error;
use crate::middleware::Middleware;

fn reject<Resp>(err: Error) -> BoxFuture<Result<Resp, Error>>
where
    Resp: Send + 'static,
{
    Box::pin(future::ready(Err(err)))
}

// ── Authorize ─────────────────────────────────────────────────────────────────

/// Forwards a call only when the caller's username is `identity`.
///
/// The password is not looked at; pair with [`Authenticate`].
#[derive(Clone, Debug)]
pub struct Authorize {
    identity: Arc<str>,
}

impl Authorize {
    pub fn new(identity: impl Into<Arc<str>>) -> Self {
        Self { identity: identity.into() }
    }
}

impl<Req, Resp> Middleware<Req, Resp> for Authorize
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    fn wrap(&self, next: BoxedEndpoint<Req, Resp>) -> BoxedEndpoint<Req, Resp> {
        Arc::new(Authorized { identity: Arc::clone(&self.identity), next })
    }
}

struct Authorized<Req, Resp> {
    identity: Arc<str>,
    next: BoxedEndpoint<Req, Resp>,
}

impl<Req, Resp> Endpoint<Req, Resp> for Authorized<Req, Resp>
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    fn call(&self, ctx: Context, req: Req) -> BoxFuture<Result<Resp, Error>> {
        match ctx.credentials() {
            None => reject(Error::UnauthenticatedContext),
            Some(c) if *c.username == *self.identity => self.next.call(ctx, req),
            Some(_) => reject(Error::NotAuthorized),
        }
    }
}

// ── Authenticate ──────────────────────────────────────────────────────────────

/// Forwards a call only when [`Credentials::authenticated`] holds.
///
/// [`Credentials::authenticated`]: crate::Credentials::authenticated
#[derive(Clone, Copy, Debug, Default)]
pub struct Authenticate;

impl<Req, Resp> Middleware<Req, Resp> for Authenticate
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    fn wrap(&self, next: BoxedEndpoint<Req, Resp>) -> BoxedEndpoint<Req, Resp> {
        Arc::new(Authenticated { next })
    }
}

struct Authenticated<Req, Resp> {
    next: BoxedEndpoint<Req, Resp>,
}

impl<Req, Resp> Endpoint<Req, Resp> for Authenticated<Req, Resp>
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    fn call(&self, ctx: Context, req: Req) -> BoxFuture<Result<Resp, Error>> {
        match ctx.credentials() {
            None => reject(Error::UnauthenticatedContext),
            Some(c) if c.authenticated() => self.next.call(ctx, req),
            Some(_) => reject(Error::BadCredentials),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::Credentials;
    use crate::endpoint::endpoint_fn;
    use crate::error::ErrorKind;
    use crate::middleware::Chain;

    fn ok() -> impl Endpoint<(), &'static str> {
        endpoint_fn(|_ctx: Context, _req: ()| async { Ok::<_, Error>("reached") })
    }

    fn ctx(user: &str, pass: &str) -> Context {
        Context::background().with_credentials(Credentials::new(user, pass))
    }

    async fn kind(e: &BoxedEndpoint<(), &'static str>, ctx: Context) -> Result<&'static str, ErrorKind> {
        e.call(ctx, ()).await.map_err(|err| err.kind())
    }

    #[tokio::test]
    async fn authorize_checks_identity_only() {
        let e = Chain::new(ok()).layer(Authorize::new("user")).build();
        assert_eq!(kind(&e, ctx("user", "anything")).await, Ok("reached"));
        assert_eq!(kind(&e, ctx("other", "other")).await, Err(ErrorKind::NotAuthorized));
    }

    #[tokio::test]
    async fn authenticate_checks_self_equality() {
        let e = Chain::new(ok()).layer(Authenticate).build();
        assert_eq!(kind(&e, ctx("x", "x")).await, Ok("reached"));
        assert_eq!(kind(&e, ctx("x", "y")).await, Err(ErrorKind::BadCredentials));

        let absent = Context::background().with_credentials(Credentials::absent());
        assert_eq!(kind(&e, absent).await, Err(ErrorKind::BadCredentials));
    }

    #[tokio::test]
    async fn missing_credentials_fail_without_panicking() {
        let authz = Chain::new(ok()).layer(Authorize::new("user")).build();
        let authn = Chain::new(ok()).layer(Authenticate).build();
        let bare = Context::background();
        assert_eq!(kind(&authz, bare.clone()).await, Err(ErrorKind::UnauthenticatedContext));
        assert_eq!(kind(&authn, bare).await, Err(ErrorKind::UnauthenticatedContext));
    }
}
