//! Request-scoped call context.
//!
//! A [`Context`] is immutable. Deriving one (`with_credentials`,
//! `with_cancel`) returns a new value and leaves the parent untouched.
//! Cancellation is observable through [`Context::is_cancelled`] and, once
//! set, never clears.

use tokio_util::sync::CancellationToken;

use crate::credentials::Credentials;

#[derive(Clone, Debug, Default)]
pub struct Context {
    credentials: Option<Credentials>,
    cancel: CancellationToken,
}

impl Context {
    /// A context with no credentials and a cancellation token nobody holds.
    pub fn background() -> Self {
        Self::default()
    }

    /// A context with no credentials that is cancelled together with
    /// `token`.
    ///
    /// This starts a new tree; derive from an existing context with
    /// [`with_cancel`](Self::with_cancel) instead so its cancellation
    /// carries over.
    pub fn from_token(token: CancellationToken) -> Self {
        Self { credentials: None, cancel: token }
    }

    /// Derives a context that carries `credentials`.
    pub fn with_credentials(&self, credentials: Credentials) -> Self {
        Self { credentials: Some(credentials), cancel: self.cancel.clone() }
    }

    /// Derives a context whose cancellation fires when either the parent's
    /// does or the returned token is cancelled.
    ///
    /// Cancelling the returned token does not affect the parent.
    pub fn with_cancel(&self) -> (Self, CancellationToken) {
        let child = self.cancel.child_token();
        let ctx = Self { credentials: self.credentials.clone(), cancel: child.clone() };
        (ctx, child)
    }


    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Polls the cancellation signal. Never waits.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivation_does_not_mutate_parent() {
        let root = Context::background();
        let child = root.with_credentials(Credentials::new("a", "a"));
        assert!(root.credentials().is_none());
        assert_eq!(child.credentials().map(|c| c.username.as_str()), Some("a"));
    }

    #[test]
    fn child_cancellation_stays_local() {
        let root = Context::background();
        let (child, cancel) = root.with_cancel();
        cancel.cancel();
        assert!(child.is_cancelled());
        assert!(!root.is_cancelled());
    }

    #[test]
    fn parent_cancellation_reaches_children() {
        let (parent, cancel) = Context::background().with_cancel();
        let child = parent.with_credentials(Credentials::absent());
        let (grandchild, _) = child.with_cancel();
        cancel.cancel();
        assert!(child.is_cancelled());
        assert!(grandchild.is_cancelled());
    }

    #[test]
    fn cancelled_parent_stays_cancelled_through_every_derivation() {
        let (parent, cancel) = Context::background().with_cancel();
        cancel.cancel();

        let with_creds = parent.with_credentials(Credentials::new("user", "user"));
        let (with_cancel, own) = with_creds.with_cancel();
        assert!(with_creds.is_cancelled());
        assert!(with_cancel.is_cancelled());
        assert!(own.is_cancelled());
        assert!(with_cancel.with_credentials(Credentials::absent()).is_cancelled());
    }

    #[test]
    fn from_token_follows_the_token() {
        let shutdown = CancellationToken::new();
        let ctx = Context::from_token(shutdown.child_token());
        assert!(ctx.credentials().is_none());
        assert!(!ctx.is_cancelled());
        shutdown.cancel();
        assert!(ctx.is_cancelled());
    }
}
