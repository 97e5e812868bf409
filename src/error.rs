//! Unified error type.
//!
//! Pipeline failures (cancellation, shape, policy) are ordinary values that
//! the transport turns into a response. Infrastructure failures (binding a
//! listener, installing a signal handler, a termination signal) end the
//! process through the [`Supervisor`](crate::Supervisor).

use http::StatusCode;

/// The error type returned by addsvc's fallible operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The call context was already cancelled when the endpoint was entered.
    #[error("context canceled")]
    Cancelled,

    /// The request value is not the payload type the endpoint expects.
    #[error("bad request shape: expected {expected}")]
    BadRequestShape { expected: &'static str },

    /// The caller's identity is not the configured one.
    #[error("user not authorized")]
    NotAuthorized,

    /// The caller's credentials failed the authentication predicate.
    #[error("bad credentials")]
    BadCredentials,

    /// An auth layer ran on a context that carries no credentials.
    #[error("no credentials in context")]
    UnauthenticatedContext,

    /// The request body could not be decoded into the expected shape.
    #[error("decode: {0}")]
    Decode(#[source] serde_json::Error),

    /// The response value could not be encoded.
    #[error("encode: {0}")]
    Encode(#[source] serde_json::Error),

    /// A listener failed to bind or accept.
    #[error("listen: {0}")]
    Listen(#[from] std::io::Error),

    /// A termination signal was received.
    #[error("signal: {0}")]
    Signal(String),

    /// A signal handler could not be installed.
    #[error("signal handler: {0}")]
    SignalHandler(#[source] std::io::Error),
}

/// The kind of an [`Error`], without its payload.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    Cancelled,
    BadRequestShape,
    NotAuthorized,
    BadCredentials,
    UnauthenticatedContext,
    Decode,
    Encode,
    Listen,
    Signal,
    SignalHandler,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Cancelled               => ErrorKind::Cancelled,
            Self::BadRequestShape { .. }  => ErrorKind::BadRequestShape,
            Self::NotAuthorized           => ErrorKind::NotAuthorized,
            Self::BadCredentials          => ErrorKind::BadCredentials,
            Self::UnauthenticatedContext  => ErrorKind::UnauthenticatedContext,
            Self::Decode(_)               => ErrorKind::Decode,
            Self::Encode(_)               => ErrorKind::Encode,
            Self::Listen(_)               => ErrorKind::Listen,
            Self::Signal(_)               => ErrorKind::Signal,
            Self::SignalHandler(_)        => ErrorKind::SignalHandler,
        }
    }

    /// Status code the HTTP binding answers with for this error.
    ///
    /// Malformed input is 400, a policy rejection is 401/403, and anything
    /// the server itself failed at is 5xx.
    pub fn status(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::Decode | ErrorKind::BadRequestShape => StatusCode::BAD_REQUEST,
            ErrorKind::BadCredentials | ErrorKind::UnauthenticatedContext => {
                StatusCode::UNAUTHORIZED
            }
            ErrorKind::NotAuthorized => StatusCode::FORBIDDEN,
            ErrorKind::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::Encode
            | ErrorKind::Listen
            | ErrorKind::Signal
            | ErrorKind::SignalHandler => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
