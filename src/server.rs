//! HTTP listener.
//!
//! [`Server::serve`] accepts connections until its shutdown token is
//! cancelled or `accept` fails, then returns. Connections still open at that
//! point are dropped with the accept loop; in-flight requests are abandoned,
//! not drained.
//!
//! Every request gets its own [`Context`]: its cancellation token is a child
//! of the shutdown token and is also cancelled if hyper drops the request
//! future because the client went away.

use std::convert::Infallible;
use std::fmt::Display;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::Full;
use hyper::body::Body;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span, debug, error, info};

use crate::context::Context;
use crate::endpoint::Endpoint;
use crate::error::Error;
use crate::request::Request;
use crate::response::{IntoResponse, Response};

enum Bind {
    Addr(SocketAddr),
    Listener(TcpListener),
}

/// The HTTP server.
pub struct Server {
    bind: Bind,
    span: Span,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called. A bind failure is returned from `serve`.
    pub fn bind(addr: SocketAddr) -> Self {
        Self { bind: Bind::Addr(addr), span: Span::none() }
    }

    /// Serves on an already bound listener.
    pub fn from_listener(listener: TcpListener) -> Self {
        Self { bind: Bind::Listener(listener), span: Span::none() }
    }

    /// Span that this server's log events are emitted in.
    pub fn span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Accepts connections and dispatches every request to `endpoint`.
    ///
    /// Returns `Ok(())` once `shutdown` is cancelled, or the error that
    /// stopped the listener.
    pub async fn serve<E>(self, endpoint: E, shutdown: CancellationToken) -> Result<(), Error>
    where
        E: Endpoint<Request, Response>,
    {
        let span = self.span.clone();
        self.run(Arc::new(endpoint), shutdown).instrument(span).await
    }

    async fn run<E>(self, endpoint: Arc<E>, shutdown: CancellationToken) -> Result<(), Error>
    where
        E: Endpoint<Request, Response>,
    {
        let listener = match self.bind {
            Bind::Addr(addr) => TcpListener::bind(addr).await.inspect_err(|e| {
                error!(%addr, "bind failed: {e}");
            })?,
            Bind::Listener(listener) => listener,
        };
        let addr = listener.local_addr()?;
        info!(%addr, "listening");

        let mut tasks = JoinSet::new();

        let result = loop {
            tokio::select! {
                biased;

                () = shutdown.cancelled() => break Ok(()),

                res = listener.accept() => {
                    let (stream, peer) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept failed: {e}");
                            break Err(Error::Listen(e));
                        }
                    };

                    let endpoint = Arc::clone(&endpoint);
                    let shutdown = shutdown.clone();
                    let io = TokioIo::new(stream);

                    tasks.spawn(
                        async move {
                            // Called once per request on the connection.
                            let svc = service_fn(move |req| {
                                dispatch(Arc::clone(&endpoint), shutdown.child_token(), req)
                            });

                            if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                                .serve_connection(io, svc)
                                .await
                            {
                                error!(%peer, "connection error: {e}");
                            }
                        }
                        .in_current_span(),
                    );
                }

                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        };

        info!(%addr, abandoned = tasks.len(), "stopped");
        tasks.abort_all();
        result
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Reads one request and produces one response.
///
/// Never fails towards hyper: endpoint errors become error responses.
async fn dispatch<E, B>(
    endpoint: Arc<E>,
    cancel: CancellationToken,
    req: hyper::Request<B>,
) -> Result<http::Response<Full<Bytes>>, Infallible>
where
    E: Endpoint<Request, Response>,
    B: Body,
    B::Error: Display,
{
    // Fires if this future is dropped before it finishes.
    let disconnect = cancel.clone().drop_guard();

    let response = match Request::from_hyper(req).await {
        Ok(req) => {
            let ctx = Context::from_token(cancel);
            endpoint.call(ctx, req).await.into_response()
        }
        Err(e) => {
            debug!("reading request body failed: {e}");
            StatusCode::BAD_REQUEST.into_response()
        }
    };

    disconnect.disarm();
    Ok(response.into_inner())
}
