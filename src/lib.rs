//! # addsvc
//!
//! A pure business function behind composable middleware, served as JSON
//! over HTTP.
//!
//! ## The pieces
//!
//! - [`Endpoint`]: `(context, request) -> Result<response, error>`. Knows
//!   nothing about HTTP, credentials formats or cancellation sources.
//! - [`middleware`]: endpoint-to-endpoint transforms. The layer added last
//!   to a [`Chain`] runs first.
//! - [`transport`]: [`HttpBinding`] decodes an HTTP exchange into a call and
//!   encodes the result back, with ordered before/after hooks.
//! - [`Server`]: hyper accept loop that feeds requests to an endpoint.
//! - [`Supervisor`]: runs the listeners and the signal watcher; the first
//!   to finish stops the process.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use addsvc::{Server, Supervisor, health, service, supervisor, transport};
//! use tracing::Span;
//!
//! #[tokio::main]
//! async fn main() {
//!     let pipeline = service::pipeline("user", Span::none());
//!     let binding = service::make_http_binding(pipeline, vec![transport::basic_auth()], vec![]);
//!
//!     let mut sup = Supervisor::new(Span::none());
//!     let shutdown = sup.token();
//!     sup.spawn("signal", supervisor::interrupt());
//!     sup.spawn("debug", Server::bind("0.0.0.0:8001".parse().unwrap())
//!         .serve(health::router(Arc::default()), shutdown.clone()));
//!     sup.spawn("http", Server::bind("0.0.0.0:8000".parse().unwrap())
//!         .serve(binding, shutdown));
//!
//!     println!("{}", sup.run().await);
//! }
//! ```

mod config;
mod context;
mod credentials;
mod error;
mod metrics;
mod request;
mod response;
mod router;
mod server;

pub mod endpoint;
pub mod health;
pub mod middleware;
pub mod service;
pub mod supervisor;
pub mod transport;

pub use config::Config;
pub use context::Context;
pub use credentials::Credentials;
pub use endpoint::{BoxFuture, BoxedEndpoint, Endpoint, endpoint_fn};
pub use error::{Error, ErrorKind};
pub use metrics::{Metrics, Snapshot};
pub use middleware::{Chain, Middleware};
pub use request::Request;
pub use response::{ContentType, IntoResponse, Response, ResponseBuilder};
pub use router::Router;
pub use server::Server;
pub use service::{AddRequest, AddResponse};
pub use supervisor::{Exit, Supervisor};
pub use transport::HttpBinding;
