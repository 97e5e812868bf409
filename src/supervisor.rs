//! Process lifecycle.
//!
//! The supervisor runs a fixed set of long-lived tasks (listeners, the
//! signal watcher) side by side. None of them is expected to finish: the
//! first one that does, for whatever reason, ends the process. At that
//! point the supervisor cancels its shutdown token so every task sees the
//! stop, aborts whatever is still running, and hands the reason back to
//! `main`. Nothing is retried.

use std::fmt;
use std::future::Future;
use std::process::ExitCode;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span, error};

use crate::error::Error;

/// Why the process is stopping.
#[derive(Debug)]
pub enum Exit {
    /// A termination signal arrived.
    Signal(String),
    /// A task failed.
    Failed { task: &'static str, error: Error },
    /// A task returned without an error, which it should never do.
    Returned { task: &'static str },
    /// Every task ended without reporting, which only a panic causes.
    Panicked,
}

impl Exit {
    /// A signal is the expected way to stop; anything else is a failure.
    pub fn is_clean(&self) -> bool {
        matches!(self, Self::Signal(_))
    }

    pub fn code(&self) -> ExitCode {
        if self.is_clean() { ExitCode::SUCCESS } else { ExitCode::FAILURE }
    }
}

impl fmt::Display for Exit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signal(name) => write!(f, "{name}"),
            Self::Failed { task, error } => write!(f, "{task}: {error}"),
            Self::Returned { task } => write!(f, "{task}: stopped"),
            Self::Panicked => f.write_str("all tasks panicked"),
        }
    }
}

type Report = (&'static str, Result<(), Error>);

/// Runs tasks until the first of them finishes.
pub struct Supervisor {
    shutdown: CancellationToken,
    tasks: JoinSet<()>,
    tx: mpsc::Sender<Report>,
    rx: mpsc::Receiver<Report>,
    span: Span,
}

impl Supervisor {
    pub fn new(span: Span) -> Self {
        let (tx, rx) = mpsc::channel(8);
        Self { shutdown: CancellationToken::new(), tasks: JoinSet::new(), tx, rx, span }
    }

    /// Token cancelled when the supervisor stops. Hand clones to tasks so
    /// they can wind down.
    pub fn token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Starts `task` under the name `name`.
    pub fn spawn<F>(&mut self, name: &'static str, task: F)
    where
        F: Future<Output = Result<(), Error>> + Send + 'static,
    {
        let tx = self.tx.clone();
        self.tasks.spawn(async move {
            let result = task.await;
            // The receiver is gone once the supervisor has stopped.
            let _ = tx.send((name, result)).await;
        });
    }

    /// Waits for the first task to finish, stops the rest and returns why.
    pub async fn run(self) -> Exit {
        let Self { shutdown, mut tasks, tx, mut rx, span } = self;
        drop(tx);

        let exit = match rx.recv().await {
            Some((_, Err(Error::Signal(name)))) => Exit::Signal(name),
            Some((task, Err(error))) => Exit::Failed { task, error },
            Some((task, Ok(()))) => Exit::Returned { task },
            None => Exit::Panicked,
        };
        span.in_scope(|| error!(fatal = %exit, "stopping"));

        shutdown.cancel();
        tasks.shutdown().instrument(span).await;
        exit
    }
}

// ── Signals ───────────────────────────────────────────────────────────────────

/// Resolves on the first termination signal the process receives.
///
/// On Unix this is SIGINT or SIGTERM; elsewhere Ctrl-C. The signal is
/// reported as [`Error::Signal`]; failing to install a handler is reported
/// as [`Error::SignalHandler`].
pub async fn interrupt() -> Result<(), Error> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigint = signal(SignalKind::interrupt()).map_err(Error::SignalHandler)?;
        let mut sigterm = signal(SignalKind::terminate()).map_err(Error::SignalHandler)?;
        let name = tokio::select! {
            _ = sigint.recv() => "interrupt",
            _ = sigterm.recv() => "terminated",
        };
        Err(Error::Signal(name.to_owned()))
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.map_err(Error::SignalHandler)?;
        Err(Error::Signal("interrupt".to_owned()))
    }
}
