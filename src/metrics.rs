//! Request counters for the debug listener.
//!
//! The HTTP binding bumps these on every exchange; `/debug/vars` reads a
//! snapshot. Counters are relaxed atomics, so a snapshot taken while
//! requests are in flight may be off by the requests it races with.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

#[derive(Debug, Default)]
pub struct Metrics {
    requests: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    decode_errors: AtomicU64,
}

/// Point-in-time copy of [`Metrics`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct Snapshot {
    pub requests: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub decode_errors: u64,
}

impl Metrics {
    pub(crate) fn request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn success(&self) {
        self.succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn decode_error(&self) {
        self.decode_errors.fetch_add(1, Ordering::Relaxed);
        self.failure();
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            requests: self.requests.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
        }
    }
}
