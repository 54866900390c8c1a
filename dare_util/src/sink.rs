//! Bug reporting.
//!
//! A "bug" is a precondition or invariant violation: the caller passed a
//! malformed argument, or called an operation on an object in a state that
//! can't support it. These are never propagated as `Result::Err` — the
//! offending call still returns its sentinel (`None`, `false`, an invalid
//! index) — but they are always reported somewhere so they can be caught in
//! testing and surfaced in production logs.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Receives bug reports from `dare_cache`/`dare_assets` operations.
///
/// Implementations must be cheap to call; bug reporting sits on the hot
/// path of every validated mutator.
pub trait BugSink: Send + Sync {
    fn report(&self, message: &'static str);

    /// Total bugs observed so far, if the implementation tracks one.
    fn count(&self) -> usize {
        0
    }
}

/// Default sink: logs at `error` level via `tracing`.
#[derive(Debug, Default)]
pub struct TracingBugSink {
    count: AtomicUsize,
}

impl TracingBugSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BugSink for TracingBugSink {
    fn report(&self, message: &'static str) {
        self.count.fetch_add(1, Ordering::Relaxed);
        tracing::error!(bug = message, "precondition violated");
    }

    fn count(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }
}

/// Test double that records every message it receives, for asserting on the
/// exact stable error string a validated operation reported.
#[derive(Debug, Default)]
pub struct RecordingBugSink {
    messages: parking_lot::Mutex<Vec<&'static str>>,
}

impl RecordingBugSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<&'static str> {
        self.messages.lock().clone()
    }

    pub fn last(&self) -> Option<&'static str> {
        self.messages.lock().last().copied()
    }
}

impl BugSink for RecordingBugSink {
    fn report(&self, message: &'static str) {
        tracing::error!(bug = message, "precondition violated");
        self.messages.lock().push(message);
    }

    fn count(&self) -> usize {
        self.messages.lock().len()
    }
}
