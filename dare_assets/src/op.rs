//! `AssetOp` contract (spec section 4.5) and one worked example,
//! `SaveDomainOp`, recovered from `Ops/SaveDomainOp.cpp` per SPEC_FULL's
//! supplemented-feature list so the contract isn't purely abstract.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::AssetDataError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionThread {
    Main,
    Worker,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpStatus {
    Pending,
    Running,
    Completed,
    Failed(String),
}

/// Spec section 4.5's contract: `update()` may be called repeatedly and
/// advances a small internal state machine; dependencies must be observed
/// complete before a dependent advances. The core guarantees `update` is
/// never called concurrently with itself for the same op and that a
/// `Failed` op never re-enters `update` — both are the *caller's*
/// (scheduler's) responsibility, not this trait's.
pub trait AssetOp: Send + Sync {
    fn execution_thread(&self) -> ExecutionThread;
    fn dependencies(&self) -> &[Arc<dyn AssetOp>];
    fn status(&self) -> OpStatus;
    fn update(&self);
}

pub fn dependencies_satisfied(op: &dyn AssetOp) -> bool {
    op.dependencies()
        .iter()
        .all(|d| matches!(d.status(), OpStatus::Completed))
}

/// Persists every block in a domain back to its `.lfindex` sidecar
/// (`AssetCacheController::save_domain`), the same shape as the source's
/// `SaveDomainOp`.
pub struct SaveDomainOp {
    cache: Arc<dare_cache::AssetCacheController>,
    domain: String,
    dependencies: Vec<Arc<dyn AssetOp>>,
    status: Mutex<OpStatus>,
}

impl SaveDomainOp {
    pub fn new(
        cache: Arc<dare_cache::AssetCacheController>,
        domain: impl Into<String>,
        dependencies: Vec<Arc<dyn AssetOp>>,
    ) -> Self {
        Self {
            cache,
            domain: domain.into(),
            dependencies,
            status: Mutex::new(OpStatus::Pending),
        }
    }
}

impl AssetOp for SaveDomainOp {
    fn execution_thread(&self) -> ExecutionThread {
        ExecutionThread::Worker
    }

    fn dependencies(&self) -> &[Arc<dyn AssetOp>] {
        &self.dependencies
    }

    fn status(&self) -> OpStatus {
        self.status.lock().clone()
    }

    fn update(&self) {
        {
            let status = self.status.lock();
            if !matches!(*status, OpStatus::Pending) {
                return;
            }
        }
        if !dependencies_satisfied(self) {
            return;
        }
        *self.status.lock() = OpStatus::Running;
        let result = self.cache.save_domain(&self.domain);
        *self.status.lock() = match result {
            Ok(()) => OpStatus::Completed,
            Err(e) => OpStatus::Failed(e.to_string()),
        };
    }
}

/// Errors an op reports through `OpStatus::Failed` carry human-readable
/// text, not a `Result`; `AssetDataError`'s `Display` is reused to produce
/// that text in `SaveDomainOp` and future concrete ops.
pub fn failure_reason(error: &AssetDataError) -> String {
    error.to_string()
}
