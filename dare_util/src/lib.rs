//! Cross-cutting helpers shared by the cache and asset crates: the
//! [`Services`] context, phased init, content hashing, and the bug/error
//! split used throughout `dare_cache` and `dare_assets`.

pub mod either;
pub mod hash;
pub mod phase;
pub mod reflection;
pub mod services;
pub mod sink;
pub mod worker_pool;

pub use either::Either;
pub use hash::AssetHash;
pub use phase::InitPhase;
pub use reflection::{ReflectionService, StaticReflectionService};
pub use services::Services;
pub use sink::{BugSink, RecordingBugSink, TracingBugSink};
pub use worker_pool::{ThreadWorkerPool, WorkerPool};
