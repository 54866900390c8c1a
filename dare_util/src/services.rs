//! Explicit services context, replacing the global static singletons the
//! original relied on (`ReflectionMgr`, `TokenTable`, `gSysLog`, per the
//! Design Notes on global statics). Constructed once at startup and passed
//! by reference into every subsystem instead of reached for through a
//! global.

use std::sync::Arc;

use crate::reflection::{ReflectionService, StaticReflectionService};
use crate::sink::{BugSink, TracingBugSink};
use crate::worker_pool::{ThreadWorkerPool, WorkerPool};

pub struct Services {
    bug_sink: Arc<dyn BugSink>,
    reflection: Arc<dyn ReflectionService>,
    worker_pool: Arc<dyn WorkerPool>,
}

impl Services {
    pub fn new(
        bug_sink: Arc<dyn BugSink>,
        reflection: Arc<dyn ReflectionService>,
        worker_pool: Arc<dyn WorkerPool>,
    ) -> Self {
        Self {
            bug_sink,
            reflection,
            worker_pool,
        }
    }

    pub fn bug_sink(&self) -> &dyn BugSink {
        self.bug_sink.as_ref()
    }

    pub fn reflection(&self) -> &dyn ReflectionService {
        self.reflection.as_ref()
    }

    pub fn worker_pool(&self) -> &dyn WorkerPool {
        self.worker_pool.as_ref()
    }
}

impl Default for Services {
    fn default() -> Self {
        Self {
            bug_sink: Arc::new(TracingBugSink::new()),
            reflection: Arc::new(StaticReflectionService::new()),
            worker_pool: Arc::new(ThreadWorkerPool::new(
                std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(1),
            )),
        }
    }
}
