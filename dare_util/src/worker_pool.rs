//! Generic worker-pool abstraction (spec section 1: "we rely only on a
//! generic 'worker pool' abstraction", replacing the original's
//! `GfxTaskScheduler`). `dare_cache`'s core allocator has no dependency on
//! `tokio`/`rayon` — those stay at the `dare_engine` binary boundary; this
//! trait is the seam between them.

use std::sync::mpsc;
use std::thread::JoinHandle;

pub trait WorkerPool: Send + Sync {
    /// Submit a unit of work. The pool makes no ordering guarantees between
    /// submissions from different callers.
    fn submit(&self, job: Box<dyn FnOnce() + Send + 'static>);
}

/// Minimal fixed-size thread pool backed by `std::thread` and an mpsc
/// channel, matching the level of abstraction the original's task
/// scheduler offered without pulling in an async runtime this low in the
/// dependency graph.
pub struct ThreadWorkerPool {
    sender: Option<mpsc::Sender<Box<dyn FnOnce() + Send + 'static>>>,
    workers: Vec<JoinHandle<()>>,
}

impl ThreadWorkerPool {
    pub fn new(num_workers: usize) -> Self {
        let (sender, receiver) = mpsc::channel::<Box<dyn FnOnce() + Send + 'static>>();
        let receiver = std::sync::Arc::new(parking_lot::Mutex::new(receiver));
        let workers = (0..num_workers.max(1))
            .map(|_| {
                let receiver = receiver.clone();
                std::thread::spawn(move || loop {
                    let job = { receiver.lock().recv() };
                    match job {
                        Ok(job) => job(),
                        Err(_) => break,
                    }
                })
            })
            .collect();
        Self {
            sender: Some(sender),
            workers,
        }
    }
}

impl Drop for ThreadWorkerPool {
    fn drop(&mut self) {
        self.sender.take();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

impl WorkerPool for ThreadWorkerPool {
    fn submit(&self, job: Box<dyn FnOnce() + Send + 'static>) {
        if let Some(sender) = &self.sender {
            let _ = sender.send(job);
        }
    }
}
