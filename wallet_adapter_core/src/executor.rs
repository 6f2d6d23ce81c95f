// Background execution contexts used to wait on wallet results

use log::error;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Somewhere to run blocking work away from the calling thread.
pub trait BackgroundExecutor: Send + Sync {
    fn execute(&self, task: Task);
}

/// Runs tasks on a tokio runtime's blocking pool.
#[derive(Clone)]
pub struct TokioExecutor {
    handle: tokio::runtime::Handle,
}

impl TokioExecutor {
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self { handle }
    }

    /// Use the runtime of the calling context, if there is one.
    pub fn try_current() -> Option<Self> {
        tokio::runtime::Handle::try_current().ok().map(Self::new)
    }
}

impl BackgroundExecutor for TokioExecutor {
    fn execute(&self, task: Task) {
        self.handle.spawn_blocking(task);
    }
}

/// Spawns one named OS thread per task. Needs no runtime.
#[derive(Debug)]
pub struct ThreadExecutor {
    name_prefix: String,
    spawned: AtomicU64,
}

impl ThreadExecutor {
    pub fn new(name_prefix: impl Into<String>) -> Self {
        Self {
            name_prefix: name_prefix.into(),
            spawned: AtomicU64::new(0),
        }
    }
}

impl Default for ThreadExecutor {
    fn default() -> Self {
        Self::new("wallet-adapter-worker")
    }
}

impl BackgroundExecutor for ThreadExecutor {
    fn execute(&self, task: Task) {
        let n = self.spawned.fetch_add(1, Ordering::Relaxed);
        let name = format!("{}-{}", self.name_prefix, n);
        if let Err(e) = std::thread::Builder::new().name(name.clone()).spawn(task) {
            error!("Failed to spawn background thread {}: {}", name, e);
        }
    }
}

/// Pick the current tokio runtime when present, otherwise plain threads.
pub fn default_executor() -> Arc<dyn BackgroundExecutor> {
    match TokioExecutor::try_current() {
        Some(executor) => Arc::new(executor),
        None => Arc::new(ThreadExecutor::default()),
    }
}
