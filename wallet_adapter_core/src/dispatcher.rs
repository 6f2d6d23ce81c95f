// Designated callback execution contexts
//
// A dispatcher names one thread ("main" context) and a FIFO queue feeding it.
// Callbacks posted from other threads run when that thread drains its queue.

use crate::executor::Task;
use log::{debug, error};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle, ThreadId};
use std::time::{Duration, Instant};

pub trait Dispatcher: Send + Sync {
    /// True when called on the designated thread.
    fn is_current(&self) -> bool;

    /// Queue a task for the designated thread. Never blocks. If the thread
    /// has gone away the task is dropped.
    fn post(&self, task: Task);
}

/// Queue bound to the thread that created it.
pub struct MainQueue;

impl MainQueue {
    /// Make the calling thread a designated context. The returned runner must
    /// be driven from this thread for posted tasks to run.
    pub fn bind_current_thread() -> (MainQueueHandle, MainQueueRunner) {
        let (tx, rx) = mpsc::channel();
        let handle = MainQueueHandle {
            tx,
            thread: thread::current().id(),
        };
        let runner = MainQueueRunner {
            rx,
            _not_send: PhantomData,
        };
        (handle, runner)
    }
}

#[derive(Clone, Debug)]
pub struct MainQueueHandle {
    tx: mpsc::Sender<Task>,
    thread: ThreadId,
}

impl Dispatcher for MainQueueHandle {
    fn is_current(&self) -> bool {
        thread::current().id() == self.thread
    }

    fn post(&self, task: Task) {
        if self.tx.send(task).is_err() {
            debug!("Designated context is gone, dropping posted callback");
        }
    }
}

/// Drains the queue on its owning thread. Not `Send`: it stays where it was
/// created, which is what makes `is_current` meaningful.
pub struct MainQueueRunner {
    rx: mpsc::Receiver<Task>,
    _not_send: PhantomData<*const ()>,
}

impl MainQueueRunner {
    /// Run every task already queued. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        while let Ok(task) = self.rx.try_recv() {
            task();
            ran += 1;
        }
        ran
    }

    /// Run tasks as they arrive until `done` holds or `timeout` elapses.
    /// Returns whether `done` was reached.
    pub fn run_until(&self, mut done: impl FnMut() -> bool, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.run_pending();
            if done() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            match self.rx.recv_timeout(deadline - now) {
                Ok(task) => task(),
                Err(mpsc::RecvTimeoutError::Timeout) => return done(),
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    self.run_pending();
                    return done();
                }
            }
        }
    }

    /// Block on the queue until `stop` is raised. Used by `DispatchThread`.
    fn run_until_stopped(&self, stop: &AtomicBool) {
        while !stop.load(Ordering::Acquire) {
            match self.rx.recv() {
                Ok(task) => task(),
                Err(_) => break,
            }
        }
        self.run_pending();
    }
}

/// A dedicated thread acting as the designated context.
pub struct DispatchThread {
    handle: MainQueueHandle,
    stop: Arc<AtomicBool>,
    join: Option<JoinHandle<()>>,
}

impl DispatchThread {
    pub fn spawn(name: impl Into<String>) -> std::io::Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = stop.clone();
        let (handle_tx, handle_rx) = mpsc::sync_channel(1);

        let join = thread::Builder::new().name(name.into()).spawn(move || {
            let (handle, runner) = MainQueue::bind_current_thread();
            if handle_tx.send(handle).is_err() {
                return;
            }
            runner.run_until_stopped(&thread_stop);
        })?;

        let handle = handle_rx.recv().map_err(|_| {
            std::io::Error::new(std::io::ErrorKind::Other, "dispatch thread exited during startup")
        })?;

        Ok(Self {
            handle,
            stop,
            join: Some(join),
        })
    }

    pub fn handle(&self) -> MainQueueHandle {
        self.handle.clone()
    }

    /// Run what is already queued, then stop the thread and wait for it.
    pub fn shutdown(mut self) {
        self.stop_and_join();
    }

    fn stop_and_join(&mut self) {
        if let Some(join) = self.join.take() {
            self.stop.store(true, Ordering::Release);
            // Wake the loop so it observes the flag.
            self.handle.post(Box::new(|| {}));
            if self.handle.is_current() {
                // Dropped from one of our own tasks: the loop exits once it returns.
                return;
            }
            if join.join().is_err() {
                error!("Dispatch thread panicked");
            }
        }
    }
}

impl Dispatcher for DispatchThread {
    fn is_current(&self) -> bool {
        self.handle.is_current()
    }

    fn post(&self, task: Task) {
        self.handle.post(task)
    }
}

impl Drop for DispatchThread {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}
