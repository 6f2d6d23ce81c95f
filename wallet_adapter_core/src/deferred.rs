// One-shot deferred results handed out by wallet transports

use crate::error::{AdapterError, AdapterResult};
use tokio::sync::oneshot;

/// Create a linked producer/consumer pair for a single wallet result.
pub fn pending<T>() -> (Completer<T>, PendingResult<T>) {
    let (tx, rx) = oneshot::channel();
    (Completer { tx }, PendingResult { rx })
}

/// Producer side: resolves the paired `PendingResult` exactly once.
#[derive(Debug)]
pub struct Completer<T> {
    tx: oneshot::Sender<AdapterResult<T>>,
}

impl<T> Completer<T> {
    pub fn complete(self, result: AdapterResult<T>) {
        // A dropped consumer means nobody is interested any more.
        let _ = self.tx.send(result);
    }

    pub fn resolve(self, value: T) {
        self.complete(Ok(value));
    }

    pub fn fail(self, message: impl Into<String>) {
        self.complete(Err(AdapterError::Transport(message.into())));
    }
}

/// Consumer side of a wallet call that has not finished yet.
///
/// `wait` takes the handle by value, so a result is read at most once. It
/// blocks the current thread and must not be called from inside an async
/// task; the bridge runs it on a blocking executor.
#[derive(Debug)]
pub struct PendingResult<T> {
    rx: oneshot::Receiver<AdapterResult<T>>,
}

impl<T> PendingResult<T> {
    /// A result that is already known, for transports that answer inline.
    pub fn ready(result: AdapterResult<T>) -> Self {
        let (completer, pending) = pending();
        completer.complete(result);
        pending
    }

    pub fn wait(self) -> AdapterResult<T> {
        match self.rx.blocking_recv() {
            Ok(result) => result,
            Err(_) => Err(AdapterError::SessionClosed),
        }
    }

    /// Non-blocking variant of `wait` for callers that poll.
    pub fn try_take(&mut self) -> Option<AdapterResult<T>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(AdapterError::SessionClosed)),
        }
    }
}
