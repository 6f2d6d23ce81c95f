// Async bridge: waits on a deferred wallet result off the calling thread and
// turns its outcome into exactly one success or failure callback.

use crate::deferred::PendingResult;
use crate::delegate::Callback;
use crate::executor::BackgroundExecutor;
use log::{debug, error, info};
use std::sync::Arc;

/// Reported when the executor drops a wait without running it.
pub const EXECUTOR_UNAVAILABLE_MESSAGE: &str = "Background executor unavailable";

/// Log lines emitted when a bridged call finishes.
#[derive(Debug, Clone)]
pub struct BridgeLog {
    /// Prefix for the error line, e.g. "Failed to sign 2 transaction(s)".
    pub failure_context: String,
    /// Info line on success, e.g. "Signed 2 transaction(s)".
    pub success_message: String,
}

impl BridgeLog {
    pub fn new(failure_context: impl Into<String>, success_message: impl Into<String>) -> Self {
        Self {
            failure_context: failure_context.into(),
            success_message: success_message.into(),
        }
    }
}

#[derive(Clone)]
pub struct AsyncBridge {
    executor: Arc<dyn BackgroundExecutor>,
}

impl AsyncBridge {
    pub fn new(executor: Arc<dyn BackgroundExecutor>) -> Self {
        Self { executor }
    }

    /// Schedule the wait and return immediately.
    ///
    /// `convert` maps the transport's raw result into the value handed to
    /// `on_success`. No retries happen here.
    pub fn spawn<R, T, C>(
        &self,
        pending: PendingResult<R>,
        log: BridgeLog,
        convert: C,
        on_success: Callback<T>,
        on_failure: Callback<String>,
    ) where
        R: Send + 'static,
        T: Send + 'static,
        C: FnOnce(R) -> T + Send + 'static,
    {
        debug!("Scheduling wait: {}", log.success_message);
        let guard = FailureGuard {
            failure_context: log.failure_context.clone(),
            on_failure: Some(on_failure),
        };
        self.executor.execute(Box::new(move || {
            let mut guard = guard;
            let Some(on_failure) = guard.on_failure.take() else {
                return;
            };
            match pending.wait() {
                Ok(raw) => {
                    let value = convert(raw);
                    info!("{}", log.success_message);
                    on_success(value);
                }
                Err(e) => {
                    let message = e.to_string();
                    error!("{}: {}", log.failure_context, message);
                    on_failure(message);
                }
            }
        }));
    }
}

/// Fires the failure callback if the scheduled task is dropped unrun.
struct FailureGuard {
    failure_context: String,
    on_failure: Option<Callback<String>>,
}

impl Drop for FailureGuard {
    fn drop(&mut self) {
        if let Some(on_failure) = self.on_failure.take() {
            error!("{}: {}", self.failure_context, EXECUTOR_UNAVAILABLE_MESSAGE);
            on_failure(EXECUTOR_UNAVAILABLE_MESSAGE.to_string());
        }
    }
}
