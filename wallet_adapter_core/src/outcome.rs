// Collects a success/failure callback pair into a single Outcome

use crate::delegate::Callback;
use crate::models::Outcome;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::oneshot;

/// Build a callback pair whose first invocation is delivered to the returned
/// receiver. Later invocations are ignored.
pub fn outcome_channel<T: Send + 'static>() -> (Callback<T>, Callback<String>, OutcomeReceiver<T>) {
    let (tx, rx) = oneshot::channel();
    let slot = Arc::new(Mutex::new(Some(tx)));
    let failure_slot = slot.clone();

    let on_success: Callback<T> = Box::new(move |value| deliver(&slot, Outcome::Success(value)));
    let on_failure: Callback<String> =
        Box::new(move |message| deliver(&failure_slot, Outcome::Failure(message)));

    (on_success, on_failure, OutcomeReceiver { rx })
}

fn deliver<T>(slot: &Mutex<Option<oneshot::Sender<Outcome<T>>>>, outcome: Outcome<T>) {
    let sender = slot.lock().unwrap_or_else(PoisonError::into_inner).take();
    if let Some(sender) = sender {
        let _ = sender.send(outcome);
    }
}

pub struct OutcomeReceiver<T> {
    rx: oneshot::Receiver<Outcome<T>>,
}

impl<T> OutcomeReceiver<T> {
    /// Block until one of the callbacks ran. Must not be called from inside
    /// an async task.
    pub fn wait(self) -> Outcome<T> {
        self.rx
            .blocking_recv()
            .unwrap_or_else(|_| Outcome::Failure("Operation finished without reporting an outcome".to_string()))
    }

    pub fn try_take(&mut self) -> Option<Outcome<T>> {
        match self.rx.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Outcome::Failure(
                "Operation finished without reporting an outcome".to_string(),
            )),
        }
    }
}
