// Callback adapter that lands every invocation on a designated context

use crate::dispatcher::Dispatcher;
use std::sync::Arc;

/// Boxed one-shot callback receiving the operation's payload.
pub type Callback<T> = Box<dyn FnOnce(T) + Send + 'static>;

/// Wraps callbacks so they run on the dispatcher's thread.
///
/// Invoked on the designated thread, the wrapped callback runs in place.
/// Invoked anywhere else, it is posted to the dispatcher's queue and the
/// caller returns at once. Posted callbacks cannot be cancelled; they are
/// dropped only if the designated context no longer exists.
#[derive(Clone)]
pub struct ThreadRedirect {
    dispatcher: Arc<dyn Dispatcher>,
}

impl ThreadRedirect {
    pub fn new(dispatcher: Arc<dyn Dispatcher>) -> Self {
        Self { dispatcher }
    }

    pub fn wrap<T, F>(&self, callback: F) -> Callback<T>
    where
        T: Send + 'static,
        F: FnOnce(T) + Send + 'static,
    {
        let dispatcher = self.dispatcher.clone();
        Box::new(move |args: T| {
            if dispatcher.is_current() {
                callback(args);
            } else {
                dispatcher.post(Box::new(move || callback(args)));
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::{DispatchThread, MainQueue};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn runs_in_place_on_designated_thread() {
        let (handle, runner) = MainQueue::bind_current_thread();
        let redirect = ThreadRedirect::new(Arc::new(handle));
        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();

        let callback = redirect.wrap(move |value: u32| {
            assert_eq!(value, 5);
            flag.store(true, Ordering::SeqCst);
        });
        callback(5);

        assert!(ran.load(Ordering::SeqCst));
        assert_eq!(runner.run_pending(), 0);
    }

    #[test]
    fn posts_from_other_threads_and_returns_first() {
        let (handle, runner) = MainQueue::bind_current_thread();
        let main_id = thread::current().id();
        let redirect = ThreadRedirect::new(Arc::new(handle));
        let (tx, rx) = mpsc::channel();

        let callback = redirect.wrap(move |message: String| {
            let _ = tx.send((message, thread::current().id()));
        });
        thread::spawn(move || callback("done".to_string()))
            .join()
            .unwrap();

        // Nothing has run yet: the worker only queued the callback.
        assert!(rx.try_recv().is_err());
        assert_eq!(runner.run_pending(), 1);
        let (message, ran_on) = rx.recv_timeout(Duration::from_secs(1)).unwrap();
        assert_eq!(message, "done");
        assert_eq!(ran_on, main_id);
    }

    #[test]
    fn lands_on_dispatch_thread() {
        let dispatch = Arc::new(DispatchThread::spawn("redirect-main").unwrap());
        let redirect = ThreadRedirect::new(dispatch.clone());
        let (tx, rx) = mpsc::channel();
        let probe = dispatch.handle();

        let callback = redirect.wrap(move |_: ()| {
            let _ = tx.send(probe.is_current());
        });
        callback(());

        assert!(rx.recv_timeout(Duration::from_secs(5)).unwrap());
    }

    #[test]
    fn dropped_when_context_is_torn_down() {
        let (handle, runner) = MainQueue::bind_current_thread();
        let redirect = ThreadRedirect::new(Arc::new(handle));
        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();
        let callback = redirect.wrap(move |_: ()| flag.store(true, Ordering::SeqCst));
        drop(runner);

        thread::spawn(move || callback(())).join().unwrap();
        assert!(!ran.load(Ordering::SeqCst));
    }
}
