//! Trailing-edge debounce for interactive inputs such as search boxes.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::config::ClientConfig;

/// A callback that only fires once calls stop arriving for `delay`.
///
/// Each `call` cancels the pending invocation, if any, and schedules a new
/// one with the latest arguments. Must be used inside a tokio runtime.
/// Dropping a `Debounced` cancels its pending invocation.
pub struct Debounced<A> {
    callback: Arc<dyn Fn(A) + Send + Sync>,
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

pub fn debounce<A, F>(callback: F, delay: Duration) -> Debounced<A>
where
    A: Send + 'static,
    F: Fn(A) + Send + Sync + 'static,
{
    Debounced {
        callback: Arc::new(callback),
        delay,
        pending: Mutex::new(None),
    }
}

impl<A: Send + 'static> Debounced<A> {
    /// Debounce with the configured `debounce_ms` delay.
    pub fn from_config<F>(callback: F, config: &ClientConfig) -> Self
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        debounce(callback, config.debounce_delay())
    }

    pub fn call(&self, args: A) {
        let callback = Arc::clone(&self.callback);
        let delay = self.delay;
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = pending.take() {
            previous.abort();
        }
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            callback(args);
        }));
    }

    /// Drop the scheduled invocation without running it.
    pub fn cancel(&self) {
        if let Some(previous) = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            previous.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl<A> Drop for Debounced<A> {
    fn drop(&mut self) {
        let pending = self.pending.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = pending.take() {
            handle.abort();
        }
    }
}
