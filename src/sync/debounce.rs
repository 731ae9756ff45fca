use std::time::Duration;

use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};
use tokio::time::{sleep_until, Instant};

use crate::runtime::{self, AsyncHandle};

/// Runs `action` with the latest submitted value once no new value has
/// arrived for `delay`. A value still pending when the debouncer is dropped
/// is flushed immediately.
pub struct Debouncer<T> {
    tx: UnboundedSender<T>,
    handle: Box<dyn AsyncHandle>,
}

impl<T: Send + 'static> Debouncer<T> {
    /// Must be called from within a tokio runtime
    pub fn new<F>(delay: Duration, mut action: F) -> Self
    where
        F: FnMut(T) + Send + 'static,
    {
        let (tx, mut rx) = unbounded_channel::<T>();
        let handle = runtime::spawn(async move {
            let mut pending: Option<T> = None;
            let mut deadline = Instant::now();
            loop {
                let armed = pending.is_some();
                tokio::select! {
                    msg = rx.recv() => match msg {
                        Some(value) => {
                            pending = Some(value);
                            deadline = Instant::now() + delay;
                        }
                        None => {
                            if let Some(value) = pending.take() {
                                action(value);
                            }
                            break;
                        }
                    },
                    _ = sleep_until(deadline), if armed => {
                        if let Some(value) = pending.take() {
                            action(value);
                        }
                    }
                }
            }
        });
        Self { tx, handle }
    }

    /// Submits a value, restarting the quiet period
    pub fn call(&self, value: T) {
        if self.tx.send(value).is_err() {
            log::warn!("debouncer task is gone; dropping value");
        }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}
