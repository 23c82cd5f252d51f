//! Request context and cancellation
//!
//! Every lifecycle call receives a [`Context`]. Cancelling it, or letting its
//! deadline pass, interrupts remote calls wrapped in
//! [`Context::run_until_cancelled`]. Cancellation flows from a context to the
//! contexts derived from it, never the other way.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::time;

#[derive(Clone)]
pub struct Context {
    inner: Arc<Signal>,
}

struct Signal {
    deadline: Option<Instant>,
    tx: watch::Sender<bool>,
}

impl Context {
    pub fn new() -> Self {
        Self::with_deadline(None)
    }

    fn with_deadline(deadline: Option<Instant>) -> Self {
        let (tx, _) = watch::channel(false);
        Self {
            inner: Arc::new(Signal { deadline, tx }),
        }
    }

    /// Derive a context cancelled when this one is, or once `timeout`
    /// elapses. Must be called from within a tokio runtime.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let mut deadline = Instant::now() + timeout;
        if let Some(parent) = self.inner.deadline {
            deadline = deadline.min(parent);
        }
        let child = Self::with_deadline(Some(deadline));

        let parent = self.inner.tx.subscribe();
        let signal = Arc::clone(&child.inner);
        tokio::spawn(async move {
            tokio::select! {
                _ = time::sleep_until(deadline.into()) => {}
                _ = cancelled(parent) => {}
            }
            signal.tx.send_replace(true);
        });

        child
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        *self.inner.tx.borrow()
    }

    pub fn cancel(&self) {
        self.inner.tx.send_replace(true);
    }

    /// Drive `future` to completion unless this context is cancelled first.
    ///
    /// Returns `None` on cancellation. The future is dropped, which aborts any
    /// in-flight request it owns.
    pub async fn run_until_cancelled<F: Future>(&self, future: F) -> Option<F::Output> {
        let done = self.inner.tx.subscribe();
        if *done.borrow() {
            return None;
        }

        tokio::select! {
            output = future => Some(output),
            _ = cancelled(done) => None,
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

async fn cancelled(mut done: watch::Receiver<bool>) {
    if done.wait_for(|cancelled| *cancelled).await.is_err() {
        // The sender lives as long as the context; a dropped one never fires.
        std::future::pending::<()>().await;
    }
}
