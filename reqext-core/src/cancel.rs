//! Cooperative cancellation.
//!
//! A [`CancelHandle`] is kept by whoever may want to abort a request; the
//! matching [`CancelSignal`] travels with the [`AdapterRequest`](crate::AdapterRequest)
//! to the transport. Cancelling only flips a shared flag: the transport is
//! trusted to observe it and reject with
//! [`AdapterError::Cancelled`](crate::AdapterError::Cancelled).

use std::future::Future;
use std::sync::Arc;

use futures::future::{self, Either};
use futures::pin_mut;
use tokio::sync::watch;

use crate::{AdapterError, AdapterResponse};

/// Owner side of a cancellation pair.
///
/// Cloning the handle shares the same underlying flag.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    /// Creates a fresh, not yet cancelled handle.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Signal cancellation now. Idempotent.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// Returns `true` once [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Returns a signal observing this handle.
    pub fn signal(&self) -> CancelSignal {
        CancelSignal {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Transport side of a cancellation pair.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    /// Returns `true` if the owning handle has signalled cancellation.
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation is signalled.
    ///
    /// Never resolves if every [`CancelHandle`] is dropped without cancelling.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|cancelled| *cancelled).await.is_err() {
            futures::future::pending::<()>().await;
        }
    }
}

/// Drive a transport call while observing `signal`.
///
/// Resolves with the transport's own result, or rejects with
/// [`AdapterError::Cancelled`] as soon as the signal fires. The in-flight
/// call is dropped on cancellation. Transport bindings use this to honour the
/// signal set by the cancelable extension.
pub async fn cancellable<F>(
    signal: Option<CancelSignal>,
    url: &str,
    call: F,
) -> Result<AdapterResponse, AdapterError>
where
    F: Future<Output = Result<AdapterResponse, AdapterError>>,
{
    let Some(signal) = signal else {
        return call.await;
    };
    if signal.is_cancelled() {
        return Err(AdapterError::cancelled(url));
    }
    let cancelled = signal.cancelled();
    pin_mut!(call, cancelled);
    match future::select(call, cancelled).await {
        Either::Left((result, _)) => result,
        Either::Right(((), _)) => Err(AdapterError::cancelled(url)),
    }
}
