//! One-shot completion handles.
//!
//! A command issued without a callback returns a [`CompletionHandle`]
//! immediately. The driver-side [`Completer`] writes exactly one result into
//! it later. Consumers either `.await` the handle, block a thread on
//! [`CompletionHandle::wait`], or poll it once with
//! [`CompletionHandle::try_take`].
//!
//! A handle is always in exactly one of three states: nothing written yet
//! ([`Slot::Pending`]), a success (which may itself be an empty sentinel such
//! as "not found"), or an error. The last two are the arms of the delivered
//! `Result`, so they can never be confused with each other or with pending.
//!
//! ```rust
//! use ferrodoc_core::completion::{self, Abandoned, Slot};
//!
//! let (completer, handle) = completion::channel::<u64, Abandoned>();
//! let handle = match handle.try_take() {
//!     Slot::Pending(handle) => handle,
//!     Slot::Ready(_) => unreachable!("nothing was written"),
//! };
//!
//! completer.complete(Ok(3));
//! assert_eq!(handle.wait(), Ok(3));
//! ```

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;
use tracing::trace;

pub use crate::error::Abandoned;

/// Create a connected producer/consumer pair.
pub fn channel<T, E>() -> (Completer<T, E>, CompletionHandle<T, E>) {
    let (tx, rx) = oneshot::channel();
    (Completer { tx }, CompletionHandle { rx })
}

/// The producing half. Consumed by its single write.
pub struct Completer<T, E> {
    tx: oneshot::Sender<Result<T, E>>,
}

impl<T, E> Completer<T, E> {
    /// Deliver the result.
    ///
    /// If the consumer has already gone away the result is dropped.
    pub fn complete(self, result: Result<T, E>) {
        if self.tx.send(result).is_err() {
            trace!("Completion handle dropped before delivery");
        }
    }

    /// Check if the consumer has gone away.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl<T, E> fmt::Debug for Completer<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completer")
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// The consuming half.
///
/// Resolves to `E::from(Abandoned)` if the [`Completer`] is dropped without
/// writing.
pub struct CompletionHandle<T, E> {
    rx: oneshot::Receiver<Result<T, E>>,
}

impl<T, E: From<Abandoned>> CompletionHandle<T, E> {
    /// Block the current thread until the result arrives.
    ///
    /// # Panics
    ///
    /// Panics when called from within an asynchronous execution context;
    /// `.await` the handle there instead.
    pub fn wait(self) -> Result<T, E> {
        self.rx
            .blocking_recv()
            .unwrap_or_else(|_| Err(E::from(Abandoned)))
    }

    /// Take the result if it has already been written, without waiting.
    pub fn try_take(mut self) -> Slot<T, E> {
        match self.rx.try_recv() {
            Ok(result) => Slot::Ready(result),
            Err(oneshot::error::TryRecvError::Empty) => Slot::Pending(self),
            Err(oneshot::error::TryRecvError::Closed) => Slot::Ready(Err(E::from(Abandoned))),
        }
    }
}

impl<T, E: From<Abandoned>> Future for CompletionHandle<T, E> {
    type Output = Result<T, E>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or_else(|_| Err(E::from(Abandoned))))
    }
}

impl<T, E> fmt::Debug for CompletionHandle<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionHandle").finish_non_exhaustive()
    }
}

/// Outcome of [`CompletionHandle::try_take`].
#[derive(Debug)]
pub enum Slot<T, E> {
    /// Nothing has been written yet; the handle is given back.
    Pending(CompletionHandle<T, E>),
    /// The delivered result.
    Ready(Result<T, E>),
}

impl<T, E> Slot<T, E> {
    /// Check if a result was available.
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}
