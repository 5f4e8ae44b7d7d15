//! Single-shot completion channel.
//!
//! A [`Resolver`] is handed to an operation and a [`Completion`] is kept by
//! the caller. `resolve` and `reject` consume the resolver, so it can only
//! complete once. A resolver dropped without completing rejects on its own,
//! so the caller always observes exactly one outcome.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::error::{BridgeError, BridgeResult};

/// The completing half of the channel.
#[derive(Debug)]
pub struct Resolver<T> {
    tx: Option<oneshot::Sender<BridgeResult<T>>>,
}

/// The awaiting half of the channel.
#[derive(Debug)]
pub struct Completion<T> {
    rx: oneshot::Receiver<BridgeResult<T>>,
}

/// Create a connected resolver/completion pair.
pub fn channel<T>() -> (Resolver<T>, Completion<T>) {
    let (tx, rx) = oneshot::channel();
    (Resolver { tx: Some(tx) }, Completion { rx })
}

impl<T> Resolver<T> {
    pub fn resolve(mut self, value: T) {
        self.complete(Ok(value));
    }

    pub fn reject(mut self, error: BridgeError) {
        self.complete(Err(error));
    }

    /// Complete with whichever side `result` carries.
    pub fn settle(mut self, result: BridgeResult<T>) {
        self.complete(result);
    }

    fn complete(&mut self, result: BridgeResult<T>) {
        if let Some(tx) = self.tx.take() {
            // The caller may have stopped waiting; nothing to report then.
            let _ = tx.send(result);
        }
    }
}

impl<T> Drop for Resolver<T> {
    fn drop(&mut self) {
        if self.tx.is_some() {
            tracing::warn!("resolver dropped without completing");
            self.complete(Err(BridgeError::Store(
                "operation ended without completing".to_string(),
            )));
        }
    }
}

impl<T> Future for Completion<T> {
    type Output = BridgeResult<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(|received| match received {
            Ok(result) => result,
            Err(_) => Err(BridgeError::Store(
                "operation ended without completing".to_string(),
            )),
        })
    }
}
