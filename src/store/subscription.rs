//! Subscription Task and Handle
//!
//! The apply task is the sole writer of the contact cache: it consumes the
//! remote snapshot stream and folds every emission into the engine state.
//! The [`SubscriptionHandle`] returned by `initialize` is the caller's way
//! to observe and cancel the subscription; the engine itself never tears it
//! down.

use std::sync::Arc;

use futures_util::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::remote::SnapshotStream;
use crate::store::StoreInner;

/// Connection state of the live subscription
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionStatus {
    /// Subscription opened, no snapshot received yet
    Connecting,
    /// At least one snapshot has been applied
    Connected,
    /// The stream ended or the subscription was cancelled
    Disconnected,
}

/// Handle to the live subscription opened by `initialize`.
///
/// Dropping the handle does NOT cancel the subscription; callers must call
/// [`SubscriptionHandle::cancel`] before re-initializing the engine or after
/// resetting it, or the apply task keeps running against the stream.
#[derive(Debug)]
pub struct SubscriptionHandle {
    task: JoinHandle<()>,
    status_rx: watch::Receiver<SubscriptionStatus>,
}

impl SubscriptionHandle {
    /// Latest observed connection state
    pub fn status(&self) -> SubscriptionStatus {
        if self.task.is_finished() {
            return SubscriptionStatus::Disconnected;
        }
        self.status_rx.borrow().clone()
    }

    /// Cancel the subscription: aborts the apply task, which drops the
    /// snapshot stream
    pub fn cancel(&self) {
        self.task.abort();
    }

    /// Whether the apply task is still running
    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }
}

/// Spawn the apply task over a freshly opened snapshot stream.
pub(crate) fn spawn(inner: Arc<StoreInner>, mut stream: SnapshotStream) -> SubscriptionHandle {
    let (status_tx, status_rx) = watch::channel(SubscriptionStatus::Connecting);

    let task = tokio::spawn(async move {
        while let Some(snapshot) = stream.next().await {
            if *status_tx.borrow() != SubscriptionStatus::Connected {
                let _ = status_tx.send(SubscriptionStatus::Connected);
            }
            inner.apply_snapshot(snapshot);
        }
        tracing::info!("[Sync] contact snapshot stream closed");
        let _ = status_tx.send(SubscriptionStatus::Disconnected);
    });

    SubscriptionHandle { task, status_rx }
}
