// ── Document store contract ──
//
// Push-based subscription surface over a remote document database.
// Registration is synchronous; delivery is async through per-handle
// unbounded channels, which keeps emission order intact with no
// coalescing. An `Err` event is terminal for its channel.

use std::task::{Context, Poll};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::document::Document;
use crate::error::StoreError;

/// One event on a snapshot channel: a fresh payload or a channel fault.
pub type SnapshotEvent<P> = Result<P, StoreError>;

/// Channel carrying full collection snapshots.
pub type CollectionChannel = SnapshotChannel<Vec<Document>>;

/// Channel carrying single-document snapshots. `None` means the
/// document does not currently exist at the subscribed path.
pub type DocumentChannel = SnapshotChannel<Option<Document>>;

// ── Channel pair ─────────────────────────────────────────────────────

/// Create a connected sender/receiver pair for snapshot delivery.
pub fn channel<P>() -> (SnapshotSender<P>, SnapshotChannel<P>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let closer = CancellationToken::new();
    (
        SnapshotSender {
            tx,
            closer: closer.clone(),
        },
        SnapshotChannel {
            rx,
            closer,
            closed: false,
        },
    )
}

/// Producer half held by a store backend.
#[derive(Debug, Clone)]
pub struct SnapshotSender<P> {
    tx: mpsc::UnboundedSender<SnapshotEvent<P>>,
    closer: CancellationToken,
}

impl<P> SnapshotSender<P> {
    /// Push one event. Returns `false` once the subscriber has closed
    /// or dropped its half -- the backend should prune this sender.
    pub fn send(&self, event: SnapshotEvent<P>) -> bool {
        if self.closer.is_cancelled() {
            return false;
        }
        self.tx.send(event).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.closer.is_cancelled() || self.tx.is_closed()
    }
}

/// Consumer half handed to the subscriber.
///
/// Events arrive in the exact order the backend emitted them. After
/// [`close`](Self::close) (or drop), nothing further is delivered,
/// including events that were already queued.
#[derive(Debug)]
pub struct SnapshotChannel<P> {
    rx: mpsc::UnboundedReceiver<SnapshotEvent<P>>,
    closer: CancellationToken,
    closed: bool,
}

impl<P> SnapshotChannel<P> {
    /// Receive the next event. `None` after teardown or once the
    /// backend has dropped its sender.
    pub async fn recv(&mut self) -> Option<SnapshotEvent<P>> {
        if self.closed {
            return None;
        }
        self.rx.recv().await
    }

    /// Poll variant of [`recv`](Self::recv), for `Stream` adapters.
    pub fn poll_recv(&mut self, cx: &mut Context<'_>) -> Poll<Option<SnapshotEvent<P>>> {
        if self.closed {
            return Poll::Ready(None);
        }
        self.rx.poll_recv(cx)
    }

    /// Tear the subscription down. Idempotent; queued events are
    /// discarded, and the backend observes the closure promptly.
    pub fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.closer.cancel();
            self.rx.close();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl<P> Drop for SnapshotChannel<P> {
    fn drop(&mut self) {
        self.close();
    }
}

// ── Store trait ──────────────────────────────────────────────────────

/// Subscription surface of a document store.
///
/// Opening a channel always succeeds structurally; path or permission
/// problems arrive as the channel's first (and only) event. Backends
/// deliver an initial snapshot immediately after registration.
pub trait DocumentStore: Send + Sync {
    /// Subscribe to every document in the collection at `path`.
    /// Snapshots carry the full collection in the store's order.
    fn open_collection_channel(&self, path: &str) -> CollectionChannel;

    /// Subscribe to the single document at `path`.
    fn open_document_channel(&self, path: &str) -> DocumentChannel;
}
