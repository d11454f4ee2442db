//! Subscription handles over document store channels.

use std::pin::Pin;
use std::task::{Context, Poll, Waker};

use dishpatch_services::{
    CollectionChannel, Document, DocumentChannel, DocumentStore, StoreError,
};
use futures_core::Stream;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::live::state::{QueryError, QueryState};

/// Raw payload drawn from either channel shape.
enum RawSnapshot {
    Collection(Vec<Document>),
    Document(Option<Document>),
}

enum RawChannel {
    Collection(CollectionChannel),
    Document(DocumentChannel),
}

impl RawChannel {
    async fn recv(&mut self) -> Option<Result<RawSnapshot, StoreError>> {
        match self {
            Self::Collection(ch) => {
                ch.recv().await.map(|ev| ev.map(RawSnapshot::Collection))
            }
            Self::Document(ch) => ch.recv().await.map(|ev| ev.map(RawSnapshot::Document)),
        }
    }

    fn poll_recv(&mut self, cx: &mut Context<'_>) -> Poll<Option<Result<RawSnapshot, StoreError>>> {
        match self {
            Self::Collection(ch) => ch
                .poll_recv(cx)
                .map(|ev| ev.map(|ev| ev.map(RawSnapshot::Collection))),
            Self::Document(ch) => ch
                .poll_recv(cx)
                .map(|ev| ev.map(|ev| ev.map(RawSnapshot::Document))),
        }
    }

    fn close(&mut self) {
        match self {
            Self::Collection(ch) => ch.close(),
            Self::Document(ch) => ch.close(),
        }
    }

    fn is_closed(&self) -> bool {
        match self {
            Self::Collection(ch) => ch.is_closed(),
            Self::Document(ch) => ch.is_closed(),
        }
    }
}

type DecodeFn<T> = fn(&str, RawSnapshot) -> Result<T, QueryError>;

fn decode_record<R: DeserializeOwned>(path: &str, doc: Document) -> Result<R, QueryError> {
    let value = serde_json::to_value(&doc).map_err(|err| QueryError::Decode {
        path: path.to_owned(),
        reason: err.to_string(),
    })?;
    serde_json::from_value(value).map_err(|err| QueryError::Decode {
        path: path.to_owned(),
        reason: err.to_string(),
    })
}

fn decode_collection<R: DeserializeOwned>(
    path: &str,
    raw: RawSnapshot,
) -> Result<Vec<R>, QueryError> {
    match raw {
        RawSnapshot::Collection(docs) => docs
            .into_iter()
            .map(|doc| decode_record(path, doc))
            .collect(),
        RawSnapshot::Document(_) => Err(QueryError::Decode {
            path: path.to_owned(),
            reason: "snapshot shape mismatch".to_owned(),
        }),
    }
}

fn decode_document<T: DeserializeOwned>(path: &str, raw: RawSnapshot) -> Result<T, QueryError> {
    match raw {
        RawSnapshot::Document(Some(doc)) => decode_record(path, doc),
        RawSnapshot::Document(None) => Err(QueryError::DocumentNotFound {
            path: path.to_owned(),
        }),
        RawSnapshot::Collection(_) => Err(QueryError::Decode {
            path: path.to_owned(),
            reason: "snapshot shape mismatch".to_owned(),
        }),
    }
}

/// Live mirror of a collection or document.
///
/// Each handle owns a private event channel into the store, so
/// snapshots arrive in publish order with nothing coalesced or
/// dropped. The handle is pull-based: call [`changed`](Self::changed)
/// (or poll the [`LiveQueryStream`] adapter) to advance the state.
///
/// Terminal errors tear the subscription down; a missing document is
/// reported but keeps the subscription alive so the state recovers if
/// the document appears.
pub struct LiveQuery<T> {
    path: String,
    channel: RawChannel,
    decode: DecodeFn<T>,
    state: QueryState<T>,
}

impl<R: DeserializeOwned> LiveQuery<Vec<R>> {
    /// Mirror the collection at `path`, decoding each document as `R`.
    pub fn collection(store: &dyn DocumentStore, path: &str) -> Self {
        Self {
            path: path.to_owned(),
            channel: RawChannel::Collection(store.open_collection_channel(path)),
            decode: decode_collection::<R>,
            state: QueryState::Loading,
        }
    }
}

impl<T: DeserializeOwned> LiveQuery<T> {
    /// Mirror the single document at `path`, decoded as `T`.
    pub fn document(store: &dyn DocumentStore, path: &str) -> Self {
        Self {
            path: path.to_owned(),
            channel: RawChannel::Document(store.open_document_channel(path)),
            decode: decode_document::<T>,
            state: QueryState::Loading,
        }
    }
}

impl<T> LiveQuery<T> {
    /// The subscribed path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The state as of the last observed event.
    pub fn state(&self) -> &QueryState<T> {
        &self.state
    }

    /// Wait for the next event and return the updated state.
    ///
    /// Returns `None` once the subscription has ended, whether by
    /// [`close`](Self::close), a terminal error already delivered, or
    /// the store going away.
    pub async fn changed(&mut self) -> Option<&QueryState<T>> {
        let event = self.channel.recv().await?;
        self.apply(event);
        Some(&self.state)
    }

    /// Apply every event already queued without waiting, then return
    /// the state.
    pub fn latest(&mut self) -> &QueryState<T> {
        let mut cx = Context::from_waker(Waker::noop());
        while let Poll::Ready(Some(event)) = self.channel.poll_recv(&mut cx) {
            self.apply(event);
        }
        &self.state
    }

    /// Stop observing. Queued events are discarded; `changed` returns
    /// `None` from here on. Idempotent, and implied by drop.
    pub fn close(&mut self) {
        self.channel.close();
    }

    pub fn is_closed(&self) -> bool {
        self.channel.is_closed()
    }

    /// Point the handle at a different path.
    ///
    /// The old subscription is torn down before the new one opens, so
    /// no stale event can interleave with the new path's snapshots.
    /// The state resets to [`QueryState::Loading`].
    pub fn rebind(&mut self, store: &dyn DocumentStore, path: &str) {
        self.channel.close();
        debug!(from = %self.path, to = path, "rebinding live query");
        self.channel = match &self.channel {
            RawChannel::Collection(_) => {
                RawChannel::Collection(store.open_collection_channel(path))
            }
            RawChannel::Document(_) => RawChannel::Document(store.open_document_channel(path)),
        };
        self.path = path.to_owned();
        self.state = QueryState::Loading;
    }

    /// Adapt the handle into a [`Stream`] of states.
    pub fn into_stream(self) -> LiveQueryStream<T> {
        LiveQueryStream { query: self }
    }

    fn apply(&mut self, event: Result<RawSnapshot, StoreError>) {
        let next = match event {
            Ok(raw) => (self.decode)(&self.path, raw),
            Err(err) => Err(QueryError::from(err)),
        };
        match next {
            Ok(data) => self.state = QueryState::Ready(data),
            Err(err) => {
                if err.is_terminal() {
                    debug!(path = %self.path, error = %err, "live query ended");
                    self.channel.close();
                }
                self.state = QueryState::Failed(err);
            }
        }
    }
}

/// [`Stream`] adapter over a [`LiveQuery`], yielding each successive
/// state. Ends when the subscription does.
pub struct LiveQueryStream<T> {
    query: LiveQuery<T>,
}

impl<T> LiveQueryStream<T> {
    /// The wrapped handle, for closing or rebinding mid-stream.
    pub fn get_mut(&mut self) -> &mut LiveQuery<T> {
        &mut self.query
    }

    /// Recover the handle.
    pub fn into_inner(self) -> LiveQuery<T> {
        self.query
    }
}

impl<T: Clone + Unpin> Stream for LiveQueryStream<T> {
    type Item = QueryState<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        match this.query.channel.poll_recv(cx) {
            Poll::Ready(Some(event)) => {
                this.query.apply(event);
                Poll::Ready(Some(this.query.state.clone()))
            }
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}
