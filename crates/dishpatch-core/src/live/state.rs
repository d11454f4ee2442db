//! Observable state of a live query.

use dishpatch_services::{SecurityRuleContext, StoreError};
use thiserror::Error;

/// Failure surfaced on a live query handle.
///
/// Every variant except [`DocumentNotFound`](Self::DocumentNotFound)
/// is terminal: the subscription is torn down and the handle delivers
/// nothing further. A missing document is recoverable; the handle
/// stays subscribed and reports the document if it appears.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueryError {
    /// Access denied by security rules.
    #[error("permission denied: {0}")]
    PermissionDenied(SecurityRuleContext),

    /// The subscription path is malformed.
    #[error("invalid path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    /// The backing store reported a transport failure.
    #[error("store transport failed: {reason}")]
    Transport { reason: String },

    /// The subscribed document does not exist.
    #[error("document does not exist: {path}")]
    DocumentNotFound { path: String },

    /// A snapshot did not decode into the requested record type.
    #[error("failed to decode snapshot at {path}: {reason}")]
    Decode { path: String, reason: String },
}

impl QueryError {
    /// Whether this error ends the subscription.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::DocumentNotFound { .. })
    }
}

impl From<StoreError> for QueryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::PermissionDenied { context } => Self::PermissionDenied(context),
            StoreError::InvalidPath { path, reason } => Self::InvalidPath { path, reason },
            StoreError::Transport { reason } => Self::Transport { reason },
        }
    }
}

/// Snapshot of a live query as seen by a consumer.
///
/// Exactly one of "still loading", "has data", and "has failed" holds
/// at any time; the accessors expose the familiar triple of optional
/// data, optional error, and a loading flag.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum QueryState<T> {
    /// Subscribed, no snapshot observed yet.
    #[default]
    Loading,
    /// The latest decoded snapshot.
    Ready(T),
    /// The subscription failed. Check
    /// [`QueryError::is_terminal`] for whether it can recover.
    Failed(QueryError),
}

impl<T> QueryState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// The latest snapshot, if one is held.
    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Ready(data) => Some(data),
            _ => None,
        }
    }

    /// The current error, if the query has failed.
    pub fn error(&self) -> Option<&QueryError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }
}
