//! Live mirroring of remote collections and documents.
//!
//! A [`LiveQuery`] subscribes to a path on the document store and
//! folds the arriving snapshot events into a [`QueryState`]: loading
//! until the first snapshot, then the latest data, then possibly an
//! error. Consumers pull updates with [`LiveQuery::changed`] or
//! through the [`LiveQueryStream`] adapter.

mod query;
mod state;

pub use query::{LiveQuery, LiveQueryStream};
pub use state::{QueryError, QueryState};
