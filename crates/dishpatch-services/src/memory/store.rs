// ── Embedded in-memory document store ──
//
// Backing store for tests, local development, and the default
// bootstrap wiring. Collections live in `DashMap`-held `BTreeMap`s
// (snapshots come out ascending by document id), and a rule table
// reproduces security-rule denials, including revoking access under
// live subscriptions.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use crate::document::{Document, Fields, split_document_path, validate_collection_path};
use crate::error::{RuleOperation, StoreError};
use crate::store::{
    CollectionChannel, DocumentChannel, DocumentStore, SnapshotSender, channel,
};

/// In-memory [`DocumentStore`]. Cheaply cloneable; clones share state.
#[derive(Clone, Default)]
pub struct MemoryDocumentStore {
    inner: Arc<StoreInner>,
}

#[derive(Default)]
struct StoreInner {
    /// Collection path -> (document id -> fields), id-ordered.
    collections: DashMap<String, BTreeMap<String, Fields>>,

    collection_subs: DashMap<u64, CollectionSub>,
    document_subs: DashMap<u64, DocumentSub>,
    next_sub: AtomicU64,

    /// Denied path prefixes (whole-segment match).
    denied: DashMap<String, ()>,

    /// Serializes registration and emission so every subscriber
    /// observes mutations in publish order.
    publish: Mutex<()>,
}

struct CollectionSub {
    path: String,
    tx: SnapshotSender<Vec<Document>>,
}

struct DocumentSub {
    collection: String,
    doc_id: String,
    tx: SnapshotSender<Option<Document>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Seeding ──────────────────────────────────────────────────────

    /// Replace the collection at `path` with `docs` and notify
    /// subscribers. Bypasses the rule table; intended for seeding.
    pub fn load_collection(
        &self,
        path: &str,
        docs: Vec<Document>,
    ) -> Result<(), StoreError> {
        validate_collection_path(path)?;
        let _guard = self.lock_publish();

        // Notify document subscribers of replaced and removed ids both.
        let ids: Vec<String> = {
            let mut col = self.inner.collections.entry(path.to_owned()).or_default();
            let mut ids: Vec<String> = col.keys().cloned().collect();
            col.clear();
            for doc in docs {
                ids.push(doc.id.clone());
                col.insert(doc.id.clone(), doc.fields);
            }
            ids.sort();
            ids.dedup();
            ids
        };

        self.inner.emit_collection(path);
        for id in ids {
            self.inner.emit_document(path, &id);
        }
        Ok(())
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Create a document with a store-assigned id. Returns the new id.
    pub fn insert(&self, collection: &str, fields: Fields) -> Result<String, StoreError> {
        validate_collection_path(collection)?;
        let _guard = self.lock_publish();
        if self.inner.is_denied(collection) {
            return Err(StoreError::permission_denied(
                collection,
                RuleOperation::Create,
            ));
        }

        let id = Uuid::new_v4().simple().to_string();
        {
            let mut col = self
                .inner
                .collections
                .entry(collection.to_owned())
                .or_default();
            col.insert(id.clone(), fields);
        }

        self.inner.emit_collection(collection);
        self.inner.emit_document(collection, &id);
        Ok(id)
    }

    /// Create or replace the document at `path` (a document path).
    pub fn upsert(&self, path: &str, fields: Fields) -> Result<(), StoreError> {
        let (collection, doc_id) = split_document_path(path)?;
        let _guard = self.lock_publish();
        if self.inner.is_denied(path) {
            return Err(StoreError::permission_denied(path, RuleOperation::Update));
        }

        {
            let mut col = self
                .inner
                .collections
                .entry(collection.to_owned())
                .or_default();
            col.insert(doc_id.to_owned(), fields);
        }

        self.inner.emit_collection(collection);
        self.inner.emit_document(collection, doc_id);
        Ok(())
    }

    /// Delete the document at `path`. Deleting a missing document is
    /// a no-op, as in the remote store.
    pub fn remove(&self, path: &str) -> Result<(), StoreError> {
        let (collection, doc_id) = split_document_path(path)?;
        let _guard = self.lock_publish();
        if self.inner.is_denied(path) {
            return Err(StoreError::permission_denied(path, RuleOperation::Delete));
        }

        let removed = {
            match self.inner.collections.get_mut(collection) {
                Some(mut col) => col.remove(doc_id).is_some(),
                None => false,
            }
        };

        if removed {
            self.inner.emit_collection(collection);
            self.inner.emit_document(collection, doc_id);
        }
        Ok(())
    }

    // ── Rule table ───────────────────────────────────────────────────

    /// Deny all access at and under `path`. New subscriptions fail on
    /// open; live subscriptions covered by the rule receive a terminal
    /// permission error.
    pub fn deny(&self, path: &str) {
        let _guard = self.lock_publish();
        self.inner.denied.insert(path.to_owned(), ());
        debug!(path, "rule table: path denied");
        self.inner.fail_covered_subscribers(path);
    }

    /// Remove a denial. Existing failed subscriptions stay failed;
    /// new subscriptions succeed again.
    pub fn allow(&self, path: &str) {
        self.inner.denied.remove(path);
    }

    // ── Direct reads ─────────────────────────────────────────────────

    /// Point-in-time snapshot of a collection, ascending by id.
    pub fn collection_snapshot(&self, path: &str) -> Vec<Document> {
        self.inner.snapshot(path)
    }

    /// Point-in-time read of a single document.
    pub fn document(&self, path: &str) -> Option<Document> {
        let (collection, doc_id) = split_document_path(path).ok()?;
        self.inner.lookup(collection, doc_id)
    }

    /// Live collection subscribers (closed channels excluded).
    pub fn collection_subscriber_count(&self) -> usize {
        self.inner
            .collection_subs
            .iter()
            .filter(|s| !s.tx.is_closed())
            .count()
    }

    /// Live document subscribers (closed channels excluded).
    pub fn document_subscriber_count(&self) -> usize {
        self.inner
            .document_subs
            .iter()
            .filter(|s| !s.tx.is_closed())
            .count()
    }

    fn lock_publish(&self) -> MutexGuard<'_, ()> {
        self.inner
            .publish
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn open_collection_channel(&self, path: &str) -> CollectionChannel {
        let (tx, rx) = channel();
        let _guard = self.lock_publish();

        if let Err(err) = validate_collection_path(path) {
            tx.send(Err(err));
            return rx;
        }
        if self.inner.is_denied(path) {
            debug!(path, "collection subscription denied by rules");
            tx.send(Err(StoreError::permission_denied(path, RuleOperation::List)));
            return rx;
        }

        tx.send(Ok(self.inner.snapshot(path)));
        let id = self.inner.next_sub.fetch_add(1, Ordering::Relaxed);
        self.inner.collection_subs.insert(
            id,
            CollectionSub {
                path: path.to_owned(),
                tx,
            },
        );
        rx
    }

    fn open_document_channel(&self, path: &str) -> DocumentChannel {
        let (tx, rx) = channel();
        let _guard = self.lock_publish();

        let (collection, doc_id) = match split_document_path(path) {
            Ok(parts) => parts,
            Err(err) => {
                tx.send(Err(err));
                return rx;
            }
        };
        if self.inner.is_denied(path) {
            debug!(path, "document subscription denied by rules");
            tx.send(Err(StoreError::permission_denied(path, RuleOperation::Get)));
            return rx;
        }

        tx.send(Ok(self.inner.lookup(collection, doc_id)));
        let id = self.inner.next_sub.fetch_add(1, Ordering::Relaxed);
        self.inner.document_subs.insert(
            id,
            DocumentSub {
                collection: collection.to_owned(),
                doc_id: doc_id.to_owned(),
                tx,
            },
        );
        rx
    }
}

// ── Fan-out internals ────────────────────────────────────────────────

impl StoreInner {
    fn snapshot(&self, path: &str) -> Vec<Document> {
        self.collections.get(path).map_or_else(Vec::new, |col| {
            col.iter()
                .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
                .collect()
        })
    }

    fn lookup(&self, collection: &str, doc_id: &str) -> Option<Document> {
        let col = self.collections.get(collection)?;
        col.get(doc_id)
            .map(|fields| Document::new(doc_id, fields.clone()))
    }

    fn is_denied(&self, path: &str) -> bool {
        self.denied.iter().any(|rule| rule_covers(rule.key(), path))
    }

    fn emit_collection(&self, path: &str) {
        let snapshot = self.snapshot(path);
        let mut dead = Vec::new();
        for sub in &self.collection_subs {
            if sub.path == path && !sub.tx.send(Ok(snapshot.clone())) {
                dead.push(*sub.key());
            }
        }
        for id in dead {
            self.collection_subs.remove(&id);
        }
    }

    fn emit_document(&self, collection: &str, doc_id: &str) {
        let current = self.lookup(collection, doc_id);
        let mut dead = Vec::new();
        for sub in &self.document_subs {
            if sub.collection == collection
                && sub.doc_id == doc_id
                && !sub.tx.send(Ok(current.clone()))
            {
                dead.push(*sub.key());
            }
        }
        for id in dead {
            self.document_subs.remove(&id);
        }
    }

    /// Fail and drop every live subscriber the rule at `rule` covers.
    fn fail_covered_subscribers(&self, rule: &str) {
        let mut dead = Vec::new();
        for sub in &self.collection_subs {
            if rule_covers(rule, &sub.path) {
                sub.tx.send(Err(StoreError::permission_denied(
                    sub.path.clone(),
                    RuleOperation::List,
                )));
                dead.push(*sub.key());
            }
        }
        for id in dead {
            self.collection_subs.remove(&id);
        }

        let mut dead = Vec::new();
        for sub in &self.document_subs {
            let doc_path = format!("{}/{}", sub.collection, sub.doc_id);
            if rule_covers(rule, &doc_path) {
                sub.tx.send(Err(StoreError::permission_denied(
                    doc_path,
                    RuleOperation::Get,
                )));
                dead.push(*sub.key());
            }
        }
        for id in dead {
            self.document_subs.remove(&id);
        }
    }
}

/// Whole-segment prefix match: `users` covers `users` and `users/u1`,
/// never `users-archive`.
fn rule_covers(rule: &str, path: &str) -> bool {
    match path.strip_prefix(rule) {
        Some("") => true,
        Some(rest) => rest.starts_with('/'),
        None => false,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn fields(value: serde_json::Value) -> Fields {
        match value {
            serde_json::Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[tokio::test]
    async fn subscription_starts_with_current_snapshot() {
        let store = MemoryDocumentStore::new();
        store
            .load_collection(
                "users",
                vec![Document::new("u1", fields(json!({ "name": "Ada" })))],
            )
            .unwrap();

        let mut rx = store.open_collection_channel("users");
        let snapshot = rx.recv().await.unwrap().unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, "u1");
    }

    #[tokio::test]
    async fn mutations_fan_out_in_publish_order() {
        let store = MemoryDocumentStore::new();
        let mut rx = store.open_collection_channel("orders");
        assert!(rx.recv().await.unwrap().unwrap().is_empty());

        let first = store.insert("orders", fields(json!({ "total": 10 }))).unwrap();
        let second = store.insert("orders", fields(json!({ "total": 20 }))).unwrap();

        assert_eq!(rx.recv().await.unwrap().unwrap().len(), 1);
        let snapshot = rx.recv().await.unwrap().unwrap();
        assert_eq!(snapshot.len(), 2);

        // Ascending id order, independent of insertion order.
        let mut ids = vec![first, second];
        ids.sort();
        assert_eq!(
            snapshot.iter().map(|d| d.id.clone()).collect::<Vec<_>>(),
            ids
        );
    }

    #[tokio::test]
    async fn document_channel_tracks_existence() {
        let store = MemoryDocumentStore::new();
        let mut rx = store.open_document_channel("users/u1");
        assert!(rx.recv().await.unwrap().unwrap().is_none());

        store
            .upsert("users/u1", fields(json!({ "name": "Ada" })))
            .unwrap();
        let doc = rx.recv().await.unwrap().unwrap().unwrap();
        assert_eq!(doc.get("name").unwrap(), "Ada");

        store.remove("users/u1").unwrap();
        assert!(rx.recv().await.unwrap().unwrap().is_none());
    }

    #[tokio::test]
    async fn denied_path_fails_new_subscriptions() {
        let store = MemoryDocumentStore::new();
        store.deny("users");

        let mut rx = store.open_collection_channel("users");
        let err = rx.recv().await.unwrap().unwrap_err();
        let ctx = err.rule_context().unwrap();
        assert_eq!(ctx.path, "users");
        assert_eq!(ctx.operation, RuleOperation::List);

        // The rule covers documents under the collection too.
        let mut rx = store.open_document_channel("users/u1");
        let err = rx.recv().await.unwrap().unwrap_err();
        assert_eq!(err.rule_context().unwrap().operation, RuleOperation::Get);

        store.allow("users");
        let mut rx = store.open_collection_channel("users");
        assert!(rx.recv().await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn deny_revokes_live_subscriptions() {
        let store = MemoryDocumentStore::new();
        let mut rx = store.open_collection_channel("drivers");
        assert!(rx.recv().await.unwrap().is_ok());

        store.deny("drivers");
        let err = rx.recv().await.unwrap().unwrap_err();
        assert!(matches!(err, StoreError::PermissionDenied { .. }));

        // The subscriber was dropped; later mutations are not delivered.
        store.allow("drivers");
        store.insert("drivers", Fields::new()).unwrap();
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn denied_mutations_report_the_operation() {
        let store = MemoryDocumentStore::new();
        store.deny("menuItems");

        let err = store.insert("menuItems", Fields::new()).unwrap_err();
        assert_eq!(err.rule_context().unwrap().operation, RuleOperation::Create);

        let err = store.upsert("menuItems/m1", Fields::new()).unwrap_err();
        assert_eq!(err.rule_context().unwrap().operation, RuleOperation::Update);

        let err = store.remove("menuItems/m1").unwrap_err();
        assert_eq!(err.rule_context().unwrap().operation, RuleOperation::Delete);
    }

    #[tokio::test]
    async fn invalid_paths_surface_as_channel_errors() {
        let store = MemoryDocumentStore::new();

        let mut rx = store.open_collection_channel("users/u1");
        assert!(matches!(
            rx.recv().await.unwrap().unwrap_err(),
            StoreError::InvalidPath { .. }
        ));
        assert!(rx.recv().await.is_none());

        let mut rx = store.open_document_channel("users");
        assert!(matches!(
            rx.recv().await.unwrap().unwrap_err(),
            StoreError::InvalidPath { .. }
        ));
    }

    #[tokio::test]
    async fn closed_channels_are_pruned() {
        let store = MemoryDocumentStore::new();
        let mut rx = store.open_collection_channel("users");
        assert_eq!(store.collection_subscriber_count(), 1);

        rx.close();
        assert_eq!(store.collection_subscriber_count(), 0);

        // The next emission clears the dead entry without delivering.
        store.insert("users", Fields::new()).unwrap();
        assert!(rx.recv().await.is_none());
    }

    #[test]
    fn rule_prefixes_match_whole_segments() {
        assert!(rule_covers("users", "users"));
        assert!(rule_covers("users", "users/u1"));
        assert!(rule_covers("users/u1", "users/u1"));
        assert!(!rule_covers("users", "users-archive"));
        assert!(!rule_covers("users/u1", "users"));
    }
}
