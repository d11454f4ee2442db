//! Collaborator contracts and embedded backend for the dishpatch
//! workspace.
//!
//! This crate defines the two service seams the console core is wired
//! against, plus an in-memory backend implementing both:
//!
//! - **[`DocumentStore`]** vends snapshot channels for collections
//!   and single documents. Opening a channel always succeeds
//!   structurally; path and permission problems arrive as the first
//!   event on the channel it returned.
//!
//! - **[`IdentityProvider`]** publishes the signed-in identity over
//!   a `watch` channel and serves claim lookups and sign-out.
//!
//! - **Embedded backend** ([`memory`]): [`MemoryDocumentStore`] and
//!   [`MemoryIdentityProvider`], used by tests, local development, and
//!   default wiring. Both support fault injection: rule-table denials
//!   on the store side, claim-lookup failures and delayed claim
//!   visibility on the identity side.
//!
//! Snapshot delivery runs over per-subscriber unbounded channels, so
//! every published event reaches every live subscriber exactly once
//! and in publish order.

pub mod document;
pub mod error;
pub mod identity;
pub mod memory;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use document::{Document, Fields, split_document_path, validate_collection_path};
pub use error::{IdentityError, RuleOperation, SecurityRuleContext, StoreError};
pub use identity::{ClaimSet, Identity, IdentityProvider};
pub use memory::{MemoryDocumentStore, MemoryIdentityProvider};
pub use store::{
    CollectionChannel, DocumentChannel, DocumentStore, SnapshotChannel, SnapshotEvent,
    SnapshotSender,
};
