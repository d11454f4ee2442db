//! Headless core of the dishpatch admin console.
//!
//! This crate owns the reactive data layer and session logic the
//! console shells (web, terminal) render from:
//!
//! - **[`LiveQuery`]** mirrors a store collection or document into a
//!   [`QueryState`]: loading until the first snapshot, then the latest
//!   decoded data, then possibly an error. Pull updates with
//!   [`changed()`](LiveQuery::changed) or via the
//!   [`LiveQueryStream`] adapter.
//!
//! - **[`AccessGate`]** follows the identity provider's auth stream,
//!   verifies the admin privilege (polling while freshly provisioned
//!   claims propagate), and publishes [`SessionState`] plus a
//!   [`GateView`] verdict for the current route over watch channels.
//!
//! - **[`Console`]** is the typed query facade over the store: one
//!   method per collection, document mirrors for detail views, and
//!   untyped escape hatches.
//!
//! - **Domain model** ([`model`]): record types for every collection
//!   the console renders, serialized in the store's field convention.
//!
//! - **[`AppServices`]** wires the two collaborator seams explicitly,
//!   with an embedded in-memory backend for development and tests.

pub mod bootstrap;
pub mod console;
pub mod live;
pub mod model;
pub mod session;

// ── Primary re-exports ──────────────────────────────────────────────
pub use bootstrap::AppServices;
pub use console::Console;
pub use live::{LiveQuery, LiveQueryStream, QueryError, QueryState};
pub use session::{
    AccessGate, ClaimRetryConfig, GateView, ROOT_OPERATOR_UID, Redirect, SessionState,
};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    Driver, DriverAvailability, DriverStatus, MenuCategory, MenuItem, MenuOption, Order,
    OrderItem, OrderParty, OrderStatus, Promotion, PromotionStatus, Review, User, UserStatus,
};
