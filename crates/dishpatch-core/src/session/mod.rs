//! Session resolution and route protection.
//!
//! The [`AccessGate`] owns the session lifecycle: it follows the
//! identity provider's auth stream, verifies the admin privilege
//! (with bounded polling while freshly provisioned claims propagate),
//! and publishes a [`SessionState`] plus a [`GateView`] verdict for
//! the current route. [`evaluate`] exposes the verdict logic as a
//! pure function.

mod gate;
mod retry;
pub mod routes;
mod state;
mod view;

pub use gate::{AccessGate, ROOT_OPERATOR_UID};
pub use retry::ClaimRetryConfig;
pub use state::SessionState;
pub use view::{GateView, Redirect, evaluate};
