//! Embedded backend: in-memory implementations of the collaborator
//! contracts, used by tests, local development, and default wiring.

mod identity;
mod store;

pub use identity::MemoryIdentityProvider;
pub use store::MemoryDocumentStore;
