//! Service wiring.

use std::sync::Arc;

use dishpatch_services::{
    DocumentStore, IdentityProvider, MemoryDocumentStore, MemoryIdentityProvider,
};
use tracing::info;

use crate::console::Console;
use crate::session::{AccessGate, ClaimRetryConfig};

/// Operations account provisioned by [`AppServices::embedded`].
pub const DEFAULT_ADMIN_EMAIL: &str = "admin@dishpatch.io";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin_123";

/// The collaborator handles everything else is wired from.
///
/// Built once at startup and passed down explicitly; facades hold
/// cheap clones of the `Arc`s.
#[derive(Clone)]
pub struct AppServices {
    store: Arc<dyn DocumentStore>,
    identity: Arc<dyn IdentityProvider>,
}

impl AppServices {
    pub fn new(store: Arc<dyn DocumentStore>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self { store, identity }
    }

    /// Wire the embedded backend: an empty in-memory store and an
    /// identity provider holding one admin-claimed operations account
    /// ([`DEFAULT_ADMIN_EMAIL`] / [`DEFAULT_ADMIN_PASSWORD`]).
    ///
    /// The concrete handles are returned alongside the services so
    /// callers can seed collections and provision further accounts.
    pub fn embedded() -> (Self, MemoryDocumentStore, MemoryIdentityProvider) {
        let store = MemoryDocumentStore::new();
        let identity = MemoryIdentityProvider::new();

        identity.register(DEFAULT_ADMIN_EMAIL, DEFAULT_ADMIN_PASSWORD);
        if let Err(err) = identity.set_admin_claim(DEFAULT_ADMIN_EMAIL) {
            // Unreachable with the account registered one line up.
            info!(error = %err, "default account claim provisioning failed");
        }
        info!(email = DEFAULT_ADMIN_EMAIL, "embedded backend ready");

        let services = Self::new(
            Arc::new(store.clone()) as Arc<dyn DocumentStore>,
            Arc::new(identity.clone()) as Arc<dyn IdentityProvider>,
        );
        (services, store, identity)
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn identity(&self) -> &Arc<dyn IdentityProvider> {
        &self.identity
    }

    /// A query facade over the wired store.
    pub fn console(&self) -> Console {
        Console::new(Arc::clone(&self.store))
    }

    /// Spawn an access gate over the wired identity provider.
    pub fn gate(&self, retry: ClaimRetryConfig) -> AccessGate {
        AccessGate::new(Arc::clone(&self.identity), retry)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn embedded_backend_signs_in_the_default_account() {
        let (services, _store, identity) = AppServices::embedded();

        let signed_in = identity
            .sign_in(DEFAULT_ADMIN_EMAIL, DEFAULT_ADMIN_PASSWORD)
            .unwrap();
        let claims = services
            .identity()
            .claims(&signed_in, true)
            .await
            .unwrap();
        assert!(claims.admin);
    }
}
