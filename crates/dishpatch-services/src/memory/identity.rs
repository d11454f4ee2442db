// ── Embedded identity provider ──
//
// Password accounts, admin-claim provisioning with a configurable
// visibility delay, and fault injection for the claim endpoint. Claim
// updates become visible to forced refreshes only once their deadline
// passes, mirroring server-side token propagation.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::watch;
use tokio::time::{Duration, Instant};
use tracing::debug;

use crate::error::IdentityError;
use crate::identity::{ClaimSet, Identity, IdentityProvider};

/// In-memory [`IdentityProvider`]. Cheaply cloneable; clones share
/// accounts and the published auth state.
#[derive(Clone)]
pub struct MemoryIdentityProvider {
    inner: Arc<IdentityInner>,
}

struct IdentityInner {
    /// Accounts keyed by email.
    accounts: DashMap<String, Account>,
    auth_tx: watch::Sender<Option<Identity>>,
    next_uid: AtomicU64,
    /// Remaining claim lookups to fail with a transport error.
    claim_failures: AtomicUsize,
    /// Claim lookups served so far, failures included.
    claim_lookups: AtomicUsize,
}

struct Account {
    uid: String,
    password: SecretString,
    /// Claims baked into the token minted at sign-in or on the last
    /// successful forced refresh.
    token: ClaimSet,
    /// Claims as provisioned on the account.
    claims: ClaimSet,
    /// Provisioned claims not yet visible to token refreshes.
    pending: Option<PendingClaims>,
}

struct PendingClaims {
    claims: ClaimSet,
    visible_at: Instant,
}

impl Account {
    /// Claims a freshly minted token would carry right now.
    fn effective(&self) -> &ClaimSet {
        match &self.pending {
            Some(pending) if Instant::now() >= pending.visible_at => &pending.claims,
            _ => &self.claims,
        }
    }

    fn promote_due_pending(&mut self) {
        let due = self
            .pending
            .as_ref()
            .is_some_and(|pending| Instant::now() >= pending.visible_at);
        if !due {
            return;
        }
        if let Some(pending) = self.pending.take() {
            self.claims = pending.claims;
        }
    }
}

impl MemoryIdentityProvider {
    pub fn new() -> Self {
        let (auth_tx, _) = watch::channel(None);
        Self {
            inner: Arc::new(IdentityInner {
                accounts: DashMap::new(),
                auth_tx,
                next_uid: AtomicU64::new(1),
                claim_failures: AtomicUsize::new(0),
                claim_lookups: AtomicUsize::new(0),
            }),
        }
    }

    // ── Accounts ─────────────────────────────────────────────────────

    /// Create an account with a provider-assigned uid.
    pub fn register(&self, email: &str, password: &str) -> Identity {
        let n = self.inner.next_uid.fetch_add(1, Ordering::Relaxed);
        self.register_with_uid(&format!("user-{n:04}"), email, password)
    }

    /// Create an account with an explicit uid.
    pub fn register_with_uid(&self, uid: &str, email: &str, password: &str) -> Identity {
        self.inner.accounts.insert(
            email.to_owned(),
            Account {
                uid: uid.to_owned(),
                password: SecretString::from(password),
                token: ClaimSet::default(),
                claims: ClaimSet::default(),
                pending: None,
            },
        );
        let mut identity = Identity::new(uid);
        identity.email = Some(email.to_owned());
        identity
    }

    /// Verify credentials, mint a token from the currently visible
    /// claims, and publish the signed-in identity.
    pub fn sign_in(&self, email: &str, password: &str) -> Result<Identity, IdentityError> {
        let identity = {
            let mut account = self.inner.accounts.get_mut(email).ok_or_else(|| {
                IdentityError::UserNotFound {
                    identifier: email.to_owned(),
                }
            })?;
            if account.password.expose_secret() != password {
                return Err(IdentityError::InvalidCredentials);
            }
            account.promote_due_pending();
            account.token = account.effective().clone();

            let mut identity = Identity::new(&account.uid);
            identity.email = Some(email.to_owned());
            identity
        };

        debug!(uid = %identity.uid, "sign-in succeeded");
        self.inner.auth_tx.send_replace(Some(identity.clone()));
        Ok(identity)
    }

    // ── Claim provisioning ───────────────────────────────────────────

    /// Grant the admin claim, visible to refreshes immediately.
    pub fn set_admin_claim(&self, email: &str) -> Result<(), IdentityError> {
        self.set_admin_claim_after(email, Duration::ZERO)
    }

    /// Grant the admin claim, visible to refreshes after `delay`.
    pub fn set_admin_claim_after(
        &self,
        email: &str,
        delay: Duration,
    ) -> Result<(), IdentityError> {
        let mut account = self.inner.accounts.get_mut(email).ok_or_else(|| {
            IdentityError::UserNotFound {
                identifier: email.to_owned(),
            }
        })?;
        let mut claims = account.claims.clone();
        claims.admin = true;
        account.pending = Some(PendingClaims {
            claims,
            visible_at: Instant::now() + delay,
        });
        account.promote_due_pending();
        Ok(())
    }

    // ── Fault injection and probes ───────────────────────────────────

    /// Fail the next `n` claim lookups with a transport error.
    pub fn fail_claims(&self, n: usize) {
        self.inner.claim_failures.store(n, Ordering::Relaxed);
    }

    /// Claim lookups served so far, failures included.
    pub fn claims_lookups(&self) -> usize {
        self.inner.claim_lookups.load(Ordering::Relaxed)
    }

    fn email_for_uid(&self, uid: &str) -> Option<String> {
        self.inner
            .accounts
            .iter()
            .find(|entry| entry.uid == uid)
            .map(|entry| entry.key().clone())
    }
}

impl Default for MemoryIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    fn auth_state(&self) -> watch::Receiver<Option<Identity>> {
        self.inner.auth_tx.subscribe()
    }

    async fn claims(
        &self,
        identity: &Identity,
        force_refresh: bool,
    ) -> Result<ClaimSet, IdentityError> {
        self.inner.claim_lookups.fetch_add(1, Ordering::Relaxed);

        let remaining = self.inner.claim_failures.load(Ordering::Relaxed);
        if remaining > 0 {
            self.inner
                .claim_failures
                .store(remaining - 1, Ordering::Relaxed);
            return Err(IdentityError::ClaimsUnavailable {
                reason: "claim endpoint unavailable".to_owned(),
            });
        }

        let email =
            self.email_for_uid(&identity.uid)
                .ok_or_else(|| IdentityError::UserNotFound {
                    identifier: identity.uid.clone(),
                })?;
        let mut account = self.inner.accounts.get_mut(&email).ok_or_else(|| {
            IdentityError::UserNotFound {
                identifier: identity.uid.clone(),
            }
        })?;

        if force_refresh {
            account.promote_due_pending();
            account.token = account.effective().clone();
        }
        Ok(account.token.clone())
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        self.inner.auth_tx.send_replace(None);
        Ok(())
    }
}
