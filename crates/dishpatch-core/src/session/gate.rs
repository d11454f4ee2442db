//! Session access gate.
//!
//! A single driver task watches the identity provider's auth stream,
//! resolves the admin privilege for each session, and publishes
//! [`SessionState`] plus a per-route [`GateView`] over watch channels.
//! Claim lookups run inline in the driver, so verdicts for a session
//! are serialized and a claim result for a stale session is discarded
//! rather than published.

use std::sync::{Arc, Mutex, PoisonError};

use dishpatch_services::{Identity, IdentityError, IdentityProvider};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::session::retry::ClaimRetryConfig;
use crate::session::routes;
use crate::session::state::SessionState;
use crate::session::view::{GateView, evaluate};

/// Operations account granted the admin privilege without a claim
/// lookup. Checked before any claim resolution so the account keeps
/// access even while the claims backend misbehaves.
// TODO: drop once claim provisioning covers the ops account.
pub const ROOT_OPERATOR_UID: &str = "vMq3TZrX9kYdPw5uBhJcE2nLaSf1";

enum GateCommand {
    Navigate(String),
    RetryClaims,
}

/// Route-protecting session gate. Cheaply cloneable; clones share the
/// driver task.
#[derive(Clone)]
pub struct AccessGate {
    inner: Arc<GateInner>,
}

struct GateInner {
    identity: Arc<dyn IdentityProvider>,
    session_rx: watch::Receiver<SessionState>,
    route_rx: watch::Receiver<String>,
    view_rx: watch::Receiver<GateView>,
    commands: mpsc::UnboundedSender<GateCommand>,
    cancel: CancellationToken,
    driver: Mutex<Option<JoinHandle<()>>>,
}

impl AccessGate {
    /// Spawn the gate driver on the current runtime, starting at the
    /// landing route.
    pub fn new(identity: Arc<dyn IdentityProvider>, retry: ClaimRetryConfig) -> Self {
        Self::with_route(identity, retry, routes::LANDING)
    }

    /// Spawn the gate driver starting at `route`.
    pub fn with_route(
        identity: Arc<dyn IdentityProvider>,
        retry: ClaimRetryConfig,
        route: &str,
    ) -> Self {
        let (session_tx, session_rx) = watch::channel(SessionState::Resolving);
        let (route_tx, route_rx) = watch::channel(route.to_owned());
        let (view_tx, view_rx) = watch::channel(evaluate(&SessionState::Resolving, route));
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let driver = GateDriver {
            identity: Arc::clone(&identity),
            retry,
            auth_probe: identity.auth_state(),
            session_tx,
            route_tx,
            view_tx,
            cancel: cancel.child_token(),
            route: route.to_owned(),
            attempt: 0,
            next_poll: None,
        };
        let handle = tokio::spawn(driver.run(command_rx));

        Self {
            inner: Arc::new(GateInner {
                identity,
                session_rx,
                route_rx,
                view_rx,
                commands: command_tx,
                cancel,
                driver: Mutex::new(Some(handle)),
            }),
        }
    }

    /// Watch the session lifecycle.
    pub fn session(&self) -> watch::Receiver<SessionState> {
        self.inner.session_rx.clone()
    }

    /// Watch the verdict for the current route.
    pub fn view(&self) -> watch::Receiver<GateView> {
        self.inner.view_rx.clone()
    }

    /// The verdicts as a stream, starting from the current one.
    pub fn view_stream(&self) -> WatchStream<GateView> {
        WatchStream::new(self.inner.view_rx.clone())
    }

    /// Watch the current route.
    pub fn route(&self) -> watch::Receiver<String> {
        self.inner.route_rx.clone()
    }

    /// Move the console to `route`. The driver re-publishes the
    /// verdict shortly after.
    pub fn navigate(&self, route: impl Into<String>) {
        if self
            .inner
            .commands
            .send(GateCommand::Navigate(route.into()))
            .is_err()
        {
            debug!("navigate ignored; gate driver stopped");
        }
    }

    /// Re-check claims now, resetting the polling schedule.
    pub fn retry_claims(&self) {
        if self.inner.commands.send(GateCommand::RetryClaims).is_err() {
            debug!("claim retry ignored; gate driver stopped");
        }
    }

    /// End the current session. The gate observes the sign-out through
    /// the auth stream like any other identity change.
    pub async fn sign_out(&self) -> Result<(), IdentityError> {
        self.inner.identity.sign_out().await
    }

    /// Stop the driver and wait for it to finish.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        let handle = self
            .inner
            .driver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}

// ── Driver ──────────────────────────────────────────────────────────

struct GateDriver {
    identity: Arc<dyn IdentityProvider>,
    retry: ClaimRetryConfig,
    /// Second cursor on the auth stream, read to discard claim
    /// results that arrive after the session changed.
    auth_probe: watch::Receiver<Option<Identity>>,
    session_tx: watch::Sender<SessionState>,
    route_tx: watch::Sender<String>,
    view_tx: watch::Sender<GateView>,
    cancel: CancellationToken,
    route: String,
    attempt: u32,
    next_poll: Option<Instant>,
}

impl GateDriver {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<GateCommand>) {
        let cancel = self.cancel.clone();
        let mut auth_rx = self.identity.auth_state();

        let initial = auth_rx.borrow_and_update().clone();
        self.apply_identity(initial).await;

        loop {
            let next_poll = self.next_poll;
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                changed = auth_rx.changed() => match changed {
                    Ok(()) => {
                        let identity = auth_rx.borrow_and_update().clone();
                        self.apply_identity(identity).await;
                    }
                    Err(_) => {
                        warn!("identity stream ended; session state frozen");
                        break;
                    }
                },
                command = commands.recv() => match command {
                    Some(GateCommand::Navigate(route)) => self.apply_route(route),
                    Some(GateCommand::RetryClaims) => self.retry_now().await,
                    None => break,
                },
                () = time::sleep_until(next_poll.unwrap_or_else(Instant::now)),
                    if next_poll.is_some() =>
                {
                    self.poll_claims().await;
                }
            }
        }
        debug!("session gate driver stopped");
    }

    /// React to a value from the auth stream. Resets the polling
    /// schedule; a new session starts its own.
    async fn apply_identity(&mut self, identity: Option<Identity>) {
        self.attempt = 0;
        self.next_poll = None;
        match identity {
            None => {
                debug!("no session");
                self.set_session(SessionState::SignedOut);
            }
            Some(identity) if identity.uid == ROOT_OPERATOR_UID => {
                info!(uid = %identity.uid, "root operator session; skipping claim checks");
                self.set_session(SessionState::SignedIn {
                    identity,
                    admin: true,
                });
            }
            Some(identity) => {
                self.set_session(SessionState::Verifying {
                    identity: identity.clone(),
                });
                self.resolve_claims(identity).await;
            }
        }
    }

    /// Look up claims for `identity` and settle the verdict.
    ///
    /// A lookup failure counts as non-admin; access never opens on an
    /// unverified claim. Non-admin verdicts arm the polling schedule
    /// so late claim propagation is picked up.
    async fn resolve_claims(&mut self, identity: Identity) {
        let result = self.identity.claims(&identity, true).await;

        let stale = {
            let current = self.auth_probe.borrow();
            current.as_ref().map(|id| id.uid.as_str()) != Some(identity.uid.as_str())
        };
        if stale {
            debug!(uid = %identity.uid, "discarding claim result for replaced session");
            return;
        }

        match result {
            Ok(claims) if claims.admin => {
                info!(uid = %identity.uid, "admin privilege verified");
                self.next_poll = None;
                self.set_session(SessionState::SignedIn {
                    identity,
                    admin: true,
                });
            }
            Ok(_) => {
                debug!(uid = %identity.uid, "admin claim absent");
                self.set_session(SessionState::SignedIn {
                    identity,
                    admin: false,
                });
                self.schedule_retry();
            }
            Err(err) => {
                warn!(uid = %identity.uid, error = %err, "claim lookup failed; treating as non-admin");
                self.set_session(SessionState::SignedIn {
                    identity,
                    admin: false,
                });
                self.schedule_retry();
            }
        }
    }

    fn schedule_retry(&mut self) {
        let exhausted = self
            .retry
            .max_attempts
            .is_some_and(|max| self.attempt >= max);
        if exhausted {
            warn!(attempts = self.attempt, "claim polling exhausted; privilege still absent");
            self.next_poll = None;
            return;
        }
        let delay = self.retry.delay_for(self.attempt);
        self.attempt += 1;
        self.next_poll = Some(Instant::now() + delay);
    }

    async fn poll_claims(&mut self) {
        self.next_poll = None;
        let identity = self.session_tx.borrow().identity().cloned();
        let Some(identity) = identity else {
            return;
        };
        debug!(uid = %identity.uid, attempt = self.attempt, "re-checking claim propagation");
        self.resolve_claims(identity).await;
    }

    /// Handle a manual retry: reset the schedule and re-check now.
    async fn retry_now(&mut self) {
        let (identity, verified) = {
            let session = self.session_tx.borrow();
            (
                session.identity().cloned(),
                session.admin() == Some(true),
            )
        };
        let Some(identity) = identity else {
            debug!("claim retry ignored; no session");
            return;
        };
        if verified {
            return;
        }
        info!(uid = %identity.uid, "manual claim re-check requested");
        self.attempt = 0;
        self.next_poll = None;
        self.resolve_claims(identity).await;
    }

    fn apply_route(&mut self, route: String) {
        if self.route == route {
            return;
        }
        debug!(from = %self.route, to = %route, "route changed");
        self.route.clone_from(&route);
        self.route_tx.send_replace(route);
        self.publish_view();
    }

    fn set_session(&mut self, next: SessionState) {
        let modified = self.session_tx.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next.clone();
                true
            }
        });
        if modified {
            self.publish_view();
        }
    }

    fn publish_view(&self) {
        let next = evaluate(&self.session_tx.borrow(), &self.route);
        self.view_tx.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next.clone();
                true
            }
        });
    }
}
