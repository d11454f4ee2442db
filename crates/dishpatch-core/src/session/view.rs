//! Route protection verdicts.

use dishpatch_services::Identity;

use crate::session::routes;
use crate::session::state::SessionState;

/// Where a blocked navigation should land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redirect {
    ToLogin,
    ToLanding,
}

impl Redirect {
    /// The route this redirect points at.
    pub fn target(self) -> &'static str {
        match self {
            Self::ToLogin => routes::LOGIN,
            Self::ToLanding => routes::LANDING,
        }
    }
}

/// What the shell should render for the current session and route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateView {
    /// Session still resolving; show the splash skeleton.
    Loading,
    /// Signed in, admin verdict pending; show the verifying notice.
    Verifying,
    /// Navigation blocked; follow the redirect.
    Redirect(Redirect),
    /// Signed in without the admin privilege; show the denial card
    /// with the identity's label and a sign-out affordance.
    AccessDenied { identity: Identity },
    /// Route accessible; render it.
    Content,
}

/// Decide what `route` shows for `state`.
///
/// Resolution order: a still-resolving session always shows
/// [`GateView::Loading`]; any signed-in session is pushed off public
/// routes; missing sessions are pushed off protected routes; then the
/// admin verdict picks between verifying, denial, and content.
pub fn evaluate(state: &SessionState, route: &str) -> GateView {
    match state {
        SessionState::Resolving => GateView::Loading,
        state if routes::is_public(route) => {
            if state.is_signed_in() {
                GateView::Redirect(Redirect::ToLanding)
            } else {
                GateView::Content
            }
        }
        SessionState::SignedOut => GateView::Redirect(Redirect::ToLogin),
        SessionState::Verifying { .. } => GateView::Verifying,
        SessionState::SignedIn { admin: true, .. } => GateView::Content,
        SessionState::SignedIn {
            identity,
            admin: false,
        } => GateView::AccessDenied {
            identity: identity.clone(),
        },
    }
}
