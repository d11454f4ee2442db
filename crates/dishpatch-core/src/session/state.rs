//! Session lifecycle states.

use dishpatch_services::Identity;

/// Where the session stands, as published by the access gate.
///
/// The privilege verdict is three-valued: absent while the session is
/// resolving or signed out, pending in [`Verifying`](Self::Verifying),
/// and settled in [`SignedIn`](Self::SignedIn).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No answer from the identity provider yet.
    #[default]
    Resolving,
    /// No session.
    SignedOut,
    /// Signed in; the admin verdict has not settled.
    Verifying { identity: Identity },
    /// Signed in with a settled admin verdict.
    SignedIn { identity: Identity, admin: bool },
}

impl SessionState {
    /// The signed-in identity, if any.
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Resolving | Self::SignedOut => None,
            Self::Verifying { identity } | Self::SignedIn { identity, .. } => Some(identity),
        }
    }

    /// The admin verdict: `None` until it settles.
    pub fn admin(&self) -> Option<bool> {
        match self {
            Self::SignedIn { admin, .. } => Some(*admin),
            _ => None,
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.identity().is_some()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn verdict_settles_only_when_signed_in() {
        assert_eq!(SessionState::Resolving.admin(), None);
        assert_eq!(SessionState::SignedOut.admin(), None);

        let identity = Identity::new("u1");
        let verifying = SessionState::Verifying {
            identity: identity.clone(),
        };
        assert_eq!(verifying.admin(), None);
        assert!(verifying.is_signed_in());

        let denied = SessionState::SignedIn {
            identity,
            admin: false,
        };
        assert_eq!(denied.admin(), Some(false));
    }
}
