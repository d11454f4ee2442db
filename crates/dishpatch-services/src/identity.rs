// ── Identity provider contract ──
//
// Auth state is published through a `watch` channel: subscribers see
// the current identity immediately and every sign-in/sign-out after.
// Claim resolution is an explicit async call so callers can force a
// fresh token when propagation lag matters.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::watch;

use crate::error::IdentityError;

/// A signed-in account as the provider reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

impl Identity {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: None,
            display_name: None,
        }
    }

    /// Email if known, otherwise the uid. Used in operator-facing text.
    pub fn label(&self) -> &str {
        self.email.as_deref().unwrap_or(&self.uid)
    }
}

/// Custom claims attached to an identity's token.
///
/// The `admin` flag is the one this system acts on; everything else
/// rides along untyped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClaimSet {
    #[serde(default)]
    pub admin: bool,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ClaimSet {
    pub fn admin() -> Self {
        Self {
            admin: true,
            extra: Map::new(),
        }
    }
}

/// Identity provider surface consumed by the session gate.
///
/// Sign-in itself belongs to the login screen's collaborator and is
/// not part of this contract.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Observe auth state. The receiver carries the current identity
    /// at subscription time; dropping it unsubscribes.
    fn auth_state(&self) -> watch::Receiver<Option<Identity>>;

    /// Resolve the claim set for `identity`. With `force_refresh` the
    /// provider must bypass any cached token.
    async fn claims(
        &self,
        identity: &Identity,
        force_refresh: bool,
    ) -> Result<ClaimSet, IdentityError>;

    /// End the current session. The resulting auth-state event is the
    /// observable effect.
    async fn sign_out(&self) -> Result<(), IdentityError>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn label_prefers_email() {
        let mut identity = Identity::new("abc123");
        assert_eq!(identity.label(), "abc123");

        identity.email = Some("ops@example.com".into());
        assert_eq!(identity.label(), "ops@example.com");
    }

    #[test]
    fn claims_deserialize_with_extras() {
        let claims: ClaimSet =
            serde_json::from_value(serde_json::json!({ "admin": true, "region": "emea" }))
                .unwrap();
        assert!(claims.admin);
        assert_eq!(claims.extra["region"], "emea");

        let defaulted: ClaimSet = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(!defaulted.admin);
    }
}
