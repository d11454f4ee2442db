// ── Service error types ──
//
// Errors crossing the collaborator boundaries. Store errors travel
// inside subscription channels as events; identity errors come back
// from provider calls. Neither layer surfaces panics.

use std::fmt;

use thiserror::Error;

// ── Security rule context ────────────────────────────────────────────

/// The operation a security rule evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum RuleOperation {
    Get,
    List,
    Create,
    Update,
    Delete,
}

/// Which request a security rule denied, kept alongside the error so
/// screens can report exactly what was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityRuleContext {
    /// Path the request targeted.
    pub path: String,
    /// Operation the rules engine evaluated.
    pub operation: RuleOperation,
}

impl fmt::Display for SecurityRuleContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} on {}", self.operation, self.path)
    }
}

// ── Store errors ─────────────────────────────────────────────────────

/// Failures emitted by a document store, either as channel events or
/// from direct mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("request denied by security rules: {context}")]
    PermissionDenied { context: SecurityRuleContext },

    #[error("invalid target path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("store transport failure: {reason}")]
    Transport { reason: String },
}

impl StoreError {
    pub fn permission_denied(path: impl Into<String>, operation: RuleOperation) -> Self {
        Self::PermissionDenied {
            context: SecurityRuleContext {
                path: path.into(),
                operation,
            },
        }
    }

    /// The rule context for a permission denial, if that is what this is.
    pub fn rule_context(&self) -> Option<&SecurityRuleContext> {
        match self {
            Self::PermissionDenied { context } => Some(context),
            Self::InvalidPath { .. } | Self::Transport { .. } => None,
        }
    }
}

// ── Identity errors ──────────────────────────────────────────────────

/// Failures from the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("no account for {identifier}")]
    UserNotFound { identifier: String },

    #[error("claims unavailable: {reason}")]
    ClaimsUnavailable { reason: String },

    #[error("identity transport failure: {reason}")]
    Transport { reason: String },
}
