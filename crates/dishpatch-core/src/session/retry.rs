//! Claim propagation polling schedule.

use std::time::Duration;

/// Schedule for re-checking custom claims after sign-in.
///
/// Freshly provisioned claims take a while to reach minted tokens, so
/// the gate re-polls a non-admin session on an exponential schedule
/// until the claim shows up or the attempts run out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimRetryConfig {
    /// Delay before the first re-check.
    pub initial_delay: Duration,
    /// Ceiling for the exponential schedule.
    pub max_delay: Duration,
    /// Total re-checks before giving up; `None` polls forever.
    pub max_attempts: Option<u32>,
}

impl Default for ClaimRetryConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(3),
            max_delay: Duration::from_secs(30),
            max_attempts: Some(20),
        }
    }
}

impl ClaimRetryConfig {
    /// Delay before re-check number `attempt` (zero-based):
    /// `initial_delay * 2^attempt`, capped at `max_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}
