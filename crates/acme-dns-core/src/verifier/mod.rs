//! Propagation verifier
//!
//! Polls public DNS until the challenge record is visible, with a bounded
//! number of rounds and a fixed delay.
//!
//! ## Algorithm
//!
//! ```text
//! for attempt in 1..=attempts:
//!     sleep(delay)                  # also before the first lookup
//!     lookup TXT _acme-challenge.<domain>.
//!       records  -> any unquote(value) == expected ? return Propagated
//!       NotFound -> not yet propagated, next round
//!       Err      -> transient fault, logged, next round
//! return Exhausted
//! ```
//!
//! Sleeping before the first lookup gives the authoritative nameservers
//! time to pick up the change.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

use crate::record::{challenge_name, unquote};
use crate::traits::{TxtLookup, TxtResolver};

/// Default number of lookup rounds
pub const DEFAULT_ATTEMPTS: u32 = 5;

/// Default delay before each round, in seconds
pub const DEFAULT_DELAY_SECS: u64 = 15;

/// Bounded retry-with-fixed-delay policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropagationPolicy {
    attempts: u32,
    delay: Duration,
}

impl PropagationPolicy {
    /// Create a policy; at least one round is always performed
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            delay,
        }
    }

    /// Number of lookup rounds
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Sleep before each round
    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for PropagationPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_ATTEMPTS, Duration::from_secs(DEFAULT_DELAY_SECS))
    }
}

/// Result of a propagation check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// The expected value was observed on this round
    Propagated {
        /// 1-based round number
        attempt: u32,
    },
    /// Every round ran without observing the expected value
    Exhausted {
        /// Rounds performed
        attempts: u32,
    },
    /// The caller cancelled the check while waiting for this round
    Cancelled {
        /// 1-based round that was interrupted
        attempt: u32,
    },
}

impl VerificationOutcome {
    /// Whether the record was observed
    pub fn is_propagated(&self) -> bool {
        matches!(self, VerificationOutcome::Propagated { .. })
    }
}

/// Checks challenge records against public DNS
#[derive(Clone)]
pub struct PropagationVerifier {
    resolver: Arc<dyn TxtResolver>,
    policy: PropagationPolicy,
}

impl PropagationVerifier {
    /// Create a verifier querying through `resolver`
    pub fn new(resolver: Arc<dyn TxtResolver>, policy: PropagationPolicy) -> Self {
        Self { resolver, policy }
    }

    /// Same resolver, different policy
    pub fn with_policy(&self, policy: PropagationPolicy) -> Self {
        Self {
            resolver: Arc::clone(&self.resolver),
            policy,
        }
    }

    /// The policy in effect
    pub fn policy(&self) -> PropagationPolicy {
        self.policy
    }

    /// Check whether `expected` becomes visible at `_acme-challenge.<domain>`
    ///
    /// Returns `false` when the attempt budget runs out. That is a normal
    /// outcome, not an error; the caller decides whether to abort.
    pub async fn validate(&self, domain: &str, expected: &str) -> bool {
        self.verify(domain, expected).await.is_propagated()
    }

    /// Like [`validate`](Self::validate), reporting which round matched
    pub async fn verify(&self, domain: &str, expected: &str) -> VerificationOutcome {
        self.verify_with_cancel(domain, expected, None).await
    }

    /// Like [`verify`](Self::verify), but each sleep races `cancel`
    ///
    /// Sending on (or dropping) the paired sender stops the loop before the
    /// next lookup.
    pub async fn verify_with_cancel(
        &self,
        domain: &str,
        expected: &str,
        mut cancel: Option<oneshot::Receiver<()>>,
    ) -> VerificationOutcome {
        let name = format!("{}.", challenge_name(domain));
        let attempts = self.policy.attempts;
        let delay = self.policy.delay;

        info!("Verifying challenge record {}", name);

        for attempt in 1..=attempts {
            info!(
                "Checking in {} seconds. Attempt {}/{}",
                delay.as_secs(),
                attempt,
                attempts
            );

            match cancel.as_mut() {
                Some(rx) => {
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = rx => {
                            info!("Propagation check for {} cancelled", name);
                            return VerificationOutcome::Cancelled { attempt };
                        }
                    }
                }
                None => tokio::time::sleep(delay).await,
            }

            match self.resolver.lookup_txt(&name).await {
                Ok(TxtLookup::Records(values)) => {
                    for value in &values {
                        debug!("Found record: {} IN TXT {}", name, value);
                        if unquote(value) == expected {
                            info!("Record matches challenge");
                            return VerificationOutcome::Propagated { attempt };
                        }
                    }
                    info!(
                        "Challenge record not found among {} TXT value(s)",
                        values.len()
                    );
                }
                Ok(TxtLookup::NotFound) => {
                    info!("Challenge record not found");
                }
                Err(e) if e.is_transient() => {
                    warn!("Lookup for {} failed, will retry: {}", name, e);
                }
                // Not expected to clear up on its own, but still only costs a round
                Err(e) => {
                    error!("Lookup for {} failed unexpectedly, will retry: {}", name, e);
                }
            }
        }

        VerificationOutcome::Exhausted { attempts }
    }
}

impl std::fmt::Debug for PropagationVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropagationVerifier")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_defaults() {
        let policy = PropagationPolicy::default();
        assert_eq!(policy.attempts(), 5);
        assert_eq!(policy.delay(), Duration::from_secs(15));
    }

    #[test]
    fn test_policy_never_zero_attempts() {
        let policy = PropagationPolicy::new(0, Duration::ZERO);
        assert_eq!(policy.attempts(), 1);
    }

    #[test]
    fn test_outcome_is_propagated() {
        assert!(VerificationOutcome::Propagated { attempt: 1 }.is_propagated());
        assert!(!VerificationOutcome::Exhausted { attempts: 5 }.is_propagated());
        assert!(!VerificationOutcome::Cancelled { attempt: 2 }.is_propagated());
    }
}
