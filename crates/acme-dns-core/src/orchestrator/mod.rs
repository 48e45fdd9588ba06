//! Challenge orchestrator
//!
//! The ChallengeOrchestrator sequences one domain's DNS-01 challenge:
//! - Publishing the record via DnsProvider
//! - Waiting for it to appear in public DNS via the PropagationVerifier
//! - Removing it once the ACME server has validated (or rejected) it
//!
//! ## Flow
//!
//! ```text
//!  caller                 ChallengeOrchestrator            DnsProvider / DNS
//!    │ create(domain, token)        │                              │
//!    ├─────────────────────────────►│ create_record ──────────────►│  fatal on error
//!    │ verify(domain, token)        │                              │
//!    ├─────────────────────────────►│ validate (poll public DNS) ─►│  fatal on false
//!    │                              │                              │
//!    │   ... ACME validation ...    │                              │
//!    │ cleanup(domain, token)       │                              │
//!    ├─────────────────────────────►│ delete_record ──────────────►│  logged, never fatal
//! ```
//!
//! There is no retry of `create`. A failed propagation check leaves the
//! record in place unless `cleanup_on_failure` is set; `cleanup` is always
//! the caller's responsibility and always attempts the delete.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::config::ChallengeConfig;
use crate::error::{Error, Result};
use crate::traits::{DnsProvider, TxtResolver};
use crate::verifier::{PropagationPolicy, PropagationVerifier, VerificationOutcome};

/// Events emitted by the ChallengeOrchestrator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChallengeEvent {
    /// The provider accepted the challenge record
    RecordCreated {
        domain: String,
        provider: &'static str,
    },

    /// The record was observed in public DNS
    PropagationConfirmed {
        domain: String,
        attempt: u32,
    },

    /// The record was not observed within the attempt budget
    PropagationFailed {
        domain: String,
        attempts: u32,
    },

    /// The challenge record was removed
    RecordDeleted {
        domain: String,
    },

    /// Removing the record failed (non-fatal)
    CleanupFailed {
        domain: String,
        error: String,
    },
}

/// Sequences create → verify → cleanup for one domain at a time
pub struct ChallengeOrchestrator {
    /// DNS provider for writing records
    provider: Box<dyn DnsProvider>,

    /// Public DNS propagation checks
    verifier: PropagationVerifier,

    /// Delete the record right away when verification fails
    cleanup_on_failure: bool,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<ChallengeEvent>,
}

impl ChallengeOrchestrator {
    /// Create a new orchestrator
    ///
    /// The propagation policy comes from `config.propagation` when set,
    /// otherwise from the provider's own [`DnsProvider::propagation_policy`].
    ///
    /// # Returns
    ///
    /// A tuple of (orchestrator, event_receiver)
    pub fn new(
        provider: Box<dyn DnsProvider>,
        resolver: Arc<dyn TxtResolver>,
        config: ChallengeConfig,
    ) -> Result<(Self, mpsc::Receiver<ChallengeEvent>)> {
        config.validate()?;

        let policy = config
            .propagation
            .map(PropagationPolicy::from)
            .unwrap_or_else(|| provider.propagation_policy());

        debug!(
            "Using {} with {} attempt(s), {:?} apart",
            provider.provider_name(),
            policy.attempts(),
            policy.delay()
        );

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let orchestrator = Self {
            provider,
            verifier: PropagationVerifier::new(resolver, policy),
            cleanup_on_failure: config.cleanup_on_failure,
            event_tx: tx,
        };

        Ok((orchestrator, rx))
    }

    /// The provider records are written through
    pub fn provider(&self) -> &dyn DnsProvider {
        self.provider.as_ref()
    }

    /// The propagation policy in effect
    pub fn policy(&self) -> PropagationPolicy {
        self.verifier.policy()
    }

    /// Step 1: publish the challenge record
    ///
    /// Any provider error is fatal for this domain and returned as-is.
    pub async fn create(&self, domain: &str, token: &str) -> Result<()> {
        info!(
            "Creating challenge record for {} via {}",
            domain,
            self.provider.provider_name()
        );

        if let Err(e) = self.provider.create_record(domain, token).await {
            error!("Failed to create challenge record for {}: {}", domain, e);
            return Err(e);
        }

        self.emit_event(ChallengeEvent::RecordCreated {
            domain: domain.to_string(),
            provider: self.provider.provider_name(),
        });
        Ok(())
    }

    /// Step 2: wait until the record is visible in public DNS
    ///
    /// # Returns
    ///
    /// - `Ok(())`: the expected value was observed
    /// - `Err(Error::PropagationTimeout)`: the attempt budget ran out
    pub async fn verify(&self, domain: &str, token: &str) -> Result<()> {
        self.verify_inner(domain, token, None, self.cleanup_on_failure)
            .await
    }

    /// Like [`verify`](Self::verify), stopping early when `cancel` fires
    pub async fn verify_with_cancel(
        &self,
        domain: &str,
        token: &str,
        cancel: oneshot::Receiver<()>,
    ) -> Result<()> {
        self.verify_inner(domain, token, Some(cancel), self.cleanup_on_failure)
            .await
    }

    /// Step 3: remove the challenge record
    ///
    /// Always attempts the delete. Failures are logged and reported as a
    /// [`ChallengeEvent::CleanupFailed`] event but never returned, so
    /// cleanup can not block the surrounding issuance workflow.
    pub async fn cleanup(&self, domain: &str, token: &str) {
        info!(
            "Removing challenge record for {} from {}",
            domain,
            self.provider.provider_name()
        );

        match self.provider.delete_record(domain, token).await {
            Ok(()) => {
                self.emit_event(ChallengeEvent::RecordDeleted {
                    domain: domain.to_string(),
                });
            }
            Err(e) => {
                warn!("Failed to remove challenge record for {}: {}", domain, e);
                self.emit_event(ChallengeEvent::CleanupFailed {
                    domain: domain.to_string(),
                    error: e.to_string(),
                });
            }
        }
    }

    /// Create the record and wait for it to propagate
    pub async fn establish(&self, domain: &str, token: &str) -> Result<()> {
        self.create(domain, token).await?;
        self.verify(domain, token).await
    }

    /// Like [`establish`](Self::establish), stopping the wait when `cancel` fires
    pub async fn establish_with_cancel(
        &self,
        domain: &str,
        token: &str,
        cancel: oneshot::Receiver<()>,
    ) -> Result<()> {
        self.create(domain, token).await?;
        self.verify_with_cancel(domain, token, cancel).await
    }

    /// Create, verify, then clean up regardless of the outcome
    ///
    /// Returns the result of create/verify; cleanup problems are only logged.
    pub async fn run(&self, domain: &str, token: &str) -> Result<()> {
        self.run_inner(domain, token, None).await
    }

    /// Like [`run`](Self::run); a cancelled wait still cleans up
    pub async fn run_with_cancel(
        &self,
        domain: &str,
        token: &str,
        cancel: oneshot::Receiver<()>,
    ) -> Result<()> {
        self.run_inner(domain, token, Some(cancel)).await
    }

    async fn run_inner(
        &self,
        domain: &str,
        token: &str,
        cancel: Option<oneshot::Receiver<()>>,
    ) -> Result<()> {
        let result = match self.create(domain, token).await {
            // Cleanup follows unconditionally, never twice
            Ok(()) => self.verify_inner(domain, token, cancel, false).await,
            Err(e) => Err(e),
        };

        self.cleanup(domain, token).await;
        result
    }

    async fn verify_inner(
        &self,
        domain: &str,
        token: &str,
        cancel: Option<oneshot::Receiver<()>>,
        cleanup_on_failure: bool,
    ) -> Result<()> {
        let outcome = self.verifier.verify_with_cancel(domain, token, cancel).await;

        let attempts = match outcome {
            VerificationOutcome::Propagated { attempt } => {
                info!("Challenge record for {} propagated (attempt {})", domain, attempt);
                self.emit_event(ChallengeEvent::PropagationConfirmed {
                    domain: domain.to_string(),
                    attempt,
                });
                return Ok(());
            }
            VerificationOutcome::Exhausted { attempts } => attempts,
            VerificationOutcome::Cancelled { attempt } => attempt,
        };

        error!("Unable to validate challenge record for {}", domain);
        self.emit_event(ChallengeEvent::PropagationFailed {
            domain: domain.to_string(),
            attempts,
        });

        if cleanup_on_failure {
            self.cleanup(domain, token).await;
        }

        Err(Error::propagation_timeout(domain, attempts))
    }

    /// Emit an event, dropping it (with a warning) when the channel is full
    fn emit_event(&self, event: ChallengeEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
            }
            // Nobody is listening
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }
}
