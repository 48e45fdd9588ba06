// # DNS Provider Trait
//
// Defines the interface for publishing and removing challenge records via
// provider APIs.
//
// ## Implementations
//
// - Route 53: `acme-dns-provider-route53` crate
// - Azure DNS: `acme-dns-provider-azure` crate
// - In-memory: `acme_dns_core::providers::MemoryProvider`
// - Stub: `acme_dns_core::providers::UnimplementedProvider`
//
// ## Usage
//
// ```rust,ignore
// use acme_dns_core::DnsProvider;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* DnsProvider implementation */;
//
//     provider.create_record("example.com", "abc123").await?;
//     // ... ACME validation ...
//     provider.delete_record("example.com", "abc123").await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::verifier::PropagationPolicy;

/// A challenge record as read back from the provider's own API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordMetadata {
    /// The record name as the provider reports it
    pub name: String,
    /// TXT values in presentation format (quoted)
    pub values: Vec<String>,
    /// Time-to-live for the record
    pub ttl: u32,
}

/// Trait for DNS provider implementations
///
/// Implementations publish exactly one TXT record per domain at
/// `_acme-challenge.<domain>`; see [`crate::ChallengeRecord`] for the
/// naming and quoting rules.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`. A provider is not bound to a
/// domain and may be reused for several domains within one run.
///
/// # Retries
///
/// Providers make a single attempt per call and return the error. Whether a
/// failed create is retried is up to the caller; the orchestrator never
/// retries it.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Publish the challenge record for `domain` with value `token`
    ///
    /// # Idempotency
    ///
    /// This is an upsert: if a challenge record already exists for the
    /// domain it is overwritten, so re-running issuance never needs manual
    /// cleanup first.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: the provider accepted the change
    /// - `Err(Error)`: the provider rejected it (auth, zone, rate limit)
    async fn create_record(&self, domain: &str, token: &str) -> Result<(), crate::Error>;

    /// Remove the challenge record for `domain`
    ///
    /// Removing a record that does not exist is not an error.
    async fn delete_record(&self, domain: &str, token: &str) -> Result<(), crate::Error>;

    /// Read the challenge record for `domain` directly from the provider
    ///
    /// This bypasses public DNS and reflects the provider's own state.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(RecordMetadata))`: the record exists
    /// - `Ok(None)`: no challenge record for the domain
    async fn get_record(&self, domain: &str) -> Result<Option<RecordMetadata>, crate::Error>;

    /// Polling policy the verifier should use for records written by this provider
    ///
    /// Providers whose changes are known to propagate slowly override this.
    fn propagation_policy(&self) -> PropagationPolicy {
        PropagationPolicy::default()
    }

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing DNS providers from configuration
///
/// Construction is async because some providers check that their zone is
/// reachable before handing out an instance.
#[async_trait]
pub trait DnsProviderFactory: Send + Sync {
    /// Create a DnsProvider instance from configuration
    async fn create(
        &self,
        config: &crate::config::ProviderConfig,
    ) -> Result<Box<dyn DnsProvider>, crate::Error>;
}
