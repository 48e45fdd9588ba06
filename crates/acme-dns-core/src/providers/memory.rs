// # Memory Provider
//
// In-memory implementation of DnsProvider.
//
// ## Purpose
//
// Holds challenge records in a HashMap instead of a real zone. Nothing is
// ever published to public DNS, so a propagation check against a real
// resolver will not see these records.
//
// ## When to Use
//
// - Testing environments
// - Dry runs of the create/verify/cleanup sequence

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;

use crate::config::ProviderConfig;
use crate::record::ChallengeRecord;
use crate::traits::{DnsProvider, DnsProviderFactory, RecordMetadata};
use crate::{Error, Result};

/// In-memory provider implementation
///
/// Records are keyed by their fully-qualified name. Cloning the provider
/// shares the underlying zone.
///
/// # Example
///
/// ```rust,no_run
/// use acme_dns_core::providers::MemoryProvider;
/// use acme_dns_core::DnsProvider;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let provider = MemoryProvider::new();
///
///     provider.create_record("example.com", "abc123").await?;
///
///     let record = provider.get_record("example.com").await?.unwrap();
///     assert_eq!(record.values, vec!["\"abc123\"".to_string()]);
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    zone: Arc<RwLock<HashMap<String, RecordMetadata>>>,
}

impl MemoryProvider {
    /// Create a provider with an empty zone
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records in the zone
    pub async fn len(&self) -> usize {
        self.zone.read().await.len()
    }

    /// Check if the zone is empty
    pub async fn is_empty(&self) -> bool {
        self.zone.read().await.is_empty()
    }
}

#[async_trait]
impl DnsProvider for MemoryProvider {
    async fn create_record(&self, domain: &str, token: &str) -> Result<()> {
        let record = ChallengeRecord::new(domain, token)?;
        let fqdn = record.fqdn();

        info!("Creating record {} IN TXT {}", fqdn, record.quoted_value());

        let mut zone = self.zone.write().await;
        zone.insert(
            fqdn.clone(),
            RecordMetadata {
                name: fqdn,
                values: vec![record.quoted_value()],
                ttl: record.ttl(),
            },
        );
        Ok(())
    }

    async fn delete_record(&self, domain: &str, token: &str) -> Result<()> {
        let record = ChallengeRecord::new(domain, token)?;

        info!("Deleting record {}", record.fqdn());

        let mut zone = self.zone.write().await;
        zone.remove(&record.fqdn());
        Ok(())
    }

    async fn get_record(&self, domain: &str) -> Result<Option<RecordMetadata>> {
        let record = ChallengeRecord::new(domain, "")?;
        let zone = self.zone.read().await;
        Ok(zone.get(&record.fqdn()).cloned())
    }

    fn provider_name(&self) -> &'static str {
        "memory"
    }
}

/// Factory for in-memory providers
pub struct MemoryProviderFactory;

#[async_trait]
impl DnsProviderFactory for MemoryProviderFactory {
    async fn create(&self, config: &ProviderConfig) -> Result<Box<dyn DnsProvider>> {
        match config {
            ProviderConfig::Memory => Ok(Box::new(MemoryProvider::new())),
            _ => Err(Error::config("Invalid config for memory provider")),
        }
    }
}
