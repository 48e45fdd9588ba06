//! Stub provider for provider types that are selectable but not wired up
//!
//! Every operation fails immediately with [`Error::NotImplemented`] so that
//! selecting such a provider is an explicit, fast failure rather than a
//! silent no-op.

use async_trait::async_trait;
use tracing::warn;

use crate::config::ProviderConfig;
use crate::traits::{DnsProvider, DnsProviderFactory, RecordMetadata};
use crate::{Error, Result};

/// Provider whose every call fails with `NotImplemented`
#[derive(Debug, Clone, Copy)]
pub struct UnimplementedProvider {
    name: &'static str,
}

impl UnimplementedProvider {
    /// Create a stub reporting itself as `name`
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }

    fn fail<T>(&self, operation: &str) -> Result<T> {
        warn!("Provider {} has no implementation for {}", self.name, operation);
        Err(Error::not_implemented(self.name, operation))
    }
}

#[async_trait]
impl DnsProvider for UnimplementedProvider {
    async fn create_record(&self, _domain: &str, _token: &str) -> Result<()> {
        self.fail("create_record")
    }

    async fn delete_record(&self, _domain: &str, _token: &str) -> Result<()> {
        self.fail("delete_record")
    }

    async fn get_record(&self, _domain: &str) -> Result<Option<RecordMetadata>> {
        self.fail("get_record")
    }

    fn provider_name(&self) -> &'static str {
        self.name
    }
}

/// Factory handing out [`UnimplementedProvider`] for any configuration
pub struct UnimplementedFactory {
    name: &'static str,
}

impl UnimplementedFactory {
    /// Create a factory for the stub named `name`
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }
}

#[async_trait]
impl DnsProviderFactory for UnimplementedFactory {
    async fn create(&self, _config: &ProviderConfig) -> Result<Box<dyn DnsProvider>> {
        Ok(Box::new(UnimplementedProvider::new(self.name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_every_operation_fails() {
        let provider = UnimplementedProvider::new("gcloud");

        let err = provider.create_record("example.com", "t").await.unwrap_err();
        assert!(matches!(
            err,
            Error::NotImplemented { ref provider, ref operation }
                if provider == "gcloud" && operation == "create_record"
        ));

        assert!(matches!(
            provider.delete_record("example.com", "t").await,
            Err(Error::NotImplemented { .. })
        ));
        assert!(matches!(
            provider.get_record("example.com").await,
            Err(Error::NotImplemented { .. })
        ));
        assert_eq!(provider.provider_name(), "gcloud");
    }
}
