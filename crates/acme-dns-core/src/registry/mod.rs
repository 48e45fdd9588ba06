//! Plugin-based provider registry
//!
//! The registry maps a provider type name from configuration to a factory,
//! so selecting a provider never goes through a hard-coded if-else chain.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use acme_dns_core::registry::ProviderRegistry;
//! use acme_dns_core::config::ProviderConfig;
//!
//! let registry = ProviderRegistry::new();
//! acme_dns_core::registry::register_builtin(&registry);
//! acme_dns_provider_route53::register(&registry);
//!
//! let config = ProviderConfig::Route53 { hosted_zone_id: "Z123".into(), .. };
//! let provider = registry.create_provider(&config).await?;
//! ```
//!
//! ## Registration
//!
//! Provider crates expose a `register()` function:
//!
//! ```rust,ignore
//! pub fn register(registry: &ProviderRegistry) {
//!     registry.register_provider("route53", Box::new(Route53Factory));
//! }
//! ```

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use crate::providers::{MemoryProviderFactory, UnimplementedFactory};
use crate::traits::{DnsProvider, DnsProviderFactory};

/// Provider registry for plugin-based DNS provider creation
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes. The lock is never held across an `.await`.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: RwLock<HashMap<String, Arc<dyn DnsProviderFactory>>>,
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a DNS provider factory
    ///
    /// Registering a name twice replaces the earlier factory.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// # use acme_dns_core::registry::ProviderRegistry;
    /// # use acme_dns_core::providers::MemoryProviderFactory;
    /// let registry = ProviderRegistry::new();
    /// registry.register_provider("memory", Box::new(MemoryProviderFactory));
    /// ```
    pub fn register_provider(&self, name: impl Into<String>, factory: Box<dyn DnsProviderFactory>) {
        let mut providers = self
            .providers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        providers.insert(name.into(), Arc::from(factory));
    }

    /// Register a provider name that is selectable but has no implementation
    ///
    /// Providers created under this name fail every call with
    /// [`Error::NotImplemented`].
    pub fn register_unimplemented(&self, name: &'static str) {
        self.register_provider(name, Box::new(UnimplementedFactory::new(name)));
    }

    /// Create a DNS provider from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn DnsProvider>)`: Created provider instance
    /// - `Err(Error)`: If the provider type is not registered, the
    ///   configuration is invalid, or the provider failed its startup checks
    pub async fn create_provider(&self, config: &ProviderConfig) -> Result<Box<dyn DnsProvider>> {
        config.validate()?;

        let provider_type = config.type_name();
        let factory = {
            let providers = self
                .providers
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            providers
                .get(provider_type)
                .cloned()
                .ok_or_else(|| Error::config(format!("Unknown provider type: {}", provider_type)))?
        };

        factory.create(config).await
    }

    /// List all registered provider types
    pub fn list_providers(&self) -> Vec<String> {
        let providers = self
            .providers
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = providers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a provider type is registered
    pub fn has_provider(&self, name: &str) -> bool {
        let providers = self
            .providers
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        providers.contains_key(name)
    }
}

/// Register the providers that ship with the core crate
pub fn register_builtin(registry: &ProviderRegistry) {
    registry.register_provider("memory", Box::new(MemoryProviderFactory));
}
