//! Configuration types for challenge provisioning
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;

use crate::verifier::{DEFAULT_ATTEMPTS, DEFAULT_DELAY_SECS, PropagationPolicy};

/// Main challenge configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeConfig {
    /// DNS provider configuration
    pub provider: ProviderConfig,

    /// Public DNS resolver used for propagation checks
    #[serde(default)]
    pub resolver: ResolverSettings,

    /// Propagation polling override
    ///
    /// When unset, the provider's own policy is used.
    #[serde(default)]
    pub propagation: Option<PropagationConfig>,

    /// Delete the record when propagation checks fail
    ///
    /// Off by default so the record stays in place for inspection.
    #[serde(default)]
    pub cleanup_on_failure: bool,

    /// Capacity of the event channel
    ///
    /// When full, new events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl ChallengeConfig {
    /// Create a configuration for a provider with defaults everywhere else
    pub fn new(provider: ProviderConfig) -> Self {
        Self {
            provider,
            resolver: ResolverSettings::default(),
            propagation: None,
            cleanup_on_failure: false,
            event_channel_capacity: default_event_channel_capacity(),
        }
    }

    /// Override the propagation policy
    pub fn with_propagation(mut self, propagation: PropagationConfig) -> Self {
        self.propagation = Some(propagation);
        self
    }

    /// Enable or disable cleanup after a failed propagation check
    pub fn with_cleanup_on_failure(mut self, enabled: bool) -> Self {
        self.cleanup_on_failure = enabled;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.provider.validate()?;
        self.resolver.validate()?;

        if let Some(ref propagation) = self.propagation {
            propagation.validate()?;
        }

        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }

        Ok(())
    }
}

impl Default for ChallengeConfig {
    fn default() -> Self {
        Self::new(ProviderConfig::default())
    }
}

fn default_event_channel_capacity() -> usize {
    64
}

/// DNS provider configuration
///
/// `Debug` output never includes credentials.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// AWS Route 53, bound to one hosted zone
    Route53 {
        /// Hosted zone ID (`Z123...` or `/hostedzone/Z123...`)
        hosted_zone_id: String,
        /// Access key ID (falls back to `AWS_ACCESS_KEY_ID`)
        #[serde(default)]
        access_key_id: Option<String>,
        /// Secret access key (falls back to `AWS_SECRET_ACCESS_KEY`)
        #[serde(default)]
        secret_access_key: Option<String>,
        /// Session token for temporary credentials (falls back to `AWS_SESSION_TOKEN`)
        #[serde(default)]
        session_token: Option<String>,
    },

    /// Azure DNS; zones are resolved per domain within a resource group
    Azure {
        /// Subscription ID
        subscription_id: String,
        /// Resource group holding the DNS zones
        resource_group: String,
        /// Bearer token for the Azure management API
        access_token: String,
    },

    /// In-memory zone (dry runs and tests)
    #[default]
    Memory,

    /// Custom provider
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl ProviderConfig {
    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ProviderConfig::Route53 { hosted_zone_id, .. } => {
                if hosted_zone_id.trim().is_empty() {
                    return Err(crate::Error::config("Route 53 hosted zone ID cannot be empty"));
                }
                Ok(())
            }
            ProviderConfig::Azure {
                subscription_id,
                resource_group,
                access_token,
            } => {
                if subscription_id.is_empty() {
                    return Err(crate::Error::config("Azure subscription ID cannot be empty"));
                }
                if resource_group.is_empty() {
                    return Err(crate::Error::config("Azure resource group cannot be empty"));
                }
                if access_token.is_empty() {
                    return Err(crate::Error::config("Azure access token cannot be empty"));
                }
                Ok(())
            }
            ProviderConfig::Memory => Ok(()),
            ProviderConfig::Custom { factory, .. } => {
                if factory.is_empty() {
                    return Err(crate::Error::config(
                        "Custom provider factory cannot be empty",
                    ));
                }
                Ok(())
            }
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ProviderConfig::Route53 { .. } => "route53",
            ProviderConfig::Azure { .. } => "azure",
            ProviderConfig::Memory => "memory",
            ProviderConfig::Custom { factory, .. } => factory,
        }
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::Route53 {
                hosted_zone_id,
                access_key_id,
                secret_access_key,
                session_token,
            } => f
                .debug_struct("Route53")
                .field("hosted_zone_id", hosted_zone_id)
                .field("access_key_id", access_key_id)
                .field(
                    "secret_access_key",
                    &secret_access_key.as_ref().map(|_| "<REDACTED>"),
                )
                .field("session_token", &session_token.as_ref().map(|_| "<REDACTED>"))
                .finish(),
            ProviderConfig::Azure {
                subscription_id,
                resource_group,
                ..
            } => f
                .debug_struct("Azure")
                .field("subscription_id", subscription_id)
                .field("resource_group", resource_group)
                .field("access_token", &"<REDACTED>")
                .finish(),
            ProviderConfig::Memory => f.write_str("Memory"),
            // Custom settings may carry secrets of their own
            ProviderConfig::Custom { factory, .. } => f
                .debug_struct("Custom")
                .field("factory", factory)
                .finish_non_exhaustive(),
        }
    }
}

/// Which nameservers the propagation checks query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResolverSettings {
    /// Google public DNS
    #[default]
    Google,
    /// Cloudflare public DNS
    Cloudflare,
    /// Quad9 public DNS
    Quad9,
    /// The host's resolver configuration
    System,
    /// Explicit nameservers
    Custom {
        /// Nameserver addresses
        nameservers: Vec<IpAddr>,
        /// Port to query (usually 53)
        #[serde(default = "default_dns_port")]
        port: u16,
    },
}

impl ResolverSettings {
    /// Validate the resolver settings
    pub fn validate(&self) -> Result<(), crate::Error> {
        if let ResolverSettings::Custom { nameservers, port } = self {
            if nameservers.is_empty() {
                return Err(crate::Error::config(
                    "Custom resolver needs at least one nameserver",
                ));
            }
            if *port == 0 {
                return Err(crate::Error::config("Custom resolver port must be > 0"));
            }
        }
        Ok(())
    }
}

fn default_dns_port() -> u16 {
    53
}

/// Propagation polling configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropagationConfig {
    /// Number of lookup rounds
    #[serde(default = "default_attempts")]
    pub attempts: u32,

    /// Sleep before each round (in seconds)
    #[serde(default = "default_delay_secs")]
    pub delay_secs: u64,
}

impl PropagationConfig {
    /// Validate the propagation configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.attempts == 0 {
            return Err(crate::Error::config("Propagation attempts must be > 0"));
        }
        Ok(())
    }
}

impl Default for PropagationConfig {
    fn default() -> Self {
        Self {
            attempts: default_attempts(),
            delay_secs: default_delay_secs(),
        }
    }
}

impl From<PropagationConfig> for PropagationPolicy {
    fn from(config: PropagationConfig) -> Self {
        PropagationPolicy::new(config.attempts, Duration::from_secs(config.delay_secs))
    }
}

fn default_attempts() -> u32 {
    DEFAULT_ATTEMPTS
}

fn default_delay_secs() -> u64 {
    DEFAULT_DELAY_SECS
}
