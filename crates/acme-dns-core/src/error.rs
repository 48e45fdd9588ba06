//! Error types for ACME DNS-01 provisioning
//!
//! This module defines all error types used throughout the workspace.

use thiserror::Error;

/// Result type alias for challenge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the challenge system
#[derive(Error, Debug)]
pub enum Error {
    /// The backing DNS control plane rejected a create/delete
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// No configured or accessible zone contains the domain
    #[error("No managed zone found for domain: {0}")]
    ZoneNotFound(String),

    /// The selected provider has no working implementation
    #[error("Provider {provider} does not implement {operation}")]
    NotImplemented {
        /// Provider name
        provider: String,
        /// Operation that was attempted
        operation: String,
    },

    /// The challenge record never became visible in public DNS
    #[error("Challenge record for {domain} not propagated after {attempts} attempt(s)")]
    PropagationTimeout {
        /// Domain being validated
        domain: String,
        /// Number of rounds performed
        attempts: u32,
    },

    /// DNS resolution fault other than "name does not exist"
    #[error("DNS resolution error: {0}")]
    Resolver(String),

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limiting errors
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// HTTP transport errors (from provider APIs)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a "zone not found" error for a domain
    pub fn zone_not_found(domain: impl Into<String>) -> Self {
        Self::ZoneNotFound(domain.into())
    }

    /// Create a "not implemented" error
    pub fn not_implemented(provider: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::NotImplemented {
            provider: provider.into(),
            operation: operation.into(),
        }
    }

    /// Create a propagation timeout error
    pub fn propagation_timeout(domain: impl Into<String>, attempts: u32) -> Self {
        Self::PropagationTimeout {
            domain: domain.into(),
            attempts,
        }
    }

    /// Create a DNS resolution error
    pub fn resolver(msg: impl Into<String>) -> Self {
        Self::Resolver(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a rate limit error
    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Whether a later attempt could succeed without any change on our side
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Resolver(_) | Self::RateLimited(_) | Self::Http(_)
        )
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_formats() {
        let err = Error::provider("route53", "AccessDenied");
        assert_eq!(err.to_string(), "Provider error (route53): AccessDenied");

        let err = Error::zone_not_found("other.net");
        assert_eq!(err.to_string(), "No managed zone found for domain: other.net");

        let err = Error::not_implemented("gcloud", "create_record");
        assert_eq!(
            err.to_string(),
            "Provider gcloud does not implement create_record"
        );
    }

    #[test]
    fn test_transient_classification() {
        assert!(Error::resolver("SERVFAIL").is_transient());
        assert!(Error::rate_limited("429").is_transient());
        assert!(!Error::provider("route53", "denied").is_transient());
        assert!(!Error::zone_not_found("example.com").is_transient());
        assert!(!Error::propagation_timeout("example.com", 5).is_transient());
    }
}
