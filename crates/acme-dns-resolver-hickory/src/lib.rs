// # Hickory TXT Resolver
//
// TxtResolver implementation on top of hickory-resolver, used by the
// propagation verifier to observe challenge records through public DNS.
//
// ## Behavior
//
// - Answer caching is disabled, so every round asks the nameservers again
// - NXDOMAIN and "no records" map to `TxtLookup::NotFound`
// - Timeouts, SERVFAIL and other faults map to `Error::Resolver`, which the
//   verifier treats as transient
// - The character-strings of one TXT record are joined into one value

use std::net::IpAddr;
use std::time::Duration;

use acme_dns_core::config::ResolverSettings;
use acme_dns_core::traits::{TxtLookup, TxtResolver};
use acme_dns_core::{Error, Result};
use async_trait::async_trait;
use hickory_resolver::config::{NameServerConfigGroup, ResolverConfig, ResolverOpts};
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::{ResolveError, TokioResolver};

/// Per-query timeout
const QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Tries per nameserver before a query fails
const QUERY_ATTEMPTS: usize = 2;

/// Public DNS TXT resolver
pub struct HickoryTxtResolver {
    resolver: TokioResolver,
    description: String,
}

impl std::fmt::Debug for HickoryTxtResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HickoryTxtResolver")
            .field("nameservers", &self.description)
            .finish_non_exhaustive()
    }
}

impl HickoryTxtResolver {
    /// Build a resolver for the configured nameservers
    pub fn from_settings(settings: &ResolverSettings) -> Result<Self> {
        settings.validate()?;

        let (config, mut opts, description) = match settings {
            ResolverSettings::Google => (ResolverConfig::google(), ResolverOpts::default(), "google".to_string()),
            ResolverSettings::Cloudflare => (
                ResolverConfig::cloudflare(),
                ResolverOpts::default(),
                "cloudflare".to_string(),
            ),
            ResolverSettings::Quad9 => (ResolverConfig::quad9(), ResolverOpts::default(), "quad9".to_string()),
            ResolverSettings::System => {
                let (config, opts) = hickory_resolver::system_conf::read_system_conf().map_err(|e| {
                    Error::config(format!("Failed to read system resolver configuration: {}", e))
                })?;
                (config, opts, "system".to_string())
            }
            ResolverSettings::Custom { nameservers, port } => (
                custom_config(nameservers, *port),
                ResolverOpts::default(),
                format_nameservers(nameservers, *port),
            ),
        };

        // Every round must reach the nameservers
        opts.cache_size = 0;
        opts.timeout = QUERY_TIMEOUT;
        opts.attempts = QUERY_ATTEMPTS;

        let resolver = TokioResolver::builder_with_config(config, TokioConnectionProvider::default())
            .with_options(opts)
            .build();

        tracing::debug!("Propagation checks will query {}", description);

        Ok(Self {
            resolver,
            description,
        })
    }

    /// Which nameservers are queried, for logs
    pub fn description(&self) -> &str {
        &self.description
    }
}

#[async_trait]
impl TxtResolver for HickoryTxtResolver {
    async fn lookup_txt(&self, name: &str) -> Result<TxtLookup> {
        tracing::debug!("Querying TXT {} via {}", name, self.description);

        match self.resolver.txt_lookup(name).await {
            Ok(lookup) => {
                let values: Vec<String> = lookup
                    .iter()
                    .map(|txt| {
                        txt.txt_data()
                            .iter()
                            .map(|data| String::from_utf8_lossy(data))
                            .collect()
                    })
                    .collect();

                if values.is_empty() {
                    Ok(TxtLookup::NotFound)
                } else {
                    Ok(TxtLookup::Records(values))
                }
            }
            Err(e) => classify(name, e),
        }
    }
}

fn classify(name: &str, error: ResolveError) -> Result<TxtLookup> {
    if error.is_nx_domain() || error.is_no_records_found() {
        tracing::trace!("No TXT records at {}: {}", name, error);
        return Ok(TxtLookup::NotFound);
    }

    Err(Error::resolver(format!("TXT lookup for {} failed: {}", name, error)))
}

fn custom_config(nameservers: &[IpAddr], port: u16) -> ResolverConfig {
    ResolverConfig::from_parts(
        None,
        vec![],
        NameServerConfigGroup::from_ips_clear(nameservers, port, true),
    )
}

fn format_nameservers(nameservers: &[IpAddr], port: u16) -> String {
    nameservers
        .iter()
        .map(|ip| match ip {
            IpAddr::V4(v4) => format!("{}:{}", v4, port),
            IpAddr::V6(v6) => format!("[{}]:{}", v6, port),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    #[tokio::test]
    async fn test_builds_for_public_resolvers() {
        for settings in [
            ResolverSettings::Google,
            ResolverSettings::Cloudflare,
            ResolverSettings::Quad9,
        ] {
            assert!(HickoryTxtResolver::from_settings(&settings).is_ok());
        }
    }

    #[tokio::test]
    async fn test_custom_nameservers() {
        let settings = ResolverSettings::Custom {
            nameservers: vec![
                IpAddr::V4(Ipv4Addr::new(192, 0, 2, 53)),
                IpAddr::V6(Ipv6Addr::LOCALHOST),
            ],
            port: 5353,
        };

        let resolver = HickoryTxtResolver::from_settings(&settings).unwrap();
        assert_eq!(resolver.description(), "192.0.2.53:5353, [::1]:5353");
    }

    #[tokio::test]
    async fn test_empty_custom_list_rejected() {
        let settings = ResolverSettings::Custom {
            nameservers: vec![],
            port: 53,
        };

        let result = HickoryTxtResolver::from_settings(&settings);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_unreachable_nameserver_is_transient_fault() {
        // TEST-NET-1 is never routed, so the query times out
        let settings = ResolverSettings::Custom {
            nameservers: vec![IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1))],
            port: 53,
        };
        let resolver = HickoryTxtResolver::from_settings(&settings).unwrap();

        let result = resolver.lookup_txt("_acme-challenge.example.com.").await;

        match result {
            Err(e) => {
                assert!(matches!(e, Error::Resolver(_)));
                assert!(e.is_transient());
            }
            Ok(other) => panic!("expected a resolver fault, got {:?}", other),
        }
    }
}
