// # acme-dns01 - ACME DNS-01 challenge hook
//
// Thin integration layer: reads configuration from environment variables,
// initializes logging and the runtime, registers providers, then runs one
// challenge action for one domain. All record and propagation logic lives in
// acme-dns-core and the provider crates.
//
// ## Configuration
//
// ### Challenge
// - `ACME_DNS_ACTION`: `present` (create + verify), `cleanup`, `run` (present then cleanup)
// - `ACME_DNS_DOMAIN`: Domain being validated (`*.` prefix is stripped)
// - `ACME_DNS_TOKEN`: Key authorization digest to publish
//
// ### DNS Provider
// - `ACME_DNS_PROVIDER_TYPE`: Provider type (route53, azure, memory)
// - `ACME_DNS_ROUTE53_HOSTED_ZONE_ID`: Hosted zone (route53)
// - `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`, `AWS_SESSION_TOKEN`: Credentials (route53)
// - `ACME_DNS_AZURE_SUBSCRIPTION_ID`, `ACME_DNS_AZURE_RESOURCE_GROUP`,
//   `ACME_DNS_AZURE_ACCESS_TOKEN`: Azure DNS access (azure)
// - `ACME_DNS_MODE=dry-run`: Log writes instead of sending them
//
// ### Propagation
// - `ACME_DNS_RESOLVER`: google, cloudflare, quad9, system, or comma-separated IPs
// - `ACME_DNS_PROPAGATION_ATTEMPTS`: Lookup rounds (overrides the provider default)
// - `ACME_DNS_PROPAGATION_DELAY_SECS`: Sleep before each round
// - `ACME_DNS_CLEANUP_ON_FAILURE`: Delete the record when propagation fails
//
// ## Example
//
// ```bash
// export ACME_DNS_PROVIDER_TYPE=route53
// export ACME_DNS_ROUTE53_HOSTED_ZONE_ID=Z1D633PJN98FT9
// export AWS_ACCESS_KEY_ID=... AWS_SECRET_ACCESS_KEY=...
// export ACME_DNS_DOMAIN=example.com
// export ACME_DNS_TOKEN=gfj9Xq...Rg85nM
//
// ACME_DNS_ACTION=present acme-dns01
// ACME_DNS_ACTION=cleanup acme-dns01
// ```

use acme_dns_core::{
    ChallengeConfig, ChallengeEvent, ChallengeOrchestrator, PropagationConfig, ProviderConfig,
    ProviderRegistry, ResolverSettings,
};
use acme_dns_resolver_hickory::HickoryTxtResolver;
use anyhow::{Context, Result};
use std::env;
use std::net::IpAddr;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes reported to the calling ACME client
///
/// - 0: Challenge action succeeded
/// - 1: Configuration or startup error
/// - 2: Challenge failed (provider error or record not propagated)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HookExitCode {
    /// Action completed
    Success = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Provider or propagation failure
    ChallengeFailure = 2,
}

impl From<HookExitCode> for ExitCode {
    fn from(code: HookExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// What to do with the challenge record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Present,
    Cleanup,
    Run,
}

impl Action {
    fn parse(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "present" => Ok(Action::Present),
            "cleanup" => Ok(Action::Cleanup),
            "run" => Ok(Action::Run),
            other => anyhow::bail!(
                "ACME_DNS_ACTION '{}' is not supported. \
                Supported actions: present, cleanup, run",
                other
            ),
        }
    }
}

/// Application configuration
struct Config {
    action: String,
    domain: String,
    token: String,
    provider_type: String,
    route53_hosted_zone_id: Option<String>,
    azure_subscription_id: Option<String>,
    azure_resource_group: Option<String>,
    azure_access_token: Option<String>,
    resolver: String,
    propagation_attempts: Option<String>,
    propagation_delay_secs: Option<String>,
    cleanup_on_failure: Option<String>,
    log_level: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("action", &self.action)
            .field("domain", &self.domain)
            .field("token", &self.token)
            .field("provider_type", &self.provider_type)
            .field("route53_hosted_zone_id", &self.route53_hosted_zone_id)
            .field("azure_subscription_id", &self.azure_subscription_id)
            .field("azure_resource_group", &self.azure_resource_group)
            .field(
                "azure_access_token",
                &self.azure_access_token.as_ref().map(|_| "<REDACTED>"),
            )
            .field("resolver", &self.resolver)
            .field("propagation_attempts", &self.propagation_attempts)
            .field("propagation_delay_secs", &self.propagation_delay_secs)
            .field("cleanup_on_failure", &self.cleanup_on_failure)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Self {
            action: var("ACME_DNS_ACTION").unwrap_or_else(|| "present".to_string()),
            domain: var("ACME_DNS_DOMAIN").unwrap_or_default(),
            token: var("ACME_DNS_TOKEN").unwrap_or_default(),
            provider_type: var("ACME_DNS_PROVIDER_TYPE").unwrap_or_else(|| "route53".to_string()),
            route53_hosted_zone_id: var("ACME_DNS_ROUTE53_HOSTED_ZONE_ID"),
            azure_subscription_id: var("ACME_DNS_AZURE_SUBSCRIPTION_ID"),
            azure_resource_group: var("ACME_DNS_AZURE_RESOURCE_GROUP"),
            azure_access_token: var("ACME_DNS_AZURE_ACCESS_TOKEN"),
            resolver: var("ACME_DNS_RESOLVER").unwrap_or_else(|| "google".to_string()),
            propagation_attempts: var("ACME_DNS_PROPAGATION_ATTEMPTS"),
            propagation_delay_secs: var("ACME_DNS_PROPAGATION_DELAY_SECS"),
            cleanup_on_failure: var("ACME_DNS_CLEANUP_ON_FAILURE"),
            log_level: var("ACME_DNS_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        }
    }

    /// Validate the configuration
    ///
    /// Every check is performed before any network traffic, so a typo never
    /// leaves a half-provisioned challenge behind.
    fn validate(&self) -> Result<()> {
        Action::parse(&self.action)?;

        if self.domain.is_empty() {
            anyhow::bail!(
                "ACME_DNS_DOMAIN is required. \
                Set it via: export ACME_DNS_DOMAIN=example.com"
            );
        }
        validate_domain_name(self.challenge_domain())?;

        self.validate_token()?;
        self.provider_config()?;
        self.resolver_settings()?;
        self.propagation()?;
        self.cleanup_on_failure()?;

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "ACME_DNS_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }

    fn validate_token(&self) -> Result<()> {
        if self.token.is_empty() {
            anyhow::bail!(
                "ACME_DNS_TOKEN is required. \
                Set it to the key authorization digest from your ACME client"
            );
        }

        // Key authorization digests are unpadded base64url
        if !self
            .token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            anyhow::bail!(
                "ACME_DNS_TOKEN contains characters outside the base64url alphabet. \
                Pass the digest, not the raw key authorization."
            );
        }

        Ok(())
    }

    /// The domain whose `_acme-challenge` record is provisioned
    fn challenge_domain(&self) -> &str {
        self.domain.strip_prefix("*.").unwrap_or(&self.domain)
    }

    fn action(&self) -> Result<Action> {
        Action::parse(&self.action)
    }

    fn provider_config(&self) -> Result<ProviderConfig> {
        match self.provider_type.to_lowercase().as_str() {
            "route53" => {
                let hosted_zone_id = self.route53_hosted_zone_id.clone().ok_or_else(|| {
                    anyhow::anyhow!(
                        "ACME_DNS_ROUTE53_HOSTED_ZONE_ID is required when ACME_DNS_PROVIDER_TYPE=route53. \
                        Set it via: export ACME_DNS_ROUTE53_HOSTED_ZONE_ID=Z1D633PJN98FT9"
                    )
                })?;

                // Credentials come from the standard AWS variables
                Ok(ProviderConfig::Route53 {
                    hosted_zone_id,
                    access_key_id: None,
                    secret_access_key: None,
                    session_token: None,
                })
            }
            "azure" => {
                let required = |value: &Option<String>, name: &str| {
                    value.clone().ok_or_else(|| {
                        anyhow::anyhow!(
                            "{} is required when ACME_DNS_PROVIDER_TYPE=azure. \
                            Set it via: export {}=...",
                            name,
                            name
                        )
                    })
                };

                Ok(ProviderConfig::Azure {
                    subscription_id: required(&self.azure_subscription_id, "ACME_DNS_AZURE_SUBSCRIPTION_ID")?,
                    resource_group: required(&self.azure_resource_group, "ACME_DNS_AZURE_RESOURCE_GROUP")?,
                    access_token: required(&self.azure_access_token, "ACME_DNS_AZURE_ACCESS_TOKEN")?,
                })
            }
            "memory" => Ok(ProviderConfig::Memory),
            other => anyhow::bail!(
                "ACME_DNS_PROVIDER_TYPE '{}' is not supported. \
                Supported providers: route53, azure, memory",
                other
            ),
        }
    }

    fn resolver_settings(&self) -> Result<ResolverSettings> {
        parse_resolver(&self.resolver)
    }

    /// Propagation override, if either knob is set
    ///
    /// A knob left unset takes the library default.
    fn propagation(&self) -> Result<Option<PropagationConfig>> {
        if self.propagation_attempts.is_none() && self.propagation_delay_secs.is_none() {
            return Ok(None);
        }

        let mut propagation = PropagationConfig::default();

        if let Some(ref raw) = self.propagation_attempts {
            let attempts: u32 = raw
                .parse()
                .with_context(|| format!("ACME_DNS_PROPAGATION_ATTEMPTS is not a number: '{}'", raw))?;
            if !(1..=60).contains(&attempts) {
                anyhow::bail!(
                    "ACME_DNS_PROPAGATION_ATTEMPTS must be between 1 and 60. Got: {}",
                    attempts
                );
            }
            propagation.attempts = attempts;
        }

        if let Some(ref raw) = self.propagation_delay_secs {
            let delay: u64 = raw
                .parse()
                .with_context(|| format!("ACME_DNS_PROPAGATION_DELAY_SECS is not a number: '{}'", raw))?;
            if delay > 600 {
                anyhow::bail!(
                    "ACME_DNS_PROPAGATION_DELAY_SECS must be between 0 and 600 seconds. Got: {}",
                    delay
                );
            }
            propagation.delay_secs = delay;
        }

        Ok(Some(propagation))
    }

    fn cleanup_on_failure(&self) -> Result<bool> {
        match self.cleanup_on_failure.as_deref().map(str::to_lowercase).as_deref() {
            None | Some("false") | Some("0") | Some("no") => Ok(false),
            Some("true") | Some("1") | Some("yes") => Ok(true),
            Some(other) => anyhow::bail!(
                "ACME_DNS_CLEANUP_ON_FAILURE must be true or false. Got: '{}'",
                other
            ),
        }
    }

    /// Assemble the library configuration
    fn challenge_config(&self) -> Result<ChallengeConfig> {
        let mut config = ChallengeConfig::new(self.provider_config()?)
            .with_cleanup_on_failure(self.cleanup_on_failure()?);
        config.resolver = self.resolver_settings()?;
        config.propagation = self.propagation()?;

        config.validate()?;
        Ok(config)
    }

    fn log_level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }
}

/// Parse the `ACME_DNS_RESOLVER` value
fn parse_resolver(value: &str) -> Result<ResolverSettings> {
    match value.trim().to_lowercase().as_str() {
        "google" => Ok(ResolverSettings::Google),
        "cloudflare" => Ok(ResolverSettings::Cloudflare),
        "quad9" => Ok(ResolverSettings::Quad9),
        "system" => Ok(ResolverSettings::System),
        list => {
            let nameservers = list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| {
                    s.parse::<IpAddr>().with_context(|| {
                        format!(
                            "ACME_DNS_RESOLVER entry '{}' is not an IP address. \
                            Use google, cloudflare, quad9, system, or a comma-separated IP list",
                            s
                        )
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            if nameservers.is_empty() {
                anyhow::bail!("ACME_DNS_RESOLVER must name at least one nameserver");
            }

            Ok(ResolverSettings::Custom { nameservers, port: 53 })
        }
    }
}

/// Validate that a string is a valid domain name
///
/// Basic RFC 1035 checks; a trailing root dot is accepted.
fn validate_domain_name(domain: &str) -> Result<()> {
    let domain = domain.strip_suffix('.').unwrap_or(domain);

    if domain.is_empty() {
        anyhow::bail!("Domain name cannot be empty");
    }

    if domain.len() > 253 {
        anyhow::bail!(
            "Domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        );
    }

    for label in domain.split('.') {
        if label.is_empty() {
            anyhow::bail!("Domain name has empty label: '{}'", domain);
        }

        if label.len() > 63 {
            anyhow::bail!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            );
        }

        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            anyhow::bail!(
                "Domain label contains invalid characters. Label: '{}'. \
                Valid: ASCII alphanumeric and hyphen only (use punycode for IDNs).",
                label
            );
        }

        if label.starts_with('-') || label.ends_with('-') {
            anyhow::bail!(
                "Domain label cannot start or end with hyphen. Label: '{}'",
                label
            );
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let config = Config::from_env();

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return HookExitCode::ConfigError.into();
    }

    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level())
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return HookExitCode::ConfigError.into();
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return HookExitCode::ConfigError.into();
        }
    };

    let code = rt.block_on(async {
        match run_hook(&config).await {
            Ok(()) => HookExitCode::Success,
            Err(e) => {
                error!("Challenge failed: {:#}", e);
                exit_code_for(&e)
            }
        }
    });

    code.into()
}

/// Configuration problems discovered late (e.g. by a provider factory) still
/// count as configuration errors.
fn exit_code_for(error: &anyhow::Error) -> HookExitCode {
    match error.downcast_ref::<acme_dns_core::Error>() {
        Some(acme_dns_core::Error::Config(_)) => HookExitCode::ConfigError,
        _ => HookExitCode::ChallengeFailure,
    }
}

/// Build the components and run the configured action
async fn run_hook(config: &Config) -> Result<()> {
    let action = config.action()?;
    let domain = config.challenge_domain();
    let challenge_config = config.challenge_config()?;

    let registry = ProviderRegistry::new();
    acme_dns_core::registry::register_builtin(&registry);

    #[cfg(feature = "route53")]
    acme_dns_provider_route53::register(&registry);
    // Compiled-out providers fail fast instead of looking unknown
    #[cfg(not(feature = "route53"))]
    registry.register_unimplemented("route53");

    #[cfg(feature = "azure")]
    acme_dns_provider_azure::register(&registry);
    #[cfg(not(feature = "azure"))]
    registry.register_unimplemented("azure");

    info!(
        "Running {:?} for {} via {} (registered: {})",
        action,
        domain,
        challenge_config.provider.type_name(),
        registry.list_providers().join(", ")
    );

    if matches!(challenge_config.provider, ProviderConfig::Memory) {
        warn!("Memory provider records are never visible in public DNS");
    }

    let provider = registry.create_provider(&challenge_config.provider).await?;
    let resolver = Arc::new(HickoryTxtResolver::from_settings(&challenge_config.resolver)?);

    let (orchestrator, events) = ChallengeOrchestrator::new(provider, resolver, challenge_config)?;
    let event_logger = tokio::spawn(log_events(events));

    let token = config.token.as_str();
    let (cancel_tx, cancel_rx) = oneshot::channel();
    let shutdown = tokio::spawn(async move {
        match wait_for_shutdown().await {
            Ok(signal) => {
                warn!("Received {}, abandoning propagation wait", signal);
                let _ = cancel_tx.send(());
            }
            Err(e) => {
                // Keep the sender alive so the wait is not cancelled
                warn!("Signal handling unavailable: {}", e);
                std::future::pending::<()>().await;
                drop(cancel_tx);
            }
        }
    });

    let result = match action {
        Action::Present => orchestrator.establish_with_cancel(domain, token, cancel_rx).await,
        Action::Run => orchestrator.run_with_cancel(domain, token, cancel_rx).await,
        Action::Cleanup => {
            orchestrator.cleanup(domain, token).await;
            Ok(())
        }
    };

    shutdown.abort();

    // Closing the channel lets the logger drain and finish
    drop(orchestrator);
    let _ = event_logger.await;

    result.with_context(|| format!("{:?} failed for {}", action, domain))
}

async fn log_events(mut events: mpsc::Receiver<ChallengeEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            ChallengeEvent::RecordCreated { domain, provider } => {
                info!("Challenge record for {} published via {}", domain, provider)
            }
            ChallengeEvent::PropagationConfirmed { domain, attempt } => {
                info!("Challenge record for {} visible after {} round(s)", domain, attempt)
            }
            ChallengeEvent::PropagationFailed { domain, attempts } => {
                error!("Challenge record for {} not visible after {} round(s)", domain, attempts)
            }
            ChallengeEvent::RecordDeleted { domain } => {
                info!("Challenge record for {} removed", domain)
            }
            ChallengeEvent::CleanupFailed { domain, error } => {
                warn!("Challenge record for {} may remain: {}", domain, error)
            }
        }
    }
}

/// Wait for SIGTERM or SIGINT
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for CTRL-C
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    fn memory_config(extra: &[(&str, &str)]) -> Config {
        let mut vars = vec![
            ("ACME_DNS_PROVIDER_TYPE", "memory"),
            ("ACME_DNS_DOMAIN", "example.com"),
            ("ACME_DNS_TOKEN", "abc123"),
        ];
        vars.extend_from_slice(extra);
        config(&vars)
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]);

        assert_eq!(config.action, "present");
        assert_eq!(config.provider_type, "route53");
        assert_eq!(config.resolver, "google");
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_minimal_memory_config_is_valid() {
        let config = memory_config(&[]);
        config.validate().unwrap();

        let challenge = config.challenge_config().unwrap();
        assert!(matches!(challenge.provider, ProviderConfig::Memory));
        assert_eq!(challenge.resolver, ResolverSettings::Google);
        assert!(challenge.propagation.is_none());
        assert!(!challenge.cleanup_on_failure);
    }

    #[test]
    fn test_missing_domain_and_token() {
        let err = config(&[("ACME_DNS_PROVIDER_TYPE", "memory")]).validate().unwrap_err();
        assert!(err.to_string().contains("ACME_DNS_DOMAIN is required"));

        let err = config(&[("ACME_DNS_PROVIDER_TYPE", "memory"), ("ACME_DNS_DOMAIN", "example.com")])
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("ACME_DNS_TOKEN is required"));
    }

    #[test]
    fn test_blank_values_count_as_unset() {
        let config = memory_config(&[("ACME_DNS_ACTION", "  "), ("ACME_DNS_RESOLVER", "")]);

        assert_eq!(config.action().unwrap(), Action::Present);
        assert_eq!(config.resolver_settings().unwrap(), ResolverSettings::Google);
    }

    #[test]
    fn test_actions() {
        assert_eq!(Action::parse("present").unwrap(), Action::Present);
        assert_eq!(Action::parse("CLEANUP").unwrap(), Action::Cleanup);
        assert_eq!(Action::parse(" run ").unwrap(), Action::Run);

        let err = memory_config(&[("ACME_DNS_ACTION", "renew")]).validate().unwrap_err();
        assert!(err.to_string().contains("not supported"));
    }

    #[test]
    fn test_wildcard_prefix_is_stripped() {
        let config = memory_config(&[("ACME_DNS_DOMAIN", "*.example.com")]);

        config.validate().unwrap();
        assert_eq!(config.challenge_domain(), "example.com");
    }

    #[test]
    fn test_token_must_be_base64url() {
        memory_config(&[("ACME_DNS_TOKEN", "LoqXcYV8q5ONbJQxbmR7SCTNo3tiAXDfowyjxAjEuX0")])
            .validate()
            .unwrap();
        memory_config(&[("ACME_DNS_TOKEN", "a-b_c")]).validate().unwrap();

        let err = memory_config(&[("ACME_DNS_TOKEN", "abc\"123")]).validate().unwrap_err();
        assert!(err.to_string().contains("base64url"));
        assert!(memory_config(&[("ACME_DNS_TOKEN", "abc.def")]).validate().is_err());
    }

    #[test]
    fn test_route53_requires_hosted_zone() {
        let err = memory_config(&[("ACME_DNS_PROVIDER_TYPE", "route53")])
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("ACME_DNS_ROUTE53_HOSTED_ZONE_ID"));

        let config = memory_config(&[
            ("ACME_DNS_PROVIDER_TYPE", "route53"),
            ("ACME_DNS_ROUTE53_HOSTED_ZONE_ID", "Z1D633PJN98FT9"),
        ]);
        match config.provider_config().unwrap() {
            ProviderConfig::Route53 {
                hosted_zone_id,
                access_key_id,
                ..
            } => {
                assert_eq!(hosted_zone_id, "Z1D633PJN98FT9");
                assert!(access_key_id.is_none());
            }
            other => panic!("expected Route53 config, got {:?}", other),
        }
    }

    #[test]
    fn test_azure_requires_all_fields() {
        let err = memory_config(&[
            ("ACME_DNS_PROVIDER_TYPE", "azure"),
            ("ACME_DNS_AZURE_SUBSCRIPTION_ID", "sub-1"),
            ("ACME_DNS_AZURE_ACCESS_TOKEN", "token"),
        ])
        .validate()
        .unwrap_err();
        assert!(err.to_string().contains("ACME_DNS_AZURE_RESOURCE_GROUP"));

        let config = memory_config(&[
            ("ACME_DNS_PROVIDER_TYPE", "azure"),
            ("ACME_DNS_AZURE_SUBSCRIPTION_ID", "sub-1"),
            ("ACME_DNS_AZURE_RESOURCE_GROUP", "rg-dns"),
            ("ACME_DNS_AZURE_ACCESS_TOKEN", "token"),
        ]);
        config.validate().unwrap();
        assert_eq!(config.provider_config().unwrap().type_name(), "azure");
    }

    #[test]
    fn test_debug_hides_azure_token() {
        let config = memory_config(&[
            ("ACME_DNS_PROVIDER_TYPE", "azure"),
            ("ACME_DNS_AZURE_SUBSCRIPTION_ID", "sub-1"),
            ("ACME_DNS_AZURE_RESOURCE_GROUP", "rg-dns"),
            ("ACME_DNS_AZURE_ACCESS_TOKEN", "eyJ0eXAiOiJKV1Qi"),
        ]);

        let debug_str = format!("{:?}", config);
        assert!(debug_str.contains("rg-dns"));
        assert!(!debug_str.contains("eyJ0eXAiOiJKV1Qi"));

        let challenge = format!("{:?}", config.challenge_config().unwrap());
        assert!(!challenge.contains("eyJ0eXAiOiJKV1Qi"));
    }

    #[test]
    fn test_unknown_provider() {
        let err = memory_config(&[("ACME_DNS_PROVIDER_TYPE", "gandi")])
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("Supported providers"));
    }

    #[test]
    fn test_resolver_parsing() {
        assert_eq!(parse_resolver("Cloudflare").unwrap(), ResolverSettings::Cloudflare);
        assert_eq!(parse_resolver("quad9").unwrap(), ResolverSettings::Quad9);
        assert_eq!(parse_resolver("system").unwrap(), ResolverSettings::System);

        match parse_resolver("8.8.8.8, 2001:4860:4860::8888").unwrap() {
            ResolverSettings::Custom { nameservers, port } => {
                assert_eq!(nameservers.len(), 2);
                assert_eq!(port, 53);
            }
            other => panic!("expected custom resolver, got {:?}", other),
        }

        assert!(parse_resolver("8.8.8.8,not-an-ip").is_err());
        assert!(parse_resolver(",").is_err());
    }

    #[test]
    fn test_propagation_override() {
        let config = memory_config(&[("ACME_DNS_PROPAGATION_ATTEMPTS", "3")]);
        let propagation = config.propagation().unwrap().unwrap();
        assert_eq!(propagation.attempts, 3);
        assert_eq!(propagation.delay_secs, PropagationConfig::default().delay_secs);

        let config = memory_config(&[("ACME_DNS_PROPAGATION_DELAY_SECS", "0")]);
        let propagation = config.propagation().unwrap().unwrap();
        assert_eq!(propagation.attempts, PropagationConfig::default().attempts);
        assert_eq!(propagation.delay_secs, 0);
    }

    #[test]
    fn test_propagation_ranges() {
        assert!(memory_config(&[("ACME_DNS_PROPAGATION_ATTEMPTS", "0")]).validate().is_err());
        assert!(memory_config(&[("ACME_DNS_PROPAGATION_ATTEMPTS", "61")]).validate().is_err());
        assert!(memory_config(&[("ACME_DNS_PROPAGATION_ATTEMPTS", "many")]).validate().is_err());
        assert!(memory_config(&[("ACME_DNS_PROPAGATION_DELAY_SECS", "601")]).validate().is_err());
        assert!(memory_config(&[("ACME_DNS_PROPAGATION_DELAY_SECS", "-1")]).validate().is_err());
        memory_config(&[("ACME_DNS_PROPAGATION_ATTEMPTS", "60"), ("ACME_DNS_PROPAGATION_DELAY_SECS", "600")])
            .validate()
            .unwrap();
    }

    #[test]
    fn test_cleanup_on_failure_flag() {
        assert!(memory_config(&[("ACME_DNS_CLEANUP_ON_FAILURE", "TRUE")]).cleanup_on_failure().unwrap());
        assert!(!memory_config(&[("ACME_DNS_CLEANUP_ON_FAILURE", "false")]).cleanup_on_failure().unwrap());
        assert!(memory_config(&[("ACME_DNS_CLEANUP_ON_FAILURE", "maybe")]).validate().is_err());
    }

    #[test]
    fn test_log_level() {
        assert_eq!(memory_config(&[("ACME_DNS_LOG_LEVEL", "DEBUG")]).log_level(), Level::DEBUG);
        assert!(memory_config(&[("ACME_DNS_LOG_LEVEL", "verbose")]).validate().is_err());
    }

    #[test]
    fn test_domain_validation() {
        assert!(validate_domain_name("example.com").is_ok());
        assert!(validate_domain_name("sub.example.com.").is_ok());
        assert!(validate_domain_name("xn--bcher-kva.example").is_ok());

        assert!(validate_domain_name("").is_err());
        assert!(validate_domain_name("example..com").is_err());
        assert!(validate_domain_name("-bad.example.com").is_err());
        assert!(validate_domain_name("bad_label.example.com").is_err());
        assert!(validate_domain_name("bücher.example").is_err());
        assert!(validate_domain_name(&format!("{}.com", "a".repeat(64))).is_err());
    }

    #[test]
    fn test_exit_code_mapping() {
        let config_error = anyhow::Error::new(acme_dns_core::Error::config("bad"));
        assert_eq!(exit_code_for(&config_error), HookExitCode::ConfigError);

        let timeout = anyhow::Error::new(acme_dns_core::Error::PropagationTimeout {
            domain: "example.com".to_string(),
            attempts: 5,
        })
        .context("Present failed for example.com");
        assert_eq!(exit_code_for(&timeout), HookExitCode::ChallengeFailure);
    }

    #[tokio::test]
    async fn test_cleanup_with_memory_provider_succeeds() {
        let config = memory_config(&[("ACME_DNS_ACTION", "cleanup")]);
        run_hook(&config).await.unwrap();
    }
}
