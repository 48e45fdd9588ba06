// # Route 53 DNS Provider
//
// Publishes ACME DNS-01 challenge records into one AWS Route 53 hosted zone.
//
// ## Behavior
//
// - The hosted zone is checked once at construction (`GetHostedZone`), so a
//   wrong zone ID or bad credentials fail before any challenge starts
// - Create is an `UPSERT`, so repeating it for the same domain is harmless
// - Delete of a record that is already gone counts as success
// - One HTTP request per operation; no retries here, the caller owns them
// - Dry-run mode (`ACME_DNS_MODE=dry-run`) performs reads but skips writes
//
// ## Security Requirements
//
// - The secret access key and session token NEVER appear in logs
// - Requests are signed with AWS Signature Version 4
//
// ## API Reference
//
// - Get zone: GET `/2013-04-01/hostedzone/{Id}`
// - Change records: POST `/2013-04-01/hostedzone/{Id}/rrset`
// - List records: GET `/2013-04-01/hostedzone/{Id}/rrset?name=...&type=TXT&maxitems=1`

pub mod sign;
pub mod xml;

use std::time::Duration;

use acme_dns_core::config::ProviderConfig;
use acme_dns_core::record::ChallengeRecord;
use acme_dns_core::traits::{DnsProvider, DnsProviderFactory, RecordMetadata};
use acme_dns_core::{Error, ProviderRegistry, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Method, StatusCode, Url};

pub use sign::{Credentials, Signer};
use xml::{ApiError, ChangeAction};

/// Route 53 API endpoint (global, signed against us-east-1)
pub const ROUTE53_ENDPOINT: &str = "https://route53.amazonaws.com";

const API_VERSION: &str = "2013-04-01";
const SIGNING_REGION: &str = "us-east-1";
const SIGNING_SERVICE: &str = "route53";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Route 53 DNS provider bound to a single hosted zone
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the provider will:
/// - Perform all GET requests (zone check, record lookup)
/// - Log the change batch it would have sent
/// - **NOT** modify the zone
pub struct Route53Provider {
    /// Hosted zone ID without the `/hostedzone/` prefix
    hosted_zone_id: String,

    /// Apex of the hosted zone, learned at construction
    zone_name: String,

    /// Request signer
    /// ⚠️ Holds the secret key; NEVER log
    signer: Signer,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// API base URL
    endpoint: String,

    /// Dry-run mode: if true, perform reads but skip changes
    dry_run: bool,
}

// Custom Debug implementation that hides the credentials
impl std::fmt::Debug for Route53Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route53Provider")
            .field("hosted_zone_id", &self.hosted_zone_id)
            .field("zone_name", &self.zone_name)
            .field("signer", &"<REDACTED>")
            .field("endpoint", &self.endpoint)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl Route53Provider {
    /// Connect to a hosted zone on the public Route 53 endpoint
    ///
    /// Fails if the zone does not exist or is not accessible with the given
    /// credentials.
    pub async fn connect(hosted_zone_id: &str, credentials: Credentials, dry_run: bool) -> Result<Self> {
        Self::connect_to(ROUTE53_ENDPOINT, hosted_zone_id, credentials, dry_run).await
    }

    /// Connect to a hosted zone through an explicit API endpoint
    pub async fn connect_to(
        endpoint: impl Into<String>,
        hosted_zone_id: &str,
        credentials: Credentials,
        dry_run: bool,
    ) -> Result<Self> {
        let hosted_zone_id = normalize_zone_id(hosted_zone_id);
        if hosted_zone_id.is_empty() {
            return Err(Error::config("Route 53 hosted zone ID cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        let mut provider = Self {
            hosted_zone_id,
            zone_name: String::new(),
            signer: Signer::new(credentials, SIGNING_REGION, SIGNING_SERVICE),
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            dry_run,
        };

        provider.zone_name = provider.fetch_zone_name().await?;

        tracing::info!(
            "Using Route 53 hosted zone {} ({}) [mode: {}]",
            provider.hosted_zone_id,
            provider.zone_name,
            if provider.dry_run { "DRY-RUN" } else { "LIVE" }
        );

        Ok(provider)
    }

    /// The hosted zone ID, without the `/hostedzone/` prefix
    pub fn hosted_zone_id(&self) -> &str {
        &self.hosted_zone_id
    }

    /// The apex domain of the hosted zone
    pub fn zone_name(&self) -> &str {
        &self.zone_name
    }

    /// Whether writes are skipped
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn url(&self, suffix: &str) -> Result<Url> {
        let raw = format!(
            "{}/{}/hostedzone/{}{}",
            self.endpoint, API_VERSION, self.hosted_zone_id, suffix
        );
        Url::parse(&raw).map_err(|e| Error::config(format!("Invalid Route 53 URL {}: {}", raw, e)))
    }

    /// Send a signed request, returning the status and body text
    async fn send(&self, method: Method, url: Url, body: Option<String>) -> Result<(StatusCode, String)> {
        let payload = body.as_deref().unwrap_or_default();
        let headers = self
            .signer
            .sign(method.as_str(), &url, payload.as_bytes(), Utc::now())?;

        let mut request = self.client.request(method, url);
        for (name, value) in headers {
            request = request.header(name, value);
        }
        if let Some(body) = body {
            request = request
                .header(reqwest::header::CONTENT_TYPE, "application/xml")
                .body(body);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::http("Route 53 request timed out")
            } else {
                Error::http(format!("Route 53 request failed: {}", e))
            }
        })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read response body".to_string());

        Ok((status, text))
    }

    /// Look up the hosted zone and return its apex
    ///
    /// # API Call
    ///
    /// ```http
    /// GET /2013-04-01/hostedzone/Z123
    /// ```
    async fn fetch_zone_name(&self) -> Result<String> {
        tracing::debug!("Checking hosted zone {}", self.hosted_zone_id);

        let (status, body) = self.send(Method::GET, self.url("")?, None).await?;
        if !status.is_success() {
            return Err(self.status_error(status, &body, "Hosted zone lookup"));
        }

        xml::parse_hosted_zone_name(&body)?.ok_or_else(|| {
            Error::provider(
                "route53",
                "Invalid response format: GetHostedZone response has no zone name",
            )
        })
    }

    /// Submit a change batch for one record
    ///
    /// # API Call
    ///
    /// ```http
    /// POST /2013-04-01/hostedzone/Z123/rrset
    /// <ChangeResourceRecordSetsRequest>...</ChangeResourceRecordSetsRequest>
    /// ```
    async fn change(&self, action: ChangeAction, record: &ChallengeRecord) -> Result<()> {
        let url = self.url("/rrset")?;
        let body = xml::change_batch(action, record);

        if self.dry_run {
            tracing::info!("[DRY-RUN] Would send POST request to {} with payload: {}", url, body);
            return Ok(());
        }

        let (status, response) = self.send(Method::POST, url, Some(body)).await?;
        if status.is_success() {
            return Ok(());
        }

        if action == ChangeAction::Delete && status == StatusCode::BAD_REQUEST {
            if let Ok(error) = ApiError::parse(&response) {
                if error.is_missing_record() {
                    tracing::debug!("Record {} already absent", record.fqdn());
                    return Ok(());
                }
            }
        }

        Err(self.status_error(status, &response, "Record change"))
    }

    /// Reject domains this zone can not hold
    fn check_in_zone(&self, record: &ChallengeRecord) -> Result<()> {
        let domain = record.domain();
        if domain == self.zone_name || domain.ends_with(&format!(".{}", self.zone_name)) {
            Ok(())
        } else {
            Err(Error::zone_not_found(domain))
        }
    }

    /// Map a non-2xx response to an error
    fn status_error(&self, status: StatusCode, body: &str, operation: &str) -> Error {
        let api_error = ApiError::parse(body).unwrap_or_default();
        let detail = if api_error.code.is_empty() {
            body.to_string()
        } else {
            format!("{}: {}", api_error.code, api_error.message())
        };

        match status.as_u16() {
            401 | 403 => Error::auth(format!(
                "Route 53 rejected the credentials or they lack permission. Status: {} - {}",
                status, detail
            )),
            404 => Error::zone_not_found(format!("hosted zone {}", self.hosted_zone_id)),
            429 => Error::rate_limited(format!("Route 53 rate limit exceeded: {}", detail)),
            400 if api_error.is_throttling() => {
                Error::rate_limited(format!("Route 53 rate limit exceeded: {}", detail))
            }
            500..=599 => Error::http(format!(
                "Route 53 server error (transient): {} - {}",
                status, detail
            )),
            _ => Error::provider(
                "route53",
                format!("{} failed: {} - {}", operation, status, detail),
            ),
        }
    }
}

#[async_trait]
impl DnsProvider for Route53Provider {
    async fn create_record(&self, domain: &str, token: &str) -> Result<()> {
        let record = ChallengeRecord::new(domain, token)?;
        self.check_in_zone(&record)?;

        tracing::info!(
            "Creating record {} IN TXT {} in zone {}",
            record.fqdn(),
            record.quoted_value(),
            self.zone_name
        );

        self.change(ChangeAction::Upsert, &record).await
    }

    async fn delete_record(&self, domain: &str, token: &str) -> Result<()> {
        let record = ChallengeRecord::new(domain, token)?;
        self.check_in_zone(&record)?;

        tracing::info!("Deleting record {} from zone {}", record.fqdn(), self.zone_name);

        self.change(ChangeAction::Delete, &record).await
    }

    async fn get_record(&self, domain: &str) -> Result<Option<RecordMetadata>> {
        let record = ChallengeRecord::new(domain, "")?;
        let fqdn = record.fqdn();

        let mut url = self.url("/rrset")?;
        url.query_pairs_mut()
            .append_pair("name", &fqdn)
            .append_pair("type", "TXT")
            .append_pair("maxitems", "1");

        let (status, body) = self.send(Method::GET, url, None).await?;
        if !status.is_success() {
            return Err(self.status_error(status, &body, "Record lookup"));
        }

        // Listing starts at `name`, so the first set may be a later one
        let found = xml::parse_record_sets(&body)?
            .into_iter()
            .find(|set| set.record_type == "TXT" && set.name.eq_ignore_ascii_case(&fqdn));

        Ok(found.map(|set| RecordMetadata {
            name: fqdn,
            values: set.values,
            ttl: set.ttl,
        }))
    }

    fn provider_name(&self) -> &'static str {
        "route53"
    }
}

/// Strip whitespace and the `/hostedzone/` prefix the console shows
pub fn normalize_zone_id(id: &str) -> String {
    let id = id.trim();
    id.strip_prefix("/hostedzone/").unwrap_or(id).to_string()
}

/// Factory for creating Route 53 providers
pub struct Route53Factory;

#[async_trait]
impl DnsProviderFactory for Route53Factory {
    async fn create(&self, config: &ProviderConfig) -> Result<Box<dyn DnsProvider>> {
        match config {
            ProviderConfig::Route53 {
                hosted_zone_id,
                access_key_id,
                secret_access_key,
                session_token,
            } => {
                let credentials = Credentials::resolve(
                    access_key_id.as_deref(),
                    secret_access_key.as_deref(),
                    session_token.as_deref(),
                )?;

                // Check for dry-run mode environment variable
                let dry_run = std::env::var("ACME_DNS_MODE")
                    .unwrap_or_default()
                    .to_lowercase()
                    == "dry-run";

                if dry_run {
                    tracing::warn!("Route 53 provider running in DRY-RUN mode - no changes will be made");
                }

                let provider = Route53Provider::connect(hosted_zone_id, credentials, dry_run).await?;
                Ok(Box::new(provider))
            }
            _ => Err(Error::config("Invalid config for Route 53 provider")),
        }
    }
}

/// Register the Route 53 provider with a registry
///
/// # Example
///
/// ```rust
/// use acme_dns_core::ProviderRegistry;
///
/// let registry = ProviderRegistry::new();
/// acme_dns_provider_route53::register(&registry);
/// assert!(registry.has_provider("route53"));
/// ```
pub fn register(registry: &ProviderRegistry) {
    registry.register_provider("route53", Box::new(Route53Factory));
}
