// # Azure DNS Provider
//
// Publishes ACME DNS-01 challenge records through the Azure DNS REST API.
//
// ## Behavior
//
// - Zones are not configured up front: the resource group's zones are
//   listed and the one containing the domain is picked by suffix match
// - The domain to zone mapping is cached per provider instance
// - Create is a PUT of the whole record set, so repeating it is harmless
// - Delete treats 404 as success
// - Azure DNS is slow to propagate, so the polling budget is 10 rounds
// - Dry-run mode (`ACME_DNS_MODE=dry-run`) lists zones but skips writes
//
// ## Security Requirements
//
// - The access token NEVER appears in logs or Debug output
//
// ## API Reference (api-version 2018-05-01)
//
// - List zones: GET `/subscriptions/{sub}/resourceGroups/{rg}/providers/Microsoft.Network/dnsZones`
// - Record set: PUT/GET/DELETE `.../dnsZones/{zone}/TXT/{relative-name}`

pub mod zone;

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use acme_dns_core::config::ProviderConfig;
use acme_dns_core::record::{ChallengeRecord, quote};
use acme_dns_core::traits::{DnsProvider, DnsProviderFactory, RecordMetadata};
use acme_dns_core::verifier::DEFAULT_DELAY_SECS;
use acme_dns_core::{Error, PropagationPolicy, ProviderRegistry, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

pub use zone::{relative_record_name, resolve_zone};

/// Azure Resource Manager endpoint
pub const AZURE_MANAGEMENT_ENDPOINT: &str = "https://management.azure.com";

/// Azure DNS API version
const API_VERSION: &str = "2018-05-01";

/// Propagation rounds for Azure DNS
pub const AZURE_PROPAGATION_ATTEMPTS: u32 = 10;

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Azure DNS provider for one resource group
pub struct AzureProvider {
    subscription_id: String,
    resource_group: String,

    /// Bearer token for the management API
    /// ⚠️ NEVER log this value
    access_token: String,

    client: reqwest::Client,
    endpoint: String,

    /// domain -> zone name
    zone_cache: RwLock<HashMap<String, String>>,

    dry_run: bool,
}

// Custom Debug implementation that hides the access token
impl std::fmt::Debug for AzureProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureProvider")
            .field("subscription_id", &self.subscription_id)
            .field("resource_group", &self.resource_group)
            .field("access_token", &"<REDACTED>")
            .field("endpoint", &self.endpoint)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct ZoneList {
    #[serde(default)]
    value: Vec<Zone>,
    #[serde(rename = "nextLink", default)]
    next_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Zone {
    name: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct RecordSet {
    properties: RecordSetProperties,
}

#[derive(Debug, Serialize, Deserialize)]
struct RecordSetProperties {
    #[serde(rename = "TTL")]
    ttl: u32,
    #[serde(rename = "TXTRecords", default)]
    txt_records: Vec<TxtRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TxtRecord {
    value: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl AzureProvider {
    /// Create a new Azure provider
    ///
    /// # Parameters
    ///
    /// - `subscription_id`: Azure subscription holding the resource group
    /// - `resource_group`: Resource group containing the DNS zones
    /// - `access_token`: Bearer token for `https://management.azure.com/`
    /// - `dry_run`: If true, list zones but skip record writes
    pub fn new(
        subscription_id: impl Into<String>,
        resource_group: impl Into<String>,
        access_token: impl Into<String>,
        dry_run: bool,
    ) -> Result<Self> {
        let subscription_id = subscription_id.into();
        let resource_group = resource_group.into();
        let access_token = access_token.into();

        if subscription_id.is_empty() || resource_group.is_empty() {
            return Err(Error::config(
                "Azure subscription ID and resource group are required",
            ));
        }
        if access_token.is_empty() {
            return Err(Error::config("Azure access token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            subscription_id,
            resource_group,
            access_token,
            client,
            endpoint: AZURE_MANAGEMENT_ENDPOINT.to_string(),
            zone_cache: RwLock::new(HashMap::new()),
            dry_run,
        })
    }

    /// Send requests to a different management endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    /// Whether writes are skipped
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn zones_url(&self) -> String {
        format!(
            "{}/subscriptions/{}/resourceGroups/{}/providers/Microsoft.Network/dnsZones",
            self.endpoint, self.subscription_id, self.resource_group
        )
    }

    fn record_url(&self, zone: &str, relative_name: &str) -> String {
        format!(
            "{}/{}/TXT/{}?api-version={}",
            self.zones_url(),
            zone,
            relative_name,
            API_VERSION
        )
    }

    /// List every zone name in the resource group, following `nextLink`
    ///
    /// # API Call
    ///
    /// ```http
    /// GET /subscriptions/{sub}/resourceGroups/{rg}/providers/Microsoft.Network/dnsZones?api-version=2018-05-01
    /// Authorization: Bearer <token>
    /// ```
    async fn list_zones(&self) -> Result<Vec<String>> {
        let mut zones = Vec::new();
        let mut next = Some(format!("{}?api-version={}", self.zones_url(), API_VERSION));

        while let Some(url) = next.take() {
            tracing::debug!("Listing DNS zones in resource group {}", self.resource_group);

            let response = self
                .client
                .get(&url)
                .bearer_auth(&self.access_token)
                .send()
                .await
                .map_err(transport_error)?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(status_error(status, &body, "Zone listing"));
            }

            let page: ZoneList = response.json().await.map_err(|e| {
                Error::provider("azure", format!("Failed to parse zone list: {}", e))
            })?;

            zones.extend(page.value.into_iter().map(|zone| zone.name));
            next = page.next_link.filter(|link| !link.is_empty());
        }

        Ok(zones)
    }

    /// The zone that holds `domain`, from cache or by listing
    pub async fn zone_for(&self, domain: &str) -> Result<String> {
        let key = acme_dns_core::record::normalize_domain(domain);

        {
            let cache = self.zone_cache.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(zone) = cache.get(&key) {
                tracing::trace!("Zone for {} found in cache: {}", key, zone);
                return Ok(zone.clone());
            }
        }

        let zones = self.list_zones().await?;
        let zone = resolve_zone(&key, &zones)
            .ok_or_else(|| Error::zone_not_found(key.clone()))?
            .to_string();

        tracing::debug!("Domain {} belongs to zone {}", key, zone);

        self.zone_cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, zone.clone());

        Ok(zone)
    }
}

#[async_trait]
impl DnsProvider for AzureProvider {
    /// # API Call
    ///
    /// ```http
    /// PUT .../dnsZones/example.org/TXT/_acme-challenge.sub?api-version=2018-05-01
    /// { "properties": { "TTL": 60, "TXTRecords": [ { "value": ["abc123"] } ] } }
    /// ```
    async fn create_record(&self, domain: &str, token: &str) -> Result<()> {
        let record = ChallengeRecord::new(domain, token)?;
        let zone = self.zone_for(record.domain()).await?;
        let relative = relative_record_name(record.domain(), &zone);
        let url = self.record_url(&zone, &relative);

        let payload = RecordSet {
            properties: RecordSetProperties {
                ttl: record.ttl(),
                txt_records: vec![TxtRecord {
                    value: vec![record.value().to_string()],
                }],
            },
        };

        tracing::info!(
            "Creating record {} IN TXT {} in zone {}",
            record.fqdn(),
            record.quoted_value(),
            zone
        );

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would send PUT request to {} with payload: {}",
                url,
                serde_json::to_string(&payload)?
            );
            return Ok(());
        }

        let response = self
            .client
            .put(&url)
            .bearer_auth(&self.access_token)
            .json(&payload)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body, "Record creation"));
        }

        Ok(())
    }

    async fn delete_record(&self, domain: &str, token: &str) -> Result<()> {
        let record = ChallengeRecord::new(domain, token)?;
        let zone = self.zone_for(record.domain()).await?;
        let url = self.record_url(&zone, &relative_record_name(record.domain(), &zone));

        tracing::info!("Deleting record {} from zone {}", record.fqdn(), zone);

        if self.dry_run {
            tracing::info!("[DRY-RUN] Would send DELETE request to {}", url);
            return Ok(());
        }

        let response = self
            .client
            .delete(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(transport_error)?;

        match response.status() {
            StatusCode::OK | StatusCode::NO_CONTENT | StatusCode::NOT_FOUND => Ok(()),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(status_error(status, &body, "Record deletion"))
            }
        }
    }

    async fn get_record(&self, domain: &str) -> Result<Option<RecordMetadata>> {
        let record = ChallengeRecord::new(domain, "")?;
        let zone = self.zone_for(record.domain()).await?;
        let url = self.record_url(&zone, &relative_record_name(record.domain(), &zone));

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body, "Record lookup"));
        }

        let set: RecordSet = response.json().await.map_err(|e| {
            Error::provider("azure", format!("Failed to parse record set: {}", e))
        })?;

        // Azure stores the bare strings; report them in presentation format
        let values = set
            .properties
            .txt_records
            .iter()
            .map(|txt| quote(&txt.value.concat()))
            .collect();

        Ok(Some(RecordMetadata {
            name: record.fqdn(),
            values,
            ttl: set.properties.ttl,
        }))
    }

    fn propagation_policy(&self) -> PropagationPolicy {
        PropagationPolicy::new(
            AZURE_PROPAGATION_ATTEMPTS,
            Duration::from_secs(DEFAULT_DELAY_SECS),
        )
    }

    fn provider_name(&self) -> &'static str {
        "azure"
    }
}

fn transport_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::http("Azure request timed out")
    } else {
        Error::http(format!("Azure request failed: {}", e))
    }
}

/// Map a non-2xx response to an error
fn status_error(status: StatusCode, body: &str, operation: &str) -> Error {
    let detail = serde_json::from_str::<ErrorBody>(body)
        .map(|b| format!("{}: {}", b.error.code, b.error.message))
        .unwrap_or_else(|_| body.to_string());

    match status.as_u16() {
        401 | 403 => Error::auth(format!(
            "Azure rejected the access token or it lacks permission. Status: {} - {}",
            status, detail
        )),
        429 => Error::rate_limited(format!("Azure rate limit exceeded: {}", detail)),
        500..=599 => Error::http(format!(
            "Azure server error (transient): {} - {}",
            status, detail
        )),
        _ => Error::provider(
            "azure",
            format!("{} failed: {} - {}", operation, status, detail),
        ),
    }
}

/// Factory for creating Azure providers
pub struct AzureFactory;

#[async_trait]
impl DnsProviderFactory for AzureFactory {
    async fn create(&self, config: &ProviderConfig) -> Result<Box<dyn DnsProvider>> {
        match config {
            ProviderConfig::Azure {
                subscription_id,
                resource_group,
                access_token,
            } => {
                // Check for dry-run mode environment variable
                let dry_run = std::env::var("ACME_DNS_MODE")
                    .unwrap_or_default()
                    .to_lowercase()
                    == "dry-run";

                if dry_run {
                    tracing::warn!("Azure provider running in DRY-RUN mode - no changes will be made");
                }

                Ok(Box::new(AzureProvider::new(
                    subscription_id.clone(),
                    resource_group.clone(),
                    access_token.clone(),
                    dry_run,
                )?))
            }
            _ => Err(Error::config("Invalid config for Azure provider")),
        }
    }
}

/// Register the Azure provider with a registry
///
/// # Example
///
/// ```rust
/// use acme_dns_core::ProviderRegistry;
///
/// let registry = ProviderRegistry::new();
/// acme_dns_provider_azure::register(&registry);
/// assert!(registry.has_provider("azure"));
/// ```
pub fn register(registry: &ProviderRegistry) {
    registry.register_provider("azure", Box::new(AzureFactory));
}
