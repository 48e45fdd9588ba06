//! AWS Signature Version 4
//!
//! Route 53 is a global service signed against `us-east-1`. Only the pieces
//! needed for the Route 53 REST API are implemented: header-based signing
//! of requests with small, fully buffered bodies.
//!
//! Reference: <https://docs.aws.amazon.com/IAM/latest/UserGuide/reference_sigv-create-signed-request.html>

use std::collections::BTreeMap;

use acme_dns_core::{Error, Result};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::Url;
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Static AWS credentials
#[derive(Clone)]
pub struct Credentials {
    access_key_id: String,
    secret_access_key: String,
    session_token: Option<String>,
}

impl Credentials {
    /// Create credentials from explicit values
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: Option<String>,
    ) -> Result<Self> {
        let access_key_id = access_key_id.into();
        let secret_access_key = secret_access_key.into();

        if access_key_id.is_empty() || secret_access_key.is_empty() {
            return Err(Error::config(
                "AWS access key ID and secret access key are required",
            ));
        }

        Ok(Self {
            access_key_id,
            secret_access_key,
            session_token: session_token.filter(|t| !t.is_empty()),
        })
    }

    /// Use explicit values where given, the standard AWS variables otherwise
    ///
    /// Reads `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY` and
    /// `AWS_SESSION_TOKEN`.
    pub fn resolve(
        access_key_id: Option<&str>,
        secret_access_key: Option<&str>,
        session_token: Option<&str>,
    ) -> Result<Self> {
        let from_env = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());

        let access_key_id = access_key_id
            .map(str::to_string)
            .or_else(|| from_env("AWS_ACCESS_KEY_ID"))
            .ok_or_else(|| Error::config("AWS_ACCESS_KEY_ID is not set"))?;
        let secret_access_key = secret_access_key
            .map(str::to_string)
            .or_else(|| from_env("AWS_SECRET_ACCESS_KEY"))
            .ok_or_else(|| Error::config("AWS_SECRET_ACCESS_KEY is not set"))?;
        let session_token = session_token
            .map(str::to_string)
            .or_else(|| from_env("AWS_SESSION_TOKEN"));

        Self::new(access_key_id, secret_access_key, session_token)
    }

    /// The access key ID (not secret)
    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<REDACTED>")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "<REDACTED>"),
            )
            .finish()
    }
}

/// Signs requests for one region and service
#[derive(Debug, Clone)]
pub struct Signer {
    credentials: Credentials,
    region: String,
    service: String,
}

impl Signer {
    pub fn new(credentials: Credentials, region: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            credentials,
            region: region.into(),
            service: service.into(),
        }
    }

    /// Headers to attach to the request, `authorization` included
    ///
    /// The returned headers must be sent unchanged; `host` is derived from
    /// `url` and is set by the HTTP client.
    pub fn sign(
        &self,
        method: &str,
        url: &Url,
        body: &[u8],
        now: DateTime<Utc>,
    ) -> Result<Vec<(&'static str, String)>> {
        let host = url
            .host_str()
            .ok_or_else(|| Error::invalid_input(format!("URL has no host: {}", url)))?;
        // Must match the Host header the client sends, port included
        let host = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date = now.format("%Y%m%d").to_string();

        let mut canonical = CanonicalRequest::new(method, url.path(), &canonical_query(url), body);
        canonical.header("host", &host);
        canonical.header("x-amz-date", &amz_date);
        if let Some(ref token) = self.credentials.session_token {
            canonical.header("x-amz-security-token", token);
        }

        let scope = format!("{}/{}/{}/aws4_request", date, self.region, self.service);
        let to_sign = string_to_sign(&amz_date, &scope, &canonical.render());
        let key = signing_key(
            &self.credentials.secret_access_key,
            &date,
            &self.region,
            &self.service,
        );
        let signature = hex::encode(hmac_sha256(&key, to_sign.as_bytes()));

        let authorization = format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            ALGORITHM,
            self.credentials.access_key_id,
            scope,
            canonical.signed_headers(),
            signature
        );

        let mut headers = vec![("x-amz-date", amz_date), ("authorization", authorization)];
        if let Some(ref token) = self.credentials.session_token {
            headers.push(("x-amz-security-token", token.clone()));
        }
        Ok(headers)
    }
}

/// The canonical form of a request that gets hashed and signed
#[derive(Debug)]
pub(crate) struct CanonicalRequest {
    method: String,
    path: String,
    query: String,
    headers: BTreeMap<String, String>,
    payload_hash: String,
}

impl CanonicalRequest {
    pub(crate) fn new(method: &str, path: &str, query: &str, body: &[u8]) -> Self {
        Self {
            method: method.to_uppercase(),
            path: if path.is_empty() { "/".to_string() } else { path.to_string() },
            query: query.to_string(),
            headers: BTreeMap::new(),
            payload_hash: hex::encode(Sha256::digest(body)),
        }
    }

    pub(crate) fn header(&mut self, name: &str, value: &str) {
        self.headers
            .insert(name.to_lowercase(), value.trim().to_string());
    }

    pub(crate) fn signed_headers(&self) -> String {
        self.headers.keys().cloned().collect::<Vec<_>>().join(";")
    }

    pub(crate) fn render(&self) -> String {
        let headers: String = self
            .headers
            .iter()
            .map(|(name, value)| format!("{}:{}\n", name, value))
            .collect();

        format!(
            "{}\n{}\n{}\n{}\n{}\n{}",
            self.method,
            self.path,
            self.query,
            headers,
            self.signed_headers(),
            self.payload_hash
        )
    }
}

pub(crate) fn string_to_sign(amz_date: &str, scope: &str, canonical_request: &str) -> String {
    format!(
        "{}\n{}\n{}\n{}",
        ALGORITHM,
        amz_date,
        scope,
        hex::encode(Sha256::digest(canonical_request.as_bytes()))
    )
}

pub(crate) fn signing_key(secret: &str, date: &str, region: &str, service: &str) -> Vec<u8> {
    let k_date = hmac_sha256(format!("AWS4{}", secret).as_bytes(), date.as_bytes());
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, service.as_bytes());
    hmac_sha256(&k_service, b"aws4_request")
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// Query parameters sorted and encoded the way SigV4 expects
fn canonical_query(url: &Url) -> String {
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (uri_encode(&k), uri_encode(&v)))
        .collect();
    pairs.sort();

    pairs
        .into_iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

/// RFC 3986 encoding; only unreserved characters pass through
fn uri_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}
