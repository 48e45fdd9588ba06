//! Shared fixtures for the Azure DNS API tests
//!
//! Azure Resource Manager is stood in for by a wiremock server; responses
//! are mounted per test and requests are inspected through
//! `received_requests()`.

#![allow(dead_code)]

use acme_dns_provider_azure::AzureProvider;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

/// Path prefix of every zone request
pub const ZONES_PATH: &str =
    "/subscriptions/sub-1/resourceGroups/rg-dns/providers/Microsoft.Network/dnsZones";

pub const ONE_ZONE: &str = r#"{
  "value": [
    { "id": "/subscriptions/sub-1/resourceGroups/rg-dns/providers/Microsoft.Network/dnszones/example.org",
      "name": "example.org", "type": "Microsoft.Network/dnszones", "location": "global" }
  ]
}"#;

/// Path of the challenge record set for `sub.example.org`
pub fn sub_record_path() -> String {
    format!("{}/example.org/TXT/_acme-challenge.sub", ZONES_PATH)
}

/// A JSON response with the given status
pub fn json(status: u16, body: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_raw(body.to_string(), "application/json")
}

/// A server whose resource group holds `example.org`
pub async fn server_with_zone() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ZONES_PATH))
        .and(query_param("api-version", "2018-05-01"))
        .respond_with(json(200, ONE_ZONE))
        .mount(&server)
        .await;

    server
}

/// A live-mode provider pointed at `server`
pub fn provider(server: &MockServer) -> AzureProvider {
    AzureProvider::new("sub-1", "rg-dns", "test-access-token", false)
        .unwrap()
        .with_endpoint(server.uri())
}

/// Everything the server saw, in arrival order
pub async fn requests(server: &MockServer) -> Vec<Request> {
    server
        .received_requests()
        .await
        .expect("request recording is enabled")
}
