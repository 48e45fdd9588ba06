//! Shared fixtures for the Route 53 API tests
//!
//! The API is stood in for by a wiremock server; responses are mounted per
//! test and requests are inspected through `received_requests()`.

#![allow(dead_code)]

use acme_dns_provider_route53::{Credentials, Route53Provider};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

pub const ZONE_ID: &str = "Z1D633PJN98FT9";

pub const ZONE_PATH: &str = "/2013-04-01/hostedzone/Z1D633PJN98FT9";

pub const RRSET_PATH: &str = "/2013-04-01/hostedzone/Z1D633PJN98FT9/rrset";

pub const HOSTED_ZONE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<GetHostedZoneResponse xmlns="https://route53.amazonaws.com/doc/2013-04-01/">
  <HostedZone>
    <Id>/hostedzone/Z1D633PJN98FT9</Id>
    <Name>example.com.</Name>
    <CallerReference>2024-01-01</CallerReference>
    <ResourceRecordSetCount>4</ResourceRecordSetCount>
  </HostedZone>
</GetHostedZoneResponse>"#;

pub const CHANGE_ACCEPTED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ChangeResourceRecordSetsResponse xmlns="https://route53.amazonaws.com/doc/2013-04-01/">
  <ChangeInfo>
    <Id>/change/C2682N5HXP0BZ4</Id>
    <Status>PENDING</Status>
    <SubmittedAt>2024-01-01T00:00:00.000Z</SubmittedAt>
  </ChangeInfo>
</ChangeResourceRecordSetsResponse>"#;

/// An XML response with the given status
pub fn xml(status: u16, body: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_raw(body.to_string(), "text/xml")
}

/// A server that already answers the hosted-zone check
pub async fn server_with_zone() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ZONE_PATH))
        .respond_with(xml(200, HOSTED_ZONE))
        .mount(&server)
        .await;

    server
}

/// Connect a live-mode provider to `server`
pub async fn connect(server: &MockServer) -> acme_dns_core::Result<Route53Provider> {
    Route53Provider::connect_to(server.uri(), ZONE_ID, credentials(), false).await
}

pub fn credentials() -> Credentials {
    Credentials::new("AKIDEXAMPLE", "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY", None).unwrap()
}

/// Everything the server saw, in arrival order
pub async fn requests(server: &MockServer) -> Vec<Request> {
    server
        .received_requests()
        .await
        .expect("request recording is enabled")
}

pub fn header(request: &Request, name: &str) -> Option<String> {
    request
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

pub fn body(request: &Request) -> String {
    String::from_utf8_lossy(&request.body).to_string()
}
