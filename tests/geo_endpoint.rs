//! End-to-end tests for the geo endpoint.

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use geo_endpoint::{ConnectionMetadata, GeoConfig, HttpServer};
use serde_json::{json, Value};
use tower::ServiceExt;

mod common;

const METADATA_HEADER: &str = "cf-connection-metadata";

fn full_metadata() -> String {
    json!({
        "country": "US",
        "region": "California",
        "regionCode": "CA",
        "timezone": "America/Los_Angeles",
        "asOrganization": "Example Net",
        "asn": 64500,
    })
    .to_string()
}

#[tokio::test]
async fn test_success_scenario() {
    let server = common::start_server(GeoConfig::default()).await;

    let res = common::client()
        .get(server.url("/"))
        .header("CF-Connecting-IP", "203.0.113.7")
        .header(METADATA_HEADER, full_metadata())
        .send()
        .await
        .expect("endpoint unreachable");

    assert_eq!(res.status(), 200);
    let headers = res.headers();
    assert_eq!(headers["content-type"], "application/json");
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert_eq!(headers["access-control-allow-methods"], "GET, HEAD, OPTIONS");

    let body = res.text().await.unwrap();
    let expected = r#"{
  "query": "203.0.113.7",
  "status": "success",
  "countryCode": "US",
  "timezone": "America/Los_Angeles",
  "isp": "Example Net",
  "as": "AS64500 Example Net",
  "regionName": "California",
  "region": "CA"
}"#;
    assert_eq!(body, expected);

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_missing_metadata_scenario() {
    let server = common::start_server(GeoConfig::default()).await;

    let res = common::client().get(server.url("/")).send().await.unwrap();

    assert_eq!(res.status(), 400);
    assert_eq!(res.headers()["access-control-allow-origin"], "*");
    assert!(res.headers().get("access-control-allow-methods").is_none());

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "fail");
    assert_eq!(body["query"], Value::Null);
    assert_eq!(
        body["message"],
        "Cloudflare geo-location data (request.cf) was not available for this request."
    );
    assert_eq!(
        body["reason"],
        "The 'request.cf' object required for geo-location was missing or undefined."
    );

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_missing_metadata_regardless_of_request() {
    let server = common::start_server(GeoConfig::default()).await;

    let res = common::client()
        .post(server.url("/lookup/anything?x=1"))
        .header("CF-Connecting-IP", "198.51.100.23")
        .body("ignored body")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 400);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "fail");
    assert_eq!(body["query"], "198.51.100.23");

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_malformed_metadata_is_server_error() {
    let server = common::start_server(GeoConfig::default()).await;

    let res = common::client()
        .get(server.url("/"))
        .header("CF-Connecting-IP", "192.0.2.55")
        .header(METADATA_HEADER, "{\"country\": ")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 500);
    assert_eq!(res.headers()["content-type"], "application/json");
    assert!(res.headers().get("access-control-allow-methods").is_none());

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "fail");
    assert_eq!(
        body["message"],
        "An unexpected server error occurred while processing the request."
    );
    assert_eq!(body["query"], "192.0.2.55");
    let details = body["error_details"].as_str().unwrap();
    assert!(details.starts_with("connection metadata is not valid JSON"), "{details}");

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_any_method_and_path_succeeds() {
    let server = common::start_server(GeoConfig::default()).await;
    let client = common::client();

    for res in [
        client
            .post(server.url("/json/8.8.8.8"))
            .header(METADATA_HEADER, r#"{"asOrganization":"Example ISP"}"#)
            .send()
            .await
            .unwrap(),
        client
            .request(reqwest::Method::OPTIONS, server.url("/"))
            .header(METADATA_HEADER, r#"{"asn":"64512"}"#)
            .send()
            .await
            .unwrap(),
    ] {
        assert_eq!(res.status(), 200);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["status"], "success");
        assert!(body["as"] == "Example ISP" || body["as"] == "AS64512");
    }

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_identical_requests_identical_bytes() {
    let server = common::start_server(GeoConfig::default()).await;
    let client = common::client();

    let mut bodies = Vec::new();
    for _ in 0..2 {
        let res = client
            .get(server.url("/"))
            .header("CF-Connecting-IP", "203.0.113.7")
            .header(METADATA_HEADER, full_metadata())
            .send()
            .await
            .unwrap();
        bodies.push(res.bytes().await.unwrap());
    }
    assert_eq!(bodies[0], bodies[1]);

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_custom_metadata_header() {
    let mut config = GeoConfig::default();
    config.metadata.header = "x-edge-geo".to_string();
    let server = common::start_server(config).await;
    let client = common::client();

    let res = client
        .get(server.url("/"))
        .header("x-edge-geo", r#"{"country":"NL"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["countryCode"], "NL");

    // The default header is no longer consulted.
    let res = client
        .get(server.url("/"))
        .header(METADATA_HEADER, r#"{"country":"NL"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_extension_ingress() {
    let server = HttpServer::new(GeoConfig::default()).unwrap();

    let mut request = Request::builder()
        .uri("/")
        .header("cf-connecting-ip", "2001:db8::1")
        .body(Body::empty())
        .unwrap();
    let metadata = ConnectionMetadata::from_value(json!({
        "country": "JP",
        "timezone": "Asia/Tokyo",
        "asn": 2497,
        "asOrganization": "Internet Initiative Japan Inc.",
    }))
    .unwrap();
    request.extensions_mut().insert(metadata);

    let response = server.router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["query"], "2001:db8::1");
    assert_eq!(body["countryCode"], "JP");
    assert_eq!(body["as"], "AS2497 Internet Initiative Japan Inc.");
    assert_eq!(body["regionName"], Value::Null);
}

#[tokio::test]
async fn test_shutdown_stops_server() {
    let server = common::start_server(GeoConfig::default()).await;
    server.shutdown.trigger();

    let result = tokio::time::timeout(Duration::from_secs(5), server.handle)
        .await
        .expect("server did not stop");
    assert!(result.unwrap().is_ok());
}
