//! Web front integration tests
//!
//! The router is driven in-process with `oneshot`; resolution goes to a
//! stub so the tests exercise form handling and rendering only.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use geotrace::api::{create_router, PageTemplate};
use geotrace::lookup::{BulkLookup, LocationRecord, LookupService, Resolver, RouteBuilder};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

/// Places each address at (first octet, second octet); `fail` tokens resolve to nothing
struct GridResolver;

#[async_trait]
impl Resolver for GridResolver {
    async fn resolve(&self, address: &str) -> Option<LocationRecord> {
        if address.contains("fail") {
            return None;
        }
        let mut octets = address.split('.').map(|o| o.parse::<f64>().unwrap_or(0.0));
        let lat = octets.next().unwrap_or(0.0);
        let lon = octets.next().unwrap_or(0.0);
        Some(LocationRecord::from_payload(
            address,
            &json!({ "status": "success", "isp": "Grid ISP", "lat": lat, "lon": lon }),
        ))
    }

    fn name(&self) -> &'static str {
        "grid"
    }
}

fn create_test_app() -> Router {
    let service = LookupService::new(
        BulkLookup::new(Arc::new(GridResolver), 4),
        RouteBuilder::default(),
    );
    create_router(service, PageTemplate::load().unwrap())
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_form_page() {
    let app = create_test_app();

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let page = body_text(response).await;
    assert!(page.contains("IP Geolocation Lookup"));
    assert!(page.contains(r#"name="ipsInput""#));
    assert!(page.contains("No geolocation results found."));
}

#[tokio::test]
async fn test_form_submission_renders_results() {
    let app = create_test_app();

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("ipsInput=1.2.3.4+5.6.7.8%0D%0A1.2.3.4+fail.1"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let page = body_text(response).await;
    assert!(page.contains("Google Maps Route:"));
    assert!(page.contains("View Route on Google Maps"));
    assert!(page.contains("Top 5 Most Repeated IPs:"));
    assert!(page.contains("<strong>IP:</strong> 1.2.3.4<br><strong>Count:</strong> 2"));
    assert!(page.contains("<strong>IP:</strong> fail.1<br><strong>Count:</strong> 1"));
    assert!(page.contains("<strong>ISP:</strong> Grid ISP"));
    assert!(!page.contains("No geolocation results found."));
}

#[tokio::test]
async fn test_form_submission_with_single_location() {
    let app = create_test_app();

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("ipsInput=9.9.9.9+fail.2"))
        .unwrap();
    let page = body_text(app.oneshot(request).await.unwrap()).await;

    assert!(page.contains("Cannot generate Google Maps route because there are insufficient locations."));
    assert!(page.contains("Geolocation Results:"));
}

#[tokio::test]
async fn test_json_lookup() {
    let app = create_test_app();

    let request = Request::builder()
        .method("POST")
        .uri("/api/lookup")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "addresses": ["1.2.3.4", "1.2.3.4", "5.6.7.8", "9.10.11.12", "fail.3"] })
                .to_string(),
        ))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_str(&body_text(response).await).unwrap();

    assert_eq!(body["results"].as_array().unwrap().len(), 3);
    assert_eq!(body["top5"][0], json!({ "address": "1.2.3.4", "count": 2 }));
    assert_eq!(body["top5"].as_array().unwrap().len(), 4);

    // Completion order decides origin and destination, but there is always
    // exactly one interior waypoint for three locations
    let url = body["route_url"].as_str().unwrap();
    assert!(url.starts_with("https://www.google.com/maps/dir/?api=1&origin="));
    let waypoints = url.split("&waypoints=").nth(1).unwrap();
    assert!(!waypoints.contains('|'));
}

#[tokio::test]
async fn test_json_lookup_accepts_text() {
    let app = create_test_app();

    let request = Request::builder()
        .method("POST")
        .uri("/api/lookup")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "addresses": "  " }).to_string()))
        .unwrap();
    let body: Value =
        serde_json::from_str(&body_text(app.oneshot(request).await.unwrap()).await).unwrap();

    assert_eq!(body["results"], json!([]));
    assert_eq!(body["top5"], json!([]));
    assert_eq!(body["route_url"], Value::Null);
}

#[tokio::test]
async fn test_health_check() {
    let app = create_test_app();

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, r#"{"message":"OK"}"#);
}
