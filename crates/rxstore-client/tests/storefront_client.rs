//! Integration tests for `StorefrontClient`.
//!
//! Each test stands up a local `wiremock` server, so no real network traffic
//! is made. Covers query encoding, classification of the three response
//! shapes, the dynamic-filters endpoint, retry policy, and caching.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use rxstore_client::{ClientError, StorefrontClient};
use rxstore_core::{ClassifiedResponse, FilterState, RequestKey, RoutePath, ShapeTag};

/// Client against the mock server: 5-second timeout, no retries.
fn test_client(server: &MockServer) -> StorefrontClient {
    StorefrontClient::new(&server.uri(), 5, "rxstore-test/0.1", 0, 0)
        .expect("failed to build test StorefrontClient")
}

fn test_client_with_retries(server: &MockServer, max_retries: u32) -> StorefrontClient {
    StorefrontClient::new(&server.uri(), 5, "rxstore-test/0.1", max_retries, 0)
        .expect("failed to build test StorefrontClient")
}

// ---------------------------------------------------------------------------
// Route fetch and classification
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_route_sends_canonical_query_and_classifies_category_collection() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/thuc-pham-chuc-nang/lam-dep"))
        .and(query_param("page", "1"))
        .and(query_param("page_size", "12"))
        .and(query_param("brand", "5,9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 5,
            "results": [{"id": 1}, {"id": 2}, {"id": 3}, {"id": 4}, {"id": 5}],
            "categoryName": "Làm đẹp"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let route = RoutePath::parse("thuc-pham-chuc-nang/lam-dep");
    let filters = FilterState::new(12).with("brand", "5,9").unwrap();
    let response = client.fetch_route(&route, &filters).await.unwrap();

    assert_eq!(response.tag(), ShapeTag::CategoryCollection);
    let collection = response.as_category_collection().unwrap();
    assert_eq!(collection.count, 5);
    assert_eq!(collection.category_name.as_deref(), Some("Làm đẹp"));
}

#[tokio::test]
async fn fetch_route_classifies_payload_without_results_as_detail() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/thuc-pham-chuc-nang/spA"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 42,
            "medicine": {"form": "capsule"},
            "price_value": 150_000
        })))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let response = client
        .fetch_route(&RoutePath::parse("thuc-pham-chuc-nang/spA"), &FilterState::new(12))
        .await
        .unwrap();

    match response.as_ref() {
        ClassifiedResponse::Detail(product) => assert_eq!(product.id, 42),
        other => panic!("expected detail, got {other:?}"),
    }
}

#[tokio::test]
async fn fetch_route_classifies_plain_collection() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/tim-kiem/vitamin"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"count": 1, "results": [{"id": 3}]})),
        )
        .mount(&server)
        .await;

    let client = test_client(&server);
    let response = client
        .fetch_route(&RoutePath::parse("tim-kiem/vitamin"), &FilterState::new(12))
        .await
        .unwrap();
    assert_eq!(response.tag(), ShapeTag::Collection);
}

#[tokio::test]
async fn fetch_route_rejects_non_object_payload() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/a/b"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([1, 2, 3])))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let err = client
        .fetch_route(&RoutePath::parse("a/b"), &FilterState::new(12))
        .await
        .unwrap_err();
    assert!(
        matches!(err.root(), ClientError::Classify { .. }),
        "expected Classify, got: {err:?}"
    );
}

#[tokio::test]
async fn fetch_route_reports_malformed_json() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/a/b"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let err = client
        .fetch_route(&RoutePath::parse("a/b"), &FilterState::new(12))
        .await
        .unwrap_err();
    assert!(
        matches!(err.root(), ClientError::Deserialize { .. }),
        "expected Deserialize, got: {err:?}"
    );
}

// ---------------------------------------------------------------------------
// Dynamic filters
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_dynamic_filters_sends_flags_and_dedups_options() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/dynamic-filters/lam-dep"))
        .and(query_param("include_variants", "true"))
        .and(query_param("include_counts", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "filters": [{
                "id": "brand",
                "label": "Thương hiệu",
                "type": "multiple",
                "options": [
                    {"value": 5, "label": "Brand Five", "count": 3},
                    {"value": "5", "label": "Brand Five", "count": 3},
                    {"value": 9, "label": "Brand Nine"}
                ]
            }],
            "categoryName": "Làm đẹp"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let filters = client.fetch_dynamic_filters("lam-dep").await.unwrap();
    assert_eq!(filters.filters.len(), 1);
    assert_eq!(filters.filters[0].options.len(), 2);
    assert_eq!(filters.category_name.as_deref(), Some("Làm đẹp"));
}

// ---------------------------------------------------------------------------
// Error statuses and retry
// ---------------------------------------------------------------------------

#[tokio::test]
async fn not_found_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/a/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client_with_retries(&server, 3);
    let err = client
        .fetch_route(&RoutePath::parse("a/missing"), &FilterState::new(12))
        .await
        .unwrap_err();
    assert!(
        matches!(err.root(), ClientError::NotFound { .. }),
        "expected NotFound, got: {err:?}"
    );
}

#[tokio::test]
async fn server_errors_are_retried_until_success() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/a/b"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/a/b"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"count": 0, "results": []})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client_with_retries(&server, 2);
    let response = client
        .fetch_route(&RoutePath::parse("a/b"), &FilterState::new(12))
        .await
        .unwrap();
    assert_eq!(response.tag(), ShapeTag::Collection);
}

#[tokio::test]
async fn rate_limit_surfaces_retry_after_once_retries_are_exhausted() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/a/b"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "7"))
        .expect(2)
        .mount(&server)
        .await;

    let client = test_client_with_retries(&server, 1);
    let err = client
        .fetch_route(&RoutePath::parse("a/b"), &FilterState::new(12))
        .await
        .unwrap_err();
    match err.root() {
        ClientError::RateLimited {
            retry_after_secs, ..
        } => assert_eq!(*retry_after_secs, 7),
        other => panic!("expected RateLimited, got: {other:?}"),
    }
}

#[tokio::test]
async fn client_errors_surface_unexpected_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/a/b"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client_with_retries(&server, 2);
    let err = client
        .fetch_route(&RoutePath::parse("a/b"), &FilterState::new(12))
        .await
        .unwrap_err();
    assert!(
        matches!(err.root(), ClientError::UnexpectedStatus { status: 403, .. }),
        "expected UnexpectedStatus 403, got: {err:?}"
    );
}

// ---------------------------------------------------------------------------
// Caching
// ---------------------------------------------------------------------------

#[tokio::test]
async fn identical_requests_hit_the_network_once() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/a/b"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"count": 1, "results": [{"id": 1}]}))
                .set_delay(Duration::from_millis(50)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let route = RoutePath::parse("a/b");
    let filters = FilterState::new(12);
    let key = RequestKey::new(&route, &filters);
    assert!(client.cached_route(&key).await.is_none());

    let (first, second) = tokio::join!(
        client.fetch_route(&route, &filters),
        client.fetch_route(&route, &filters)
    );
    assert!(first.is_ok() && second.is_ok());

    let third = client.fetch_route(&route, &filters).await.unwrap();
    assert_eq!(third.tag(), ShapeTag::Collection);
    assert!(client.cached_route(&key).await.is_some());
}

#[tokio::test]
async fn different_filters_are_cached_separately() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/a/b"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"count": 1, "results": [{"id": 1}]})),
        )
        .expect(2)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let route = RoutePath::parse("a/b");
    let first_page = FilterState::new(12);
    let mut second_page = FilterState::new(12);
    second_page.page = 2;

    client.fetch_route(&route, &first_page).await.unwrap();
    client.fetch_route(&route, &second_page).await.unwrap();
    client.fetch_route(&route, &first_page).await.unwrap();
}

#[tokio::test]
async fn failed_requests_are_not_cached() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/a/b"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/a/b"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 9})))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let route = RoutePath::parse("a/b");
    let filters = FilterState::new(12);
    assert!(client.fetch_route(&route, &filters).await.is_err());
    let response = client.fetch_route(&route, &filters).await.unwrap();
    assert_eq!(response.tag(), ShapeTag::Detail);
}
