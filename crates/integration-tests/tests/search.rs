//! City search over HTTP.

#![allow(clippy::unwrap_used)]

use nimbus_integration_tests::TestServer;

#[tokio::test]
async fn test_search_matches_name_or_country() {
    let server = TestServer::start().await;
    let client = server.client();

    let names: Vec<_> = client
        .search("tok")
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, ["Tokyo"]);

    let us = client.search("us").await.unwrap();
    assert!(!us.is_empty());
    assert!(us.len() <= 5);
}

#[tokio::test]
async fn test_search_without_query_is_bad_request() {
    let server = TestServer::start().await;
    let response = reqwest::get(format!("{}/api/locations/search", server.url()))
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health_and_request_id() {
    let server = TestServer::start().await;
    let response = reqwest::Client::new()
        .get(format!("{}/health", server.url()))
        .header("x-request-id", "trace-me-123")
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    assert_eq!(
        response
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok()),
        Some("trace-me-123")
    );
    assert_eq!(response.text().await.unwrap(), "ok");
}
