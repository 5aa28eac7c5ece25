//! MediaWikiClient against a mock Action API endpoint.

use seedgraph::api::{ApiError, MediaWikiClient, WikiApi};
use serde_json::json;
use std::time::Duration;
use wiremock::{
    matchers::{method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

async fn client_for(server: &MockServer) -> MediaWikiClient {
    MediaWikiClient::new(
        &format!("{}/w/api.php", server.uri()),
        Duration::from_secs(5),
    )
    .unwrap()
}

#[tokio::test]
async fn test_query_pages_merges_normalizations_and_redirects() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("action", "query"))
        .and(query_param("prop", "info"))
        .and(query_param("redirects", "1"))
        .and(query_param("formatversion", "2"))
        .and(query_param("titles", "rust|Big Apple|Nowhere"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "batchcomplete": true,
            "query": {
                "normalized": [{"fromencoded": false, "from": "rust", "to": "Rust"}],
                "redirects": [{"from": "Big Apple", "to": "New York City"}],
                "pages": [
                    {"pageid": 25, "ns": 0, "title": "Rust"},
                    {"pageid": 645042, "ns": 0, "title": "New York City"},
                    {"ns": 0, "title": "Nowhere", "missing": true}
                ]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let titles = vec![
        "rust".to_string(),
        "Big Apple".to_string(),
        "Nowhere".to_string(),
    ];
    let query = client.query_pages(&titles).await.unwrap();

    assert_eq!(
        query.redirects,
        vec![
            ("rust".to_string(), "Rust".to_string()),
            ("Big Apple".to_string(), "New York City".to_string()),
        ]
    );
    assert_eq!(query.pages.len(), 3);
    assert_eq!(query.pages[1].page_id, 645042);
    assert!(query.pages[2].is_missing());
}

#[tokio::test]
async fn test_fetch_wikitext_reads_main_slot() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("prop", "revisions"))
        .and(query_param("rvslots", "main"))
        .and(query_param("titles", "Rust"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "query": {
                "pages": [{
                    "pageid": 25,
                    "ns": 0,
                    "title": "Rust",
                    "revisions": [{
                        "slots": {"main": {"contentmodel": "wikitext", "content": "See [[Iron]]."}}
                    }]
                }]
            }
        })))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let body = client.fetch_wikitext("Rust").await.unwrap();

    assert_eq!(body.as_deref(), Some("See [[Iron]]."));
}

#[tokio::test]
async fn test_fetch_wikitext_missing_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("prop", "revisions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "query": {"pages": [{"ns": 0, "title": "Ghost", "missing": true}]}
        })))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    assert_eq!(client.fetch_wikitext("Ghost").await.unwrap(), None);
}

#[tokio::test]
async fn test_server_error_is_retryable_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client
        .query_pages(&["Rust".to_string()])
        .await
        .unwrap_err();

    match &err {
        ApiError::Status { status, .. } => assert_eq!(*status, 503),
        other => panic!("expected status error, got {:?}", other),
    }
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_remote_error_is_surfaced() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": {"code": "maxlag", "info": "Waiting for replicas"}
        })))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client.fetch_wikitext("Rust").await.unwrap_err();

    assert!(matches!(err, ApiError::Remote { ref code, .. } if code == "maxlag"));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_non_json_body_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client.fetch_wikitext("Rust").await.unwrap_err();

    assert!(matches!(err, ApiError::Malformed(_)));
    assert!(!err.is_retryable());
}
