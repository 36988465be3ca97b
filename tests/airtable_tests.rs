// Airtable client and catalog service tests against a mock upstream

use chrono::Utc;
use experience_match::models::{Lead, Mode};
use experience_match::services::{
    AirtableClient, AirtableError, AirtableTables, CatalogCache, CatalogService,
};
use mockito::{Matcher, Server};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn create_client(url: String, token: &str) -> AirtableClient {
    let tables = AirtableTables {
        experiences: "Experiences".to_string(),
        experiences_view: None,
        leads: "Leads".to_string(),
    };

    AirtableClient::new(
        url,
        token.to_string(),
        "appTEST".to_string(),
        tables,
        100,
        Duration::from_secs(5),
    )
    .unwrap()
}

fn record(id: &str, title: &str, mode: &str) -> serde_json::Value {
    json!({
        "id": id,
        "createdTime": "2024-01-01T00:00:00.000Z",
        "fields": {
            "Title": title,
            "Mode": mode,
            "Min party": 2,
            "Max party": 6,
            "Price Per Person (Min)": 80,
            "Price Per Person (Max)": 150,
            "Vibe tags": ["cosy"]
        }
    })
}

#[tokio::test]
async fn test_fetch_experiences_follows_pagination() {
    let mut server = Server::new_async().await;

    let first = server
        .mock("GET", "/appTEST/Experiences")
        .match_query(Matcher::Regex("^pageSize=100$".into()))
        .match_header("authorization", "Bearer keyTEST")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "records": [record("recA", "Pasta night", "Home")],
                "offset": "itr1/recA"
            })
            .to_string(),
        )
        .create_async()
        .await;

    let second = server
        .mock("GET", "/appTEST/Experiences")
        .match_query(Matcher::UrlEncoded("offset".into(), "itr1/recA".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "records": [
                    record("recB", "Wine bar crawl", "Out"),
                    { "id": "recBad", "fields": { "Min party": 9, "Max party": 2 } }
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = create_client(server.url(), "keyTEST");
    let experiences = client.fetch_experiences().await.unwrap();

    first.assert_async().await;
    second.assert_async().await;

    // The inverted record is skipped
    assert_eq!(experiences.len(), 2);
    assert_eq!(experiences[0].id, "recA");
    assert_eq!(experiences[0].mode, Mode::Home);
    assert_eq!(experiences[1].id, "recB");
    assert_eq!(experiences[1].max_price_pp, Some(150));
}

#[tokio::test]
async fn test_fetch_by_ids_builds_formula() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", "/appTEST/Experiences")
        .match_query(Matcher::UrlEncoded(
            "filterByFormula".into(),
            "OR(RECORD_ID()='recA',RECORD_ID()='recB')".into(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "records": [record("recA", "Pasta night", "Home")] }).to_string())
        .create_async()
        .await;

    let client = create_client(server.url(), "keyTEST");
    let ids = vec!["recA".to_string(), "recB".to_string(), "rec'); DROP".to_string()];
    let experiences = client.fetch_by_ids(&ids).await.unwrap();

    mock.assert_async().await;
    assert_eq!(experiences.len(), 1);
    assert_eq!(experiences[0].title, "Pasta night");
}

#[tokio::test]
async fn test_fetch_by_ids_follows_pagination() {
    let mut server = Server::new_async().await;

    // First request ends with the formula, the follow-up with the offset
    let first = server
        .mock("GET", "/appTEST/Experiences")
        .match_query(Matcher::Regex(r"(%29|\))$".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "records": [record("recA", "Pasta night", "Home")],
                "offset": "itr2"
            })
            .to_string(),
        )
        .create_async()
        .await;

    let second = server
        .mock("GET", "/appTEST/Experiences")
        .match_query(Matcher::Regex("offset=itr2$".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "records": [record("recB", "Wine bar crawl", "Out")] }).to_string())
        .create_async()
        .await;

    let client = create_client(server.url(), "keyTEST");
    let ids = vec!["recA".to_string(), "recB".to_string()];
    let experiences = client.fetch_by_ids(&ids).await.unwrap();

    first.assert_async().await;
    second.assert_async().await;
    assert_eq!(experiences.len(), 2);
    assert_eq!(experiences[1].id, "recB");
}

#[tokio::test]
async fn test_fetch_by_ids_without_valid_ids_skips_upstream() {
    let server = Server::new_async().await;
    let client = create_client(server.url(), "keyTEST");

    let experiences = client.fetch_by_ids(&["bad id!".to_string()]).await.unwrap();

    assert!(experiences.is_empty());
}

#[tokio::test]
async fn test_create_lead_returns_record_id() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("POST", "/appTEST/Leads")
        .match_body(Matcher::Regex(r#""Name":"Sam""#.into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "records": [{ "id": "recLead1", "fields": {} }] }).to_string())
        .create_async()
        .await;

    let client = create_client(server.url(), "keyTEST");
    let lead = Lead {
        name: "Sam".to_string(),
        quiz: json!({ "mode": "Home" }),
        selected_ids: vec!["recA".to_string()],
        budget_pp: Some(100),
        group: Some("Friends".to_string()),
        created_at: Utc::now(),
    };

    let lead_id = client.create_lead(&lead).await.unwrap();

    mock.assert_async().await;
    assert_eq!(lead_id, "recLead1");
}

#[tokio::test]
async fn test_unauthorized_maps_to_error() {
    let mut server = Server::new_async().await;

    server
        .mock("GET", "/appTEST/Experiences")
        .match_query(Matcher::Any)
        .with_status(401)
        .with_body(r#"{"error":"AUTHENTICATION_REQUIRED"}"#)
        .create_async()
        .await;

    let client = create_client(server.url(), "keyBAD");
    let result = client.fetch_experiences().await;

    assert!(matches!(result, Err(AirtableError::Unauthorized)));
}

#[tokio::test]
async fn test_server_error_carries_status() {
    let mut server = Server::new_async().await;

    server
        .mock("GET", "/appTEST/Experiences")
        .match_query(Matcher::Any)
        .with_status(503)
        .with_body("upstream down")
        .create_async()
        .await;

    let client = create_client(server.url(), "keyTEST");
    let result = client.fetch_experiences().await;

    match result {
        Err(AirtableError::ApiError { status, detail }) => {
            assert_eq!(status, 503);
            assert_eq!(detail, "upstream down");
        }
        other => panic!("Expected ApiError, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_token_is_not_configured() {
    let client = create_client("http://127.0.0.1:9".to_string(), "");

    let result = client.fetch_experiences().await;

    assert!(matches!(result, Err(AirtableError::NotConfigured("token"))));
}

#[tokio::test]
async fn test_catalog_service_caches_snapshot() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", "/appTEST/Experiences")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "records": [record("recA", "Pasta night", "Home")] }).to_string())
        .expect(2)
        .create_async()
        .await;

    let catalog = CatalogService::new(
        Arc::new(create_client(server.url(), "keyTEST")),
        Arc::new(CatalogCache::in_memory(4, 60)),
        "Experiences",
    );

    let first = catalog.experiences().await.unwrap();
    let second = catalog.experiences().await.unwrap();
    assert_eq!(first, second);

    // Invalidation forces the second upstream read
    catalog.invalidate().await;
    let third = catalog.experiences().await.unwrap();
    assert_eq!(third.len(), 1);

    mock.assert_async().await;
}

#[tokio::test]
async fn test_probe_reports_status_and_body() {
    let mut server = Server::new_async().await;

    server
        .mock("GET", "/appTEST/Experiences")
        .match_query(Matcher::UrlEncoded("pageSize".into(), "1".into()))
        .with_status(422)
        .with_body(r#"{"error":"VIEW_NAME_NOT_FOUND"}"#)
        .create_async()
        .await;

    let client = create_client(server.url(), "keyTEST");
    let (status, body) = client.probe().await.unwrap();

    assert_eq!(status, 422);
    assert!(body.contains("VIEW_NAME_NOT_FOUND"));
}

#[tokio::test]
async fn test_probe_body_read_failure_is_an_error() {
    let mut server = Server::new_async().await;

    server
        .mock("GET", "/appTEST/Experiences")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_chunked_body(|w| {
            w.write_all(b"{\"records\":")?;
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "upstream reset"))
        })
        .create_async()
        .await;

    let client = create_client(server.url(), "keyTEST");
    let result = client.probe().await;

    assert!(matches!(result, Err(AirtableError::InvalidResponse(_))));
}
