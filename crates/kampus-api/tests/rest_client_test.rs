#![allow(clippy::unwrap_used)]
// Integration tests for `RestClient` and `StorageClient` using wiremock.

use std::time::Duration;

use bytes::Bytes;
use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use kampus_api::{
    BlobStorage, CollectionGateway, Error, Filter, Order, Query, RestClient, Row, RowKey,
    StorageClient, TlsMode, TransportConfig,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, RestClient) {
    let server = MockServer::start().await;
    let client = RestClient::from_reqwest(&server.uri(), reqwest::Client::new()).unwrap();
    (server, client)
}

fn row(value: serde_json::Value) -> Row {
    value.as_object().cloned().unwrap()
}

// ── Select ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_select_renders_order_and_filters() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/news"))
        .and(query_param("select", "*"))
        .and(query_param("published", "eq.true"))
        .and(query_param("order", "created_at.desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 2, "title": "Second" },
            { "id": 1, "title": "First" }
        ])))
        .mount(&server)
        .await;

    let query = Query::new()
        .filter(Filter::eq("published", true))
        .order(Order::desc("created_at"));
    let rows = client.select("news", &query).await.unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["title"], json!("Second"));
}

#[tokio::test]
async fn test_select_bad_body_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/news"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let result = client.select("news", &Query::new()).await;
    match result {
        Err(Error::Deserialization { ref body, .. }) => assert!(body.contains("oops")),
        other => panic!("expected Deserialization error, got: {other:?}"),
    }
}

// ── Writes ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_insert_posts_row_with_minimal_return() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/gallery"))
        .and(header("Prefer", "return=minimal"))
        .and(body_json(json!({ "title": "Lab", "category": "fasilitas" })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    client
        .insert("gallery", row(json!({ "title": "Lab", "category": "fasilitas" })))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_update_targets_key_column() {
    let (server, client) = setup().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/news"))
        .and(query_param("id", "eq.42"))
        .and(body_json(json!({ "views": 11 })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client
        .update("news", &RowKey::id(42), row(json!({ "views": 11 })))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_delete_targets_key_column() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/documents"))
        .and(query_param("id", "eq.d0c"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client
        .delete("documents", &RowKey::id("d0c"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_upsert_uses_conflict_key_and_merge() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/content_sections"))
        .and(query_param("on_conflict", "section_key"))
        .and(|req: &Request| {
            req.headers
                .get("prefer")
                .and_then(|v| v.to_str().ok())
                == Some("resolution=merge-duplicates,return=minimal")
        })
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    client
        .upsert(
            "content_sections",
            row(json!({ "section_key": "fasilitas", "content": "Lab komputer" })),
            "section_key",
        )
        .await
        .unwrap();
}

// ── Errors ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_not_null_violation_surfaces_code() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/content_sections"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": "23502",
            "message": "null value in column \"title\" violates not-null constraint",
            "details": null,
            "hint": null
        })))
        .mount(&server)
        .await;

    let err = client
        .upsert(
            "content_sections",
            row(json!({ "section_key": "baru", "content": "x" })),
            "section_key",
        )
        .await
        .unwrap_err();

    assert!(err.is_constraint_violation(), "got {err:?}");
    assert_eq!(err.api_error_code(), Some("23502"));
}

#[tokio::test]
async fn test_unauthorized_is_authentication_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "Invalid API key" })),
        )
        .mount(&server)
        .await;

    let result = client.select("students", &Query::new()).await;
    match result {
        Err(Error::Authentication { ref message }) => assert_eq!(message, "Invalid API key"),
        other => panic!("expected Authentication error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_unstructured_error_body_is_kept() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let err = client.delete("news", &RowKey::id(1)).await.unwrap_err();
    match err {
        Error::Remote {
            status, ref message, ..
        } => {
            assert_eq!(status, 500);
            assert!(message.contains("upstream exploded"));
        }
        ref other => panic!("expected Remote error, got: {other:?}"),
    }
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_non_json_bodies_with_multibyte_text_do_not_panic() {
    let (server, client) = setup().await;
    let body = format!("{}€ tail", "a".repeat(199));

    Mock::given(method("GET"))
        .and(path("/rest/v1/news"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body.clone()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/videos"))
        .respond_with(ResponseTemplate::new(502).set_body_string(body))
        .mount(&server)
        .await;

    let err = client.select("news", &Query::new()).await.unwrap_err();
    assert!(matches!(err, Error::Deserialization { .. }), "got {err:?}");

    let err = client.select("videos", &Query::new()).await.unwrap_err();
    match err {
        Error::Remote { status, ref message, .. } => {
            assert_eq!(status, 502);
            assert!(message.ends_with('€'), "got {message}");
        }
        ref other => panic!("expected Remote error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_timeout_reports_configured_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/news"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let transport = TransportConfig {
        tls: TlsMode::System,
        timeout: Duration::from_secs(1),
    };
    let client =
        RestClient::new(&server.uri(), &SecretString::from("anon-key"), &transport).unwrap();

    let err = client.select("news", &Query::new()).await.unwrap_err();
    assert!(
        matches!(err, Error::Timeout { timeout_secs: 1 }),
        "got {err:?}"
    );
    assert!(err.is_transient());
}

// ── Storage ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_storage_upload_returns_public_url() {
    let server = MockServer::start().await;
    let storage =
        StorageClient::from_reqwest(&server.uri(), "media", reqwest::Client::new()).unwrap();

    Mock::given(method("POST"))
        .and(path("/storage/v1/object/media/news/cover.jpg"))
        .and(header("content-type", "image/jpeg"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Key": "media/news/cover.jpg" })))
        .expect(1)
        .mount(&server)
        .await;

    let url = storage
        .upload("news/cover.jpg", Bytes::from_static(b"jpeg"), "image/jpeg")
        .await
        .unwrap();

    assert_eq!(
        url,
        format!("{}/storage/v1/object/public/media/news/cover.jpg", server.uri())
    );
    assert_eq!(storage.path_from_url(&url).as_deref(), Some("news/cover.jpg"));
}

#[tokio::test]
async fn test_storage_remove_sends_prefixes() {
    let server = MockServer::start().await;
    let storage =
        StorageClient::from_reqwest(&server.uri(), "media", reqwest::Client::new()).unwrap();

    Mock::given(method("DELETE"))
        .and(path("/storage/v1/object/media"))
        .and(body_json(json!({ "prefixes": ["docs/a.pdf"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    storage.remove(&["docs/a.pdf".to_owned()]).await.unwrap();
}

#[tokio::test]
async fn test_storage_error_envelope() {
    let server = MockServer::start().await;
    let storage =
        StorageClient::from_reqwest(&server.uri(), "media", reqwest::Client::new()).unwrap();

    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "statusCode": "404",
            "error": "not_found",
            "message": "Object not found"
        })))
        .mount(&server)
        .await;

    let err = storage.remove(&["x".to_owned()]).await.unwrap_err();
    assert!(err.is_not_found(), "got {err:?}");
}
