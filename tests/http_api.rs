//! End-to-end tests of the HTTP API through the client SDK.

use std::collections::HashSet;
use std::sync::atomic::Ordering;

use order_client::{ClientError, OrderClient};
use order_service::lifecycle::{build_service, Shutdown};
use reqwest::{Method, StatusCode};

mod common;

use common::{eventually, spawn_faulty_server, spawn_server, test_config, TestServer};

async fn default_server() -> TestServer {
    let config = test_config();
    let service = build_service(&config, &Shutdown::new()).await.unwrap();
    spawn_server(config, service).await
}

fn api_status(err: ClientError) -> StatusCode {
    err.status().expect("expected an API error")
}

#[tokio::test]
async fn test_order_lifecycle() {
    let server = default_server().await;
    let client = &server.client;

    let id = client.create_order("X", 5).await.unwrap();
    assert!(!id.is_empty());

    let first = client.get_order(&id).await.unwrap();
    let second = client.get_order(&id).await.unwrap();
    assert_eq!(first, second);
    assert_eq!((first.item.as_str(), first.quantity), ("X", 5));

    let updated = client.update_order(&id, "Y", 7).await.unwrap();
    assert_eq!(updated.id, id);
    assert_eq!(client.get_order(&id).await.unwrap(), updated);

    assert!(client.delete_order(&id).await.unwrap());
    assert!(client.list_orders().await.unwrap().is_empty());
    let err = client.get_order(&id).await.unwrap_err();
    assert_eq!(api_status(err), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_returns_201_with_unique_ids() {
    let server = default_server().await;

    let resp = server
        .client
        .send_raw(
            Method::POST,
            "/v1/orders",
            Some(r#"{"item":"book","quantity":1}"#.into()),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let mut ids = HashSet::new();
    for _ in 0..10 {
        assert!(ids.insert(server.client.create_order("book", 1).await.unwrap()));
    }
    assert_eq!(server.client.list_orders().await.unwrap().len(), 11);
}

#[tokio::test]
async fn test_invalid_input_is_rejected() {
    let server = default_server().await;
    let client = &server.client;

    let err = client.create_order("", 1).await.unwrap_err();
    assert_eq!(api_status(err), StatusCode::BAD_REQUEST);
    let err = client.create_order("book", 0).await.unwrap_err();
    assert_eq!(api_status(err), StatusCode::BAD_REQUEST);

    let id = client.create_order("book", 1).await.unwrap();
    let err = client.update_order(&id, "", 2).await.unwrap_err();
    assert_eq!(api_status(err), StatusCode::BAD_REQUEST);
    assert_eq!(client.get_order(&id).await.unwrap().item, "book");

    assert_eq!(client.list_orders().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_missing_fields_and_negative_quantity() {
    let server = default_server().await;

    for body in [r#"{}"#, r#"{"item":"book"}"#, r#"{"quantity":3}"#, r#"{"item":"book","quantity":-1}"#] {
        let resp = server
            .client
            .send_raw(Method::POST, "/v1/orders", Some(body.into()))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "body: {}", body);

        let json: serde_json::Value = resp.json().await.unwrap();
        assert!(json["error"].is_string());
    }
}

#[tokio::test]
async fn test_quantity_beyond_int32_is_a_bad_request() {
    let server = default_server().await;
    let body = r#"{"item":"book","quantity":3000000000}"#;

    let resp = server
        .client
        .send_raw(Method::POST, "/v1/orders", Some(body.into()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let id = server.client.create_order("book", 1).await.unwrap();
    let resp = server
        .client
        .send_raw(Method::PUT, &format!("/v1/orders/{}", id), Some(body.into()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(server.client.get_order(&id).await.unwrap().quantity, 1);
}

#[tokio::test]
async fn test_unknown_ids_are_not_found() {
    let server = default_server().await;
    let client = &server.client;

    let err = client.get_order("missing").await.unwrap_err();
    assert_eq!(api_status(err), StatusCode::NOT_FOUND);
    let err = client.update_order("missing", "x", 1).await.unwrap_err();
    assert_eq!(api_status(err), StatusCode::NOT_FOUND);
    let err = client.delete_order("missing").await.unwrap_err();
    assert_eq!(api_status(err), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_request_id_is_generated_or_echoed() {
    let server = default_server().await;
    let http = reqwest::Client::new();

    let resp = http.get(format!("{}/health", server.url())).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let generated = resp.headers().get("x-request-id").unwrap().to_str().unwrap();
    assert_eq!(generated.len(), 36);

    let resp = http
        .get(format!("{}/v1/orders", server.url()))
        .header("x-request-id", "trace-me-123")
        .send()
        .await
        .unwrap();
    assert_eq!(
        resp.headers().get("x-request-id").unwrap().to_str().unwrap(),
        "trace-me-123"
    );
}

#[tokio::test]
async fn test_health_reports_backends() {
    let server = default_server().await;
    let health = server.client.health().await.unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["store"], "memory");
    assert_eq!(health["cache"], "memory");
}

#[tokio::test]
async fn test_admin_requires_token() {
    let server = default_server().await;

    let anonymous = OrderClient::new(&server.url());
    let err = anonymous.admin_get("status").await.unwrap_err();
    assert_eq!(api_status(err), StatusCode::UNAUTHORIZED);

    let wrong = OrderClient::new(&server.url()).with_admin_key("nope");
    let err = wrong.admin_get("status").await.unwrap_err();
    assert_eq!(api_status(err), StatusCode::UNAUTHORIZED);

    let status = server.client.admin_get("status").await.unwrap();
    assert_eq!(status["status"], "operational");
    assert_eq!(status["topic"], "orders");
}

#[tokio::test]
async fn test_admin_routes_absent_when_disabled() {
    let mut config = test_config();
    config.admin.enabled = false;
    let service = build_service(&config, &Shutdown::new()).await.unwrap();
    let server = spawn_server(config, service).await;

    let err = server.client.admin_get("status").await.unwrap_err();
    assert_eq!(api_status(err), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_cache_stats() {
    let server = default_server().await;
    let id = server.client.create_order("X", 1).await.unwrap();
    server.client.get_order(&id).await.unwrap();
    server.client.get_order(&id).await.unwrap();

    let cache = server.client.admin_get("cache").await.unwrap();
    assert_eq!(cache["backend"], "memory");
    assert_eq!(cache["ttl_secs"], 60);
    assert_eq!(cache["stats"]["hits"], 1);
    assert_eq!(cache["stats"]["misses"], 1);
}

#[tokio::test]
async fn test_failed_events_can_be_redriven_via_admin() {
    let (server, backends) = spawn_faulty_server().await;
    backends.publisher.down.store(true, Ordering::SeqCst);

    // The request succeeds even though its event cannot be published.
    let id = server.client.create_order("X", 1).await.unwrap();

    let notifier = server.service.notifier().clone();
    assert!(eventually(|| notifier.dead_letters().len() == 1).await);

    let parked = server.client.admin_get("dead-letters").await.unwrap();
    assert_eq!(parked["count"], 1);
    assert_eq!(parked["entries"][0]["payload"]["kind"], "created");
    assert_eq!(parked["entries"][0]["payload"]["order"]["id"], id.as_str());
    assert_eq!(parked["entries"][0]["attempts"], 3);

    let err = server.client.redrive_dead_letters().await.unwrap_err();
    assert_eq!(api_status(err), StatusCode::SERVICE_UNAVAILABLE);

    backends.publisher.down.store(false, Ordering::SeqCst);
    let mut rx = backends.publisher.inner.subscribe();
    assert_eq!(server.client.redrive_dead_letters().await.unwrap(), 1);
    assert_eq!(rx.recv().await.unwrap().key, id);

    let parked = server.client.admin_get("dead-letters").await.unwrap();
    assert_eq!(parked["count"], 0);
}
