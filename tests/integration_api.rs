//! API Integration Tests
//!
//! Drive the full router over in-memory backends.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use std::collections::HashSet;
use uuid::Uuid;

use mint_settlement::domain::MintStatus;
use mint_settlement::queue::WorkQueue;
use mint_settlement::store::MintStore;

mod common;

use common::{get, memory_app, post_json, send};

#[tokio::test]
async fn test_health_check() {
    let app = memory_app();
    let (status, _, body) = send(&app.router, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("OK".to_string()));
}

#[tokio::test]
async fn test_create_mint_accepted() {
    let app = memory_app();

    let (status, headers, body) = send(
        &app.router,
        post_json("/mint", r#"{"amount": 100, "token": "doge"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["content-type"], "application/json");
    assert_eq!(body["status"], "PENDING");
    assert_eq!(
        body["message"],
        "Mint request received and queued for processing"
    );

    let mint_id: Uuid = body["id"].as_str().unwrap().parse().unwrap();
    let record = app.store.get(mint_id).await.unwrap().unwrap();
    assert_eq!(record.status, MintStatus::Pending);
    assert_eq!(app.queue.depth().await.unwrap().visible, 1);
}

#[tokio::test]
async fn test_create_mint_validation_errors() {
    let app = memory_app();

    let cases = [
        (r#"{"token": "doge"}"#, "Missing required fields: amount, token"),
        (r#"{"amount": 100}"#, "Missing required fields: amount, token"),
        (r#"{"amount": 0.5, "token": "doge"}"#, "Amount should be greater or equal than 1"),
        (r#"{"amount": "100", "token": "doge"}"#, "Amount should be greater or equal than 1"),
        (r#"{"amount": 100, "token": "btc"}"#, "The supported token is doge"),
    ];

    for (request, message) in cases {
        let (status, _, body) = send(&app.router, post_json("/mint", request)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "request: {}", request);
        assert_eq!(body, json!({ "error": message }), "request: {}", request);
    }

    assert!(app.store.is_empty().await);
    assert_eq!(app.queue.depth().await.unwrap().visible, 0);
}

#[tokio::test]
async fn test_create_mint_accepts_large_and_precise_amounts() {
    let app = memory_app();

    for (request, expected) in [
        (r#"{"amount": 2000000000000, "token": "doge"}"#, 2000000000000.0),
        (r#"{"amount": 1.123456789, "token": "doge"}"#, 1.123456789),
    ] {
        let (status, _, created) = send(&app.router, post_json("/mint", request)).await;
        assert_eq!(status, StatusCode::OK, "request: {}", request);

        let id = created["id"].as_str().unwrap();
        let (_, _, record) = send(&app.router, get(&format!("/mint/{}", id))).await;
        assert_eq!(record["amount"], expected);
    }

    let (status, _, body) = send(
        &app.router,
        post_json("/mint", r#"{"amount": 1e30, "token": "doge"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Amount is too large"}));
}

#[tokio::test]
async fn test_create_mint_malformed_body() {
    let app = memory_app();

    let (status, _, body) = send(&app.router, post_json("/mint", "{not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let request = Request::builder()
        .method("POST")
        .uri("/mint")
        .body(Body::from(r#"{"amount": 100, "token": "doge"}"#))
        .unwrap();
    let (status, _, _) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(app.store.is_empty().await);
}

#[tokio::test]
async fn test_list_mints_empty() {
    let app = memory_app();

    let (status, _, body) = send(&app.router, get("/mint")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"items": [], "hasMore": false}));
}

#[tokio::test]
async fn test_list_mints_limit_validation() {
    let app = memory_app();

    for uri in ["/mint?limit=0", "/mint?limit=11", "/mint?limit=abc"] {
        let (status, _, body) = send(&app.router, get(uri)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "uri: {}", uri);
        assert_eq!(
            body,
            json!({"error": "limit should be a number between 1 and 10"})
        );
    }

    for uri in ["/mint?limit=1", "/mint?limit=10"] {
        let (status, _, _) = send(&app.router, get(uri)).await;
        assert_eq!(status, StatusCode::OK, "uri: {}", uri);
    }
}

#[tokio::test]
async fn test_list_mints_unreadable_query_is_json_error() {
    let app = memory_app();

    let (status, headers, body) = send(&app.router, get("/mint?limit=5&limit=6")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(headers["content-type"], "application/json");
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Invalid query string"));
}

#[tokio::test]
async fn test_list_mints_paginates() {
    let app = memory_app();

    let mut created = HashSet::new();
    for amount in 1..=15 {
        let body = format!(r#"{{"amount": {}, "token": "doge"}}"#, amount);
        let (_, _, response) = send(&app.router, post_json("/mint", &body)).await;
        created.insert(response["id"].as_str().unwrap().to_string());
    }

    let (status, _, first) = send(&app.router, get("/mint?limit=10")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["items"].as_array().unwrap().len(), 10);
    assert_eq!(first["hasMore"], true);
    let token = first["nextToken"].as_str().unwrap();

    let (status, _, second) =
        send(&app.router, get(&format!("/mint?limit=10&nextToken={}", token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["items"].as_array().unwrap().len(), 5);
    assert_eq!(second["hasMore"], false);
    assert!(second.get("nextToken").is_none());

    let seen: HashSet<String> = first["items"]
        .as_array()
        .unwrap()
        .iter()
        .chain(second["items"].as_array().unwrap())
        .map(|item| item["mintId"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(seen, created);
}

#[tokio::test]
async fn test_list_mints_rejects_garbage_token() {
    let app = memory_app();

    let (status, _, body) = send(&app.router, get("/mint?nextToken=zzzz")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Invalid pagination token"}));
}

#[tokio::test]
async fn test_get_mint() {
    let app = memory_app();

    let (_, _, created) = send(
        &app.router,
        post_json("/mint", r#"{"amount": 7, "token": "doge"}"#),
    )
    .await;
    let id = created["id"].as_str().unwrap();

    let (status, _, body) = send(&app.router, get(&format!("/mint/{}", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mintId"], id);
    assert_eq!(body["entityType"], "MINT");
    assert_eq!(body["amount"], 7.0);
    assert_eq!(body["token"], "doge");
    assert_eq!(body["status"], "PENDING");

    let (status, _, _) = send(&app.router, get(&format!("/mint/{}", Uuid::new_v4()))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, _) = send(&app.router, get("/mint/not-a-uuid")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_responses_carry_cors_and_request_id() {
    let app = memory_app();

    let (_, headers, _) = send(&app.router, get("/mint")).await;
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert!(headers.contains_key("x-request-id"));
}
