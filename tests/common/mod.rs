//! Common test utilities
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{HeaderMap, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use tower::util::ServiceExt;

use mint_settlement::api::{self, AppState};
use mint_settlement::queue::InMemoryWorkQueue;
use mint_settlement::store::InMemoryMintStore;

/// Router wired to in-memory backends, with handles on both
pub struct TestApp {
    pub router: Router,
    pub store: InMemoryMintStore,
    pub queue: InMemoryWorkQueue,
}

pub fn memory_app() -> TestApp {
    let store = InMemoryMintStore::new();
    let queue = InMemoryWorkQueue::default();
    let router = api::build_router(AppState::new(
        Arc::new(store.clone()),
        Arc::new(queue.clone()),
    ));

    TestApp {
        router,
        store,
        queue,
    }
}

pub fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("origin", "http://localhost:3001")
        .body(Body::empty())
        .unwrap()
}

/// Send a request; parse the body as JSON when it is JSON
pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, headers, body)
}

/// Setup test database - truncate tables for a fresh state
pub async fn setup_test_db() -> PgPool {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for tests");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    sqlx::query("TRUNCATE TABLE mints, mint_queue")
        .execute(&pool)
        .await
        .expect("Failed to clean up DB");

    pool
}
