//! API Middleware
//!
//! Request logging. Request ids are assigned by `tower_http::request_id`
//! (see [`crate::api::build_router`]) and picked up here, so every log line
//! written while a request is handled carries its id.

use axum::{
    body::Body,
    http::{HeaderMap, HeaderName, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::Instrument;

/// Header carrying the id assigned to every request
pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Headers never written to logs verbatim
const SENSITIVE_HEADERS: &[&str] = &["authorization", "proxy-authorization", "cookie"];

const REDACTED: &str = "[REDACTED]";

/// Render request headers for a log line, redacting credentials
pub fn mask_headers_for_logging(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let shown = if SENSITIVE_HEADERS.contains(&name.as_str()) {
                REDACTED
            } else {
                value.to_str().unwrap_or("[invalid utf8]")
            };
            (name.to_string(), shown.to_string())
        })
        .collect()
}

fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(&REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string()
}

/// Log each request and run it inside a span tagged with its request id
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let span = tracing::info_span!(
        "http_request",
        request_id = %request_id(request.headers()),
        method = %request.method(),
        path = %request.uri().path(),
    );

    async move {
        tracing::debug!(
            query = request.uri().query().unwrap_or(""),
            headers = ?mask_headers_for_logging(request.headers()),
            "Incoming request"
        );

        let started = Instant::now();
        let response = next.run(request).await;

        tracing::info!(
            status = response.status().as_u16(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Request completed"
        );
        response
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_are_redacted() {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", "application/json".parse().unwrap());
        headers.insert("authorization", "Bearer secret".parse().unwrap());
        headers.insert("cookie", "session=abc".parse().unwrap());

        let masked = mask_headers_for_logging(&headers);
        let shown = |name: &str| {
            masked
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
                .unwrap()
        };

        assert_eq!(shown("authorization"), REDACTED);
        assert_eq!(shown("cookie"), REDACTED);
        assert_eq!(shown("content-type"), "application/json");
    }

    #[test]
    fn test_request_id_read_from_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(request_id(&headers), "-");

        headers.insert(REQUEST_ID_HEADER, "req-123".parse().unwrap());
        assert_eq!(request_id(&headers), "req-123");
    }
}
