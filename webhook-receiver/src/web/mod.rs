//! Web server module for receiving signed product webhooks.
//!
//! This module provides:
//! - Raw body capture, so signatures are checked over the exact wire bytes
//! - HMAC-SHA256 signature verification
//! - Endpoint handlers for deliveries, health and secret administration

pub mod capture;
pub mod handlers;
pub mod signature;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub use capture::RawPayload;
pub use handlers::{
    health, product_webhook, set_secret, AckResponse, AppState, ErrorResponse, HealthResponse,
    SetSecretRequest, SetSecretResponse,
};
pub use signature::{
    check_signature, constant_time_compare, sign, verify, RejectReason, SignatureError,
    VerificationOutcome,
};

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let body_limit = state.config.body_limit_bytes;

    Router::new()
        .route("/health", get(health))
        .route("/webhooks/products", post(product_webhook))
        .route("/set-secret", post(set_secret))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Config;
    use axum::{
        body::Body,
        http::{Method, Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const PAYLOAD: &str = r#"{"eventType":"product.created","eventId":"e1"}"#;

    fn state_with(secret: &str, admin_token: Option<&str>) -> AppState {
        AppState::new(Config {
            webhook_secret: secret.to_string(),
            admin_token: admin_token.map(str::to_string),
            ..Config::default()
        })
    }

    fn delivery(body: &str, signature: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri("/webhooks/products")
            .header("content-type", "application/json")
            .header("x-event-type", "product.created");
        if let Some(sig) = signature {
            builder = builder.header("x-webhook-signature", sig);
        }
        builder.body(Body::from(body.to_string())).expect("request")
    }

    fn set_secret_request(secret: &str, bearer: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri("/set-secret")
            .header("content-type", "application/json");
        if let Some(token) = bearer {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        builder
            .body(Body::from(json!({ "secret": secret }).to_string()))
            .expect("request")
    }

    async fn call(state: &AppState, request: Request<Body>) -> (StatusCode, Value) {
        let response = router(state.clone())
            .oneshot(request)
            .await
            .expect("response");
        let status = response.status();
        let bytes = response.into_body().collect().await.expect("body").to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn test_signed_delivery_is_acknowledged() {
        let state = state_with("abc123", None);
        let sig = sign(PAYLOAD.as_bytes(), "abc123").unwrap();

        let (status, body) = call(&state, delivery(PAYLOAD, Some(&sig))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["received"], true);
        assert_eq!(body["eventId"], "e1");
        assert!(body["processedAt"].as_str().unwrap().ends_with('Z'));
    }

    #[tokio::test]
    async fn test_event_id_header_takes_precedence() {
        let state = state_with("abc123", None);
        let sig = sign(PAYLOAD.as_bytes(), "abc123").unwrap();
        let mut request = delivery(PAYLOAD, Some(&sig));
        request
            .headers_mut()
            .insert("x-event-id", "evt_from_header".parse().unwrap());

        let (status, body) = call(&state, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["eventId"], "evt_from_header");
    }

    #[tokio::test]
    async fn test_empty_signature_is_rejected() {
        let state = state_with("abc123", None);

        let (status, body) = call(&state, delivery(PAYLOAD, Some(""))).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({ "error": "Invalid signature" }));
    }

    #[tokio::test]
    async fn test_missing_signature_is_rejected_when_secret_configured() {
        let state = state_with("abc123", None);

        let (status, body) = call(&state, delivery(PAYLOAD, None)).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid signature");
    }

    #[tokio::test]
    async fn test_tampered_body_is_rejected() {
        let state = state_with("abc123", None);
        let sig = sign(PAYLOAD.as_bytes(), "abc123").unwrap();
        let tampered = PAYLOAD.replace("e1", "e2");

        let (status, _) = call(&state, delivery(&tampered, Some(&sig))).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_reformatted_json_breaks_signature() {
        // Semantically equal JSON with different bytes must not verify.
        let state = state_with("abc123", None);
        let sig = sign(PAYLOAD.as_bytes(), "abc123").unwrap();
        let reformatted = r#"{ "eventType": "product.created", "eventId": "e1" }"#;

        let (status, _) = call(&state, delivery(reformatted, Some(&sig))).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_degraded_mode_accepts_anything_and_reports_health() {
        let state = state_with("", None);

        let (status, _) = call(&state, delivery(PAYLOAD, Some("whatever"))).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = call(&state, delivery("not json", None)).await;
        assert_eq!(status, StatusCode::OK);

        let health = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .expect("request");
        let (status, body) = call(&state, health).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["webhookSecretConfigured"], false);
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_undecodable_body_with_valid_signature_is_acknowledged() {
        let state = state_with("abc123", None);
        let body = "definitely not json";
        let sig = sign(body.as_bytes(), "abc123").unwrap();

        let (status, response) = call(&state, delivery(body, Some(&sig))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(response["received"], true);
        assert!(response["eventId"].is_null());
    }

    #[tokio::test]
    async fn test_mistyped_field_keeps_envelope_event_id() {
        let state = state_with("abc123", None);
        let body = r#"{"eventType":"product.created","eventId":"e1","metadata":{"triggeredBy":"system"}}"#;
        let sig = sign(body.as_bytes(), "abc123").unwrap();

        let (status, response) = call(&state, delivery(body, Some(&sig))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(response["received"], true);
        assert_eq!(response["eventId"], "e1");
    }

    #[tokio::test]
    async fn test_duplicate_deliveries_are_both_acknowledged() {
        let state = state_with("abc123", None);
        let sig = sign(PAYLOAD.as_bytes(), "abc123").unwrap();

        let (first, _) = call(&state, delivery(PAYLOAD, Some(&sig))).await;
        let (second, _) = call(&state, delivery(PAYLOAD, Some(&sig))).await;

        assert_eq!(first, StatusCode::OK);
        assert_eq!(second, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_set_secret_rotates_verification_key() {
        let state = state_with("old", None);

        let (status, body) = call(&state, set_secret_request("new", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Secret updated successfully");

        let new_sig = sign(PAYLOAD.as_bytes(), "new").unwrap();
        let (status, _) = call(&state, delivery(PAYLOAD, Some(&new_sig))).await;
        assert_eq!(status, StatusCode::OK);

        let old_sig = sign(PAYLOAD.as_bytes(), "old").unwrap();
        let (status, _) = call(&state, delivery(PAYLOAD, Some(&old_sig))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_set_secret_enables_verification_from_degraded_mode() {
        let state = state_with("", None);

        call(&state, set_secret_request("abc123", None)).await;

        let health = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .expect("request");
        let (_, body) = call(&state, health).await;
        assert_eq!(body["webhookSecretConfigured"], true);

        let (status, _) = call(&state, delivery(PAYLOAD, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_set_secret_requires_admin_token_when_configured() {
        let state = state_with("old", Some("admin-token"));

        let (status, body) = call(&state, set_secret_request("new", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Unauthorized");

        let (status, _) = call(&state, set_secret_request("new", Some("wrong"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(&*state.secret.current().await, "old");

        let (status, _) = call(&state, set_secret_request("new", Some("admin-token"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(&*state.secret.current().await, "new");
    }

    #[tokio::test]
    async fn test_set_secret_accepts_lowercase_bearer_scheme() {
        let state = state_with("old", Some("admin-token"));
        let mut request = set_secret_request("new", None);
        request
            .headers_mut()
            .insert("authorization", "bearer admin-token".parse().unwrap());

        let (status, _) = call(&state, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(&*state.secret.current().await, "new");
    }

    #[tokio::test]
    async fn test_set_secret_checks_token_before_body() {
        let state = state_with("old", Some("admin-token"));
        let request = Request::builder()
            .method(Method::POST)
            .uri("/set-secret")
            .body(Body::from("{ not json"))
            .expect("request");

        let (status, body) = call(&state, request).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Unauthorized");
        assert_eq!(&*state.secret.current().await, "old");
    }

    #[tokio::test]
    async fn test_set_secret_rejects_malformed_body() {
        let state = state_with("old", None);
        let request = Request::builder()
            .method(Method::POST)
            .uri("/set-secret")
            .header("content-type", "application/json")
            .body(Body::from("{\"nope\": 1}"))
            .expect("request");

        let (status, body) = call(&state, request).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "Invalid request body");
        assert_eq!(&*state.secret.current().await, "old");
    }

    #[tokio::test]
    async fn test_oversized_body_is_refused() {
        let state = AppState::new(Config {
            body_limit_bytes: 16,
            ..Config::default()
        });

        let (status, _) = call(&state, delivery(PAYLOAD, None)).await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }
}
