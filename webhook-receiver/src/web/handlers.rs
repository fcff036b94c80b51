//! HTTP endpoint handlers.
//!
//! The product webhook handler walks every delivery through the same steps:
//! 1. Capture the raw body
//! 2. Verify the signature against the current secret
//! 3. Log the event for operators
//! 4. Acknowledge or reject
//!
//! Nothing is persisted and nothing is deduplicated; redelivery is the
//! sender's concern.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::events::{is_known_event_type, EVENT_ID_HEADER, EVENT_TYPE_HEADER, SIGNATURE_HEADER};
use crate::secret::WebhookSecret;
use crate::web::capture::RawPayload;
use crate::web::signature::{check_signature, constant_time_compare, VerificationOutcome};
use crate::Config;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub secret: WebhookSecret,
}

impl AppState {
    /// Build state from configuration, seeding the secret from
    /// `config.webhook_secret`.
    pub fn new(config: Config) -> Self {
        let secret = WebhookSecret::new(config.webhook_secret.clone());
        Self {
            config: Arc::new(config),
            secret,
        }
    }
}

/// RFC 3339 UTC timestamp with millisecond precision.
fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Read a header as text, ignoring values that are not valid header strings.
fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Error body shared by every rejection.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub webhook_secret_configured: bool,
    pub timestamp: String,
}

/// Health check endpoint.
///
/// `webhookSecretConfigured: false` means deliveries are accepted without
/// verification.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        webhook_secret_configured: state.secret.is_configured().await,
        timestamp: now_timestamp(),
    })
}

// =============================================================================
// Product Webhook
// =============================================================================

/// Acknowledgment sent for an accepted delivery.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AckResponse {
    pub received: bool,
    pub event_id: Option<String>,
    pub processed_at: String,
}

/// Product webhook endpoint.
pub async fn product_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    // A header that is present but unreadable still counts as a signature,
    // it just cannot match.
    let signature = headers
        .get(SIGNATURE_HEADER)
        .map(|v| v.to_str().unwrap_or_default());
    let header_event_type = header_str(&headers, EVENT_TYPE_HEADER);
    let header_event_id = header_str(&headers, EVENT_ID_HEADER);

    info!(
        event_type = ?header_event_type,
        event_id = ?header_event_id,
        has_signature = signature.is_some(),
        content_type = ?header_str(&headers, header::CONTENT_TYPE.as_str()),
        body_length = body.len(),
        "product_webhook_received"
    );

    let payload = RawPayload::capture(body);
    let secret = state.secret.current().await;

    match check_signature(payload.as_bytes(), signature, &secret) {
        VerificationOutcome::Rejected(reason) => {
            warn!(
                reason = reason.code(),
                event_id = ?header_event_id,
                "product_webhook_rejected"
            );
            return (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    error: "Invalid signature",
                }),
            )
                .into_response();
        }
        VerificationOutcome::Accepted { degraded: true } => {
            warn!(event_id = ?header_event_id, "product_webhook_accepted_unverified");
        }
        VerificationOutcome::Accepted { degraded: false } => {
            info!(event_id = ?header_event_id, "product_webhook_signature_verified");
        }
    }

    log_event(&payload, header_event_type);

    let event_id = header_event_id
        .map(str::to_owned)
        .or_else(|| payload.envelope().and_then(|e| e.event_id.clone()));

    info!(event_id = ?event_id, "product_webhook_acknowledged");

    (
        StatusCode::OK,
        Json(AckResponse {
            received: true,
            event_id,
            processed_at: now_timestamp(),
        }),
    )
        .into_response()
}

/// Operator-facing rendering of an accepted delivery. Has no effect on the
/// response.
fn log_event(payload: &RawPayload, header_event_type: Option<&str>) {
    let event = match payload.envelope() {
        Some(event) => event,
        None => {
            warn!(
                error = payload.decode_error().unwrap_or_default(),
                body_length = payload.len(),
                "product_webhook_payload_undecodable"
            );
            return;
        }
    };

    if let Some(event_type) = event.event_type.as_deref() {
        if !is_known_event_type(event_type) {
            warn!(event_type = %event_type, "product_webhook_unknown_event_type");
        }
        if let Some(header_type) = header_event_type {
            if header_type != event_type {
                warn!(
                    header_event_type = %header_type,
                    payload_event_type = %event_type,
                    "product_webhook_event_type_mismatch"
                );
            }
        }
    }

    info!(
        event_type = ?event.event_type,
        event_id = ?event.event_id,
        timestamp = ?event.timestamp,
        product_id = ?event.product.as_ref().and_then(|p| p.id),
        product_sku = ?event.product.as_ref().and_then(|p| p.sku.as_deref()),
        details = %event,
        "product_webhook_event"
    );
}

// =============================================================================
// Secret Administration
// =============================================================================

/// Body of `POST /set-secret`.
#[derive(Debug, Deserialize)]
pub struct SetSecretRequest {
    pub secret: String,
}

/// Response to a successful secret update.
#[derive(Debug, Serialize)]
pub struct SetSecretResponse {
    pub message: &'static str,
}

/// Token from an `Authorization: Bearer <token>` header. The scheme name is
/// matched case-insensitively.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = header_str(headers, header::AUTHORIZATION.as_str())?;
    let (scheme, token) = value.split_once(' ')?;
    scheme
        .eq_ignore_ascii_case("bearer")
        .then(|| token.trim_start())
}

/// Replace the webhook secret.
///
/// When an admin token is configured the caller must present it as a bearer
/// token; otherwise the endpoint is open. The body is only parsed once the
/// caller is authorized.
pub async fn set_secret(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Some(expected) = state.config.admin_token.as_deref() {
        let provided = bearer_token(&headers).unwrap_or_default();

        if !constant_time_compare(expected, provided) {
            warn!(has_authorization = !provided.is_empty(), "set_secret_unauthorized");
            return (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    error: "Unauthorized",
                }),
            )
                .into_response();
        }
    }

    let request: SetSecretRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, body_length = body.len(), "set_secret_invalid_body");
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ErrorResponse {
                    error: "Invalid request body",
                }),
            )
                .into_response();
        }
    };

    state.secret.replace(request.secret).await;

    (
        StatusCode::OK,
        Json(SetSecretResponse {
            message: "Secret updated successfully",
        }),
    )
        .into_response()
}
