//! Product webhook signature verification.
//!
//! The catalog service signs every delivery with HMAC-SHA256 over the raw
//! request body, keyed with the subscription secret, and sends the digest
//! base64-encoded (standard alphabet, padded) in `X-Webhook-Signature`.

use base64::{prelude::BASE64_STANDARD, Engine};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;
use tracing::{debug, warn};

type HmacSha256 = Hmac<Sha256>;

/// Failure to compute a signature.
#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("secret cannot be used as an HMAC key")]
    InvalidKey,
}

/// Why a delivery was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RejectReason {
    /// A secret is configured but no signature was sent.
    #[error("signature header missing")]
    MissingSignature,
    /// The provided signature differs from the expected one.
    #[error("signature does not match payload")]
    SignatureMismatch,
    /// The expected signature could not be computed. HMAC accepts keys of
    /// any length, so this does not occur with the SHA-256 construction.
    #[error("secret cannot be used as an HMAC key")]
    InvalidKey,
}

impl RejectReason {
    /// Stable machine-readable code for logs.
    pub fn code(&self) -> &'static str {
        match self {
            RejectReason::MissingSignature => "missing_signature",
            RejectReason::SignatureMismatch => "signature_mismatch",
            RejectReason::InvalidKey => "invalid_key",
        }
    }
}

/// Result of checking one delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// Accept the delivery. `degraded` is set when no secret is configured
    /// and the signature was not checked at all.
    Accepted { degraded: bool },
    Rejected(RejectReason),
}

impl VerificationOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, VerificationOutcome::Accepted { .. })
    }
}

/// Compute the signature the sender attaches to `payload`.
pub fn sign(payload: &[u8], secret: &str) -> Result<String, SignatureError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| SignatureError::InvalidKey)?;
    mac.update(payload);
    Ok(BASE64_STANDARD.encode(mac.finalize().into_bytes()))
}

/// Decide whether a delivery carries a valid signature.
///
/// * Empty `secret`: verification is disabled and every delivery is accepted
///   in degraded mode.
/// * Secret set, no signature: rejected. Omitting the header must not bypass
///   verification.
/// * Otherwise the provided signature is compared in constant time against
///   the expected one. Malformed input is just a mismatch.
pub fn check_signature(
    payload: &[u8],
    provided: Option<&str>,
    secret: &str,
) -> VerificationOutcome {
    // Callers own the operator warning for degraded acceptance.
    if secret.is_empty() {
        debug!(
            has_signature = provided.is_some(),
            "signature_verification_disabled"
        );
        return VerificationOutcome::Accepted { degraded: true };
    }

    let provided = match provided {
        Some(sig) => sig,
        None => {
            warn!(payload_length = payload.len(), "webhook_signature_missing");
            return VerificationOutcome::Rejected(RejectReason::MissingSignature);
        }
    };

    // Unreachable for HMAC-SHA256 (any key length is valid); the error is
    // still mapped to a rejection rather than unwrapped.
    let expected = match sign(payload, secret) {
        Ok(sig) => sig,
        Err(e) => {
            warn!(error = %e, "webhook_signature_invalid_key");
            return VerificationOutcome::Rejected(RejectReason::InvalidKey);
        }
    };

    if constant_time_compare(&expected, provided) {
        VerificationOutcome::Accepted { degraded: false }
    } else {
        warn!(
            expected_length = expected.len(),
            actual_length = provided.len(),
            "webhook_signature_mismatch"
        );
        VerificationOutcome::Rejected(RejectReason::SignatureMismatch)
    }
}

/// Verify `signature` against `payload` with the given secret.
///
/// Returns `true` when the signature matches, or when `secret` is empty
/// (verification disabled).
pub fn verify(payload: &[u8], signature: &str, secret: &str) -> bool {
    check_signature(payload, Some(signature), secret).is_accepted()
}

/// Constant-time string comparison to prevent timing attacks.
///
/// Only the length check short-circuits; equal-length inputs always scan
/// every byte.
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}
