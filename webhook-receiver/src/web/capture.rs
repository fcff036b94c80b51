//! Raw request body capture.
//!
//! Signatures are computed over the exact bytes the sender put on the wire,
//! so the body is kept verbatim and decoded separately. A failed decode only
//! loses the structured view; the bytes stay available for verification.

use axum::body::Bytes;

use crate::events::ProductEvent;

/// Request body as received, plus a best-effort decode of it.
#[derive(Debug, Clone)]
pub struct RawPayload {
    bytes: Bytes,
    envelope: Result<ProductEvent, String>,
}

impl RawPayload {
    /// Capture a request body and attempt to decode it as a [`ProductEvent`].
    pub fn capture(bytes: Bytes) -> Self {
        let envelope = serde_json::from_slice::<ProductEvent>(&bytes).map_err(|e| e.to_string());
        Self { bytes, envelope }
    }

    /// The exact body bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The decoded envelope, if the body was valid JSON of the right shape.
    pub fn envelope(&self) -> Option<&ProductEvent> {
        self.envelope.as_ref().ok()
    }

    /// Why decoding failed, if it did.
    pub fn decode_error(&self) -> Option<&str> {
        self.envelope.as_ref().err().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_keeps_exact_bytes() {
        // Whitespace and key order must survive untouched.
        let body = "{ \"eventId\" : \"e1\",\n  \"eventType\":\"product.created\" }";
        let payload = RawPayload::capture(Bytes::from(body));

        assert_eq!(payload.as_bytes(), body.as_bytes());
        assert_eq!(payload.len(), body.len());
        assert_eq!(
            payload.envelope().and_then(|e| e.event_id.as_deref()),
            Some("e1")
        );
        assert!(payload.decode_error().is_none());
    }

    #[test]
    fn test_decode_failure_keeps_bytes() {
        let body = b"not json at all".to_vec();
        let payload = RawPayload::capture(Bytes::from(body.clone()));

        assert!(payload.envelope().is_none());
        assert!(payload.decode_error().is_some());
        assert_eq!(payload.as_bytes(), &body[..]);
    }

    #[test]
    fn test_mistyped_field_keeps_partial_envelope() {
        let body = r#"{"eventType":"product.created","eventId":"e1","metadata":{"triggeredBy":"system"}}"#;
        let payload = RawPayload::capture(Bytes::from(body));

        let event = payload.envelope().expect("envelope");
        assert_eq!(event.event_id.as_deref(), Some("e1"));
        assert_eq!(event.event_type.as_deref(), Some("product.created"));
        assert!(event.metadata.is_none());
        assert!(payload.decode_error().is_none());
    }

    #[test]
    fn test_non_utf8_body_is_captured() {
        let body = vec![0xff, 0xfe, 0x00, 0x7b];
        let payload = RawPayload::capture(Bytes::from(body.clone()));

        assert_eq!(payload.as_bytes(), &body[..]);
        assert!(payload.envelope().is_none());
    }

    #[test]
    fn test_empty_body() {
        let payload = RawPayload::capture(Bytes::new());
        assert!(payload.is_empty());
        assert!(payload.envelope().is_none());
    }
}
