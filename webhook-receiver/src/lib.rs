//! Storehook - signed product-event webhook receiver.
//!
//! This library provides the shared modules for the two Storehook binaries:
//! - `storehook-web`: web server receiving product webhooks
//! - `storehook-sign`: computes the signature a sender would attach
//!
//! ## Request Flow
//!
//! ```text
//! POST /webhooks/products → capture raw body → verify HMAC → acknowledge (200) | reject (401)
//! ```

pub mod config;
pub mod events;
pub mod secret;
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use events::{Product, ProductEvent};
pub use secret::WebhookSecret;
pub use web::{router, AppState};
