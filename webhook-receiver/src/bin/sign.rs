//! Storehook Sign - compute a product webhook signature.
//!
//! Reads the payload from stdin byte-for-byte and prints the base64
//! HMAC-SHA256 signature a sender would put in `X-Webhook-Signature`.
//!
//! ```text
//! WEBHOOK_SECRET=abc123 storehook-sign < event.json
//! storehook-sign abc123 < event.json
//! ```

use std::env;
use std::io::{self, Read};

use anyhow::{bail, Context, Result};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use storehook::web::sign;

fn main() -> Result<()> {
    // Logs go to stderr so stdout carries only the signature
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true).with_writer(io::stderr))
        .init();

    let secret = match env::args().nth(1).or_else(|| env::var("WEBHOOK_SECRET").ok()) {
        Some(secret) if !secret.is_empty() => secret,
        _ => bail!("No secret given: pass it as the first argument or set WEBHOOK_SECRET"),
    };

    let mut payload = Vec::new();
    io::stdin()
        .read_to_end(&mut payload)
        .context("Failed to read payload from stdin")?;

    let signature = sign(&payload, &secret).context("Failed to compute signature")?;
    info!(payload_length = payload.len(), "payload_signed");

    println!("{}", signature);

    Ok(())
}
