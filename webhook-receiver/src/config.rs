//! Configuration module for environment variable parsing.
//!
//! Everything the receiver needs at startup comes from the environment.
//! The webhook secret read here is only the initial value; it can be
//! replaced at runtime through `POST /set-secret`.

use std::env;
use std::str::FromStr;
use tracing::warn;

/// Default port, matching the upstream producer's example subscription URLs.
const DEFAULT_PORT: u16 = 3000;

/// Default request body limit (1 MiB).
const DEFAULT_BODY_LIMIT_BYTES: usize = 1024 * 1024;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the web server to listen on
    pub port: u16,

    /// Initial shared secret for HMAC verification (empty means disabled)
    pub webhook_secret: String,

    /// Maximum accepted request body size in bytes
    pub body_limit_bytes: usize,

    /// Bearer token required by `POST /set-secret`, if any
    pub admin_token: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Config {
            port: parse_or("PORT", DEFAULT_PORT),

            webhook_secret: env::var("WEBHOOK_SECRET").unwrap_or_default(),

            body_limit_bytes: parse_or("BODY_LIMIT_BYTES", DEFAULT_BODY_LIMIT_BYTES),

            admin_token: parse_non_empty("ADMIN_TOKEN"),
        }
    }

    /// Whether signature verification is active at startup.
    pub fn secret_configured(&self) -> bool {
        !self.webhook_secret.is_empty()
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: DEFAULT_PORT,
            webhook_secret: String::new(),
            body_limit_bytes: DEFAULT_BODY_LIMIT_BYTES,
            admin_token: None,
        }
    }
}

/// Parse an environment variable, falling back to `default` when it is
/// absent or does not parse.
fn parse_or<T: FromStr>(name: &str, default: T) -> T {
    let raw = match env::var(name) {
        Ok(v) => v,
        Err(_) => return default,
    };

    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            warn!(env_var = name, value = %raw, "Invalid value, using default");
            default
        }
    }
}

/// Read an environment variable, treating blank values as unset.
fn parse_non_empty(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|s| !s.is_empty())
}
