//! Shared webhook secret with whole-value replacement.
//!
//! The secret is the only mutable state shared between requests. Readers take
//! a snapshot of the full value and writers replace it in one assignment, so a
//! verification always sees either the old or the new secret, never a mix.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, warn};

/// Cloneable handle to the process-wide webhook secret.
///
/// An empty secret means signature verification is disabled.
#[derive(Clone)]
pub struct WebhookSecret {
    inner: Arc<RwLock<Arc<str>>>,
}

impl WebhookSecret {
    /// Create a handle holding the given initial secret.
    pub fn new(initial: impl Into<String>) -> Self {
        let initial: String = initial.into();
        Self {
            inner: Arc::new(RwLock::new(Arc::from(initial))),
        }
    }

    /// Snapshot of the currently active secret.
    pub async fn current(&self) -> Arc<str> {
        self.inner.read().await.clone()
    }

    /// Whether a non-empty secret is currently active.
    pub async fn is_configured(&self) -> bool {
        !self.inner.read().await.is_empty()
    }

    /// Replace the active secret. Last write wins.
    pub async fn replace(&self, secret: impl Into<String>) {
        let secret: String = secret.into();
        let configured = !secret.is_empty();

        *self.inner.write().await = Arc::from(secret);

        if configured {
            info!(secret_configured = true, "webhook_secret_updated");
        } else {
            warn!(
                secret_configured = false,
                "webhook_secret_cleared_verification_disabled"
            );
        }
    }
}

impl std::fmt::Debug for WebhookSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookSecret").finish_non_exhaustive()
    }
}
