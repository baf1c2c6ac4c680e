use super::{AccessToken, Clock, CredentialProvider, SystemClock};
use crate::Result;
use chrono::Duration;
use std::sync::{Arc, Mutex};

/// Tokens are refreshed this long before they actually expire.
const REFRESH_MARGIN_SECS: i64 = 60;

/// Single-slot access token cache.
///
/// One instance per process, shared by every vendor call that needs a bearer
/// token. Concurrent callers that all see a stale slot will each ask the
/// provider for a token; issuance is idempotent so the last write wins.
pub struct TokenCache {
    provider: Box<dyn CredentialProvider>,
    clock: Arc<dyn Clock>,
    slot: Mutex<Option<AccessToken>>,
}

impl TokenCache {
    pub fn new(provider: Box<dyn CredentialProvider>) -> Self {
        Self::with_clock(provider, Arc::new(SystemClock))
    }

    pub fn with_clock(provider: Box<dyn CredentialProvider>, clock: Arc<dyn Clock>) -> Self {
        Self {
            provider,
            clock,
            slot: Mutex::new(None),
        }
    }

    fn cached(&self) -> Option<String> {
        let now = self.clock.now();
        let guard = self.slot.lock().ok()?;
        guard
            .as_ref()
            .filter(|t| now < t.expires_at - Duration::seconds(REFRESH_MARGIN_SECS))
            .map(|t| t.token.clone())
    }

    /// Returns a valid bearer token, minting a new one if needed.
    pub async fn token(&self) -> Result<String> {
        if let Some(token) = self.cached() {
            return Ok(token);
        }

        tracing::debug!("Access token missing or near expiry, refreshing");
        let fresh = self.provider.access_token().await?;
        let token = fresh.token.clone();
        tracing::debug!("Access token refreshed, expires at {}", fresh.expires_at);

        if let Ok(mut guard) = self.slot.lock() {
            *guard = Some(fresh);
        }
        Ok(token)
    }

}
