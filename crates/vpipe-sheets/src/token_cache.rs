//! Service-account access tokens for the Sheets API.
//!
//! A token is reused until a minute before it expires. Callers that find it
//! stale queue on one write lock, so only the first of them asks the
//! provider. If that request fails, the old token is handed out until it
//! actually expires.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use gcp_auth::TokenProvider;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::{SheetsError, SheetsResult};

/// Read/write access to spreadsheets.
pub const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// How long before expiry a token is replaced.
const EARLY_REFRESH_SECS: i64 = 60;

struct Lease {
    token: String,
    expires_at: DateTime<Utc>,
}

impl Lease {
    fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EARLY_REFRESH_SECS) >= self.expires_at
    }

    fn expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

fn reusable(lease: &Option<Lease>, now: DateTime<Utc>) -> Option<String> {
    lease
        .as_ref()
        .filter(|l| !l.needs_refresh(now))
        .map(|l| l.token.clone())
}

/// Shared token for every Sheets request of one client.
pub struct TokenCache {
    provider: Arc<dyn TokenProvider>,
    lease: RwLock<Option<Lease>>,
}

impl TokenCache {
    pub fn new(provider: Arc<dyn TokenProvider>) -> Self {
        Self {
            provider,
            lease: RwLock::new(None),
        }
    }

    /// Forget the current token, e.g. after the API rejected it.
    pub async fn invalidate(&self) {
        self.lease.write().await.take();
    }

    pub async fn get_token(&self) -> SheetsResult<String> {
        if let Some(token) = reusable(&*self.lease.read().await, Utc::now()) {
            return Ok(token);
        }

        let mut lease = self.lease.write().await;
        if let Some(token) = reusable(&lease, Utc::now()) {
            return Ok(token);
        }

        match self.provider.token(&[SHEETS_SCOPE]).await {
            Ok(fresh) => {
                let token = fresh.as_str().to_owned();
                debug!(expires_at = %fresh.expires_at(), "Sheets access token refreshed");
                *lease = Some(Lease {
                    token: token.clone(),
                    expires_at: fresh.expires_at(),
                });
                Ok(token)
            }
            Err(e) => match lease.as_ref().filter(|l| !l.expired(Utc::now())) {
                Some(stale) => {
                    warn!(error = %e, expires_at = %stale.expires_at, "Token refresh failed, reusing current token");
                    Ok(stale.token.clone())
                }
                None => Err(SheetsError::auth_error(format!(
                    "failed to obtain access token: {e}"
                ))),
            },
        }
    }
}
