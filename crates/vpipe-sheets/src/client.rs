//! Google Sheets REST v4 client.
//!
//! Production-grade client with:
//! - Token caching with refresh margin
//! - HTTP client tuning (pooling, timeouts)
//! - Exponential backoff with jitter
//! - Observability (tracing spans, metrics)

use std::sync::Arc;
use std::time::{Duration, Instant};

use gcp_auth::{CustomServiceAccount, TokenProvider};
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tracing::{debug, info_span, Instrument};

use crate::error::{SheetsError, SheetsResult};
use crate::metrics::{record_cells_updated, record_request};
use crate::retry::{with_retry, RetryConfig};
use crate::token_cache::TokenCache;
use crate::types::{BatchUpdateValuesRequest, BatchUpdateValuesResponse, ValueRange};

/// Public Sheets API endpoint.
pub const DEFAULT_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Header row plus data rows of the status sheet.
pub const DEFAULT_RANGE: &str = "Videos!A1:Z";

// =============================================================================
// Configuration
// =============================================================================

/// Sheets client configuration.
#[derive(Debug, Clone)]
pub struct SheetsConfig {
    /// Spreadsheet ID from the sheet URL
    pub spreadsheet_id: String,
    /// A1 range holding the header row and the video rows
    pub range: String,
    /// API base URL, overridable for tests
    pub api_base: String,
    /// Request timeout
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Retry configuration
    pub retry: RetryConfig,
}

impl SheetsConfig {
    /// Create config from environment variables.
    pub fn from_env() -> SheetsResult<Self> {
        let spreadsheet_id = std::env::var("SHEETS_SPREADSHEET_ID")
            .map_err(|_| SheetsError::config("SHEETS_SPREADSHEET_ID must be set"))?;

        if spreadsheet_id.trim().is_empty() {
            return Err(SheetsError::config("SHEETS_SPREADSHEET_ID cannot be empty"));
        }

        let timeout_secs: u64 = std::env::var("SHEETS_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);

        let connect_timeout_secs: u64 = std::env::var("SHEETS_CONNECT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5);

        Ok(Self {
            spreadsheet_id: spreadsheet_id.trim().to_string(),
            range: std::env::var("SHEETS_RANGE")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_RANGE.to_string()),
            api_base: std::env::var("SHEETS_API_BASE")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            timeout: Duration::from_secs(timeout_secs),
            connect_timeout: Duration::from_secs(connect_timeout_secs),
            retry: RetryConfig::from_env(),
        })
    }

    /// Sheet name part of the configured range (`Videos` in `Videos!A1:Z`).
    pub fn sheet_name(&self) -> &str {
        match self.range.split_once('!') {
            Some((name, _)) => name.trim_matches('\''),
            None => self.range.as_str(),
        }
    }
}

// =============================================================================
// Client
// =============================================================================

#[derive(Clone)]
enum Credentials {
    ServiceAccount(Arc<TokenCache>),
    /// Fixed bearer token, for local runs and tests.
    Static(String),
}

/// Google Sheets REST API client.
#[derive(Clone)]
pub struct SheetsClient {
    http: Client,
    config: SheetsConfig,
    credentials: Credentials,
}

impl SheetsClient {
    /// Create a client authenticated with the service account from
    /// `GOOGLE_APPLICATION_CREDENTIALS`.
    pub async fn new(config: SheetsConfig) -> SheetsResult<Self> {
        let auth = Self::create_auth_provider()?;
        Self::with_token_provider(config, auth)
    }

    /// Create a client over any token provider.
    pub fn with_token_provider(
        config: SheetsConfig,
        auth: Arc<dyn TokenProvider>,
    ) -> SheetsResult<Self> {
        Ok(Self {
            http: Self::build_http(&config)?,
            config,
            credentials: Credentials::ServiceAccount(Arc::new(TokenCache::new(auth))),
        })
    }

    /// Create a client that sends a fixed access token.
    pub fn with_access_token(
        config: SheetsConfig,
        access_token: impl Into<String>,
    ) -> SheetsResult<Self> {
        Ok(Self {
            http: Self::build_http(&config)?,
            config,
            credentials: Credentials::Static(access_token.into()),
        })
    }

    /// Create from environment variables.
    pub async fn from_env() -> SheetsResult<Self> {
        let config = SheetsConfig::from_env()?;
        Self::new(config).await
    }

    fn build_http(config: &SheetsConfig) -> SheetsResult<Client> {
        Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(4)
            .user_agent(concat!("vpipe-sheets/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(SheetsError::Network)
    }

    fn create_auth_provider() -> SheetsResult<Arc<dyn TokenProvider>> {
        let service_account = CustomServiceAccount::from_env().map_err(|e| {
            SheetsError::auth_error(format!("Failed to load service account: {}", e))
        })?;

        match service_account {
            Some(sa) => Ok(Arc::new(sa)),
            None => Err(SheetsError::auth_error(
                "GOOGLE_APPLICATION_CREDENTIALS not set. \
                 Set it to the path of your service account JSON file.",
            )),
        }
    }

    pub fn config(&self) -> &SheetsConfig {
        &self.config
    }

    // =========================================================================
    // Values API
    // =========================================================================

    /// Read a range, rows first, as displayed in the UI.
    pub async fn get_values(&self, range: &str) -> SheetsResult<ValueRange> {
        let url = format!(
            "{}/{}/values/{}?majorDimension=ROWS&valueRenderOption=FORMATTED_VALUE",
            self.config.api_base,
            self.config.spreadsheet_id,
            urlencoding::encode(range)
        );
        let url = url.as_str();

        with_retry(&self.config.retry, "get_values", || async move {
            self.execute_request("get_values", range, async move {
                let response = self.send(|token| self.http.get(url).bearer_auth(token)).await?;
                let status = response.status();

                if status.is_success() {
                    Ok(response.json::<ValueRange>().await?)
                } else {
                    Err(Self::handle_error_response(status, url, response).await)
                }
            })
            .await
        })
        .await
    }

    /// Write several ranges in one request.
    pub async fn batch_update_values(
        &self,
        data: Vec<ValueRange>,
    ) -> SheetsResult<BatchUpdateValuesResponse> {
        if data.is_empty() {
            return Ok(BatchUpdateValuesResponse::empty());
        }

        let url = format!(
            "{}/{}/values:batchUpdate",
            self.config.api_base, self.config.spreadsheet_id
        );
        let url = url.as_str();
        let target = data
            .first()
            .and_then(|d| d.range.clone())
            .unwrap_or_default();
        let target = target.as_str();
        let request = BatchUpdateValuesRequest::user_entered(data);
        let request = &request;

        let response = with_retry(&self.config.retry, "batch_update_values", || async move {
            self.execute_request("batch_update_values", target, async move {
                let response = self
                    .send(|token| self.http.post(url).bearer_auth(token).json(request))
                    .await?;
                let status = response.status();

                if status.is_success() {
                    Ok(response.json::<BatchUpdateValuesResponse>().await?)
                } else {
                    Err(Self::handle_error_response(status, url, response).await)
                }
            })
            .await
        })
        .await?;

        if let Some(cells) = response.total_updated_cells {
            record_cells_updated(cells);
        }
        Ok(response)
    }

    // =========================================================================
    // Internal Helpers
    // =========================================================================

    async fn token(&self) -> SheetsResult<String> {
        match &self.credentials {
            Credentials::ServiceAccount(cache) => cache.get_token().await,
            Credentials::Static(token) => Ok(token.clone()),
        }
    }

    fn is_access_token_expired(body: &str) -> bool {
        body.contains("ACCESS_TOKEN_EXPIRED") || body.contains("\"UNAUTHENTICATED\"")
    }

    /// Send a request, refreshing the token once on an expired-token 401.
    async fn send<B>(&self, build: B) -> SheetsResult<Response>
    where
        B: Fn(&str) -> RequestBuilder,
    {
        let token = self.token().await?;
        let response = build(&token).send().await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let cache = match &self.credentials {
            Credentials::ServiceAccount(cache) if Self::is_access_token_expired(&body) => cache,
            _ => return Err(SheetsError::from_http_status(401, body)),
        };

        debug!("Access token rejected, refreshing");
        cache.invalidate().await;
        let token = cache.get_token().await?;
        Ok(build(&token).send().await?)
    }

    /// Execute a request with tracing and metrics.
    async fn execute_request<T, F>(&self, operation: &str, range: &str, fut: F) -> SheetsResult<T>
    where
        F: std::future::Future<Output = SheetsResult<T>>,
    {
        let span = info_span!(
            "sheets_request",
            operation = %operation,
            spreadsheet_id = %self.config.spreadsheet_id,
            range = %range
        );

        let start = Instant::now();
        let result = fut.instrument(span).await;
        let latency_ms = start.elapsed().as_millis() as f64;

        let status = match &result {
            Ok(_) => 200,
            Err(e) => e.http_status().unwrap_or(500),
        };
        record_request(operation, status, latency_ms);

        result
    }

    async fn handle_error_response(status: StatusCode, url: &str, response: Response) -> SheetsError {
        let retry_after_secs = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok());
        let body = response.text().await.unwrap_or_default();

        match (status, retry_after_secs) {
            (StatusCode::TOO_MANY_REQUESTS, Some(secs)) => {
                SheetsError::RateLimited(secs.saturating_mul(1000))
            }
            _ => SheetsError::from_http_status(status.as_u16(), format!("{} failed: {}", url, body)),
        }
    }
}
