//! API client for the material purchase REST service.
//!
//! Authenticated calls read the bearer token from the injected
//! `SessionStore` at call time. When no token is present the call fails
//! with `ApiError::NotAuthenticated` before anything is sent.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{header, Client};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use crate::auth::SessionStore;
use crate::models::{NewPurchase, PurchasePage};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Default base URL for the purchase API
pub const DEFAULT_BASE_URL: &str = "https://devapi.propsoft.ai/api";

const LOGIN_PATH: &str = "/interview/login";

const PURCHASES_PATH: &str = "/auth/interview/material-purchase";

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) list requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// `status_code` value the API uses for success
const STATUS_OK: &str = "1";

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    status_code: serde_json::Value,
    #[serde(default)]
    status_message: Option<String>,
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    user_data: Option<UserData>,
}

#[derive(Debug, Deserialize)]
struct UserData {
    email: String,
}

#[derive(Debug, Deserialize)]
struct PurchaseListResponse {
    #[serde(default)]
    status_code: serde_json::Value,
    #[serde(default)]
    status_message: Option<String>,
    #[serde(default)]
    material_purchase_list: Option<PurchasePage>,
}

#[derive(Debug, Serialize)]
struct CreatePurchasesRequest<'a> {
    material_purchase: &'a [NewPurchase],
}

#[derive(Debug, Deserialize)]
struct CreateFailure {
    #[serde(default)]
    message: Option<String>,
}

/// `status_code` arrives as `"1"`, occasionally as `1`
fn status_ok(code: &serde_json::Value) -> bool {
    match code {
        serde_json::Value::String(s) => s == STATUS_OK,
        serde_json::Value::Number(n) => n.as_i64() == Some(1),
        _ => false,
    }
}

/// Identity and token returned by a successful login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginSuccess {
    pub email: String,
    pub token: String,
}

/// API client for the purchase service.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: SessionStore,
}

impl ApiClient {
    /// Create a new API client reading tokens from `session`
    pub fn new(base_url: impl Into<String>, session: SessionStore) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Exchange email and password for a token. Does not touch the session.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginSuccess> {
        let url = self.url(LOGIN_PATH);

        let response = self
            .client
            .post(&url)
            .header(header::ACCEPT, "application/json")
            .json(&LoginRequest { email, password })
            .send()
            .await
            .map_err(ApiError::NetworkError)?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        let parsed: LoginResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(_) if !status.is_success() => return Err(ApiError::from_status(status, &body).into()),
            Err(e) => {
                return Err(ApiError::InvalidResponse(format!("login response: {}", e)).into())
            }
        };

        if !status.is_success() || !status_ok(&parsed.status_code) {
            let message = parsed
                .status_message
                .unwrap_or_else(|| format!("Login failed with status {}", status));
            warn!(%status, message = %message, "Login rejected");
            return Err(ApiError::Rejected(message).into());
        }

        let token = parsed
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::InvalidResponse("login response has no access_token".into()))?;
        let email = parsed
            .user_data
            .map(|u| u.email)
            .unwrap_or_else(|| email.to_string());

        debug!(email = %email, "Login accepted");
        Ok(LoginSuccess { email, token })
    }

    fn auth_headers(&self) -> Result<header::HeaderMap> {
        let token = self
            .session
            .bearer_token()
            .ok_or(ApiError::NotAuthenticated)?;

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", token))?,
        );
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit (should retry),
    /// or Err for other errors.
    async fn check_response_for_retry(
        response: reqwest::Response,
    ) -> Result<Option<reqwest::Response>> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status().as_u16() == 429 {
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let headers = self.auth_headers()?;
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let response = self
                .client
                .get(url)
                .headers(headers.clone())
                .send()
                .await
                .map_err(ApiError::NetworkError)?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => {
                    return response
                        .json()
                        .await
                        .with_context(|| format!("Failed to parse JSON response from {}", url));
                }
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited.into());
                    }
                    warn!(url = url, retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2;
                }
            }
        }
    }

    /// Fetch one page of material purchases (pages start at 1)
    pub async fn list_purchases(&self, page: u32) -> Result<PurchasePage> {
        let url = format!("{}?page={}", self.url(PURCHASES_PATH), page.max(1));
        let response: PurchaseListResponse = self.get(&url).await?;

        if !status_ok(&response.status_code) {
            let message = response
                .status_message
                .unwrap_or_else(|| "Unknown error".to_string());
            return Err(ApiError::Rejected(message).into());
        }

        let page_data = response
            .material_purchase_list
            .ok_or_else(|| ApiError::InvalidResponse("missing material_purchase_list".into()))?;
        debug!(
            page = page_data.current_page,
            last_page = page_data.last_page,
            rows = page_data.data.len(),
            "Fetched purchases"
        );
        Ok(page_data)
    }

    /// Submit new purchase rows in a single request
    pub async fn create_purchases(&self, rows: &[NewPurchase]) -> Result<()> {
        let headers = self.auth_headers()?;
        let url = self.url(PURCHASES_PATH);

        let response = self
            .client
            .post(&url)
            .headers(headers)
            .json(&CreatePurchasesRequest {
                material_purchase: rows,
            })
            .send()
            .await
            .map_err(ApiError::NetworkError)?;

        let status = response.status();
        if status.is_success() {
            debug!(rows = rows.len(), "Submitted purchases");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        if status.as_u16() == 401 {
            return Err(ApiError::Unauthorized.into());
        }
        let message = serde_json::from_str::<CreateFailure>(&body)
            .ok()
            .and_then(|f| f.message)
            .unwrap_or_else(|| "Unknown error".to_string());
        warn!(%status, message = %message, "Purchase submission rejected");
        Err(ApiError::Rejected(message).into())
    }
}
