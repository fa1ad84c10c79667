//! OAuth token plumbing for the Google APIs
//!
//! Credentials are explicit values injected where needed — there is no
//! process-wide authorization state. The refreshing provider trades a
//! long-lived refresh token for short-lived access tokens and caches each
//! one until shortly before it expires.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use trailsync_domain::{GoogleConfig, Result, TrailSyncError};
use url::Url;

pub const AUTHORIZATION_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";

/// Read the track files, manage the calendar
pub const OAUTH_SCOPES: [&str; 2] = [
    "https://www.googleapis.com/auth/drive.readonly",
    "https://www.googleapis.com/auth/calendar",
];

// Refresh slightly early so a token never expires mid-request
const REFRESH_THRESHOLD_SECS: u64 = 60;

/// Trait for supplying a bearer token per request
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String>;
}

/// Provider for an already-obtained access token (web sessions, tests)
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

#[async_trait]
impl AccessTokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<String> {
        Ok(self.token.clone())
    }
}

/// Token response from the OAuth token endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

struct CachedToken {
    access_token: String,
    expires_at: Option<Instant>,
}

impl CachedToken {
    fn is_fresh(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => {
                Instant::now() + Duration::from_secs(REFRESH_THRESHOLD_SECS) < expires_at
            }
            None => true,
        }
    }
}

/// Provider that refreshes access tokens from a long-lived refresh token
pub struct OAuthTokenProvider {
    http: reqwest::Client,
    token_endpoint: String,
    client_id: String,
    client_secret: String,
    refresh_token: String,
    cached: Mutex<Option<CachedToken>>,
}

impl OAuthTokenProvider {
    pub fn new(credentials: &GoogleConfig, refresh_token: impl Into<String>) -> Self {
        Self::with_token_endpoint(credentials, refresh_token, TOKEN_ENDPOINT)
    }

    /// Provider pointed at a different token endpoint (tests)
    pub fn with_token_endpoint(
        credentials: &GoogleConfig,
        refresh_token: impl Into<String>,
        token_endpoint: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            token_endpoint: token_endpoint.into(),
            client_id: credentials.client_id.clone(),
            client_secret: credentials.client_secret.clone(),
            refresh_token: refresh_token.into(),
            cached: Mutex::new(None),
        }
    }

    async fn refresh(&self) -> Result<TokenResponse> {
        let response = self
            .http
            .post(&self.token_endpoint)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", self.refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| TrailSyncError::Auth(format!("Token refresh request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(TrailSyncError::Auth(format!(
                "the credentials have been revoked or expired, please re-authorize ({status}): {body}"
            )));
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| TrailSyncError::Auth(format!("Failed to parse token response: {e}")))
    }
}

#[async_trait]
impl AccessTokenProvider for OAuthTokenProvider {
    async fn access_token(&self) -> Result<String> {
        {
            let cached = self.cached.lock().map_err(|_| {
                TrailSyncError::Internal("token cache lock poisoned".to_string())
            })?;
            if let Some(token) = cached.as_ref() {
                if token.is_fresh() {
                    return Ok(token.access_token.clone());
                }
            }
        }

        debug!("refreshing access token");
        let token = self.refresh().await?;
        let expires_at =
            token.expires_in.map(|secs| Instant::now() + Duration::from_secs(secs));
        let access_token = token.access_token;

        let mut cached = self
            .cached
            .lock()
            .map_err(|_| TrailSyncError::Internal("token cache lock poisoned".to_string()))?;
        *cached = Some(CachedToken { access_token: access_token.clone(), expires_at });

        Ok(access_token)
    }
}

/// Build the user consent URL for the authorization redirect
pub fn authorize_url(
    credentials: &GoogleConfig,
    redirect_uri: &str,
    state: &str,
) -> Result<String> {
    let mut url = Url::parse(AUTHORIZATION_ENDPOINT)
        .map_err(|e| TrailSyncError::Internal(format!("bad authorization endpoint: {e}")))?;

    url.query_pairs_mut()
        .append_pair("client_id", &credentials.client_id)
        .append_pair("redirect_uri", redirect_uri)
        .append_pair("response_type", "code")
        .append_pair("scope", &OAUTH_SCOPES.join(" "))
        .append_pair("access_type", "offline")
        .append_pair("prompt", "consent")
        .append_pair("state", state);

    Ok(url.to_string())
}

/// Random state parameter tying the callback to the login attempt
pub fn login_state() -> String {
    format!("{:032x}", rand::random::<u128>())
}

/// Exchange an authorization code for tokens
pub async fn exchange_code(
    credentials: &GoogleConfig,
    redirect_uri: &str,
    code: &str,
) -> Result<TokenResponse> {
    exchange_code_at(TOKEN_ENDPOINT, credentials, redirect_uri, code).await
}

/// Code exchange against a specific token endpoint (tests)
pub async fn exchange_code_at(
    token_endpoint: &str,
    credentials: &GoogleConfig,
    redirect_uri: &str,
    code: &str,
) -> Result<TokenResponse> {
    let client = reqwest::Client::new();
    let response = client
        .post(token_endpoint)
        .form(&[
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("grant_type", "authorization_code"),
        ])
        .send()
        .await
        .map_err(|e| TrailSyncError::Auth(format!("Code exchange request failed: {e}")))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
        return Err(TrailSyncError::Auth(format!(
            "Code exchange failed ({status}): {body}"
        )));
    }

    response
        .json::<TokenResponse>()
        .await
        .map_err(|e| TrailSyncError::Auth(format!("Failed to parse token response: {e}")))
}
