//! Google API adapters
//!
//! Implementations of the core ports over the Google Drive v2 and Google
//! Calendar v3 REST APIs, plus the OAuth token plumbing they share.

pub mod auth;
pub mod calendar;
pub mod drive;

pub use auth::{
    authorize_url, exchange_code, login_state, AccessTokenProvider, OAuthTokenProvider,
    StaticTokenProvider, TokenResponse,
};
pub use calendar::GoogleCalendarStore;
pub use drive::GoogleDriveStore;

use trailsync_domain::TrailSyncError;

/// Map a non-success Google response to a domain error, keeping the body
/// for context. Authorization failures get their own variant so the top
/// level can report them as user-actionable.
pub(crate) async fn error_for_status(response: reqwest::Response) -> TrailSyncError {
    let status = response.status();
    let body = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());

    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        TrailSyncError::Auth(format!(
            "the credentials have been revoked or expired ({status}): {body}"
        ))
    } else {
        TrailSyncError::Network(format!("Google API error ({status}): {body}"))
    }
}
