//! Web front-end
//!
//! A small axum app around the sync engine: authorize via the Google
//! consent flow, then trigger one run. Tokens live in process state for
//! the single configured user.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{info, warn};
use trailsync_domain::{Config, Result, TrailSyncError};
use trailsync_infra::{
    authorize_url, exchange_code, login_state, AccessTokenProvider, OAuthTokenProvider,
    StaticTokenProvider, TokenResponse,
};

#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    tokens: Arc<RwLock<Option<TokenResponse>>>,
    pending_login: Arc<RwLock<Option<String>>>,
}

impl AppState {
    fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            tokens: Arc::new(RwLock::new(None)),
            pending_login: Arc::new(RwLock::new(None)),
        }
    }

    fn redirect_uri(&self) -> String {
        format!("http://{}/authcallback", self.config.server.bind_addr)
    }
}

/// Serve the front-end until the process is terminated
pub async fn serve(config: Config) -> Result<()> {
    let bind_addr = config.server.bind_addr.clone();
    let state = AppState::new(config);

    let app = Router::new()
        .route("/", get(index))
        .route("/doauth", post(doauth))
        .route("/authcallback", get(authcallback))
        .route("/run", post(run))
        .route("/logout", get(logout))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| TrailSyncError::Internal(format!("failed to bind {bind_addr}: {e}")))?;

    info!(addr = %bind_addr, "serving sync front-end");

    axum::serve(listener, app)
        .await
        .map_err(|e| TrailSyncError::Internal(format!("server error: {e}")))
}

async fn index(State(state): State<AppState>) -> Html<String> {
    let authorized = state.tokens.read().await.is_some();

    let body = if authorized {
        "<h1>TrailSync</h1><p>Authorized.</p>\
         <form method=\"post\" action=\"/run\"><button>Synchronize now</button></form>\
         <p><a href=\"/logout\">Log out</a></p>"
    } else {
        "<h1>TrailSync</h1><p>Not authorized.</p>\
         <form method=\"post\" action=\"/doauth\"><button>Authorize with Google</button></form>"
    };

    Html(body.to_string())
}

async fn doauth(State(state): State<AppState>) -> Response {
    let login = login_state();
    *state.pending_login.write().await = Some(login.clone());

    match authorize_url(&state.config.google, &state.redirect_uri(), &login) {
        Ok(url) => Redirect::to(&url).into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Debug, Deserialize)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

async fn authcallback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Response {
    if let Some(error) = params.error {
        warn!(error = %error, "authorization was denied");
        return error_response(TrailSyncError::Auth(format!("authorization denied: {error}")));
    }

    let Some(code) = params.code else {
        return error_response(TrailSyncError::InvalidInput(
            "missing authorization code".to_string(),
        ));
    };

    let expected = state.pending_login.write().await.take();
    if expected.is_none() || params.state != expected {
        return error_response(TrailSyncError::Auth("mismatched login state".to_string()));
    }

    match exchange_code(&state.config.google, &state.redirect_uri(), &code).await {
        Ok(tokens) => {
            *state.tokens.write().await = Some(tokens);
            Redirect::to("/").into_response()
        }
        Err(e) => error_response(e),
    }
}

async fn run(State(state): State<AppState>) -> Response {
    let Some(tokens) = state.tokens.read().await.clone() else {
        return error_response(TrailSyncError::Auth("no auth token found".to_string()));
    };

    // A refresh token outlives the access token; prefer it when present.
    let provider: Arc<dyn AccessTokenProvider> = match tokens.refresh_token {
        Some(refresh_token) => {
            Arc::new(OAuthTokenProvider::new(&state.config.google, refresh_token))
        }
        None => Arc::new(StaticTokenProvider::new(tokens.access_token)),
    };

    match crate::build_runner(&state.config, provider).run().await {
        Ok(summary) => Json(summary).into_response(),
        Err(e) => error_response(e),
    }
}

async fn logout(State(state): State<AppState>) -> Redirect {
    *state.tokens.write().await = None;
    Redirect::to("/")
}

fn error_response(err: TrailSyncError) -> Response {
    let status = match &err {
        TrailSyncError::Auth(_) => StatusCode::UNAUTHORIZED,
        TrailSyncError::Config(_) | TrailSyncError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        TrailSyncError::NotFound(_) => StatusCode::NOT_FOUND,
        TrailSyncError::Network(_) => StatusCode::BAD_GATEWAY,
        TrailSyncError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (status, Json(err)).into_response()
}
