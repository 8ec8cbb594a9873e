use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use super::ErrorResponse;
use crate::server::AppState;

/// Redirect the browser to the provider's authorization page.
pub async fn login(State(state): State<Arc<AppState>>) -> Response {
    let csrf: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect();

    let url = state
        .passport
        .authorization_url(&state.default_scopes, Some(&csrf));
    Redirect::temporary(&url).into_response()
}

#[derive(Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub error: Option<String>,
    #[allow(dead_code)]
    pub state: Option<String>,
}

#[derive(Serialize)]
pub struct CallbackResponse {
    pub user_id: String,
    pub name: Option<String>,
    pub is_verified: bool,
}

/// OAuth callback: exchange the code, fetch the profile, persist both.
pub async fn callback(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CallbackQuery>,
) -> Response {
    if let Some(error) = query.error {
        return (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(error))).into_response();
    }

    let code = match query.code {
        Some(code) => code,
        None => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new("Missing authorization code")),
            )
                .into_response()
        }
    };

    let token = match state.passport.exchange_code(&code).await {
        Ok(token) => token,
        Err(e) => {
            return (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse::new(format!("Token exchange failed: {}", e))),
            )
                .into_response()
        }
    };

    let profile = match state.passport.user_info(&token.access_token).await {
        Ok(profile) => profile,
        Err(e) => {
            return (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse::new(format!("Profile fetch failed: {}", e))),
            )
                .into_response()
        }
    };

    if let Err(e) = state
        .store
        .upsert_user(&profile)
        .and_then(|_| state.store.save_token(&profile.id, &token))
    {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(e.to_string())),
        )
            .into_response();
    }

    tracing::info!(user_id = %profile.id, "user logged in via Aitu Passport");
    Json(CallbackResponse {
        name: profile.full_name(),
        user_id: profile.id,
        is_verified: profile.is_verified,
    })
    .into_response()
}

#[derive(Deserialize)]
pub struct LogoutRequest {
    pub user_id: String,
}

/// Log a user out: revoke the active token upstream (best effort) and
/// deactivate the local copies. Always returns 200.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LogoutRequest>,
) -> Response {
    if let Ok(Some(token)) = state.store.get_active_token(&req.user_id) {
        if let Err(e) = state.passport.revoke_token(&token.access_token).await {
            tracing::warn!(user_id = %req.user_id, error = %e, "upstream revocation failed");
        }
    }

    match state.store.mark_tokens_revoked(&req.user_id) {
        Ok(count) => {
            tracing::info!(user_id = %req.user_id, revoked = count, "user logged out");
        }
        Err(e) => {
            tracing::error!(user_id = %req.user_id, error = %e, "failed to deactivate tokens");
        }
    }

    Json(json!({"status": "logged_out"})).into_response()
}
