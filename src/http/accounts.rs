//! Login, logout, and health handlers.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::header;
use axum::response::IntoResponse;

use super::AppState;
use crate::auth::{self, LoginClaims};
use crate::error::MarketError;
use crate::store::lock_store;

/// Consumes the verified identity claims, reconciles the local account, and
/// establishes the session cookie with a snapshot of the account.
pub(super) async fn google_login(
    State(state): State<AppState>,
    payload: Result<Json<LoginClaims>, JsonRejection>,
) -> Result<impl IntoResponse, MarketError> {
    let Json(claims) = payload.map_err(|rej| MarketError::InvalidInput(rej.body_text()))?;

    let account = {
        let db = lock_store(&state.db)?;
        auth::reconcile(&db, &claims)?
    };

    let token = state.signer.issue(&account);
    Ok((
        [(header::SET_COOKIE, state.signer.cookie(&token))],
        Json(serde_json::json!({
            "message": "login successful",
            "user": account,
        })),
    ))
}

pub(super) async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::SET_COOKIE, state.signer.clear_cookie())],
        Json(serde_json::json!({"message": "logged out"})),
    )
}

pub(super) async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}
