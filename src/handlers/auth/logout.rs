use axum::{extract::State, response::Json};
use chrono::Utc;
use serde::Deserialize;

use crate::auth::{decode_token, token_digest, TokenUse};
use crate::error::ApiError;
use crate::middleware::{message, MessageResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LogoutRequest {
    pub refresh: String,
}

/// POST /auth/logout - revoke the refresh token so it can no longer mint
/// access tokens. Idempotent: revoking an already-revoked token succeeds.
pub async fn logout(
    State(state): State<AppState>,
    Json(payload): Json<LogoutRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    decode_token(
        &payload.refresh,
        &state.config.security.jwt_secret,
        TokenUse::Refresh,
    )
    .map_err(|_| ApiError::bad_request("Invalid token"))?;

    sqlx::query(
        "INSERT INTO revoked_tokens (token_digest, revoked_at) VALUES ($1, $2)
         ON CONFLICT (token_digest) DO NOTHING",
    )
    .bind(token_digest(&payload.refresh))
    .bind(Utc::now())
    .execute(&state.pool)
    .await?;

    Ok(message("Logged out successfully"))
}
