use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};

use crate::auth::{decode_token, issue_access_token, token_digest, TokenUse};
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(Debug, Serialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
}

/// POST /auth/refresh - mint a new access token from a refresh token.
///
/// Signature, expiry, token kind and the revocation denylist are all checked;
/// every failure returns the same generic 401.
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AccessTokenResponse>, ApiError> {
    let claims = decode_token(
        &payload.refresh,
        &state.config.security.jwt_secret,
        TokenUse::Refresh,
    )
    .map_err(|_| ApiError::unauthorized("Invalid token"))?;

    let revoked = sqlx::query_scalar::<_, String>(
        "SELECT token_digest FROM revoked_tokens WHERE token_digest = $1",
    )
    .bind(token_digest(&payload.refresh))
    .fetch_optional(&state.pool)
    .await?;
    if revoked.is_some() {
        return Err(ApiError::unauthorized("Invalid token"));
    }

    let access_token = issue_access_token(
        claims.sub,
        &claims.username,
        &claims.role,
        &state.config.security,
    )
    .map_err(|e| ApiError::internal(e.to_string()))?;

    Ok(Json(AccessTokenResponse { access_token }))
}
