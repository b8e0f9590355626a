use axum::{extract::State, response::Json};
use serde::Deserialize;

use crate::auth::password::verify_password;
use crate::auth::{issue_token_pair, TokenPair};
use crate::database::models::User;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

// Same response for unknown user, bad password and inactive account
const LOGIN_FAILED: &str = "No active account found with the given credentials";

/// POST /auth/login - verify credentials and issue an access/refresh pair.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
        .bind(&payload.username)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| ApiError::unauthorized(LOGIN_FAILED))?;

    if !verify_password(&payload.password, &user.password_hash) || !user.is_active {
        return Err(ApiError::unauthorized(LOGIN_FAILED));
    }

    let pair = issue_token_pair(user.id, &user.username, &user.role, &state.config.security)
        .map_err(|e| ApiError::internal(e.to_string()))?;

    tracing::info!(username = %user.username, "login");
    Ok(Json(pair))
}
