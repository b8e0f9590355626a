use axum::{extract::State, response::Json, Extension};
use chrono::Utc;
use serde::Deserialize;
use std::collections::HashMap;

use crate::auth::password::hash_password;
use crate::database::models::User;
use crate::error::ApiError;
use crate::middleware::{message, AuthUser, MessageResponse};
use crate::state::AppState;

/// GET /auth/profile - the caller's own account, read fresh from storage.
pub async fn profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<User>, ApiError> {
    let row = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(user.id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(Json(row))
}

#[derive(Debug, Deserialize)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// PATCH /auth/profile - partial self-update.
///
/// Only credentials and contact fields; role and activation are reserved for
/// the admin endpoints.
pub async fn profile_update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<ProfileUpdate>,
) -> Result<Json<MessageResponse>, ApiError> {
    let errors = validate(&payload);
    if !errors.is_empty() {
        return Err(ApiError::validation(errors));
    }

    let password_hash = match &payload.password {
        Some(password) => Some(hash_password(password)?),
        None => None,
    };

    let result = sqlx::query(
        "UPDATE users SET
             username = COALESCE($2, username),
             email = COALESCE($3, email),
             password_hash = COALESCE($4, password_hash),
             updated_at = $5
         WHERE id = $1",
    )
    .bind(user.id)
    .bind(payload.username.as_deref().map(str::trim))
    .bind(payload.email.as_deref().map(str::trim))
    .bind(password_hash)
    .bind(Utc::now())
    .execute(&state.pool)
    .await;

    match result {
        Ok(done) if done.rows_affected() == 1 => Ok(message("Profile updated successfully")),
        Ok(_) => Err(ApiError::not_found("User not found")),
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(ApiError::field_error(
            "username",
            "A user with that username already exists",
        )),
        Err(other) => Err(other.into()),
    }
}

fn validate(payload: &ProfileUpdate) -> HashMap<String, Vec<String>> {
    let mut errors: HashMap<String, Vec<String>> = HashMap::new();

    if let Some(username) = &payload.username {
        if username.trim().is_empty() {
            errors
                .entry("username".to_string())
                .or_default()
                .push("Username may not be blank".to_string());
        }
    }
    if let Some(email) = &payload.email {
        if !email.contains('@') {
            errors
                .entry("email".to_string())
                .or_default()
                .push("Enter a valid email address".to_string());
        }
    }
    if let Some(password) = &payload.password {
        if password.len() < 8 {
            errors
                .entry("password".to_string())
                .or_default()
                .push("Password must be at least 8 characters".to_string());
        }
    }

    errors
}
