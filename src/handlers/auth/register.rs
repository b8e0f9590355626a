use axum::{extract::State, http::StatusCode, response::Json};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::str::FromStr;
use uuid::Uuid;

use crate::auth::password::hash_password;
use crate::database::models::{Role, User};
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: String,
}

/// POST /auth/register - create an account with the submitted role.
///
/// Accounts start inactive whatever the payload says; an admin activates them
/// through the user-management endpoints.
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let errors = validate(&payload);
    if !errors.is_empty() {
        return Err(ApiError::validation(errors));
    }
    let password_hash = hash_password(&payload.password)?;

    let now = Utc::now();
    let result = sqlx::query_as::<_, User>(
        "INSERT INTO users
             (id, username, email, password_hash, role, is_active, is_staff, is_superuser, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, FALSE, FALSE, FALSE, $6, $6)
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(payload.username.trim())
    .bind(payload.email.trim())
    .bind(&password_hash)
    .bind(&payload.role)
    .bind(now)
    .fetch_one(&state.pool)
    .await;

    let user = match result {
        Ok(user) => user,
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
            return Err(ApiError::field_error(
                "username",
                "A user with that username already exists",
            ));
        }
        Err(other) => return Err(other.into()),
    };

    tracing::info!(username = %user.username, role = %user.role, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User registered successfully",
            "user": user,
        })),
    ))
}

fn validate(payload: &RegisterRequest) -> HashMap<String, Vec<String>> {
    let mut errors: HashMap<String, Vec<String>> = HashMap::new();

    if payload.username.trim().is_empty() {
        errors
            .entry("username".to_string())
            .or_default()
            .push("This field is required".to_string());
    }
    if payload.email.trim().is_empty() {
        errors
            .entry("email".to_string())
            .or_default()
            .push("This field is required".to_string());
    } else if !payload.email.contains('@') {
        errors
            .entry("email".to_string())
            .or_default()
            .push("Enter a valid email address".to_string());
    }
    if payload.password.len() < 8 {
        errors
            .entry("password".to_string())
            .or_default()
            .push("Password must be at least 8 characters".to_string());
    }
    if Role::from_str(&payload.role).is_err() {
        errors
            .entry("role".to_string())
            .or_default()
            .push("Role must be one of admin, parent, driver".to_string());
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_payload() -> RegisterRequest {
        RegisterRequest {
            username: "amina".to_string(),
            email: "amina@example.com".to_string(),
            password: "correct-horse".to_string(),
            role: "parent".to_string(),
        }
    }

    #[test]
    fn valid_payload_passes() {
        assert!(validate(&valid_payload()).is_empty());
    }

    #[test]
    fn missing_fields_are_reported_per_field() {
        let errors = validate(&RegisterRequest {
            username: String::new(),
            email: String::new(),
            password: String::new(),
            role: String::new(),
        });
        assert!(errors.contains_key("username"));
        assert!(errors.contains_key("email"));
        assert!(errors.contains_key("password"));
        assert!(errors.contains_key("role"));
    }

    #[test]
    fn bad_email_and_role_are_rejected() {
        let mut payload = valid_payload();
        payload.email = "not-an-email".to_string();
        payload.role = "teacher".to_string();
        let errors = validate(&payload);
        assert!(errors.contains_key("email"));
        assert!(errors.contains_key("role"));
        assert!(!errors.contains_key("username"));
    }

    #[test]
    fn short_password_is_rejected() {
        let mut payload = valid_payload();
        payload.password = "short".to_string();
        assert!(validate(&payload).contains_key("password"));
    }
}
