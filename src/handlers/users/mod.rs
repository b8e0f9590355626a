//! Admin-only user management. Every route sits behind both the JWT layer and
//! the admin role gate; non-admin callers get a 403 regardless of target.

use axum::{
    extract::{Path, State},
    middleware,
    response::Json,
    routing::{get, patch},
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use std::str::FromStr;
use uuid::Uuid;

use crate::database::models::{Role, User};
use crate::error::ApiError;
use crate::middleware::{jwt_auth, message, require_admin, MessageResponse};
use crate::state::AppState;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/:id", get(get_user).patch(update_user).delete(delete_user))
        .route("/users/:id/deactivate", patch(deactivate))
        .route("/users/:id/reactivate", patch(reactivate))
        .route("/users/:id/assign_role", patch(assign_role))
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(state.clone(), jwt_auth))
        .with_state(state)
}

/// GET /users
async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, ApiError> {
    let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at")
        .fetch_all(&state.pool)
        .await?;
    Ok(Json(users))
}

/// GET /users/:id
async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, ApiError> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(Json(user))
}

#[derive(Debug, Deserialize)]
struct UserUpdate {
    username: Option<String>,
    email: Option<String>,
    role: Option<String>,
}

/// PATCH /users/:id
async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UserUpdate>,
) -> Result<Json<MessageResponse>, ApiError> {
    if let Some(role) = &payload.role {
        if Role::from_str(role).is_err() {
            return Err(ApiError::bad_request("Invalid role"));
        }
    }

    let result = sqlx::query(
        "UPDATE users SET
             username = COALESCE($2, username),
             email = COALESCE($3, email),
             role = COALESCE($4, role),
             updated_at = $5
         WHERE id = $1",
    )
    .bind(id)
    .bind(payload.username)
    .bind(payload.email)
    .bind(payload.role)
    .bind(Utc::now())
    .execute(&state.pool)
    .await;

    match result {
        Ok(done) if done.rows_affected() == 1 => Ok(message("User updated")),
        Ok(_) => Err(ApiError::not_found("User not found")),
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(ApiError::field_error(
            "username",
            "A user with that username already exists",
        )),
        Err(other) => Err(other.into()),
    }
}

/// DELETE /users/:id
async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    let done = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;
    if done.rows_affected() == 0 {
        return Err(ApiError::not_found("User not found"));
    }
    Ok(message("User deleted"))
}

/// PATCH /users/:id/deactivate
async fn deactivate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    set_active(&state, id, false).await?;
    Ok(message("User deactivated"))
}

/// PATCH /users/:id/reactivate
async fn reactivate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    set_active(&state, id, true).await?;
    Ok(message("User reactivated"))
}

async fn set_active(state: &AppState, id: Uuid, active: bool) -> Result<(), ApiError> {
    let done = sqlx::query("UPDATE users SET is_active = $2, updated_at = $3 WHERE id = $1")
        .bind(id)
        .bind(active)
        .bind(Utc::now())
        .execute(&state.pool)
        .await?;
    if done.rows_affected() == 0 {
        return Err(ApiError::not_found("User not found"));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct AssignRoleRequest {
    #[serde(default)]
    role: String,
}

/// PATCH /users/:id/assign_role - role must be one of the enumerated values;
/// anything else is rejected before any write, leaving the stored role
/// unchanged.
async fn assign_role(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignRoleRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let role = Role::from_str(&payload.role).map_err(|_| ApiError::bad_request("Invalid role"))?;

    let done = sqlx::query("UPDATE users SET role = $2, updated_at = $3 WHERE id = $1")
        .bind(id)
        .bind(role.as_str())
        .bind(Utc::now())
        .execute(&state.pool)
        .await?;
    if done.rows_affected() == 0 {
        return Err(ApiError::not_found("User not found"));
    }

    Ok(message(format!("Role updated to {}", role)))
}
