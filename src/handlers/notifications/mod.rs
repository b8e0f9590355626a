//! Notifications: free-text messages delivered in-store to a recipient.
//! Reading, marking seen and deleting are scoped to the caller as recipient;
//! someone else's notification id behaves like an unknown id.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::{delete, get, patch, post},
    Extension, Router,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::database::models::Notification;
use crate::error::ApiError;
use crate::middleware::{created, jwt_auth, message, AuthUser, MessageResponse};
use crate::state::AppState;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/notifications", get(list_notifications))
        .route("/notifications/send_notification", post(send_notification))
        .route("/notifications/:id/mark_seen", patch(mark_seen))
        .route("/notifications/:id", delete(delete_notification))
        .route_layer(middleware::from_fn_with_state(state.clone(), jwt_auth))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct SendNotification {
    recipient_id: Uuid,
    #[serde(default)]
    message: String,
}

/// POST /notifications/send_notification - any authenticated caller, any
/// recipient.
async fn send_notification(
    State(state): State<AppState>,
    Json(payload): Json<SendNotification>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    if payload.message.trim().is_empty() {
        return Err(ApiError::field_error("message", "This field is required"));
    }

    let recipient = sqlx::query_scalar::<_, Uuid>("SELECT id FROM users WHERE id = $1")
        .bind(payload.recipient_id)
        .fetch_optional(&state.pool)
        .await?;
    if recipient.is_none() {
        return Err(ApiError::not_found("Recipient not found"));
    }

    sqlx::query(
        "INSERT INTO notifications (id, recipient_id, message, seen, created_at)
         VALUES ($1, $2, $3, FALSE, $4)",
    )
    .bind(Uuid::new_v4())
    .bind(payload.recipient_id)
    .bind(payload.message.trim())
    .bind(Utc::now())
    .execute(&state.pool)
    .await?;

    Ok(created("Notification sent"))
}

/// GET /notifications - the caller's notifications, newest first.
async fn list_notifications(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Notification>>, ApiError> {
    let notifications = sqlx::query_as::<_, Notification>(
        "SELECT * FROM notifications WHERE recipient_id = $1 ORDER BY created_at DESC",
    )
    .bind(user.id)
    .fetch_all(&state.pool)
    .await?;
    Ok(Json(notifications))
}

/// PATCH /notifications/:id/mark_seen
async fn mark_seen(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    let done = sqlx::query(
        "UPDATE notifications SET seen = TRUE WHERE id = $1 AND recipient_id = $2",
    )
    .bind(id)
    .bind(user.id)
    .execute(&state.pool)
    .await?;
    if done.rows_affected() == 0 {
        return Err(ApiError::not_found("Notification not found"));
    }
    Ok(message("Notification marked as seen"))
}

/// DELETE /notifications/:id
async fn delete_notification(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    let done = sqlx::query("DELETE FROM notifications WHERE id = $1 AND recipient_id = $2")
        .bind(id)
        .bind(user.id)
        .execute(&state.pool)
        .await?;
    if done.rows_affected() == 0 {
        return Err(ApiError::not_found("Notification not found"));
    }
    Ok(message("Notification deleted"))
}
