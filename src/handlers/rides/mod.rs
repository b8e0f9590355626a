//! Ride lifecycle: parents request rides, drivers move them through the
//! forward-only status chain. Transitions are guarded by a single conditional
//! UPDATE, so two drivers racing to accept the same ride resolve to exactly
//! one winner and a 409 for the loser.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::{get, patch, post},
    Extension, Router,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::database::models::{Ride, RideStatus, Role};
use crate::error::ApiError;
use crate::middleware::{created, jwt_auth, message, AuthUser, MessageResponse};
use crate::state::AppState;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/rides", get(list_rides))
        .route("/rides/request_ride", post(request_ride))
        .route("/rides/my_requests", get(my_requests))
        .route("/rides/:id", get(get_ride).delete(delete_ride))
        .route("/rides/:id/accept", patch(accept))
        .route("/rides/:id/start", patch(start))
        .route("/rides/:id/complete", patch(complete))
        .route_layer(middleware::from_fn_with_state(state.clone(), jwt_auth))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct RideRequest {
    #[serde(default)]
    pickup_location: String,
}

/// POST /rides/request_ride - create a ride owned by the caller as parent.
async fn request_ride(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<RideRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    if payload.pickup_location.trim().is_empty() {
        return Err(ApiError::field_error(
            "pickup_location",
            "This field is required",
        ));
    }

    sqlx::query(
        "INSERT INTO rides (id, parent_id, driver_id, pickup_location, status, created_at)
         VALUES ($1, $2, NULL, $3, $4, $5)",
    )
    .bind(Uuid::new_v4())
    .bind(user.id)
    .bind(payload.pickup_location.trim())
    .bind(RideStatus::Requested.as_str())
    .bind(Utc::now())
    .execute(&state.pool)
    .await?;

    tracing::info!(parent = %user.username, "ride requested");
    Ok(created("Ride requested successfully"))
}

/// GET /rides/my_requests - rides the caller requested as parent.
async fn my_requests(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Ride>>, ApiError> {
    let rides = sqlx::query_as::<_, Ride>(
        "SELECT * FROM rides WHERE parent_id = $1 ORDER BY created_at DESC",
    )
    .bind(user.id)
    .fetch_all(&state.pool)
    .await?;
    Ok(Json(rides))
}

/// GET /rides
async fn list_rides(State(state): State<AppState>) -> Result<Json<Vec<Ride>>, ApiError> {
    let rides = sqlx::query_as::<_, Ride>("SELECT * FROM rides ORDER BY created_at DESC")
        .fetch_all(&state.pool)
        .await?;
    Ok(Json(rides))
}

/// GET /rides/:id
async fn get_ride(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Ride>, ApiError> {
    let ride = sqlx::query_as::<_, Ride>("SELECT * FROM rides WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Ride not found"))?;
    Ok(Json(ride))
}

/// DELETE /rides/:id - the only way a ride is destroyed. Cascades to its
/// tracking and attendance rows via the schema's FK actions.
async fn delete_ride(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    let done = sqlx::query("DELETE FROM rides WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;
    if done.rows_affected() == 0 {
        return Err(ApiError::not_found("Ride not found"));
    }
    Ok(message("Ride deleted"))
}

/// PATCH /rides/:id/accept - a driver claims a requested ride.
async fn accept(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    require_driver(&user)?;

    let done = sqlx::query(
        "UPDATE rides SET status = $3, driver_id = $2 WHERE id = $1 AND status = $4",
    )
    .bind(id)
    .bind(user.id)
    .bind(RideStatus::Accepted.as_str())
    .bind(RideStatus::Requested.as_str())
    .execute(&state.pool)
    .await?;

    if done.rows_affected() == 0 {
        return Err(transition_failure(&state, id, RideStatus::Accepted).await?);
    }
    tracing::info!(driver = %user.username, ride = %id, "ride accepted");
    Ok(message("Ride accepted"))
}

/// PATCH /rides/:id/start - the assigned driver starts an accepted ride.
async fn start(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    advance(&state, &user, id, RideStatus::Started).await?;
    Ok(message("Ride started"))
}

/// PATCH /rides/:id/complete - the assigned driver completes a started ride.
async fn complete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    advance(&state, &user, id, RideStatus::Completed).await?;
    Ok(message("Ride completed"))
}

fn require_driver(user: &AuthUser) -> Result<(), ApiError> {
    if user.role != Role::Driver {
        return Err(ApiError::forbidden("Driver role required"));
    }
    Ok(())
}

/// Move a ride one step forward, requiring the caller to be its assigned
/// driver. The status and driver checks live in the UPDATE's WHERE clause so
/// the transition is atomic.
async fn advance(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    target: RideStatus,
) -> Result<(), ApiError> {
    require_driver(user)?;
    // `requested` is never a target here; accept() handles that transition
    let prior = target
        .required_prior()
        .ok_or_else(|| ApiError::internal("no transition into requested"))?;

    let done = sqlx::query(
        "UPDATE rides SET status = $3 WHERE id = $1 AND status = $4 AND driver_id = $2",
    )
    .bind(id)
    .bind(user.id)
    .bind(target.as_str())
    .bind(prior.as_str())
    .execute(&state.pool)
    .await?;

    if done.rows_affected() == 0 {
        let failure = transition_failure(state, id, target).await?;
        // Distinguish "not yours" from "wrong state" for the assigned-driver rules
        if let ApiError::Conflict(_) = &failure {
            let assigned = sqlx::query_scalar::<_, Option<Uuid>>(
                "SELECT driver_id FROM rides WHERE id = $1",
            )
            .bind(id)
            .fetch_one(&state.pool)
            .await?;
            if assigned != Some(user.id) {
                return Err(ApiError::forbidden(
                    "Only the assigned driver may update this ride",
                ));
            }
        }
        return Err(failure);
    }
    tracing::info!(driver = %user.username, ride = %id, status = %target, "ride advanced");
    Ok(())
}

/// Diagnose a failed conditional transition: unknown ride vs. wrong state.
async fn transition_failure(
    state: &AppState,
    id: Uuid,
    target: RideStatus,
) -> Result<ApiError, ApiError> {
    let status = sqlx::query_scalar::<_, String>("SELECT status FROM rides WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;
    Ok(match status {
        None => ApiError::not_found("Ride not found"),
        Some(current) => ApiError::conflict(format!(
            "Ride cannot be {} while it is {}",
            target, current
        )),
    })
}
