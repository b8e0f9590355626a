//! GPS tracking: an append-only log of position samples per ride.
//!
//! Samples are stored exactly as submitted; there is no coordinate-bounds
//! validation, no de-duplication and no rate limiting.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::database::models::TrackingPoint;
use crate::error::ApiError;
use crate::middleware::{created, jwt_auth, MessageResponse};
use crate::state::AppState;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/tracking/update_location", post(update_location))
        .route("/tracking/:id/bus_location", get(bus_location))
        .route("/tracking/ride/:ride_id", get(ride_history))
        .route_layer(middleware::from_fn_with_state(state.clone(), jwt_auth))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct LocationUpdate {
    ride_id: Uuid,
    latitude: f64,
    longitude: f64,
}

/// POST /tracking/update_location - append a sample with a server-set
/// timestamp.
async fn update_location(
    State(state): State<AppState>,
    Json(payload): Json<LocationUpdate>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let ride = sqlx::query_scalar::<_, Uuid>("SELECT id FROM rides WHERE id = $1")
        .bind(payload.ride_id)
        .fetch_optional(&state.pool)
        .await?;
    if ride.is_none() {
        return Err(ApiError::not_found("Ride not found"));
    }

    sqlx::query(
        "INSERT INTO tracking (id, ride_id, latitude, longitude, timestamp)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(Uuid::new_v4())
    .bind(payload.ride_id)
    .bind(payload.latitude)
    .bind(payload.longitude)
    .bind(Utc::now())
    .execute(&state.pool)
    .await?;

    Ok(created("Location updated"))
}

/// GET /tracking/:id/bus_location - a single tracking record by its own id.
async fn bus_location(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TrackingPoint>, ApiError> {
    let point = sqlx::query_as::<_, TrackingPoint>("SELECT * FROM tracking WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Tracking record not found"))?;
    Ok(Json(point))
}

/// GET /tracking/ride/:ride_id - a ride's samples in timestamp order.
async fn ride_history(
    State(state): State<AppState>,
    Path(ride_id): Path<Uuid>,
) -> Result<Json<Vec<TrackingPoint>>, ApiError> {
    let points = sqlx::query_as::<_, TrackingPoint>(
        "SELECT * FROM tracking WHERE ride_id = $1 ORDER BY timestamp",
    )
    .bind(ride_id)
    .fetch_all(&state.pool)
    .await?;
    Ok(Json(points))
}
