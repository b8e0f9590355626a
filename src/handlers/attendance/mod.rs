//! Attendance records: created ahead of a ride, then stamped by check-in and
//! check-out. Each stamp overwrites unconditionally; calling check-in twice
//! simply replaces the first timestamp, and no ordering between the two
//! timestamps is enforced.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::database::models::AttendanceRecord;
use crate::error::ApiError;
use crate::middleware::{created, jwt_auth, message, MessageResponse};
use crate::state::AppState;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/attendance", post(create_record))
        .route("/attendance/:id/check_in", post(check_in))
        .route("/attendance/:id/check_out", post(check_out))
        .route("/attendance/student/:student_id", get(student_attendance))
        .route("/attendance/by_date", get(attendance_by_date))
        .route_layer(middleware::from_fn_with_state(state.clone(), jwt_auth))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct AttendanceCreate {
    ride_id: Uuid,
    student_id: Uuid,
}

/// POST /attendance - create a record for a (ride, student) pair.
async fn create_record(
    State(state): State<AppState>,
    Json(payload): Json<AttendanceCreate>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let ride = sqlx::query_scalar::<_, Uuid>("SELECT id FROM rides WHERE id = $1")
        .bind(payload.ride_id)
        .fetch_optional(&state.pool)
        .await?;
    if ride.is_none() {
        return Err(ApiError::not_found("Ride not found"));
    }
    let student = sqlx::query_scalar::<_, Uuid>("SELECT id FROM users WHERE id = $1")
        .bind(payload.student_id)
        .fetch_optional(&state.pool)
        .await?;
    if student.is_none() {
        return Err(ApiError::not_found("Student not found"));
    }

    sqlx::query(
        "INSERT INTO attendance (id, ride_id, student_id, check_in_time, check_out_time)
         VALUES ($1, $2, $3, NULL, NULL)",
    )
    .bind(Uuid::new_v4())
    .bind(payload.ride_id)
    .bind(payload.student_id)
    .execute(&state.pool)
    .await?;

    Ok(created("Attendance record created"))
}

/// POST /attendance/:id/check_in - stamp the current server time.
async fn check_in(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    stamp(&state, id, "check_in_time").await?;
    Ok(message("Check-in successful"))
}

/// POST /attendance/:id/check_out - stamp the current server time.
async fn check_out(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    stamp(&state, id, "check_out_time").await?;
    Ok(message("Check-out successful"))
}

async fn stamp(state: &AppState, id: Uuid, column: &str) -> Result<(), ApiError> {
    // `column` is one of two fixed names, never client input
    let sql = format!("UPDATE attendance SET {} = $2 WHERE id = $1", column);
    let done = sqlx::query(&sql)
        .bind(id)
        .bind(Utc::now())
        .execute(&state.pool)
        .await?;
    if done.rows_affected() == 0 {
        return Err(ApiError::not_found("Attendance record not found"));
    }
    Ok(())
}

/// GET /attendance/student/:student_id
async fn student_attendance(
    State(state): State<AppState>,
    Path(student_id): Path<Uuid>,
) -> Result<Json<Vec<AttendanceRecord>>, ApiError> {
    let records = sqlx::query_as::<_, AttendanceRecord>(
        "SELECT * FROM attendance WHERE student_id = $1",
    )
    .bind(student_id)
    .fetch_all(&state.pool)
    .await?;
    Ok(Json(records))
}

#[derive(Debug, Deserialize)]
struct DateQuery {
    date: String,
}

/// GET /attendance/by_date?date=YYYY-MM-DD - filter by the date portion of
/// check-in time.
async fn attendance_by_date(
    State(state): State<AppState>,
    Query(query): Query<DateQuery>,
) -> Result<Json<Vec<AttendanceRecord>>, ApiError> {
    let date = NaiveDate::parse_from_str(&query.date, "%Y-%m-%d")
        .map_err(|_| ApiError::bad_request("Invalid date, expected YYYY-MM-DD"))?;

    let records = sqlx::query_as::<_, AttendanceRecord>(
        "SELECT * FROM attendance WHERE check_in_time::date = $1",
    )
    .bind(date)
    .fetch_all(&state.pool)
    .await?;
    Ok(Json(records))
}
