//! Admin dashboard. Placeholder summaries only; real aggregation has never
//! existed for these endpoints and the response shape is all that matters.

use axum::{middleware, response::Json, routing::get, Router};
use serde_json::{json, Value};

use crate::middleware::{jwt_auth, require_admin};
use crate::state::AppState;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/admin/overview", get(overview))
        .route("/admin/reports_attendance", get(reports_attendance))
        .route("/admin/alerts", get(alerts))
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(state.clone(), jwt_auth))
        .with_state(state)
}

async fn overview() -> Json<Value> {
    Json(json!({
        "message": "Dashboard overview: trips today, active buses, late check-ins"
    }))
}

async fn reports_attendance() -> Json<Value> {
    Json(json!({ "message": "Attendance reports by school or student" }))
}

async fn alerts() -> Json<Value> {
    Json(json!({ "message": "Critical alerts (delays, safety issues)" }))
}
