pub mod admin;
pub mod attendance;
pub mod auth;
pub mod notifications;
pub mod rides;
pub mod tracking;
pub mod users;

use axum::{response::Json, routing::get, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;

/// Assemble the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .merge(auth::routes(state.clone()))
        .merge(users::routes(state.clone()))
        .merge(rides::routes(state.clone()))
        .merge(tracking::routes(state.clone()))
        .merge(attendance::routes(state.clone()))
        .merge(notifications::routes(state.clone()))
        .merge(admin::routes(state))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn root() -> Json<Value> {
    Json(json!({
        "name": "swift-shuttle",
        "description": "School shuttle coordination API",
    }))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
