use axum::{http::StatusCode, response::Json};
use serde::Serialize;

/// Standard `{"message": ...}` body returned by every successful mutation.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

pub fn message(text: impl Into<String>) -> Json<MessageResponse> {
    Json(MessageResponse {
        message: text.into(),
    })
}

pub fn created(text: impl Into<String>) -> (StatusCode, Json<MessageResponse>) {
    (StatusCode::CREATED, message(text))
}
