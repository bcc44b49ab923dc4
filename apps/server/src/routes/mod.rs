//! HTTP route handlers.

pub mod auth;
pub mod courses;
pub mod files;
pub mod lectures;

use axum::Json;
use serde_json::{Value, json};

/// `GET /` — welcome/health check.
pub async fn home() -> Json<Value> {
    Json(json!({ "message": "Welcome to the Lectern backend!" }))
}
