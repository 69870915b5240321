//! Route handlers.

pub mod admin;
pub mod applications;
pub mod auth;
pub mod projects;

use axum::Json;
use serde_json::{Value, json};

/// Health check.
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
