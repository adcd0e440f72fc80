//! HTTP handlers

pub mod admin;
pub mod auth;
pub mod error;
pub mod paste;
pub mod photo;
pub mod web;

pub use error::{ApiError, AppError};

use axum::Json;
use quire_core::QuireError;
use serde_json::{json, Value};

/// Health check
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Fallback for unmatched routes
pub async fn not_found() -> AppError {
    AppError(QuireError::not_found("route"))
}
