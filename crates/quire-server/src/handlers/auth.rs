//! Authentication handlers

use super::ApiError;
use crate::app::AppState;
use axum::{extract::State, Json};
use quire_core::{User, UserLogin};
use serde::Serialize;
use tracing::info;

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    access_token: String,
    expires_in: i64,
    user: User,
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<UserLogin>,
) -> Result<Json<LoginResponse>, ApiError> {
    info!("Login attempt for: {}", req.email);

    let (user, token) = state.auth_service.login(&req.email, &req.password).await?;

    info!("Login successful for: {}", req.email);
    Ok(Json(LoginResponse {
        access_token: token.access_token,
        expires_in: token.expires_in,
        user,
    }))
}
