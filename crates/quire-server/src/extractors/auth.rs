//! Auth extractor for the admin API

use crate::app::AppState;
use crate::handlers::ApiError;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use quire_core::ports::UserStore;
use quire_core::QuireError;

/// Authenticated admin user
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: String,
    pub email: String,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // Get Authorization header
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| QuireError::Unauthorized("Missing Authorization header".to_string()))?;

        // Extract Bearer token
        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| QuireError::Unauthorized("Invalid Authorization format".to_string()))?;

        let user_id = state.auth_service.validate_token(token)?;
        let user = state
            .db
            .get_user(&user_id)
            .await?
            .ok_or_else(|| QuireError::Unauthorized("User not found".to_string()))?;

        Ok(AuthUser {
            user_id: user.id,
            email: user.email,
        })
    }
}
