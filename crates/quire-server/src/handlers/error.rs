//! Error responses: HTML pages for the site, JSON for the admin API

use crate::views::error_document;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use quire_core::QuireError;
use serde_json::json;
use tracing::{error, warn};

pub fn status_for(err: &QuireError) -> StatusCode {
    match err {
        QuireError::NotFound(_) => StatusCode::NOT_FOUND,
        QuireError::Conflict(_) => StatusCode::CONFLICT,
        QuireError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        QuireError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn log(status: StatusCode, err: &QuireError) {
    if status.is_server_error() {
        error!("Request failed: {}", err);
    } else if status != StatusCode::NOT_FOUND {
        warn!("Request rejected: {}", err);
    }
}

/// Error from a public HTML route
#[derive(Debug)]
pub struct AppError(pub QuireError);

impl From<QuireError> for AppError {
    fn from(e: QuireError) -> Self {
        AppError(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        log(status, &self.0);

        // Internal details stay in the log
        let message = match status {
            StatusCode::NOT_FOUND => "The page you requested does not exist.".to_string(),
            s if s.is_server_error() => "Something went wrong on our side.".to_string(),
            _ => self.0.to_string(),
        };
        (
            status,
            Html(error_document(status.as_u16(), &message).into_string()),
        )
            .into_response()
    }
}

/// Error from an `/api/v1` route
#[derive(Debug)]
pub struct ApiError(pub QuireError);

impl From<QuireError> for ApiError {
    fn from(e: QuireError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        log(status, &self.0);

        let message = if status.is_server_error() {
            "Internal server error".to_string()
        } else {
            self.0.to_string()
        };
        let body = Json(json!({
            "error": message,
            "code": self.0.code()
        }));
        (status, body).into_response()
    }
}
