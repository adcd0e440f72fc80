//! Error types for Quire

use thiserror::Error;

pub type Result<T> = std::result::Result<T, QuireError>;

#[derive(Error, Debug)]
pub enum QuireError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl QuireError {
    pub fn not_found(what: impl std::fmt::Display) -> Self {
        QuireError::NotFound(what.to_string())
    }

    /// Short machine-readable kind, used in JSON error bodies
    pub fn code(&self) -> &'static str {
        match self {
            QuireError::NotFound(_) => "not_found",
            QuireError::Conflict(_) => "conflict",
            QuireError::InvalidInput(_) => "invalid_input",
            QuireError::Unauthorized(_) => "unauthorized",
            QuireError::Database(_) => "database",
            QuireError::Io(_) => "io",
            QuireError::Serialization(_) => "serialization",
            QuireError::Render(_) => "render",
            QuireError::Fetch(_) => "fetch",
            QuireError::Config(_) => "config",
        }
    }
}

impl From<serde_json::Error> for QuireError {
    fn from(e: serde_json::Error) -> Self {
        QuireError::Serialization(e.to_string())
    }
}
