use axum::{Json, http::StatusCode, response::IntoResponse, response::Response};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Environment variable {0} not set error")]
    EnvironmentVariableNotSetError(String),
    #[error("File read error, {0}")]
    FileReadError(String),
    #[error("Database connection error")]
    DatabaseConnectionError,
    #[error("Sqlx error: {0}")]
    SqlxError(#[from] sqlx::Error),
    #[error("Listing store temporarily unavailable, {0}")]
    StoreUnavailable(String),
    #[error("Invalid search scope, {0}")]
    InvalidScopeError(String),
    #[error("Too many requests")]
    TooManyRequests,
    #[error("Missing access token error")]
    MissingAccessToken,
    #[error("{0} token required")]
    Unauthorized(String),
    #[error("jsonwebtoken error")]
    JsonWebTokenError(#[from] jsonwebtoken::errors::Error),
    #[error("IO error, {0}")]
    IoError(#[from] std::io::Error),
    #[error("Internal error, {0}")]
    InternalError(String),
}

impl AppError {
    /// Sorts a store-level failure into the transient class (503) or a plain
    /// database error (500). Neither is ever turned into an empty result.
    pub fn from_store(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_) => Self::StoreUnavailable(error.to_string()),
            other => Self::SqlxError(other),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            Self::EnvironmentVariableNotSetError(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Environment variable {e} not set"),
            ),
            Self::FileReadError(e) => (StatusCode::INTERNAL_SERVER_ERROR, e),
            Self::DatabaseConnectionError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database connection error".to_string(),
            ),
            Self::SqlxError(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            Self::StoreUnavailable(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Listing search is temporarily unavailable".to_string(),
            ),
            Self::InvalidScopeError(e) => (
                StatusCode::BAD_REQUEST,
                format!("Invalid search scope, {e}"),
            ),
            Self::TooManyRequests => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many requests".to_string(),
            ),
            Self::MissingAccessToken => {
                (StatusCode::UNAUTHORIZED, "Missing access token".to_string())
            }
            Self::Unauthorized(e) => (StatusCode::UNAUTHORIZED, e),
            Self::JsonWebTokenError(e) => (StatusCode::UNAUTHORIZED, e.to_string()),
            Self::IoError(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            Self::InternalError(e) => (StatusCode::INTERNAL_SERVER_ERROR, e),
        };

        let body = Json(json!({"error": error_message}));

        (status, body).into_response()
    }
}
