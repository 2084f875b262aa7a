//! Custom error types for the web service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::error::StoreError;
use serde_json::json;
use thiserror::Error;
use views::voting::SIGN_IN_TO_VOTE;

/// Custom error type for the web service
#[derive(Error, Debug)]
pub enum ApiError {
    /// No usable session
    #[error("Unauthorized")]
    Unauthorized,

    /// Voting without a session
    #[error("Sign-in required")]
    SignInRequired,

    /// Bad request with message
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The provider failed or rejected the call
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Internal server error
    #[error("Internal server error")]
    InternalServerError,
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        if error.is_unauthorized() {
            return ApiError::Unauthorized;
        }

        match error {
            StoreError::NotFound(what) => ApiError::NotFound(format!("{what} not found")),
            StoreError::Rejected(reason) => ApiError::BadRequest(reason),
            StoreError::Database(_) => ApiError::InternalServerError,
            other => ApiError::Upstream(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            ApiError::SignInRequired => (StatusCode::UNAUTHORIZED, SIGN_IN_TO_VOTE.to_string()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg),
            ApiError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_statuses() {
        let unauthorized = ApiError::from(StoreError::Auth {
            status: 401,
            message: "invalid JWT".to_string(),
        });
        assert!(matches!(unauthorized, ApiError::Unauthorized));

        let missing = ApiError::from(StoreError::NotFound("caption c9".to_string()));
        assert_eq!(missing.into_response().status(), StatusCode::NOT_FOUND);

        let upstream = ApiError::from(StoreError::Rest {
            status: 500,
            code: None,
            message: "boom".to_string(),
        });
        assert_eq!(upstream.into_response().status(), StatusCode::BAD_GATEWAY);
    }
}
