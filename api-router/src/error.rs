use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::error::AppError;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Serialize, Clone)]
pub enum ApiError {
    #[error("Internal server error")]
    Internal(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::Validation(msg) => Self::Validation(msg),
            other => {
                tracing::error!("Internal error: {:?}", other);
                Self::Internal("Internal server error".to_owned())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_response) = match self {
            Self::Internal(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse {
                    error: message,
                    status: "error".to_owned(),
                },
            ),
            Self::Validation(message) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: message,
                    status: "error".to_owned(),
                },
            ),
            Self::RateLimited(message) => (
                StatusCode::TOO_MANY_REQUESTS,
                ErrorResponse {
                    error: message,
                    status: "error".to_owned(),
                },
            ),
        };

        (status, Json(error_response)).into_response()
    }
}

#[derive(Serialize, Debug)]
struct ErrorResponse {
    error: String,
    status: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt::Debug;

    fn assert_status_code<T: IntoResponse + Debug>(response: T, expected_status: StatusCode) {
        let response = response.into_response();
        assert_eq!(response.status(), expected_status);
    }

    #[test]
    fn app_error_to_api_error_conversion() {
        let validation = AppError::Validation("invalid input".to_owned());
        let api_error = ApiError::from(validation);
        assert!(matches!(api_error, ApiError::Validation(msg) if msg == "invalid input"));

        // Runtime failures never reach callers as raw internals
        let internal = AppError::Io(std::io::Error::other("io error"));
        let api_error = ApiError::from(internal);
        assert!(matches!(api_error, ApiError::Internal(_)));
    }

    #[test]
    fn api_error_response_status_codes() {
        assert_status_code(
            ApiError::Internal("server error".to_owned()),
            StatusCode::INTERNAL_SERVER_ERROR,
        );
        assert_status_code(
            ApiError::Validation("invalid input".to_owned()),
            StatusCode::BAD_REQUEST,
        );
        assert_status_code(
            ApiError::RateLimited("slow down".to_owned()),
            StatusCode::TOO_MANY_REQUESTS,
        );
    }

    #[test]
    fn internal_error_message_is_sanitized() {
        let sensitive = "db password incorrect";
        let api_error = ApiError::Internal(sensitive.to_owned());

        assert_eq!(api_error.to_string(), "Internal server error");
        assert_status_code(api_error, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
