use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use dexa_core::CoreError;
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("JWT error: {0}")]
    Jwt(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(msg) => ApiError::Validation(msg),
            CoreError::NotFound(msg) => ApiError::NotFound(msg),
            CoreError::PayloadTooLarge(msg) => ApiError::PayloadTooLarge(msg),
            CoreError::Unauthorized(_) => ApiError::Unauthorized,
            CoreError::Upstream(msg) => ApiError::Upstream(msg),
            CoreError::Database(msg) => ApiError::Database(msg),
            CoreError::Storage(msg) => ApiError::Storage(msg),
            CoreError::Serialization(msg) | CoreError::Internal(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Validation(format!("Validation failed: {}", errors))
    }
}

impl From<jsonwebtoken::errors::Error> for ApiError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        ApiError::Jwt(err.to_string())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(err.body_text())
        } else {
            ApiError::BadRequest(format!("Failed to read multipart body: {}", err.body_text()))
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, details) = match &self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "Validation error", Some(msg.clone())),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "Bad request", Some(msg.clone())),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "Resource not found", Some(msg.clone())),
            ApiError::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "Payload too large", Some(msg.clone()))
            }
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized", None),
            ApiError::Jwt(msg) => (StatusCode::UNAUTHORIZED, "JWT error", Some(msg.clone())),
            ApiError::Upstream(msg) => {
                tracing::warn!(error = %msg, "Upstream service failed");
                (StatusCode::BAD_GATEWAY, "Upstream error", Some(msg.clone()))
            }
            ApiError::Database(err) => {
                tracing::error!("Database error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error", None)
            }
            ApiError::Storage(msg) => {
                tracing::error!("Storage error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Storage error", Some(msg.clone()))
            }
            ApiError::Internal(err) => {
                tracing::error!("Internal error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", Some(err.clone()))
            }
        };

        let mut response_json = json!({
            "error": message,
        });

        if let Some(details_msg) = details {
            response_json["details"] = json!(details_msg);
        }

        (status, Json(response_json)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(CoreError::Validation("x".into()), StatusCode::BAD_REQUEST)]
    #[case(CoreError::NotFound("x".into()), StatusCode::NOT_FOUND)]
    #[case(CoreError::PayloadTooLarge("x".into()), StatusCode::PAYLOAD_TOO_LARGE)]
    #[case(CoreError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED)]
    #[case(CoreError::Upstream("x".into()), StatusCode::BAD_GATEWAY)]
    #[case(CoreError::Database("x".into()), StatusCode::INTERNAL_SERVER_ERROR)]
    #[case(CoreError::Serialization("x".into()), StatusCode::INTERNAL_SERVER_ERROR)]
    fn core_errors_map_to_status(#[case] err: CoreError, #[case] expected: StatusCode) {
        let response = ApiError::from(err).into_response();
        assert_eq!(response.status(), expected);
    }
}
