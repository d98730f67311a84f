//! Application-level error type returned by handlers.
//!
//! All variants serialise to the [`ErrorResponse`] JSON format and map to the
//! appropriate HTTP status code.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tether::{FollowError, ValidationError};
use tether_node_api::{error::codes, ErrorResponse};

use crate::engine::EngineError;
use crate::storage::StorageError;

/// An error that a handler can return; converts directly to an HTTP response.
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    NotFollowing(String),
    /// Malformed request body.
    InvalidJson(String),
    InvalidOperation(String),
    InvalidAction(String),
    Unauthorized(String),
    Conflict(String),
    Validation(String),
    Timeout(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, codes::NOT_FOUND, msg),
            AppError::NotFollowing(msg) => (StatusCode::NOT_FOUND, codes::NOT_FOLLOWING, msg),
            AppError::InvalidJson(msg) => (StatusCode::BAD_REQUEST, codes::INVALID_JSON, msg),
            AppError::InvalidOperation(msg) => {
                (StatusCode::BAD_REQUEST, codes::INVALID_OPERATION, msg)
            }
            AppError::InvalidAction(msg) => (StatusCode::BAD_REQUEST, codes::INVALID_ACTION, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, codes::UNAUTHORIZED, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, codes::CONFLICT, msg),
            AppError::Validation(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, codes::VALIDATION_FAILED, msg)
            }
            AppError::Timeout(msg) => (StatusCode::GATEWAY_TIMEOUT, codes::STORE_TIMEOUT, msg),
            AppError::Internal(msg) => {
                tracing::error!("internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    codes::INTERNAL_ERROR,
                    "internal server error".to_string(),
                )
            }
        };
        let body = ErrorResponse::new(code, message);
        (status, Json(body)).into_response()
    }
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound => AppError::NotFound("not found".into()),
            StorageError::Conflict(msg) => AppError::Conflict(msg),
            StorageError::Invalid(msg) => AppError::InvalidOperation(msg),
            StorageError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<FollowError> for AppError {
    fn from(e: FollowError) -> Self {
        let msg = e.to_string();
        match e {
            FollowError::NotFound(_) => AppError::NotFound(msg),
            FollowError::InvalidOperation(_) => AppError::InvalidOperation(msg),
            FollowError::InvalidAction(_) => AppError::InvalidAction(msg),
            FollowError::NotFollowing => AppError::NotFollowing(msg),
            FollowError::Unauthorized(_) => AppError::Unauthorized(msg),
        }
    }
}

impl From<EngineError> for AppError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::Follow(e) => e.into(),
            EngineError::Storage(e) => e.into(),
            e @ EngineError::Timeout(_) => AppError::Timeout(e.to_string()),
            e @ EngineError::Conflict { .. } => AppError::Conflict(e.to_string()),
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        AppError::Validation(e.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(e: JsonRejection) -> Self {
        AppError::InvalidJson(e.body_text())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tether::UserId;

    use super::*;

    fn status_of(e: impl Into<AppError>) -> StatusCode {
        e.into().into_response().status()
    }

    #[test]
    fn follow_errors_map_to_statuses() {
        assert_eq!(status_of(FollowError::NotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(status_of(FollowError::NotFollowing), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(FollowError::InvalidOperation("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(FollowError::InvalidAction("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(FollowError::Unauthorized("x".into())),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn engine_errors_map_to_statuses() {
        assert_eq!(
            status_of(EngineError::Timeout(Duration::from_millis(10))),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            status_of(EngineError::Conflict {
                follower: UserId(1),
                following: UserId(2),
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(EngineError::Storage(StorageError::Internal("disk".into()))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn validation_is_unprocessable() {
        assert_eq!(
            status_of(ValidationError::InvalidUsername("a b".into())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }
}
