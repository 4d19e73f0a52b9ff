use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use commitment_core::errors::{DatabaseError, Error as CoreError};
use commitment_core::penalties::PenaltyError;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Core(#[from] CoreError),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Internal(String),
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

fn penalty_status(e: &PenaltyError) -> (StatusCode, &'static str) {
    match e {
        PenaltyError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
        PenaltyError::Forbidden { .. } => (StatusCode::FORBIDDEN, "forbidden"),
        PenaltyError::AlreadyResolved { .. } => (StatusCode::CONFLICT, "already_resolved"),
        PenaltyError::DeadlineExpired { .. } => (StatusCode::GONE, "deadline_expired"),
        PenaltyError::ValidationFailed(_) => (StatusCode::BAD_REQUEST, "validation_failed"),
        PenaltyError::DuplicateKind { .. } => (StatusCode::CONFLICT, "duplicate"),
        PenaltyError::InvariantViolation(_) => {
            (StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation")
        }
    }
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Core(e) => match e {
                CoreError::Penalty(p) => penalty_status(p),
                CoreError::Database(DatabaseError::NotFound(_)) => {
                    (StatusCode::NOT_FOUND, "not_found")
                }
                CoreError::Database(DatabaseError::UniqueViolation(_))
                | CoreError::ConstraintViolation(_) => (StatusCode::CONFLICT, "conflict"),
                CoreError::Database(_) | CoreError::Unexpected(_) => {
                    (StatusCode::SERVICE_UNAVAILABLE, "storage_failure")
                }
                CoreError::Validation(_) | CoreError::InvalidConfigValue(_) => {
                    (StatusCode::BAD_REQUEST, "invalid_input")
                }
            },
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
            ApiError::Internal(_) | ApiError::Anyhow(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal")
            }
        }
    }

    fn user_message(&self) -> String {
        match self {
            ApiError::Core(CoreError::Database(DatabaseError::NotFound(what))) => {
                format!("Not found: {}", what)
            }
            ApiError::Core(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::debug!("Request rejected ({}): {}", status, self);
        }
        let body = Json(ErrorBody {
            code,
            message: self.user_message(),
        });
        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
