//! Error classification shared by repositories, services and handlers.
//!
//! Repositories translate driver errors into one of the classified variants,
//! services pass them through, and the HTTP edge maps each variant to a fixed
//! status code and a generic message. Nothing from the driver reaches the
//! client.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("unauthorized")]
    Unauthorized,

    #[error("invalid")]
    Invalid,

    /// Malformed request at the edge (bad JSON, bad path id).
    #[error("{0}")]
    BadRequest(&'static str),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Conflict => StatusCode::CONFLICT,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Invalid | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> &'static str {
        match self {
            AppError::NotFound => "not found",
            AppError::Conflict => "conflict",
            AppError::Unauthorized => "unauthorized",
            AppError::Invalid => "invalid",
            AppError::BadRequest(message) => *message,
            AppError::Internal(_) => "internal error",
        }
    }
}

const NOT_NULL_VIOLATION: &str = "23502";

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::RowNotFound = err {
            return AppError::NotFound;
        }
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return AppError::Conflict;
            }
            if db_err.is_foreign_key_violation() || db_err.is_check_violation() {
                return AppError::Invalid;
            }
            if db_err.code().as_deref() == Some(NOT_NULL_VIOLATION) {
                return AppError::Invalid;
            }
        }
        AppError::Internal(anyhow::Error::new(err))
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Internal(err) = &self {
            tracing::error!(error = ?err, "unhandled error");
        }
        let status = self.status();
        (status, Json(ErrorBody { error: self.public_message() })).into_response()
    }
}
