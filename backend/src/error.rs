//! Application error handling
//!
//! This module provides unified error handling for the API,
//! converting internal errors to appropriate HTTP responses.
//!
//! Validation and conflict errors keep their field detail. Credential and
//! token errors are flattened so a client cannot tell which part of a
//! credential was wrong, and internal errors are logged but never echoed.

use crate::repositories::{StoreError, UniqueField};
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use task_app_shared::{ErrorDetail, ErrorResponse, FieldErrors, TokenError};
use thiserror::Error;
use tracing::{debug, error};

/// Message returned for every login failure
pub const INVALID_CREDENTIALS: &str = "Invalid Credentials.";
/// Message returned for unreadable request bodies
pub const INVALID_INPUT: &str = "Please review your input";
/// Message returned for masked internal failures
pub const TRY_AGAIN_LATER: &str = "Something went wrong, please try again later.";

/// API error type that can be converted to HTTP responses
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation error: {0:?}")]
    Validation(FieldErrors),

    #[error("Conflict: {0:?}")]
    Conflict(FieldErrors),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Unauthorized: {0}")]
    Unauthorized(TokenError),

    #[error("Forbidden: {0}")]
    Forbidden(TokenError),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(field) => ApiError::Conflict(conflict_for(field)),
            StoreError::Backend(err) => ApiError::Internal(err),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        debug!(error = %rejection, "Rejected request body");
        ApiError::BadRequest(INVALID_INPUT.to_string())
    }
}

/// Field-tagged conflict for a duplicate identity
pub fn conflict_for(field: UniqueField) -> FieldErrors {
    let mut fields = FieldErrors::default();
    match field {
        UniqueField::Email => fields.email = Some("Email is already registered".to_string()),
        UniqueField::Username => {
            fields.username = Some("Username is already registered".to_string())
        }
    }
    fields
}

impl ApiError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::InvalidCredentials | ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (code, message, fields) = match self {
            ApiError::Validation(fields) => (
                "VALIDATION_ERROR",
                "Please correct the highlighted fields".to_string(),
                Some(fields),
            ),
            ApiError::Conflict(fields) => (
                "CONFLICT",
                "Account details are already in use".to_string(),
                Some(fields),
            ),
            ApiError::InvalidCredentials => {
                ("INVALID_CREDENTIALS", INVALID_CREDENTIALS.to_string(), None)
            }
            ApiError::Unauthorized(_) => {
                ("UNAUTHORIZED", "Authentication required".to_string(), None)
            }
            ApiError::Forbidden(_) => ("FORBIDDEN", "Access denied".to_string(), None),
            ApiError::NotFound(msg) => ("NOT_FOUND", msg, None),
            ApiError::BadRequest(msg) => ("BAD_REQUEST", msg, None),
            ApiError::Internal(err) => {
                error!("Internal error: {:?}", err);
                ("INTERNAL_ERROR", TRY_AGAIN_LATER.to_string(), None)
            }
        };

        let body = Json(ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                fields,
            },
        });

        (status, body).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
