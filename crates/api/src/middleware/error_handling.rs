//! # Error Handling Middleware
//!
//! This module provides a standardized way to handle errors in the LearnHub
//! API. It maps domain-specific errors to appropriate HTTP status codes and
//! JSON error responses, ensuring a consistent error handling experience
//! across the entire API.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use learnhub_core::errors::LearnError;
use serde_json::json;

/// Application error wrapper that provides HTTP status code mapping
///
/// `AppError` wraps domain-specific `LearnError` instances and implements
/// `IntoResponse` to convert them into HTTP responses with appropriate
/// status codes and JSON payloads.
#[derive(Debug)]
pub struct AppError(pub LearnError);

/// Converts application errors to HTTP responses
///
/// This implementation maps each error type to the appropriate HTTP status
/// code and formats the error message into a JSON response body.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Map error types to HTTP status codes
        let status = match &self.0 {
            LearnError::NotFound(_) => StatusCode::NOT_FOUND,
            LearnError::Validation(_) => StatusCode::BAD_REQUEST,
            LearnError::Forbidden(_) => StatusCode::FORBIDDEN,
            LearnError::Conflict(_) => StatusCode::CONFLICT,
            LearnError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            LearnError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Get the error message and format as JSON
        let message = self.0.to_string();
        let body = Json(json!({ "error": message }));

        (status, body).into_response()
    }
}

/// Automatic conversion from LearnError to AppError
///
/// This implementation allows using `?` operator with functions that return
/// `Result<T, LearnError>` in handler functions that return
/// `Result<T, AppError>`.
impl From<LearnError> for AppError {
    fn from(err: LearnError) -> Self {
        AppError(err)
    }
}

/// Automatic conversion from eyre::Report to AppError
///
/// This implementation allows using `?` operator with functions that return
/// `Result<T, eyre::Report>` in handler functions that return
/// `Result<T, AppError>`. It wraps the eyre error in a
/// `LearnError::Database` variant.
impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        AppError(LearnError::Database(err))
    }
}
