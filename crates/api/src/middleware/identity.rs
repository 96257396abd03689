//! Caller identity extraction.
//!
//! Authentication is terminated upstream; requests arrive with the resolved
//! user id in the `X-User-Id` header. The extractor only parses the header,
//! role checks happen in the handlers against the stored user row.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
};
use learnhub_core::errors::LearnError;

use crate::middleware::error_handling::AppError;

pub const USER_ID_HEADER: &str = "x-user-id";

/// The acting user's id, taken from the `X-User-Id` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerId(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for CallerId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                AppError(LearnError::Validation(
                    "Missing X-User-Id header".to_string(),
                ))
            })?;

        let id: i64 = raw.trim().parse().map_err(|_| {
            AppError(LearnError::Validation(format!(
                "Invalid X-User-Id header: {:?}",
                raw
            )))
        })?;
        if id <= 0 {
            return Err(AppError(LearnError::Validation(format!(
                "Invalid X-User-Id header: {}",
                id
            ))));
        }

        Ok(CallerId(id))
    }
}
