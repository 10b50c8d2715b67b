use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;

use crate::errors::AppError;

/// Message for a request that carries no usable bearer credential.
pub const MISSING_TOKEN_MESSAGE: &str = "Access token required";

/// Raw bearer token taken from the `Authorization` header.
///
/// Extraction only checks presence and scheme; verification is the caller's
/// job so that it can pick the right secret and failure mapping.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

#[axum::async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        extract_bearer_token(&parts.headers).map(|t| Self(t.to_string()))
    }
}

/// Return the token of an `Authorization: Bearer <token>` header.
///
/// A missing header, a non-Bearer scheme and an empty token are all reported
/// as the same 401.
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::unauthorized(MISSING_TOKEN_MESSAGE))
}
