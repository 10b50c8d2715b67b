use axum::http::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::token::TokenPayload;

/// Identity header set by the gateway from a verified access token.
pub const HEADER_USER_ID: &str = "x-user-id";
/// Email companion of [`HEADER_USER_ID`].
pub const HEADER_USER_EMAIL: &str = "x-user-email";

/// Identity derived from a token that passed signature and expiry checks.
///
/// Only ever constructed from a [`TokenPayload`]; client-supplied identity
/// headers are never parsed into this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedIdentity {
    pub user_id: Uuid,
    pub email: String,
}

impl From<TokenPayload> for AuthenticatedIdentity {
    fn from(payload: TokenPayload) -> Self {
        Self {
            user_id: payload.user_id,
            email: payload.email,
        }
    }
}

impl AuthenticatedIdentity {
    /// Overwrite the identity headers in `headers` with this identity.
    ///
    /// An email that is not a valid header value is dropped rather than
    /// forwarded; the user id header is always set.
    pub fn write_headers(&self, headers: &mut HeaderMap) {
        strip_identity_headers(headers);
        if let Ok(value) = HeaderValue::from_str(&self.user_id.to_string()) {
            headers.insert(HeaderName::from_static(HEADER_USER_ID), value);
        }
        match HeaderValue::from_str(&self.email) {
            Ok(value) => {
                headers.insert(HeaderName::from_static(HEADER_USER_EMAIL), value);
            }
            Err(_) => {
                tracing::warn!(user_id = %self.user_id, "email not representable as header, omitted");
            }
        }
    }
}

/// Remove every occurrence of the identity headers.
pub fn strip_identity_headers(headers: &mut HeaderMap) {
    headers.remove(HEADER_USER_ID);
    headers.remove(HEADER_USER_EMAIL);
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

impl TokenPair {
    pub fn new(access_token: String, refresh_token: String, expires_in: i64) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in,
        }
    }
}
