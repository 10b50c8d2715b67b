//! Signing and verification of bearer tokens (HS256 JWTs).
//!
//! Access and refresh tokens are produced by the same functions but always
//! with different [`TokenSecret`]s, held together in [`TokenKeys`].

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("signing secret is missing")]
    MissingSecret,
    #[error("access and refresh secrets must differ")]
    SharedSecret,
    #[error("token lifetime must be positive")]
    InvalidTtl,
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token has expired")]
    Expired,
    #[error("token encoding failed: {0}")]
    Encoding(String),
}

/// Claims carried inside every access and refresh token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPayload {
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    pub email: String,
    /// Issued-at (unix seconds).
    pub iat: i64,
    /// Expiry (unix seconds). Always greater than `iat`.
    pub exp: i64,
    /// Unique per signature, so two tokens minted in the same second differ.
    pub jti: Uuid,
}

/// Who a token is being issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSubject {
    pub user_id: Uuid,
    pub email: String,
}

/// A symmetric HMAC secret, pre-expanded into encoding and decoding keys.
#[derive(Clone)]
pub struct TokenSecret {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenSecret {
    pub fn new(secret: &str) -> Result<Self, TokenError> {
        if secret.trim().is_empty() {
            return Err(TokenError::MissingSecret);
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        })
    }
}

impl std::fmt::Debug for TokenSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TokenSecret(<redacted>)")
    }
}

/// The two signing secrets of the token service.
#[derive(Debug, Clone)]
pub struct TokenKeys {
    pub access: TokenSecret,
    pub refresh: TokenSecret,
}

impl TokenKeys {
    /// Build both keys, refusing an empty secret or a secret shared by both roles.
    pub fn new(access_secret: &str, refresh_secret: &str) -> Result<Self, TokenError> {
        let access = TokenSecret::new(access_secret)?;
        let refresh = TokenSecret::new(refresh_secret)?;
        if access_secret == refresh_secret {
            return Err(TokenError::SharedSecret);
        }
        Ok(Self { access, refresh })
    }
}

/// Sign a fresh token for `subject` that expires `ttl_secs` from now.
pub fn sign(subject: &TokenSubject, secret: &TokenSecret, ttl_secs: i64) -> Result<String, TokenError> {
    if ttl_secs <= 0 {
        return Err(TokenError::InvalidTtl);
    }
    let now = Utc::now().timestamp();
    let payload = TokenPayload {
        user_id: subject.user_id,
        email: subject.email.clone(),
        iat: now,
        exp: now.checked_add(ttl_secs).ok_or(TokenError::InvalidTtl)?,
        jti: Uuid::now_v7(),
    };
    sign_payload(&payload, secret)
}

/// Sign an already-built payload as is.
pub fn sign_payload(payload: &TokenPayload, secret: &TokenSecret) -> Result<String, TokenError> {
    encode(&Header::new(Algorithm::HS256), payload, &secret.encoding)
        .map_err(|e| TokenError::Encoding(e.to_string()))
}

/// Verify signature and expiry against the current clock.
pub fn verify(token: &str, secret: &TokenSecret) -> Result<TokenPayload, TokenError> {
    verify_at(token, secret, Utc::now().timestamp())
}

/// Verify signature and expiry against `now` (unix seconds).
///
/// A token is expired from the second `exp` is reached onwards. Any malformed
/// input is reported as [`TokenError::InvalidSignature`].
pub fn verify_at(token: &str, secret: &TokenSecret, now: i64) -> Result<TokenPayload, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    // Expiry is checked below without leeway.
    validation.validate_exp = false;

    let payload = decode::<TokenPayload>(token, &secret.decoding, &validation)
        .map_err(|e| {
            tracing::debug!(error = %e, "token rejected");
            TokenError::InvalidSignature
        })?
        .claims;

    if now >= payload.exp {
        return Err(TokenError::Expired);
    }
    Ok(payload)
}
