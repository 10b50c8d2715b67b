//! Registration, login and the refresh-token lifecycle.
//!
//! Every issued refresh token is persisted by value. A refresh consumes the
//! stored record with a single atomic take before a new pair is issued, so a
//! token value grants at most one successful refresh.

use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use tollgate_shared::token::{self, TokenKeys, TokenPayload, TokenSubject};
use tollgate_shared::{AppError, AppResult, AuthenticatedIdentity, ErrorCode, TokenPair};

use crate::config::AppConfig;
use crate::models::{Credential, NewCredential, NewRefreshToken, Profile};
use crate::services::CredentialHasher;
use crate::store::{CredentialStore, StoreError};

pub const USER_EXISTS_MESSAGE: &str = "User already exists";
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid email or password";
pub const INVALID_REFRESH_MESSAGE: &str = "Invalid or expired refresh token";
pub const INVALID_TOKEN_MESSAGE: &str = "Invalid or expired token";
pub const USER_NOT_FOUND_MESSAGE: &str = "User not found";

pub struct TokenService {
    store: Arc<dyn CredentialStore>,
    keys: TokenKeys,
    access_ttl: i64,
    refresh_ttl: i64,
    hasher: CredentialHasher,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn invalid_refresh() -> AppError {
    AppError::new(ErrorCode::RefreshTokenInvalid, INVALID_REFRESH_MESSAGE)
}

fn invalid_token() -> AppError {
    AppError::new(ErrorCode::TokenInvalid, INVALID_TOKEN_MESSAGE)
}

impl TokenService {
    pub fn new(store: Arc<dyn CredentialStore>, config: &AppConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let keys = TokenKeys::new(&config.access_secret, &config.refresh_secret)?;
        let hasher = CredentialHasher::new(config.hash_cost, config.hash_memory_kib)?;
        Ok(Self {
            store,
            keys,
            access_ttl: config.access_ttl_secs,
            refresh_ttl: config.refresh_ttl_secs,
            hasher,
        })
    }

    pub async fn register(&self, email: &str, password: &str) -> AppResult<TokenPair> {
        let email = normalize_email(email);
        if self.store.find_credential_by_email(&email).await?.is_some() {
            return Err(AppError::new(ErrorCode::EmailAlreadyExists, USER_EXISTS_MESSAGE));
        }

        let password_hash = self.hasher.hash(password.to_owned()).await?;
        // A racing register with the same email fails here on the unique index.
        let credential = self
            .store
            .create_credential(NewCredential { email, password_hash })
            .await?;

        tracing::info!(user_id = %credential.id, "credential registered");
        self.issue_tokens(&credential).await
    }

    pub async fn login(&self, email: &str, password: &str) -> AppResult<TokenPair> {
        let email = normalize_email(email);
        let credential = self.store.find_credential_by_email(&email).await?;
        let stored_hash = credential.as_ref().map(|c| c.password_hash.clone());
        let valid = self.hasher.verify(password.to_owned(), stored_hash).await?;

        match credential {
            Some(credential) if valid => {
                tracing::info!(user_id = %credential.id, "user logged in");
                self.issue_tokens(&credential).await
            }
            _ => Err(AppError::new(ErrorCode::InvalidCredentials, INVALID_CREDENTIALS_MESSAGE)),
        }
    }

    /// Exchange a refresh token for a new pair, consuming the old token.
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<TokenPair> {
        let payload = token::verify(refresh_token, &self.keys.refresh).map_err(|e| {
            tracing::debug!(error = %e, "refresh token rejected");
            invalid_refresh()
        })?;

        let stored = self
            .store
            .take_refresh_token(refresh_token)
            .await?
            .ok_or_else(|| {
                tracing::debug!(user_id = %payload.user_id, "refresh token not on record");
                invalid_refresh()
            })?;

        if stored.expires_at <= Utc::now() || stored.user_id != payload.user_id {
            return Err(invalid_refresh());
        }

        let credential = self
            .store
            .find_credential_by_id(stored.user_id)
            .await?
            .ok_or_else(invalid_refresh)?;

        tracing::debug!(user_id = %credential.id, "refresh token rotated");
        self.issue_tokens(&credential).await
    }

    /// Forget a refresh token. Unknown tokens are ignored.
    pub async fn logout(&self, refresh_token: &str) -> AppResult<()> {
        let removed = self.store.delete_refresh_tokens(refresh_token).await?;
        tracing::debug!(removed, "logout");
        Ok(())
    }

    /// Verify an access token and confirm its subject still exists.
    pub async fn validate_token(&self, access_token: &str) -> AppResult<TokenPayload> {
        let payload = self.verify_access(access_token)?;
        if self.store.find_credential_by_id(payload.user_id).await?.is_none() {
            return Err(AppError::new(ErrorCode::UserNotFound, USER_NOT_FOUND_MESSAGE));
        }
        Ok(payload)
    }

    /// Verify an access token without touching the store.
    pub fn authenticate(&self, access_token: &str) -> AppResult<AuthenticatedIdentity> {
        self.verify_access(access_token).map(AuthenticatedIdentity::from)
    }

    pub async fn get_profile(&self, user_id: Uuid) -> AppResult<Profile> {
        self.store
            .find_credential_by_id(user_id)
            .await?
            .map(Profile::from)
            .ok_or_else(|| AppError::new(ErrorCode::UserNotFound, USER_NOT_FOUND_MESSAGE))
    }

    /// Delete a credential together with all of its refresh tokens.
    pub async fn delete_user(&self, user_id: Uuid) -> AppResult<()> {
        if !self.store.delete_credential(user_id).await? {
            return Err(AppError::new(ErrorCode::UserNotFound, USER_NOT_FOUND_MESSAGE));
        }
        tracing::info!(user_id = %user_id, "credential deleted");
        Ok(())
    }

    pub fn access_ttl(&self) -> i64 {
        self.access_ttl
    }

    fn verify_access(&self, access_token: &str) -> AppResult<TokenPayload> {
        token::verify(access_token, &self.keys.access).map_err(|e| {
            tracing::debug!(error = %e, "access token rejected");
            invalid_token()
        })
    }

    async fn issue_tokens(&self, credential: &Credential) -> AppResult<TokenPair> {
        let subject = TokenSubject {
            user_id: credential.id,
            email: credential.email.clone(),
        };
        let access_token = token::sign(&subject, &self.keys.access, self.access_ttl)
            .map_err(|e| AppError::internal(format!("signing access token: {e}")))?;
        let refresh_token = token::sign(&subject, &self.keys.refresh, self.refresh_ttl)
            .map_err(|e| AppError::internal(format!("signing refresh token: {e}")))?;
        let expires_at = Duration::try_seconds(self.refresh_ttl)
            .and_then(|ttl| Utc::now().checked_add_signed(ttl))
            .ok_or_else(|| AppError::internal("refresh token lifetime out of range"))?;

        self.store
            .create_refresh_token(NewRefreshToken {
                user_id: credential.id,
                token: refresh_token.clone(),
                expires_at,
            })
            .await
            .map_err(|e| match e {
                StoreError::Conflict(msg) => AppError::internal(format!("refresh token collision: {msg}")),
                other => other.into(),
            })?;

        Ok(TokenPair::new(access_token, refresh_token, self.access_ttl))
    }
}
