//! Persistence for credentials and issued refresh tokens.
//!
//! [`CredentialStore`] is the only seam between the token service and the
//! database. Two implementations exist:
//!
//! - [`PgCredentialStore`]: diesel over an r2d2 pool, used in production
//! - [`MemoryCredentialStore`]: a mutex-guarded map, used in development and tests
//!
//! Uniqueness of `email` and of refresh-token values is enforced by the store
//! and surfaces as [`StoreError::Conflict`].

mod memory;
mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use tollgate_shared::{AppError, ErrorCode};

use crate::models::{Credential, NewCredential, NewRefreshToken, RefreshToken};

pub use memory::MemoryCredentialStore;
pub use postgres::{DbPool, PgCredentialStore};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique constraint was violated (duplicate email or token value).
    #[error("unique constraint violated: {0}")]
    Conflict(String),

    /// A referenced credential does not exist.
    #[error("foreign key violated: {0}")]
    MissingReference(String),

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("connection pool error: {0}")]
    Pool(String),

    #[error("blocking task failed: {0}")]
    Task(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(_) => AppError::new(ErrorCode::EmailAlreadyExists, "User already exists"),
            other => AppError::internal(other.to_string()),
        }
    }
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Insert a credential. Fails with [`StoreError::Conflict`] if the email is taken.
    async fn create_credential(&self, new: NewCredential) -> StoreResult<Credential>;

    async fn find_credential_by_email(&self, email: &str) -> StoreResult<Option<Credential>>;

    async fn find_credential_by_id(&self, id: Uuid) -> StoreResult<Option<Credential>>;

    /// Delete a credential and every refresh token it owns.
    /// Returns `false` when nothing was deleted.
    async fn delete_credential(&self, id: Uuid) -> StoreResult<bool>;

    async fn create_refresh_token(&self, new: NewRefreshToken) -> StoreResult<RefreshToken>;

    /// Remove the record holding exactly `token` and return it.
    ///
    /// At most one caller ever receives `Some` for a given value.
    async fn take_refresh_token(&self, token: &str) -> StoreResult<Option<RefreshToken>>;

    /// Remove every record holding `token`. Returns the number removed.
    async fn delete_refresh_tokens(&self, token: &str) -> StoreResult<u64>;
}
