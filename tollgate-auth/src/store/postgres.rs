use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use uuid::Uuid;

use super::{CredentialStore, StoreError, StoreResult};
use crate::models::{Credential, NewCredential, NewRefreshToken, RefreshToken};
use crate::schema::{credentials, refresh_tokens};

pub type DbPool = Pool<ConnectionManager<PgConnection>>;

/// Credential store backed by Postgres. The schema lives in `migrations/`.
///
/// diesel is synchronous, so every query runs on the blocking pool.
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: DbPool,
}

impl PgCredentialStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn connect(database_url: &str, max_size: u32) -> StoreResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(database_url);
        let pool = Pool::builder()
            .max_size(max_size)
            .build(manager)
            .map_err(|e| StoreError::Pool(e.to_string()))?;
        Ok(Self::new(pool))
    }

    async fn run<T, F>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut PgConnection) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get().map_err(|e| StoreError::Pool(e.to_string()))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

fn map_constraint(err: DieselError) -> StoreError {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            StoreError::Conflict(info.message().to_string())
        }
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
            StoreError::MissingReference(info.message().to_string())
        }
        other => StoreError::Database(other),
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn create_credential(&self, new: NewCredential) -> StoreResult<Credential> {
        self.run(move |conn| {
            diesel::insert_into(credentials::table)
                .values(&new)
                .get_result::<Credential>(conn)
                .map_err(map_constraint)
        })
        .await
    }

    async fn find_credential_by_email(&self, email: &str) -> StoreResult<Option<Credential>> {
        let email = email.to_owned();
        self.run(move |conn| {
            Ok(credentials::table
                .filter(credentials::email.eq(email))
                .first::<Credential>(conn)
                .optional()?)
        })
        .await
    }

    async fn find_credential_by_id(&self, id: Uuid) -> StoreResult<Option<Credential>> {
        self.run(move |conn| Ok(credentials::table.find(id).first::<Credential>(conn).optional()?))
            .await
    }

    async fn delete_credential(&self, id: Uuid) -> StoreResult<bool> {
        // refresh_tokens.user_id is ON DELETE CASCADE
        self.run(move |conn| Ok(diesel::delete(credentials::table.find(id)).execute(conn)? > 0))
            .await
    }

    async fn create_refresh_token(&self, new: NewRefreshToken) -> StoreResult<RefreshToken> {
        self.run(move |conn| {
            diesel::insert_into(refresh_tokens::table)
                .values(&new)
                .get_result::<RefreshToken>(conn)
                .map_err(map_constraint)
        })
        .await
    }

    async fn take_refresh_token(&self, token: &str) -> StoreResult<Option<RefreshToken>> {
        let token = token.to_owned();
        self.run(move |conn| {
            Ok(diesel::delete(refresh_tokens::table.filter(refresh_tokens::token.eq(token)))
                .get_result::<RefreshToken>(conn)
                .optional()?)
        })
        .await
    }

    async fn delete_refresh_tokens(&self, token: &str) -> StoreResult<u64> {
        let token = token.to_owned();
        self.run(move |conn| {
            let deleted = diesel::delete(refresh_tokens::table.filter(refresh_tokens::token.eq(token)))
                .execute(conn)?;
            Ok(deleted as u64)
        })
        .await
    }
}
