use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use uuid::Uuid;

use super::{CredentialStore, StoreError, StoreResult};
use crate::models::{Credential, NewCredential, NewRefreshToken, RefreshToken};

#[derive(Default)]
struct Tables {
    credentials: HashMap<Uuid, Credential>,
    refresh_tokens: HashMap<Uuid, RefreshToken>,
}

/// In-process store with the same constraints as the Postgres schema:
/// unique email, unique token value, cascade on credential delete.
///
/// Every operation runs under one lock, so `take_refresh_token` is atomic.
#[derive(Default)]
pub struct MemoryCredentialStore {
    tables: Mutex<Tables>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn credential_count(&self) -> usize {
        self.tables.lock().credentials.len()
    }

    pub fn refresh_token_count(&self) -> usize {
        self.tables.lock().refresh_tokens.len()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn create_credential(&self, new: NewCredential) -> StoreResult<Credential> {
        let mut tables = self.tables.lock();
        if tables.credentials.values().any(|c| c.email == new.email) {
            return Err(StoreError::Conflict(format!("email {}", new.email)));
        }
        let now = Utc::now();
        let credential = Credential {
            id: Uuid::now_v7(),
            email: new.email,
            password_hash: new.password_hash,
            created_at: now,
            updated_at: now,
        };
        tables.credentials.insert(credential.id, credential.clone());
        Ok(credential)
    }

    async fn find_credential_by_email(&self, email: &str) -> StoreResult<Option<Credential>> {
        let tables = self.tables.lock();
        Ok(tables.credentials.values().find(|c| c.email == email).cloned())
    }

    async fn find_credential_by_id(&self, id: Uuid) -> StoreResult<Option<Credential>> {
        Ok(self.tables.lock().credentials.get(&id).cloned())
    }

    async fn delete_credential(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.lock();
        if tables.credentials.remove(&id).is_none() {
            return Ok(false);
        }
        tables.refresh_tokens.retain(|_, t| t.user_id != id);
        Ok(true)
    }

    async fn create_refresh_token(&self, new: NewRefreshToken) -> StoreResult<RefreshToken> {
        let mut tables = self.tables.lock();
        if !tables.credentials.contains_key(&new.user_id) {
            return Err(StoreError::MissingReference(format!("credential {}", new.user_id)));
        }
        if tables.refresh_tokens.values().any(|t| t.token == new.token) {
            return Err(StoreError::Conflict("refresh token".into()));
        }
        let record = RefreshToken {
            id: Uuid::now_v7(),
            user_id: new.user_id,
            token: new.token,
            expires_at: new.expires_at,
            created_at: Utc::now(),
        };
        tables.refresh_tokens.insert(record.id, record.clone());
        Ok(record)
    }

    async fn take_refresh_token(&self, token: &str) -> StoreResult<Option<RefreshToken>> {
        let mut tables = self.tables.lock();
        let id = tables
            .refresh_tokens
            .values()
            .find(|t| t.token == token)
            .map(|t| t.id);
        Ok(id.and_then(|id| tables.refresh_tokens.remove(&id)))
    }

    async fn delete_refresh_tokens(&self, token: &str) -> StoreResult<u64> {
        let mut tables = self.tables.lock();
        let before = tables.refresh_tokens.len();
        tables.refresh_tokens.retain(|_, t| t.token != token);
        Ok((before - tables.refresh_tokens.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_credential(email: &str) -> NewCredential {
        NewCredential {
            email: email.into(),
            password_hash: "$argon2id$stub".into(),
        }
    }

    fn new_token(user_id: Uuid, token: &str) -> NewRefreshToken {
        NewRefreshToken {
            user_id,
            token: token.into(),
            expires_at: Utc::now() + Duration::days(7),
        }
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let store = MemoryCredentialStore::new();
        store.create_credential(new_credential("alice@example.com")).await.unwrap();
        let err = store
            .create_credential(new_credential("alice@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(store.credential_count(), 1);
    }

    #[tokio::test]
    async fn take_is_single_use() {
        let store = MemoryCredentialStore::new();
        let user = store.create_credential(new_credential("bob@example.com")).await.unwrap();
        store.create_refresh_token(new_token(user.id, "tok-1")).await.unwrap();

        let taken = store.take_refresh_token("tok-1").await.unwrap().unwrap();
        assert_eq!(taken.user_id, user.id);
        assert!(store.take_refresh_token("tok-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn deleting_credential_cascades_to_tokens() {
        let store = MemoryCredentialStore::new();
        let user = store.create_credential(new_credential("carol@example.com")).await.unwrap();
        store.create_refresh_token(new_token(user.id, "a")).await.unwrap();
        store.create_refresh_token(new_token(user.id, "b")).await.unwrap();

        assert!(store.delete_credential(user.id).await.unwrap());
        assert_eq!(store.refresh_token_count(), 0);
        assert!(!store.delete_credential(user.id).await.unwrap());
    }

    #[tokio::test]
    async fn delete_tokens_is_idempotent() {
        let store = MemoryCredentialStore::new();
        let user = store.create_credential(new_credential("dave@example.com")).await.unwrap();
        store.create_refresh_token(new_token(user.id, "x")).await.unwrap();

        assert_eq!(store.delete_refresh_tokens("x").await.unwrap(), 1);
        assert_eq!(store.delete_refresh_tokens("x").await.unwrap(), 0);
        assert_eq!(store.delete_refresh_tokens("never-issued").await.unwrap(), 0);
    }
}
