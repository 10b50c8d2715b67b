use std::sync::Arc;

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;

use tollgate_shared::{AppError, AppResult};

/// Argon2id hashing with a configurable cost.
///
/// All work runs on the blocking pool. A hash of a throwaway password is
/// computed up front so a login for an unknown email pays the same price as
/// one with a wrong password.
#[derive(Clone)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
    dummy_hash: Arc<str>,
}

impl CredentialHasher {
    /// `time_cost` is the Argon2 iteration count, `memory_kib` its memory size.
    pub fn new(time_cost: u32, memory_kib: u32) -> anyhow::Result<Self> {
        let params = Params::new(memory_kib, time_cost, 1, None)
            .map_err(|e| anyhow::anyhow!("invalid argon2 parameters: {e}"))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let dummy_hash = hash_with(&argon2, "tollgate-dummy-password")
            .map_err(|e| anyhow::anyhow!("computing dummy hash: {e}"))?;
        Ok(Self {
            argon2,
            dummy_hash: dummy_hash.into(),
        })
    }

    pub async fn hash(&self, password: String) -> AppResult<String> {
        let argon2 = self.argon2.clone();
        tokio::task::spawn_blocking(move || hash_with(&argon2, &password))
            .await
            .map_err(|e| AppError::internal(format!("hashing task failed: {e}")))?
            .map_err(|e| AppError::internal(format!("password hashing failed: {e}")))
    }

    /// Check `password` against `hash`, or against the dummy hash when there
    /// is no stored credential. The latter always yields `false`.
    pub async fn verify(&self, password: String, hash: Option<String>) -> AppResult<bool> {
        let argon2 = self.argon2.clone();
        let known = hash.is_some();
        let hash = hash.unwrap_or_else(|| self.dummy_hash.to_string());

        let matched = tokio::task::spawn_blocking(move || -> AppResult<bool> {
            let parsed = PasswordHash::new(&hash)
                .map_err(|e| AppError::internal(format!("invalid password hash: {e}")))?;
            Ok(argon2.verify_password(password.as_bytes(), &parsed).is_ok())
        })
        .await
        .map_err(|e| AppError::internal(format!("verification task failed: {e}")))??;

        Ok(known && matched)
    }
}

fn hash_with(argon2: &Argon2<'_>, password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
}
