use anyhow::{bail, ensure};
use serde::Deserialize;

/// Lowest Argon2 iteration count accepted when running in production.
pub const MIN_PRODUCTION_HASH_COST: u32 = 2;

/// Longest token lifetime accepted for either token kind (ten years).
pub const MAX_TTL_SECS: i64 = 10 * 365 * 24 * 60 * 60;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    /// Postgres URL. Without one the service keeps credentials in memory.
    #[serde(default)]
    pub database_url: Option<String>,
    #[serde(default = "default_pool_size")]
    pub db_pool_size: u32,
    pub access_secret: String,
    pub refresh_secret: String,
    #[serde(default = "default_access_ttl")]
    pub access_ttl_secs: i64,
    #[serde(default = "default_refresh_ttl")]
    pub refresh_ttl_secs: i64,
    /// Argon2 time cost (iterations).
    #[serde(default = "default_hash_cost")]
    pub hash_cost: u32,
    #[serde(default = "default_hash_memory")]
    pub hash_memory_kib: u32,
    #[serde(default = "default_environment")]
    pub environment: String,
}

fn default_port() -> u16 { 3001 }
fn default_pool_size() -> u32 { 10 }
fn default_access_ttl() -> i64 { 15 * 60 }
fn default_refresh_ttl() -> i64 { 7 * 24 * 60 * 60 }
fn default_hash_cost() -> u32 { 10 }
fn default_hash_memory() -> u32 { 19 * 1024 }
fn default_environment() -> String { "development".into() }

impl AppConfig {
    /// Load from `TOLLGATE_AUTH_*` environment variables.
    pub fn load() -> anyhow::Result<Self> {
        Self::from_env(config::Environment::with_prefix("TOLLGATE_AUTH"))
    }

    pub fn from_env(source: config::Environment) -> anyhow::Result<Self> {
        let config: Self = config::Config::builder()
            .add_source(source.prefix_separator("_").separator("__").try_parsing(true))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.access_secret.trim().is_empty() || self.refresh_secret.trim().is_empty() {
            bail!("access_secret and refresh_secret must both be set");
        }
        ensure!(
            self.access_secret != self.refresh_secret,
            "access_secret and refresh_secret must differ"
        );
        ensure!(self.access_ttl_secs > 0, "access_ttl_secs must be positive");
        ensure!(
            self.refresh_ttl_secs > self.access_ttl_secs,
            "refresh_ttl_secs must exceed access_ttl_secs"
        );
        ensure!(
            self.refresh_ttl_secs <= MAX_TTL_SECS,
            "token lifetimes must not exceed {MAX_TTL_SECS} seconds"
        );
        ensure!(self.hash_cost >= 1, "hash_cost must be at least 1");
        if self.is_production() {
            ensure!(
                self.hash_cost >= MIN_PRODUCTION_HASH_COST,
                "hash_cost must be at least {MIN_PRODUCTION_HASH_COST} in production"
            );
            ensure!(self.database_url.is_some(), "database_url is required in production");
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}
