use anyhow::{bail, ensure, Context};
use axum::http::HeaderValue;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    /// Must equal the token service's access secret.
    pub access_secret: String,

    // Backend base URLs
    #[serde(default = "default_auth_url")]
    pub auth_url: String,
    #[serde(default = "default_users_url")]
    pub users_url: String,
    #[serde(default = "default_notes_url")]
    pub notes_url: String,
    #[serde(default = "default_tags_url")]
    pub tags_url: String,

    #[serde(default = "default_upstream_timeout")]
    pub upstream_timeout_secs: u64,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
    #[serde(default)]
    pub cors_credentials: bool,
    #[serde(default = "default_environment")]
    pub environment: String,
}

fn default_port() -> u16 { 8080 }
fn default_auth_url() -> String { "http://localhost:3001".into() }
fn default_users_url() -> String { "http://localhost:3002".into() }
fn default_notes_url() -> String { "http://localhost:3003".into() }
fn default_tags_url() -> String { "http://localhost:3004".into() }
fn default_upstream_timeout() -> u64 { 30 }
fn default_max_body_bytes() -> usize { 10 * 1024 * 1024 }
fn default_cors_origin() -> String { "http://localhost:3000".into() }
fn default_environment() -> String { "development".into() }

impl AppConfig {
    /// Load from `TOLLGATE_GATEWAY_*` environment variables.
    pub fn load() -> anyhow::Result<Self> {
        Self::from_env(config::Environment::with_prefix("TOLLGATE_GATEWAY"))
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
        if self.access_secret.trim().is_empty() {
            bail!("access_secret must be set");
        }
        ensure!(self.upstream_timeout_secs > 0, "upstream_timeout_secs must be positive");
        ensure!(self.max_body_bytes > 0, "max_body_bytes must be positive");

        for (name, url) in self.service_urls() {
            reqwest::Url::parse(url).with_context(|| format!("{name}_url is not a valid URL: {url}"))?;
        }

        self.cors_origin_header()?;
        ensure!(
            !(self.cors_credentials && self.cors_origin == "*"),
            "cors_credentials cannot be combined with a wildcard cors_origin"
        );
        Ok(())
    }

    pub fn cors_origin_header(&self) -> anyhow::Result<HeaderValue> {
        HeaderValue::from_str(&self.cors_origin)
            .with_context(|| format!("cors_origin is not a valid origin: {}", self.cors_origin))
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    fn service_urls(&self) -> [(&'static str, &str); 4] {
        [
            ("auth", self.auth_url.as_str()),
            ("users", self.users_url.as_str()),
            ("notes", self.notes_url.as_str()),
            ("tags", self.tags_url.as_str()),
        ]
    }
}

/// A backend reachable through the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRoute {
    pub name: &'static str,
    /// Public path prefix, e.g. `/api/notes`.
    pub prefix: &'static str,
    /// Where the backend mounts its own routes, e.g. `/notes`.
    pub mount: &'static str,
    pub base_url: String,
}

impl ServiceRoute {
    /// The part of `path` after the prefix, if the route owns `path`.
    ///
    /// `/api/notes` owns `/api/notes` and `/api/notes/...` but not `/api/notesx`.
    /// A remainder with a dot segment is never owned: the backend URL must
    /// stay under the mount root.
    fn remainder<'a>(&self, path: &'a str) -> Option<&'a str> {
        let rest = path.strip_prefix(self.prefix)?;
        if !(rest.is_empty() || rest.starts_with('/')) {
            return None;
        }
        (!rest.split(['/', '\\']).any(is_dot_segment)).then_some(rest)
    }

    /// Build the backend URL for `path`, swapping the prefix for the mount root.
    pub fn upstream_url(&self, path: &str, query: Option<&str>) -> Option<String> {
        let rest = self.remainder(path)?;
        let base = self.base_url.trim_end_matches('/');
        Some(match query {
            Some(q) => format!("{base}{}{rest}?{q}", self.mount),
            None => format!("{base}{}{rest}", self.mount),
        })
    }

    pub fn health_url(&self) -> String {
        format!("{}/health", self.base_url.trim_end_matches('/'))
    }
}

/// `.` or `..`, literal or percent-encoded (`%2e`, `.%2E`, ...).
fn is_dot_segment(segment: &str) -> bool {
    let decoded = segment.to_ascii_lowercase().replace("%2e", ".");
    decoded == "." || decoded == ".."
}

/// Fixed prefix → backend table.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<ServiceRoute>,
}

impl RouteTable {
    pub fn from_config(config: &AppConfig) -> Self {
        let route = |name, prefix, mount, base_url: &String| ServiceRoute {
            name,
            prefix,
            mount,
            base_url: base_url.clone(),
        };
        Self {
            routes: vec![
                route("auth", "/api/auth", "/auth", &config.auth_url),
                route("users", "/api/users", "/users", &config.users_url),
                route("notes", "/api/notes", "/notes", &config.notes_url),
                route("tags", "/api/tags", "/tags", &config.tags_url),
            ],
        }
    }

    pub fn resolve(&self, path: &str) -> Option<&ServiceRoute> {
        self.routes.iter().find(|r| r.remainder(path).is_some())
    }

    pub fn routes(&self) -> &[ServiceRoute] {
        &self.routes
    }
}
